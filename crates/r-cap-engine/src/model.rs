//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::errors::{RatingError, Result};
use crate::materials;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConductorMaterial {
    Copper,
    Aluminum,
}

impl std::str::FromStr for ConductorMaterial {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "copper" | "cu" => Ok(ConductorMaterial::Copper),
            "aluminum" | "aluminium" | "al" => Ok(ConductorMaterial::Aluminum),
            other => Err(RatingError::InvalidMaterial(format!(
                "conductor material '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stranding {
    Solid,
    StrandedRound,
    StrandedCompact,
    Segmental,
}

/// Conductor construction.
///
/// `ks`/`kp` override the per-stranding defaults of IEC 60287-1-1 Table 2.
/// An explicit `ks` also disables the CIGRE large-Milliken fallback: the
/// user-supplied coefficient wins unambiguously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conductor {
    pub material: ConductorMaterial,
    pub cross_section_mm2: f64,
    pub diameter_mm: f64,
    pub stranding: Stranding,
    #[serde(default)]
    pub dc_resistance_20c: Option<f64>,
    #[serde(default)]
    pub ks: Option<f64>,
    #[serde(default)]
    pub kp: Option<f64>,
}

impl Conductor {
    pub fn skin_coefficient(&self) -> f64 {
        self.ks
            .unwrap_or_else(|| materials::stranding_coefficients(self.stranding).0)
    }

    pub fn proximity_coefficient(&self) -> f64 {
        self.kp
            .unwrap_or_else(|| materials::stranding_coefficients(self.stranding).1)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsulationMaterial {
    Xlpe,
    Epr,
    PaperOil,
}

impl std::str::FromStr for InsulationMaterial {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlpe" => Ok(InsulationMaterial::Xlpe),
            "epr" => Ok(InsulationMaterial::Epr),
            "paper_oil" | "paper-oil" | "paper" => Ok(InsulationMaterial::PaperOil),
            other => Err(RatingError::InvalidMaterial(format!(
                "insulation material '{other}'"
            ))),
        }
    }
}

/// Insulation system, including the semi-conducting screens that count
/// towards the thermal thickness t1 per IEC 60287-2-1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insulation {
    pub material: InsulationMaterial,
    pub thickness_mm: f64,
    #[serde(default)]
    pub conductor_screen_mm: f64,
    #[serde(default)]
    pub insulation_screen_mm: f64,
    #[serde(default)]
    pub tan_delta: Option<f64>,
    #[serde(default)]
    pub permittivity: Option<f64>,
    #[serde(default)]
    pub thermal_resistivity: Option<f64>,
}

impl Insulation {
    pub fn tan_delta(&self) -> f64 {
        self.tan_delta
            .unwrap_or_else(|| materials::insulation_tan_delta(self.material))
    }

    pub fn permittivity(&self) -> f64 {
        self.permittivity
            .unwrap_or_else(|| materials::insulation_permittivity(self.material))
    }

    pub fn thermal_resistivity(&self) -> f64 {
        self.thermal_resistivity
            .unwrap_or_else(|| materials::insulation_thermal_resistivity(self.material))
    }

    /// Total thermal thickness over the conductor (screens included).
    pub fn t1_mm(&self) -> f64 {
        self.conductor_screen_mm + self.thickness_mm + self.insulation_screen_mm
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShieldMaterial {
    Copper,
    Aluminum,
    Lead,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShieldType {
    Tape,
    Wire,
    Corrugated,
    Extruded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Bonding {
    SinglePoint,
    BothEnds,
    CrossBonded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shield {
    pub material: ShieldMaterial,
    pub kind: ShieldType,
    pub thickness_mm: f64,
    pub mean_diameter_mm: f64,
    #[serde(default)]
    pub resistance_20c: Option<f64>,
    pub bonding: Bonding,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JacketMaterial {
    Pvc,
    Pe,
    Hdpe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jacket {
    pub material: JacketMaterial,
    pub thickness_mm: f64,
    #[serde(default)]
    pub thermal_resistivity: Option<f64>,
}

impl Jacket {
    pub fn thermal_resistivity(&self) -> f64 {
        self.thermal_resistivity
            .unwrap_or_else(|| materials::jacket_thermal_resistivity(self.material))
    }
}

/// Full radial build of a single-core cable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableDesign {
    pub conductor: Conductor,
    pub insulation: Insulation,
    #[serde(default)]
    pub shield: Option<Shield>,
    pub jacket: Jacket,
}

impl CableDesign {
    /// Diameter over the insulation system, screens included (mm).
    pub fn diameter_over_insulation(&self) -> f64 {
        self.conductor.diameter_mm + 2.0 * self.insulation.t1_mm()
    }

    /// Diameter over the metallic shield, or over the insulation when the
    /// cable carries none (mm).
    pub fn diameter_over_shield(&self) -> f64 {
        let shield_thickness = self.shield.as_ref().map_or(0.0, |s| s.thickness_mm);
        self.diameter_over_insulation() + 2.0 * shield_thickness
    }

    /// Overall cable diameter (mm).
    pub fn overall_diameter(&self) -> f64 {
        self.diameter_over_shield() + 2.0 * self.jacket.thickness_mm
    }

    pub fn validate(&self) -> Result<()> {
        if self.conductor.cross_section_mm2 <= 0.0 {
            return Err(RatingError::InvalidGeometry(
                "conductor cross-section must be positive".into(),
            ));
        }
        if self.conductor.diameter_mm <= 0.0 {
            return Err(RatingError::InvalidGeometry(
                "conductor diameter must be positive".into(),
            ));
        }
        if self.insulation.thickness_mm <= 0.0 {
            return Err(RatingError::InvalidGeometry(
                "insulation thickness must be positive".into(),
            ));
        }
        if self.jacket.thickness_mm <= 0.0 {
            return Err(RatingError::InvalidGeometry(
                "jacket thickness must be positive".into(),
            ));
        }
        if let Some(shield) = &self.shield {
            if shield.thickness_mm <= 0.0 {
                return Err(RatingError::InvalidGeometry(
                    "shield thickness must be positive".into(),
                ));
            }
            if shield.mean_diameter_mm <= self.diameter_over_insulation() - 1e-9 {
                return Err(RatingError::InvalidGeometry(format!(
                    "shield mean diameter {:.2} mm sits inside the insulation ({:.2} mm)",
                    shield.mean_diameter_mm,
                    self.diameter_over_insulation()
                )));
            }
        }
        Ok(())
    }
}

/// Operating point shared by all cables of the study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingConditions {
    /// Phase-to-ground voltage (V).
    pub voltage_v: f64,
    pub frequency_hz: f64,
    /// Overrides the rated temperature of the insulation system (degC).
    #[serde(default)]
    pub max_conductor_temp_c: Option<f64>,
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
}

fn default_load_factor() -> f64 {
    1.0
}

impl OperatingConditions {
    pub fn max_conductor_temp(&self, insulation: InsulationMaterial) -> f64 {
        self.max_conductor_temp_c
            .unwrap_or_else(|| materials::rated_conductor_temp(insulation))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConduitMaterial {
    Pvc,
    Fiberglass,
    Steel,
}

impl std::str::FromStr for ConduitMaterial {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pvc" => Ok(ConduitMaterial::Pvc),
            "fiberglass" | "fibreglass" | "frp" => Ok(ConduitMaterial::Fiberglass),
            "steel" => Ok(ConduitMaterial::Steel),
            other => Err(RatingError::InvalidMaterial(format!(
                "conduit material '{other}'"
            ))),
        }
    }
}

/// Grid slot inside a duct bank, row 0 at the top.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DuctSlot {
    pub row: usize,
    pub col: usize,
}

/// Installation geometry. The engine dispatches on the variant to decide
/// which thermal resistances participate and where the heated neighbours
/// sit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Installation {
    DirectBuried {
        /// Burial depth to the cable centre (m).
        depth_m: f64,
        /// Axial spacing to the neighbouring phases (m); zero for a
        /// solitary cable.
        #[serde(default)]
        spacing_m: f64,
        soil_resistivity: f64,
        ambient_temp_c: f64,
    },
    Conduit {
        /// Burial depth to the conduit centre (m).
        depth_m: f64,
        #[serde(default)]
        spacing_m: f64,
        soil_resistivity: f64,
        ambient_temp_c: f64,
        conduit_id_mm: f64,
        conduit_od_mm: f64,
        conduit_material: ConduitMaterial,
        #[serde(default = "default_one")]
        num_conduits: usize,
    },
    DuctBank {
        /// Depth from grade to the top of the concrete envelope (m).
        depth_to_top_m: f64,
        soil_resistivity: f64,
        concrete_resistivity: f64,
        ambient_temp_c: f64,
        bank_width_m: f64,
        bank_height_m: f64,
        rows: usize,
        cols: usize,
        spacing_h_m: f64,
        spacing_v_m: f64,
        duct_id_mm: f64,
        duct_od_mm: f64,
        duct_material: ConduitMaterial,
        occupied: Vec<DuctSlot>,
        target: DuctSlot,
    },
}

fn default_one() -> usize {
    1
}

impl Installation {
    pub fn soil_resistivity(&self) -> f64 {
        match self {
            Installation::DirectBuried {
                soil_resistivity, ..
            }
            | Installation::Conduit {
                soil_resistivity, ..
            }
            | Installation::DuctBank {
                soil_resistivity, ..
            } => *soil_resistivity,
        }
    }

    pub fn ambient_temp_c(&self) -> f64 {
        match self {
            Installation::DirectBuried { ambient_temp_c, .. }
            | Installation::Conduit { ambient_temp_c, .. }
            | Installation::DuctBank { ambient_temp_c, .. } => *ambient_temp_c,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Installation::DirectBuried {
                depth_m,
                spacing_m,
                soil_resistivity,
                ..
            } => {
                require_positive(*depth_m, "burial depth")?;
                require_positive(*soil_resistivity, "soil thermal resistivity")?;
                if *spacing_m < 0.0 {
                    return Err(RatingError::InvalidGeometry(
                        "phase spacing must not be negative".into(),
                    ));
                }
            }
            Installation::Conduit {
                depth_m,
                spacing_m,
                soil_resistivity,
                conduit_id_mm,
                conduit_od_mm,
                num_conduits,
                ..
            } => {
                require_positive(*depth_m, "burial depth")?;
                require_positive(*soil_resistivity, "soil thermal resistivity")?;
                require_positive(*conduit_id_mm, "conduit inner diameter")?;
                if conduit_od_mm <= conduit_id_mm {
                    return Err(RatingError::InvalidGeometry(
                        "conduit outer diameter must exceed its inner diameter".into(),
                    ));
                }
                if *num_conduits == 0 {
                    return Err(RatingError::InvalidGeometry(
                        "at least one conduit is required".into(),
                    ));
                }
                if *num_conduits > 1 && *spacing_m <= 0.0 {
                    return Err(RatingError::InvalidGeometry(
                        "multiple conduits need a positive spacing".into(),
                    ));
                }
            }
            Installation::DuctBank {
                depth_to_top_m,
                soil_resistivity,
                concrete_resistivity,
                bank_width_m,
                bank_height_m,
                rows,
                cols,
                spacing_h_m,
                spacing_v_m,
                duct_id_mm,
                duct_od_mm,
                occupied,
                target,
                ..
            } => {
                require_positive(*depth_to_top_m, "depth to bank top")?;
                require_positive(*soil_resistivity, "soil thermal resistivity")?;
                require_positive(*concrete_resistivity, "concrete thermal resistivity")?;
                require_positive(*bank_width_m, "bank width")?;
                require_positive(*bank_height_m, "bank height")?;
                require_positive(*spacing_h_m, "horizontal duct spacing")?;
                require_positive(*spacing_v_m, "vertical duct spacing")?;
                require_positive(*duct_id_mm, "duct inner diameter")?;
                if duct_od_mm <= duct_id_mm {
                    return Err(RatingError::InvalidGeometry(
                        "duct outer diameter must exceed its inner diameter".into(),
                    ));
                }
                if *rows == 0 || *cols == 0 {
                    return Err(RatingError::InvalidGeometry(
                        "duct bank needs at least one row and one column".into(),
                    ));
                }
                if occupied.is_empty() {
                    return Err(RatingError::InvalidGeometry(
                        "duct bank has no occupied positions".into(),
                    ));
                }
                for slot in occupied {
                    if slot.row >= *rows || slot.col >= *cols {
                        return Err(RatingError::InvalidGeometry(format!(
                            "occupied duct ({}, {}) lies outside the {}x{} bank",
                            slot.row, slot.col, rows, cols
                        )));
                    }
                }
                if !occupied.contains(target) {
                    return Err(RatingError::InvalidGeometry(format!(
                        "target duct ({}, {}) is not in the occupied set",
                        target.row, target.col
                    )));
                }
                // The duct lattice has to fit inside the declared envelope.
                let lattice_w = (*cols as f64 - 1.0) * spacing_h_m;
                let lattice_h = (*rows as f64 - 1.0) * spacing_v_m;
                if lattice_w > *bank_width_m || lattice_h > *bank_height_m {
                    return Err(RatingError::InvalidGeometry(format!(
                        "duct lattice {:.2}x{:.2} m exceeds the bank envelope {:.2}x{:.2} m",
                        lattice_w, lattice_h, bank_width_m, bank_height_m
                    )));
                }
            }
        }
        Ok(())
    }
}

fn require_positive(value: f64, what: &str) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(RatingError::InvalidGeometry(format!(
            "{what} must be positive (got {value})"
        )))
    }
}

/// Position of a heated cable, x along the bank axis and y measured
/// downward from grade (m).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CablePosition {
    pub x_m: f64,
    pub y_m: f64,
}

/// Complete request consumed by the rating entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    #[serde(default)]
    pub study: Option<String>,
    pub cable: CableDesign,
    pub operating: OperatingConditions,
    pub installation: Installation,
    /// Current the design is judged against; absent a target, PASS simply
    /// means a positive ampacity was found.
    #[serde(default)]
    pub target_current_a: Option<f64>,
    /// Required margin over the target current, in percent.
    #[serde(default)]
    pub margin_percent: f64,
}

impl RatingRequest {
    pub fn validate(&self) -> Result<()> {
        self.cable.validate()?;
        self.installation.validate()?;

        let tmax = self
            .operating
            .max_conductor_temp(self.cable.insulation.material);
        let tamb = self.installation.ambient_temp_c();
        if tmax <= tamb {
            return Err(RatingError::InvalidOperating(format!(
                "maximum conductor temperature {tmax:.1} degC does not exceed ambient {tamb:.1} degC"
            )));
        }
        if self.operating.voltage_v <= 0.0 {
            return Err(RatingError::InvalidOperating(
                "phase-to-ground voltage must be positive".into(),
            ));
        }
        if self.operating.frequency_hz <= 0.0 {
            return Err(RatingError::InvalidOperating(
                "frequency must be positive".into(),
            ));
        }
        let lf = self.operating.load_factor;
        if !(lf > 0.0 && lf <= 1.0) {
            return Err(RatingError::InvalidOperating(format!(
                "load factor must lie in (0, 1], got {lf}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cable() -> CableDesign {
        CableDesign {
            conductor: Conductor {
                material: ConductorMaterial::Copper,
                cross_section_mm2: 240.0,
                diameter_mm: 17.5,
                stranding: Stranding::StrandedCompact,
                dc_resistance_20c: None,
                ks: None,
                kp: None,
            },
            insulation: Insulation {
                material: InsulationMaterial::Xlpe,
                thickness_mm: 8.0,
                conductor_screen_mm: 0.0,
                insulation_screen_mm: 0.0,
                tan_delta: None,
                permittivity: None,
                thermal_resistivity: None,
            },
            shield: None,
            jacket: Jacket {
                material: JacketMaterial::Pe,
                thickness_mm: 3.0,
                thermal_resistivity: None,
            },
        }
    }

    #[test]
    fn layer_diameters_stack_up() {
        let c = cable();
        assert!((c.diameter_over_insulation() - 33.5).abs() < 1e-9);
        assert!((c.overall_diameter() - 39.5).abs() < 1e-9);
    }

    #[test]
    fn shield_inside_insulation_is_rejected() {
        let mut c = cable();
        c.shield = Some(Shield {
            material: ShieldMaterial::Copper,
            kind: ShieldType::Tape,
            thickness_mm: 0.2,
            mean_diameter_mm: 20.0,
            resistance_20c: None,
            bonding: Bonding::SinglePoint,
        });
        assert!(matches!(
            c.validate(),
            Err(RatingError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn duct_bank_target_must_be_occupied() {
        let bank = Installation::DuctBank {
            depth_to_top_m: 0.9,
            soil_resistivity: 0.9,
            concrete_resistivity: 1.0,
            ambient_temp_c: 25.0,
            bank_width_m: 1.0,
            bank_height_m: 0.6,
            rows: 2,
            cols: 3,
            spacing_h_m: 0.3,
            spacing_v_m: 0.3,
            duct_id_mm: 202.7,
            duct_od_mm: 219.1,
            duct_material: ConduitMaterial::Pvc,
            occupied: vec![DuctSlot { row: 0, col: 0 }],
            target: DuctSlot { row: 1, col: 1 },
        };
        assert!(matches!(
            bank.validate(),
            Err(RatingError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn load_factor_bounds_are_enforced() {
        let request = RatingRequest {
            study: None,
            cable: cable(),
            operating: OperatingConditions {
                voltage_v: 15_000.0,
                frequency_hz: 60.0,
                max_conductor_temp_c: None,
                load_factor: 1.2,
            },
            installation: Installation::DirectBuried {
                depth_m: 1.0,
                spacing_m: 0.0,
                soil_resistivity: 1.0,
                ambient_temp_c: 25.0,
            },
            target_current_a: None,
            margin_percent: 0.0,
        };
        assert!(matches!(
            request.validate(),
            Err(RatingError::InvalidOperating(_))
        ));
    }
}
