//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Thermal resistance network, K.m/W throughout.
//!
//! R1 and R2 are the layered cable resistances per IEC 60287-2-1, R3 the
//! conduit system (empirical air gap plus the wall), R4 the earth via the
//! Neher-McGrath logarithmic form, and the concrete envelope of a duct
//! bank enters as a Kennelly geometric-factor correction against the
//! native soil.

use serde::{Deserialize, Serialize};

use crate::errors::{RatingError, Result};
use crate::materials;
use crate::model::{CableDesign, ConduitMaterial};

/// Empirical air-gap constants for a cable in a duct (IEC 60287-2-1).
const GAP_U: f64 = 1.87;
const GAP_V: f64 = 0.29;
const GAP_Y: f64 = 0.026;

/// Past this value of u = 2L/De the shallow-burial logarithm is within
/// 0.1 percent of the exact form.
const DEEP_BURIAL_U: f64 = 10.0;

/// Thermal resistances assembled for one cable, in solve order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThermalResistances {
    pub r1_insulation: f64,
    pub r2_jacket: f64,
    pub r3_conduit: f64,
    pub r_concrete: f64,
    pub r4_earth: f64,
    /// Mutual-heating addition at the converged current distribution.
    pub r_mutual: f64,
}

impl ThermalResistances {
    /// Effective earth resistance seen by the conductor loss path.
    pub fn r4_effective(&self) -> f64 {
        self.r4_earth + self.r_mutual
    }

    /// Composite resistance for the conductor loss term.
    pub fn total(&self) -> f64 {
        self.r1_insulation + self.r2_jacket + self.r3_conduit + self.r_concrete + self.r4_effective()
    }

    /// Composite for the dielectric loss term, which enters the insulation
    /// at its thermal midpoint.
    pub fn dielectric_total(&self) -> f64 {
        0.5 * self.r1_insulation
            + self.r2_jacket
            + self.r3_conduit
            + self.r_concrete
            + self.r4_effective()
    }
}

/// R1, insulation including semi-conducting screens:
/// rho/(2 pi) * ln(1 + 2 t1 / dc).
pub fn insulation_resistance(cable: &CableDesign) -> Result<f64> {
    let dc = cable.conductor.diameter_mm;
    let t1 = cable.insulation.t1_mm();
    if dc <= 0.0 || t1 <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "insulation build needs positive conductor diameter and thickness".into(),
        ));
    }
    let rho = cable.insulation.thermal_resistivity();
    Ok(rho / (2.0 * std::f64::consts::PI) * (1.0 + 2.0 * t1 / dc).ln())
}

/// R2, jacket over the shield: rho/(2 pi) * ln(De/Ds). Zero for a
/// hypothetical jacketless build.
pub fn jacket_resistance(cable: &CableDesign) -> Result<f64> {
    if cable.jacket.thickness_mm == 0.0 {
        return Ok(0.0);
    }
    let ds = cable.diameter_over_shield();
    let de = cable.overall_diameter();
    if de <= ds || ds <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "jacket diameters are not strictly increasing".into(),
        ));
    }
    let rho = cable.jacket.thermal_resistivity();
    Ok(rho / (2.0 * std::f64::consts::PI) * (de / ds).ln())
}

/// Air gap between cable and conduit bore, IEC 60287-2-1 empirical form
/// with the cable surface term in metres against the bore regression in
/// millimetres. `mean_temp_c` is the estimated mean temperature of the
/// conduit interior.
pub fn conduit_air_gap_resistance(
    cable_od_mm: f64,
    conduit_id_mm: f64,
    mean_temp_c: f64,
) -> Result<f64> {
    if cable_od_mm <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "cable outer diameter must be positive".into(),
        ));
    }
    if conduit_id_mm <= cable_od_mm {
        return Err(RatingError::InvalidGeometry(format!(
            "cable of {cable_od_mm:.1} mm does not fit a {conduit_id_mm:.1} mm conduit bore"
        )));
    }
    let cable_od_m = cable_od_mm * 1e-3;
    let denom = std::f64::consts::PI
        * cable_od_m
        * (1.0 + 0.1 * (GAP_V + GAP_Y * mean_temp_c) * conduit_id_mm);
    Ok(GAP_U / denom)
}

/// Conduit wall: rho/(2 pi) * ln(OD/ID).
pub fn conduit_wall_resistance(
    conduit_id_mm: f64,
    conduit_od_mm: f64,
    material: ConduitMaterial,
) -> Result<f64> {
    if conduit_id_mm <= 0.0 || conduit_od_mm <= conduit_id_mm {
        return Err(RatingError::InvalidGeometry(
            "conduit wall diameters are not strictly increasing".into(),
        ));
    }
    let rho = materials::conduit_thermal_resistivity(material);
    Ok(rho / (2.0 * std::f64::consts::PI) * (conduit_od_mm / conduit_id_mm).ln())
}

/// Combined R3 for a cable pulled into a conduit or duct.
pub fn conduit_resistance(
    cable_od_mm: f64,
    conduit_id_mm: f64,
    conduit_od_mm: f64,
    material: ConduitMaterial,
    mean_temp_c: f64,
) -> Result<f64> {
    let gap = conduit_air_gap_resistance(cable_od_mm, conduit_id_mm, mean_temp_c)?;
    let wall = conduit_wall_resistance(conduit_id_mm, conduit_od_mm, material)?;
    Ok(gap + wall)
}

/// R4, earth resistance of an isothermal cylinder buried with its centre
/// at `depth_m`, referenced to the outer diameter `od_mm` of whatever
/// actually touches the soil (cable, conduit, or duct).
///
/// Exact form rho/(2 pi) * ln(u + sqrt(u^2 - 1)) with u = 2L/De; for
/// u > 10 the shallow-burial approximation ln(4L/De) is used.
pub fn earth_resistance(soil_resistivity: f64, depth_m: f64, od_mm: f64) -> Result<f64> {
    if od_mm <= 0.0 || depth_m <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "earth path needs a positive depth and diameter".into(),
        ));
    }
    let de_m = od_mm * 1e-3;
    let u = 2.0 * depth_m / de_m;
    if u <= 1.0 {
        return Err(RatingError::InvalidGeometry(format!(
            "burial depth {depth_m:.2} m is shallower than the outer radius"
        )));
    }
    let factor = soil_resistivity / (2.0 * std::f64::consts::PI);
    if u > DEEP_BURIAL_U {
        Ok(factor * (4.0 * depth_m / de_m).ln())
    } else {
        Ok(factor * (u + (u * u - 1.0).sqrt()).ln())
    }
}

/// Kennelly geometric factor of a duct centred at perpendicular distances
/// (top, bottom, left, right) from the concrete boundary:
/// G = ln(geometric mean of the four doubled distances / duct radius).
pub fn kennelly_geometric_factor(
    dist_top_m: f64,
    dist_bottom_m: f64,
    dist_left_m: f64,
    dist_right_m: f64,
    duct_radius_m: f64,
) -> Result<f64> {
    let distances = [dist_top_m, dist_bottom_m, dist_left_m, dist_right_m];
    if distances.iter().any(|d| *d <= 0.0) {
        return Err(RatingError::InvalidGeometry(
            "duct centre must lie strictly inside the concrete envelope".into(),
        ));
    }
    if duct_radius_m <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "duct radius must be positive".into(),
        ));
    }
    let product: f64 = distances.iter().map(|d| 2.0 * d).product();
    let mean = product.powf(0.25);
    if mean <= duct_radius_m {
        return Err(RatingError::InvalidGeometry(
            "concrete envelope is too tight around the duct".into(),
        ));
    }
    Ok((mean / duct_radius_m).ln())
}

/// Concrete-envelope correction for one duct of the bank, in the
/// native-soil-subtraction convention of IEC 60287-2-1:
/// (rho_concrete - rho_soil) / (2 pi) * G, with R4 carried entirely at
/// rho_soil. Negative when the concrete conducts better than the soil.
pub fn concrete_correction(
    concrete_resistivity: f64,
    soil_resistivity: f64,
    geometric_factor: f64,
) -> f64 {
    (concrete_resistivity - soil_resistivity) / (2.0 * std::f64::consts::PI) * geometric_factor
}
