//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Conductor size suggestion: a sweep over the standard size ladder for
//! the smallest conductor whose steady-state ampacity meets a target.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{RatingError, Result};
use crate::model::{
    CableDesign, Conductor, ConductorMaterial, Installation, Insulation, InsulationMaterial,
    Jacket, JacketMaterial, OperatingConditions, RatingRequest, Stranding,
};
use crate::solver::{self, SolveCondition};

/// Standard conductor sizes (mm2) and their nominal stranded diameters.
const STANDARD_SIZES: [(f64, f64); 19] = [
    (25.0, 5.64),
    (35.0, 6.68),
    (50.0, 7.98),
    (70.0, 9.44),
    (95.0, 11.0),
    (120.0, 12.4),
    (150.0, 13.8),
    (185.0, 15.3),
    (240.0, 17.5),
    (300.0, 19.5),
    (400.0, 22.6),
    (500.0, 25.2),
    (630.0, 28.3),
    (800.0, 31.9),
    (1000.0, 35.7),
    (1200.0, 39.1),
    (1400.0, 42.2),
    (1600.0, 45.1),
    (2000.0, 50.5),
];

const MM2_PER_KCMIL: f64 = 0.5067;

/// What the caller wants the suggested cable to carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingRequest {
    pub target_current_a: f64,
    pub conductor_material: ConductorMaterial,
    pub insulation_material: InsulationMaterial,
    /// Phase-to-ground voltage (V); also sets the insulation wall.
    pub voltage_v: f64,
    pub frequency_hz: f64,
    pub installation: Installation,
    /// Required margin over the target, in percent.
    #[serde(default)]
    pub margin_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingSuggestion {
    pub cross_section_mm2: f64,
    pub cross_section_kcmil: f64,
    pub expected_ampacity_a: f64,
    pub margin_percent: f64,
}

/// Typical insulation wall per voltage class (mm).
pub fn insulation_wall_mm(voltage_v: f64, material: InsulationMaterial) -> f64 {
    let xlpe = matches!(material, InsulationMaterial::Xlpe);
    let kv = voltage_v / 1000.0;
    if kv <= 15.0 {
        if xlpe { 4.5 } else { 5.5 }
    } else if kv <= 25.0 {
        if xlpe { 5.5 } else { 6.5 }
    } else if kv <= 35.0 {
        if xlpe { 8.0 } else { 9.0 }
    } else if kv <= 69.0 {
        if xlpe { 12.0 } else { 14.0 }
    } else if kv <= 115.0 {
        if xlpe { 16.0 } else { 18.0 }
    } else if kv <= 138.0 {
        if xlpe { 18.0 } else { 20.0 }
    } else if xlpe {
        24.0
    } else {
        26.0
    }
}

/// Walk the size ladder and return the smallest conductor that meets the
/// target plus margin. Sizes that fail to solve (for instance a cable
/// grown past its conduit bore) are skipped rather than fatal.
pub fn suggest_conductor_size(request: &SizingRequest) -> Result<SizingSuggestion> {
    if request.target_current_a <= 0.0 {
        return Err(RatingError::InvalidOperating(
            "target current must be positive".into(),
        ));
    }
    let wall = insulation_wall_mm(request.voltage_v, request.insulation_material);
    let required = request.target_current_a * (1.0 + request.margin_percent / 100.0);

    for (size_mm2, diameter_mm) in STANDARD_SIZES {
        let candidate = RatingRequest {
            study: None,
            cable: CableDesign {
                conductor: Conductor {
                    material: request.conductor_material,
                    cross_section_mm2: size_mm2,
                    diameter_mm,
                    stranding: Stranding::StrandedCompact,
                    dc_resistance_20c: None,
                    ks: None,
                    kp: None,
                },
                insulation: Insulation {
                    material: request.insulation_material,
                    thickness_mm: wall,
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
            },
            operating: OperatingConditions {
                voltage_v: request.voltage_v,
                frequency_hz: request.frequency_hz,
                max_conductor_temp_c: None,
                load_factor: 1.0,
            },
            installation: request.installation.clone(),
            target_current_a: None,
            margin_percent: 0.0,
        };

        let result = match solver::rate(&candidate) {
            Ok(result) => result,
            Err(_) => continue,
        };
        if !matches!(result.condition, SolveCondition::Converged { .. }) {
            continue;
        }
        if result.ampacity_a >= required {
            let margin =
                (result.ampacity_a - request.target_current_a) / request.target_current_a * 100.0;
            info!(
                size_mm2,
                ampacity = result.ampacity_a,
                "size sweep satisfied the target"
            );
            return Ok(SizingSuggestion {
                cross_section_mm2: size_mm2,
                cross_section_kcmil: size_mm2 / MM2_PER_KCMIL,
                expected_ampacity_a: result.ampacity_a,
                margin_percent: margin,
            });
        }
    }

    Err(RatingError::InvalidOperating(format!(
        "no standard conductor size reaches {:.0} A in this installation",
        request.target_current_a
    )))
}
