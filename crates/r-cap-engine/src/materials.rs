//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Material constants and standards tables.
//!
//! Everything in this module is immutable data: conductor and shield metal
//! properties, insulation dielectric and thermal properties, jacket and
//! conduit thermal resistivities, the per-stranding ks/kp defaults of
//! IEC 60287-1-1 Table 2, and the CIGRE empirical Ycs anchors for large
//! Milliken conductors.

use crate::model::{
    Bonding, ConductorMaterial, ConduitMaterial, InsulationMaterial, JacketMaterial,
    ShieldMaterial, Stranding,
};

/// Vacuum permittivity (F/m).
pub const EPSILON_0: f64 = 8.854e-12;

/// Electrical resistivity at 20 degC (ohm.m).
pub fn conductor_resistivity(material: ConductorMaterial) -> f64 {
    match material {
        ConductorMaterial::Copper => 1.7241e-8,
        ConductorMaterial::Aluminum => 2.8264e-8,
    }
}

/// Resistance temperature coefficient at 20 degC (per degC).
pub fn conductor_temp_coefficient(material: ConductorMaterial) -> f64 {
    match material {
        ConductorMaterial::Copper => 0.00393,
        ConductorMaterial::Aluminum => 0.00403,
    }
}

pub fn shield_resistivity(material: ShieldMaterial) -> f64 {
    match material {
        ShieldMaterial::Copper => 1.7241e-8,
        ShieldMaterial::Aluminum => 2.8264e-8,
        ShieldMaterial::Lead => 21.4e-8,
    }
}

pub fn shield_temp_coefficient(material: ShieldMaterial) -> f64 {
    match material {
        ShieldMaterial::Copper => 0.00393,
        ShieldMaterial::Aluminum => 0.00403,
        ShieldMaterial::Lead => 0.00400,
    }
}

/// Default skin/proximity coefficients per conductor construction
/// (IEC 60287-1-1 Table 2, extruded insulation).
pub fn stranding_coefficients(stranding: Stranding) -> (f64, f64) {
    match stranding {
        Stranding::Solid => (1.0, 1.0),
        Stranding::StrandedRound => (1.0, 0.8),
        Stranding::StrandedCompact => (0.8, 0.8),
        Stranding::Segmental => (0.435, 0.37),
    }
}

/// Relative permittivity of the insulation system.
pub fn insulation_permittivity(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe => 2.5,
        InsulationMaterial::Epr => 3.0,
        InsulationMaterial::PaperOil => 3.5,
    }
}

/// Dielectric loss factor tan(delta).
pub fn insulation_tan_delta(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe => 0.004,
        InsulationMaterial::Epr => 0.020,
        InsulationMaterial::PaperOil => 0.0035,
    }
}

/// Thermal resistivity of the insulation (K.m/W).
pub fn insulation_thermal_resistivity(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe | InsulationMaterial::Epr => 3.5,
        InsulationMaterial::PaperOil => 6.0,
    }
}

/// Rated continuous conductor temperature (degC).
pub fn rated_conductor_temp(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe | InsulationMaterial::Epr => 90.0,
        InsulationMaterial::PaperOil => 85.0,
    }
}

/// Emergency-overload conductor limit (degC). Reported only; the solver
/// always rates against the continuous limit.
pub fn emergency_conductor_temp(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe => 105.0,
        InsulationMaterial::Epr => 130.0,
        InsulationMaterial::PaperOil => 100.0,
    }
}

/// Short-circuit conductor limit (degC). Reported only.
pub fn short_circuit_conductor_temp(material: InsulationMaterial) -> f64 {
    match material {
        InsulationMaterial::Xlpe | InsulationMaterial::Epr => 250.0,
        InsulationMaterial::PaperOil => 160.0,
    }
}

/// Thermal resistivity of the jacket (K.m/W).
pub fn jacket_thermal_resistivity(material: JacketMaterial) -> f64 {
    match material {
        JacketMaterial::Pvc => 5.0,
        JacketMaterial::Pe | JacketMaterial::Hdpe => 3.5,
    }
}

/// Thermal resistivity of the conduit wall (K.m/W).
///
/// Steel is not meaningfully resistive; the 1.0 placeholder keeps the wall
/// term finite without pretending the metal insulates.
pub fn conduit_thermal_resistivity(material: ConduitMaterial) -> f64 {
    match material {
        ConduitMaterial::Pvc => 6.0,
        ConduitMaterial::Fiberglass => 4.0,
        ConduitMaterial::Steel => 1.0,
    }
}

/// CIGRE empirical Ycs anchors for segmental (Milliken) conductors,
/// cross-section in mm2 against skin-effect factor, per supply frequency.
/// The IEC series is invalid in this regime; these anchors are linearly
/// interpolated and clamped at the ends.
const CIGRE_YCS_AREAS: [f64; 9] = [
    800.0, 1000.0, 1200.0, 1400.0, 1600.0, 1800.0, 2000.0, 2500.0, 3000.0,
];

const CIGRE_YCS_50HZ: [f64; 9] = [
    0.015, 0.019, 0.023, 0.027, 0.031, 0.035, 0.039, 0.048, 0.057,
];

const CIGRE_YCS_60HZ: [f64; 9] = [
    0.018, 0.023, 0.028, 0.032, 0.037, 0.042, 0.047, 0.058, 0.069,
];

/// Smallest cross-section covered by the CIGRE Ycs table (mm2).
pub const CIGRE_MIN_AREA_MM2: f64 = CIGRE_YCS_AREAS[0];

/// Look up the CIGRE Ycs value for a segmental conductor.
///
/// Returns `None` when the supply frequency has no tabulated column; the
/// caller decides whether that is an operating error (it is, once the
/// fallback is actually needed).
pub fn cigre_ycs(cross_section_mm2: f64, frequency_hz: f64) -> Option<f64> {
    let column = if (frequency_hz - 50.0).abs() < 1e-6 {
        &CIGRE_YCS_50HZ
    } else if (frequency_hz - 60.0).abs() < 1e-6 {
        &CIGRE_YCS_60HZ
    } else {
        return None;
    };

    let a = cross_section_mm2;
    if a <= CIGRE_YCS_AREAS[0] {
        return Some(column[0]);
    }
    if a >= CIGRE_YCS_AREAS[CIGRE_YCS_AREAS.len() - 1] {
        return Some(column[column.len() - 1]);
    }
    for i in 0..CIGRE_YCS_AREAS.len() - 1 {
        let (a0, a1) = (CIGRE_YCS_AREAS[i], CIGRE_YCS_AREAS[i + 1]);
        if a >= a0 && a <= a1 {
            let t = (a - a0) / (a1 - a0);
            return Some(column[i] + t * (column[i + 1] - column[i]));
        }
    }
    None
}

/// Spacing fallback used for the shield reactance when no axial spacing is
/// declared: twice the shield mean diameter.
pub fn default_shield_spacing_mm(mean_diameter_mm: f64) -> f64 {
    2.0 * mean_diameter_mm
}

/// Whether the bonding scheme lets circulating currents flow.
pub fn bonding_carries_circulating_current(bonding: Bonding) -> bool {
    matches!(bonding, Bonding::BothEnds)
}
