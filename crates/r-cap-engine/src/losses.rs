//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Per-unit-length losses: dielectric loss in the insulation, shield
//! circulating/eddy losses expressed as the loss factor lambda1, and the
//! I2R conductor loss reported at the solved ampacity.

use serde::{Deserialize, Serialize};

use crate::errors::{RatingError, Result};
use crate::materials;
use crate::model::{Bonding, CableDesign, Shield};

/// Shield loss factor split into its circulating and eddy components.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShieldLossFactor {
    pub circulating: f64,
    pub eddy: f64,
    pub total: f64,
}

/// Capacitance of the insulation cylinder (F/m).
///
/// The logarithm runs over the insulation proper; the semi-conducting
/// screens are thermally part of t1 but electrically part of the
/// conductor/shield system.
pub fn capacitance(cable: &CableDesign) -> Result<f64> {
    let dc = cable.conductor.diameter_mm;
    let di = dc + 2.0 * cable.insulation.thickness_mm;
    if di <= dc {
        return Err(RatingError::InvalidGeometry(
            "insulation outer diameter must exceed the conductor diameter".into(),
        ));
    }
    let epsilon_r = cable.insulation.permittivity();
    Ok(2.0 * std::f64::consts::PI * materials::EPSILON_0 * epsilon_r / (di / dc).ln())
}

/// Dielectric loss Wd = 2 pi f C U0^2 tan(delta) (W/m).
pub fn dielectric_loss(cable: &CableDesign, voltage_v: f64, frequency_hz: f64) -> Result<f64> {
    let c = capacitance(cable)?;
    let omega = 2.0 * std::f64::consts::PI * frequency_hz;
    Ok(omega * c * voltage_v * voltage_v * cable.insulation.tan_delta())
}

/// Shield resistance at `temperature_c` (ohm/m), from the manufacturer
/// figure when present, else the thin annulus pi * ds * ts.
pub fn shield_resistance(shield: &Shield, temperature_c: f64) -> Result<f64> {
    if shield.mean_diameter_mm <= 0.0 || shield.thickness_mm <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "shield mean diameter and thickness must be positive".into(),
        ));
    }
    let r20 = match shield.resistance_20c {
        Some(r20) => r20,
        None => {
            let area =
                std::f64::consts::PI * (shield.mean_diameter_mm * 1e-3) * (shield.thickness_mm * 1e-3);
            materials::shield_resistivity(shield.material) / area
        }
    };
    let alpha = materials::shield_temp_coefficient(shield.material);
    Ok(r20 * (1.0 + alpha * (temperature_c - 20.0)))
}

/// Shield loss factor lambda1 per IEC 60287-1-1.
///
/// Single-point bonding leaves only eddy losses. Both-ends bonding adds the
/// circulating component. Ideal cross-bonding cancels the circulating
/// currents outright, so it reduces to the eddy term as well.
pub fn shield_loss_factor(
    shield: &Shield,
    conductor_rac: f64,
    spacing_mm: f64,
    frequency_hz: f64,
    temperature_c: f64,
) -> Result<ShieldLossFactor> {
    let ds = shield.mean_diameter_mm;
    let ts = shield.thickness_mm;
    let s = if spacing_mm > 0.0 {
        spacing_mm
    } else {
        materials::default_shield_spacing_mm(ds)
    };

    // Small even for heavy sheaths; the dominant term is the circulating
    // current when the bonding lets it flow.
    let eddy = 0.01 * (ts / ds).powi(2) * (ds / s).powi(2);

    let circulating = if materials::bonding_carries_circulating_current(shield.bonding) {
        let rs = shield_resistance(shield, temperature_c)?;
        let xs = 2.0 * std::f64::consts::PI * frequency_hz * 2e-7 * (2.0 * s / ds).ln();
        if xs > 0.0 {
            let ratio = rs / xs;
            (rs / conductor_rac) / (1.0 + ratio * ratio)
        } else {
            0.0
        }
    } else {
        0.0
    };

    Ok(ShieldLossFactor {
        circulating,
        eddy,
        total: circulating + eddy,
    })
}

/// Loss factor for the cable as built, zero when it carries no shield.
pub fn cable_loss_factor(
    cable: &CableDesign,
    conductor_rac: f64,
    spacing_mm: f64,
    frequency_hz: f64,
    temperature_c: f64,
) -> Result<ShieldLossFactor> {
    match &cable.shield {
        Some(shield) => {
            shield_loss_factor(shield, conductor_rac, spacing_mm, frequency_hz, temperature_c)
        }
        None => Ok(ShieldLossFactor::default()),
    }
}

/// Conductor joule loss at `current_a` (W/m).
pub fn conductor_loss(current_a: f64, rac_ohm_per_m: f64) -> f64 {
    current_a * current_a * rac_ohm_per_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Conductor, ConductorMaterial, Insulation, InsulationMaterial, Jacket, JacketMaterial,
        ShieldMaterial, ShieldType, Stranding,
    };

    fn cable_1000(bonding: Bonding) -> CableDesign {
        CableDesign {
            conductor: Conductor {
                material: ConductorMaterial::Copper,
                cross_section_mm2: 1000.0,
                diameter_mm: 37.9,
                stranding: Stranding::StrandedRound,
                dc_resistance_20c: None,
                ks: None,
                kp: None,
            },
            insulation: Insulation {
                material: InsulationMaterial::Xlpe,
                thickness_mm: 17.0,
                conductor_screen_mm: 0.0,
                insulation_screen_mm: 0.0,
                tan_delta: None,
                permittivity: None,
                thermal_resistivity: None,
            },
            shield: Some(Shield {
                material: ShieldMaterial::Lead,
                kind: ShieldType::Extruded,
                thickness_mm: 0.2,
                mean_diameter_mm: 37.9 + 2.0 * 17.0 + 0.2,
                resistance_20c: None,
                bonding,
            }),
            jacket: Jacket {
                material: JacketMaterial::Pe,
                thickness_mm: 4.0,
                thermal_resistivity: None,
            },
        }
    }

    #[test]
    fn dielectric_loss_scales_with_voltage_squared() {
        let cable = cable_1000(Bonding::SinglePoint);
        let wd1 = dielectric_loss(&cable, 76_000.0, 60.0).unwrap();
        let wd2 = dielectric_loss(&cable, 152_000.0, 60.0).unwrap();
        assert!((wd2 / wd1 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_bonding_leaves_only_eddy_losses() {
        let cable = cable_1000(Bonding::SinglePoint);
        let lambda = cable_loss_factor(&cable, 2.6e-5, 300.0, 60.0, 90.0).unwrap();
        assert_eq!(lambda.circulating, 0.0);
        assert!(lambda.total < 0.01);
    }

    #[test]
    fn both_ends_bonding_adds_circulating_losses() {
        let cable = cable_1000(Bonding::BothEnds);
        let rac = 2.6e-5;
        let lambda = cable_loss_factor(&cable, rac, 300.0, 60.0, 90.0).unwrap();
        assert!(lambda.circulating > 0.0);
        let single = cable_loss_factor(
            &cable_1000(Bonding::SinglePoint),
            rac,
            300.0,
            60.0,
            90.0,
        )
        .unwrap();
        assert!(lambda.total > single.total);
    }

    #[test]
    fn cross_bonding_cancels_circulating_losses() {
        let crossed = cable_loss_factor(&cable_1000(Bonding::CrossBonded), 2.6e-5, 300.0, 60.0, 90.0)
            .unwrap();
        let single = cable_loss_factor(&cable_1000(Bonding::SinglePoint), 2.6e-5, 300.0, 60.0, 90.0)
            .unwrap();
        assert_eq!(crossed.circulating, 0.0);
        assert!((crossed.total - single.total).abs() < 1e-12);
    }

    #[test]
    fn shieldless_cable_has_zero_loss_factor() {
        let mut cable = cable_1000(Bonding::SinglePoint);
        cable.shield = None;
        let lambda = cable_loss_factor(&cable, 2.6e-5, 300.0, 60.0, 90.0).unwrap();
        assert_eq!(lambda.total, 0.0);
    }
}
