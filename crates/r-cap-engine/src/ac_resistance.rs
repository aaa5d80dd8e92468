//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Conductor AC resistance: DC resistance with temperature correction,
//! skin effect, proximity effect, and the CIGRE empirical fallback for
//! large Milliken conductors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{RatingError, Result};
use crate::materials;
use crate::model::{Conductor, Stranding};

/// Per-conductor resistance breakdown at the evaluation temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcResistance {
    /// DC resistance at the evaluation temperature (ohm/m).
    pub rdc_ohm_per_m: f64,
    /// Skin-effect factor ys.
    pub ys: f64,
    /// Proximity-effect factor yp.
    pub yp: f64,
    /// AC resistance Rdc * (1 + ys + yp) (ohm/m).
    pub rac_ohm_per_m: f64,
    /// Whether the CIGRE large-Milliken table supplied ys.
    pub cigre_table_applied: bool,
}

/// DC resistance at `temperature_c` (ohm/m).
///
/// Uses the manufacturer R20 when the request carries one, otherwise the
/// material resistivity over the nominal cross-section.
pub fn dc_resistance(conductor: &Conductor, temperature_c: f64) -> Result<f64> {
    if conductor.cross_section_mm2 <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "conductor cross-section must be positive".into(),
        ));
    }
    let r20 = match conductor.dc_resistance_20c {
        Some(r20) => r20,
        None => {
            let resistivity = materials::conductor_resistivity(conductor.material);
            resistivity / (conductor.cross_section_mm2 * 1e-6)
        }
    };
    let alpha = materials::conductor_temp_coefficient(conductor.material);
    Ok(r20 * (1.0 + alpha * (temperature_c - 20.0)))
}

/// IEC 60287-1-1 skin/proximity transfer function, branched on the squared
/// argument. The quadratic branch goes slightly negative just past the
/// knee, hence the clamp.
fn iec_factor(x_squared: f64) -> f64 {
    if x_squared <= 2.8 {
        let x4 = x_squared * x_squared;
        x4 / (192.0 + 0.8 * x4)
    } else {
        let x = x_squared.sqrt();
        (-0.136 - 0.0177 * x + 0.0563 * x_squared).max(0.0)
    }
}

/// Skin-effect factor ys.
///
/// Precedence: a user-supplied ks always feeds the IEC formula; only when
/// the request leaves ks unset does a segmental conductor at or above the
/// CIGRE threshold take the tabulated Ycs, because the IEC series is
/// invalid for large Milliken constructions.
pub fn skin_effect(conductor: &Conductor, rdc: f64, frequency_hz: f64) -> Result<(f64, bool)> {
    let large_milliken = conductor.stranding == Stranding::Segmental
        && conductor.cross_section_mm2 >= materials::CIGRE_MIN_AREA_MM2;
    if large_milliken && conductor.ks.is_none() {
        let ycs = materials::cigre_ycs(conductor.cross_section_mm2, frequency_hz).ok_or_else(
            || {
                RatingError::InvalidOperating(format!(
                    "segmental conductor of {} mm2 needs a 50 or 60 Hz supply for the tabulated \
                     skin effect, got {} Hz",
                    conductor.cross_section_mm2, frequency_hz
                ))
            },
        )?;
        debug!(
            cross_section = conductor.cross_section_mm2,
            ycs, "skin effect from CIGRE Milliken table"
        );
        return Ok((ycs, true));
    }

    let ks = conductor.skin_coefficient();
    let xs_squared = (8.0 * std::f64::consts::PI * frequency_hz / rdc) * 1e-7 * ks;
    Ok((iec_factor(xs_squared), false))
}

/// Proximity-effect factor yp for a trefoil/equally-spaced arrangement.
/// Zero spacing means a solitary cable with no neighbouring field.
pub fn proximity_effect(conductor: &Conductor, rdc: f64, spacing_mm: f64, frequency_hz: f64) -> f64 {
    if spacing_mm <= 0.0 {
        return 0.0;
    }
    let kp = conductor.proximity_coefficient();
    let xp_squared = (8.0 * std::f64::consts::PI * frequency_hz / rdc) * 1e-7 * kp;
    let f_xp = iec_factor(xp_squared);
    let ratio = conductor.diameter_mm / spacing_mm;
    let ratio2 = ratio * ratio;
    f_xp * ratio2 * (0.312 * ratio2 + 1.18 / (f_xp + 0.27))
}

/// Full AC-resistance evaluation at `temperature_c`.
pub fn ac_resistance(
    conductor: &Conductor,
    temperature_c: f64,
    spacing_mm: f64,
    frequency_hz: f64,
) -> Result<AcResistance> {
    let rdc = dc_resistance(conductor, temperature_c)?;
    let (ys, cigre_table_applied) = skin_effect(conductor, rdc, frequency_hz)?;
    let yp = proximity_effect(conductor, rdc, spacing_mm, frequency_hz);
    Ok(AcResistance {
        rdc_ohm_per_m: rdc,
        ys,
        yp,
        rac_ohm_per_m: rdc * (1.0 + ys + yp),
        cigre_table_applied,
    })
}
