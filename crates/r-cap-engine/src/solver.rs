//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Ampacity solver.
//!
//! Closes the loop on the IEC 60287-1-1 rating equation
//! dT = I^2 Rac (1 + lambda1) SigmaR + Wd SigmaR', inverting for I with
//! every temperature-dependent quantity evaluated at the conductor limit.
//! Multi-cable installations run the current-weighted mutual-heating
//! fixed point as an explicit bounded loop; divergence and a dielectric
//! loss that alone exhausts the thermal budget both come back as flagged,
//! fully populated results rather than bare errors.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ac_resistance::{self, AcResistance};
use crate::errors::{RatingError, Result};
use crate::losses;
use crate::model::{CablePosition, Installation, RatingRequest};
use crate::mutual;
use crate::thermal::{self, ThermalResistances};

/// Iteration cap of the mutual-heating fixed point.
const MAX_MUTUAL_ITERATIONS: usize = 20;

/// Convergence predicate: largest relative current shift below 1 percent.
const MUTUAL_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignStatus {
    Pass,
    Fail,
}

/// How the solve ended. Anything but `Converged` marks a degraded result
/// kept around for diagnostic rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolveCondition {
    Converged { iterations: usize },
    DielectricLimited,
    NotConverged { iterations: usize, last_shift: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub conductor_w_per_m: f64,
    pub dielectric_w_per_m: f64,
    pub shield_w_per_m: f64,
    pub total_w_per_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TemperatureRise {
    pub from_conductor_c: f64,
    pub from_dielectric_c: f64,
    pub total_c: f64,
}

/// Steady-state and cyclic rating of one heated cable of the layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CableRating {
    pub position: CablePosition,
    pub ampacity_a: f64,
    pub ampacity_cyclic_a: f64,
}

/// Full rating of the target cable, mirroring the request by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingResult {
    pub ampacity_a: f64,
    pub ampacity_cyclic_a: f64,
    pub max_conductor_temp_c: f64,
    /// Tabulated emergency-overload limit, reported for reference only.
    pub emergency_temp_c: f64,
    /// Tabulated short-circuit limit, reported for reference only.
    pub short_circuit_temp_c: f64,
    pub ambient_temp_c: f64,
    pub delta_t_available_c: f64,
    pub ac_resistance: AcResistance,
    pub losses: LossBreakdown,
    pub shield_loss_factor: f64,
    pub thermal: ThermalSummary,
    pub temperature_rise: TemperatureRise,
    pub condition: SolveCondition,
    pub design_status: DesignStatus,
    /// Every heated cable of the layout, the rated one included.
    pub cables: Vec<CableRating>,
    pub target_index: usize,
}

/// Serialized view of the thermal network at the target cable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalSummary {
    pub r1_insulation: f64,
    pub r2_jacket: f64,
    pub r3_conduit: f64,
    pub r_concrete: f64,
    pub r4_earth: f64,
    pub r_mutual: f64,
    pub r4_effective: f64,
    pub total: f64,
}

impl From<ThermalResistances> for ThermalSummary {
    fn from(r: ThermalResistances) -> Self {
        ThermalSummary {
            r1_insulation: r.r1_insulation,
            r2_jacket: r.r2_jacket,
            r3_conduit: r.r3_conduit,
            r_concrete: r.r_concrete,
            r4_earth: r.r4_earth,
            r_mutual: r.r_mutual,
            r4_effective: r.r4_effective(),
            total: r.total(),
        }
    }
}

/// Invert the rating equation for the current. Fails with
/// `ThermalInfeasible` when the dielectric loss already spends the
/// available temperature rise.
fn solve_current(
    delta_t: f64,
    wd: f64,
    rac: f64,
    lambda_total: f64,
    resistances: &ThermalResistances,
) -> Result<f64> {
    let numerator = delta_t - wd * resistances.dielectric_total();
    if numerator <= 0.0 {
        return Err(RatingError::ThermalInfeasible {
            dielectric_rise_c: wd * resistances.dielectric_total(),
            budget_c: delta_t,
        });
    }
    let denominator = rac * (1.0 + lambda_total) * resistances.total();
    if denominator <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "thermal network collapsed to a non-positive resistance".into(),
        ));
    }
    Ok((numerator / denominator).sqrt())
}

/// Rate the target cable of `request`.
pub fn rate(request: &RatingRequest) -> Result<RatingResult> {
    request.validate()?;

    let cable = &request.cable;
    let operating = &request.operating;
    let installation = &request.installation;

    let tmax = operating.max_conductor_temp(cable.insulation.material);
    let tamb = installation.ambient_temp_c();
    let delta_t = tmax - tamb;

    info!(
        study = request.study.as_deref().unwrap_or("unnamed"),
        tmax, tamb, "running ampacity solve"
    );

    let layout = mutual::layout(installation)?;
    let spacing_mm = layout.nearest_spacing_mm();

    // Electrical quantities at the conductor limit (IEC boundary-condition
    // simplification).
    let acr = ac_resistance::ac_resistance(
        &cable.conductor,
        tmax,
        spacing_mm,
        operating.frequency_hz,
    )?;
    let wd = losses::dielectric_loss(cable, operating.voltage_v, operating.frequency_hz)?;
    let lambda = losses::cable_loss_factor(
        cable,
        acr.rac_ohm_per_m,
        spacing_mm,
        operating.frequency_hz,
        tmax,
    )?;

    // Layered resistances common to every cable of the layout.
    let r1 = thermal::insulation_resistance(cable)?;
    let r2 = thermal::jacket_resistance(cable)?;
    let r3 = conduit_term(cable, installation, tmax, tamb)?;

    let soil = installation.soil_resistivity();
    let earth_od_mm = earth_reference_od(cable, installation);

    // Static per-cable network: everything except the mutual term.
    let mut base: Vec<ThermalResistances> = Vec::with_capacity(layout.len());
    for position in &layout.positions {
        let r4 = thermal::earth_resistance(soil, position.y_m, earth_od_mm)?;
        let r_concrete = concrete_term(installation, *position)?;
        base.push(ThermalResistances {
            r1_insulation: r1,
            r2_jacket: r2,
            r3_conduit: r3,
            r_concrete,
            r4_earth: r4,
            r_mutual: 0.0,
        });
    }

    let mut currents = Vec::new();
    let solve_outcome = iterate_currents(
        delta_t,
        wd,
        acr.rac_ohm_per_m,
        lambda.total,
        &layout,
        &mut base,
        &mut currents,
        soil,
    );

    let condition = match solve_outcome {
        Ok(iterations) => SolveCondition::Converged { iterations },
        Err(RatingError::ThermalInfeasible {
            dielectric_rise_c,
            budget_c,
        }) => {
            warn!(
                dielectric_rise_c,
                budget_c, "dielectric losses exhaust the thermal budget"
            );
            currents = vec![0.0; layout.len()];
            SolveCondition::DielectricLimited
        }
        Err(RatingError::IterationDivergence {
            iterations,
            last_shift,
        }) => {
            warn!(
                iterations,
                last_shift, "mutual-heating loop did not converge; flagging the last estimate"
            );
            SolveCondition::NotConverged {
                iterations,
                last_shift,
            }
        }
        Err(other) => return Err(other),
    };

    Ok(assemble(
        request, &layout, &base, &currents, acr, wd, lambda.total, tmax, tamb, condition,
    ))
}

/// The bounded current-weighted fixed point: initialize each cable as if
/// alone, weight neighbours by relative heat output, re-solve, and stop
/// on the 1 percent predicate or the iteration cap. The cap makes
/// termination unconditional; hitting it surfaces as
/// `IterationDivergence`, with `currents` holding the last estimate so
/// the caller can still assemble a flagged result.
///
/// Returns the number of iterations taken on convergence.
#[allow(clippy::too_many_arguments)]
fn iterate_currents(
    delta_t: f64,
    wd: f64,
    rac: f64,
    lambda_total: f64,
    layout: &mutual::HeatSourceLayout,
    base: &mut [ThermalResistances],
    currents: &mut Vec<f64>,
    soil_resistivity: f64,
) -> Result<usize> {
    let n = layout.len();
    currents.clear();
    for r in base.iter() {
        currents.push(solve_current(delta_t, wd, rac, lambda_total, r)?);
    }
    if n == 1 {
        return Ok(0);
    }

    let coupling = mutual::coupling_matrix(&layout.positions, soil_resistivity)?;
    let mut last_shift = f64::INFINITY;

    for iteration in 1..=MAX_MUTUAL_ITERATIONS {
        let heat: Vec<f64> = currents
            .iter()
            .map(|i| i * i * rac * (1.0 + lambda_total) + wd)
            .collect();
        let mean_heat = heat.iter().sum::<f64>() / n as f64;
        if mean_heat <= 0.0 {
            return Err(RatingError::InvalidOperating(
                "no cable in the layout dissipates any heat".into(),
            ));
        }
        let weights = DVector::from_iterator(n, heat.iter().map(|q| q / mean_heat));
        let r_mutual = mutual::weighted_mutual(&coupling, &weights);

        let mut next = Vec::with_capacity(n);
        for (i, r) in base.iter_mut().enumerate() {
            r.r_mutual = r_mutual[i];
            next.push(solve_current(delta_t, wd, rac, lambda_total, r)?);
        }

        last_shift = currents
            .iter()
            .zip(&next)
            .map(|(old, new)| {
                if *old > 0.0 {
                    ((new - old) / old).abs()
                } else {
                    1.0
                }
            })
            .fold(0.0, f64::max);
        *currents = next;

        debug!(iteration, last_shift, "mutual-heating sweep");
        if last_shift < MUTUAL_TOLERANCE {
            return Ok(iteration);
        }
    }

    Err(RatingError::IterationDivergence {
        iterations: MAX_MUTUAL_ITERATIONS,
        last_shift,
    })
}

/// R3 of the conduit system, zero for direct burial. The interior mean
/// temperature is estimated as the midpoint of the conductor limit and
/// ambient.
fn conduit_term(
    cable: &crate::model::CableDesign,
    installation: &Installation,
    tmax: f64,
    tamb: f64,
) -> Result<f64> {
    let mean_temp = 0.5 * (tmax + tamb);
    match installation {
        Installation::DirectBuried { .. } => Ok(0.0),
        Installation::Conduit {
            conduit_id_mm,
            conduit_od_mm,
            conduit_material,
            ..
        } => thermal::conduit_resistance(
            cable.overall_diameter(),
            *conduit_id_mm,
            *conduit_od_mm,
            *conduit_material,
            mean_temp,
        ),
        Installation::DuctBank {
            duct_id_mm,
            duct_od_mm,
            duct_material,
            ..
        } => thermal::conduit_resistance(
            cable.overall_diameter(),
            *duct_id_mm,
            *duct_od_mm,
            *duct_material,
            mean_temp,
        ),
    }
}

/// Outer diameter of the surface in contact with the soil.
fn earth_reference_od(cable: &crate::model::CableDesign, installation: &Installation) -> f64 {
    match installation {
        Installation::DirectBuried { .. } => cable.overall_diameter(),
        Installation::Conduit { conduit_od_mm, .. } => *conduit_od_mm,
        Installation::DuctBank { duct_od_mm, .. } => *duct_od_mm,
    }
}

/// Kennelly concrete correction of one duct position, zero outside a bank.
fn concrete_term(installation: &Installation, position: CablePosition) -> Result<f64> {
    match installation {
        Installation::DuctBank {
            depth_to_top_m,
            soil_resistivity,
            concrete_resistivity,
            bank_width_m,
            bank_height_m,
            duct_od_mm,
            ..
        } => {
            let (top, bottom, left, right) =
                mutual::envelope_distances(position, *depth_to_top_m, *bank_width_m, *bank_height_m);
            let g = thermal::kennelly_geometric_factor(
                top,
                bottom,
                left,
                right,
                duct_od_mm * 1e-3 / 2.0,
            )?;
            Ok(thermal::concrete_correction(
                *concrete_resistivity,
                *soil_resistivity,
                g,
            ))
        }
        _ => Ok(0.0),
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    request: &RatingRequest,
    layout: &mutual::HeatSourceLayout,
    resistances: &[ThermalResistances],
    currents: &[f64],
    acr: AcResistance,
    wd: f64,
    lambda_total: f64,
    tmax: f64,
    tamb: f64,
    condition: SolveCondition,
) -> RatingResult {
    let load_factor = request.operating.load_factor;
    let cyclic = |i: f64| i / load_factor.sqrt();

    let target = layout.target;
    let ampacity = currents[target];
    let target_r = resistances[target];

    let wc = losses::conductor_loss(ampacity, acr.rac_ohm_per_m);
    let ws = lambda_total * wc;
    let rise_conductor = wc * (1.0 + lambda_total) * target_r.total();
    let rise_dielectric = wd * target_r.dielectric_total();

    let design_status = match condition {
        SolveCondition::DielectricLimited | SolveCondition::NotConverged { .. } => {
            DesignStatus::Fail
        }
        SolveCondition::Converged { .. } => match request.target_current_a {
            Some(target_current) => {
                let required = target_current * (1.0 + request.margin_percent / 100.0);
                if ampacity >= required {
                    DesignStatus::Pass
                } else {
                    DesignStatus::Fail
                }
            }
            None => {
                if ampacity > 0.0 && tmax > tamb {
                    DesignStatus::Pass
                } else {
                    DesignStatus::Fail
                }
            }
        },
    };

    let cables = layout
        .positions
        .iter()
        .zip(currents)
        .map(|(position, current)| CableRating {
            position: *position,
            ampacity_a: *current,
            ampacity_cyclic_a: cyclic(*current),
        })
        .collect();

    info!(
        ampacity_a = ampacity,
        status = ?design_status,
        "ampacity solve finished"
    );

    let insulation = request.cable.insulation.material;
    RatingResult {
        ampacity_a: ampacity,
        ampacity_cyclic_a: cyclic(ampacity),
        max_conductor_temp_c: tmax,
        emergency_temp_c: crate::materials::emergency_conductor_temp(insulation),
        short_circuit_temp_c: crate::materials::short_circuit_conductor_temp(insulation),
        ambient_temp_c: tamb,
        delta_t_available_c: tmax - tamb,
        ac_resistance: acr,
        losses: LossBreakdown {
            conductor_w_per_m: wc,
            dielectric_w_per_m: wd,
            shield_w_per_m: ws,
            total_w_per_m: wc + wd + ws,
        },
        shield_loss_factor: lambda_total,
        thermal: target_r.into(),
        temperature_rise: TemperatureRise {
            from_conductor_c: rise_conductor,
            from_dielectric_c: rise_dielectric,
            total_c: rise_conductor + rise_dielectric,
        },
        condition,
        design_status,
        cables,
        target_index: target,
    }
}
