//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
//! Mutual heating between buried heat sources via the image method.
//!
//! The ground surface is an isotherm, so every heated cable is mirrored
//! above grade and the temperature raise it causes at a neighbour reduces
//! to the closed-form ln(d'/d) term. This module lays out the heated
//! positions for each installation variant and assembles the pairwise
//! coupling matrix the solver weights by the per-cable heat output.

use nalgebra::{DMatrix, DVector};

use crate::errors::{RatingError, Result};
use crate::model::{CablePosition, DuctSlot, Installation};

/// Geometric layout of every heated cable in the study, with the index of
/// the cable being rated.
#[derive(Debug, Clone)]
pub struct HeatSourceLayout {
    pub positions: Vec<CablePosition>,
    pub target: usize,
}

impl HeatSourceLayout {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn target_position(&self) -> CablePosition {
        self.positions[self.target]
    }

    /// Axial spacing to the nearest heated neighbour of the target cable,
    /// in millimetres, as consumed by the proximity and shield-reactance
    /// formulas. Zero for a solitary cable.
    pub fn nearest_spacing_mm(&self) -> f64 {
        let here = self.target_position();
        let nearest = self
            .positions
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.target)
            .map(|(_, p)| ((p.x_m - here.x_m).powi(2) + (p.y_m - here.y_m).powi(2)).sqrt())
            .fold(f64::INFINITY, f64::min);
        if nearest.is_finite() {
            nearest * 1000.0
        } else {
            0.0
        }
    }
}

/// Mutual-heating contribution of a source at `k` towards the cable at
/// `p`: rho/(2 pi) * ln(d'/d), with d' the distance to the mirror image.
pub fn image_factor(p: CablePosition, k: CablePosition, soil_resistivity: f64) -> Result<f64> {
    let dx = p.x_m - k.x_m;
    let dy = p.y_m - k.y_m;
    let d = (dx * dx + dy * dy).sqrt();
    if d <= 0.0 {
        return Err(RatingError::InvalidGeometry(
            "two heat sources occupy the same position".into(),
        ));
    }
    let dy_image = p.y_m + k.y_m;
    let d_image = (dx * dx + dy_image * dy_image).sqrt();
    Ok(soil_resistivity / (2.0 * std::f64::consts::PI) * (d_image / d).ln())
}

/// Pairwise coupling matrix F with a zero diagonal; `F[(i, j)]` is the
/// resistance the full heat of cable j adds to the earth path of cable i.
/// Symmetric by construction since both distances only depend on the pair.
pub fn coupling_matrix(
    positions: &[CablePosition],
    soil_resistivity: f64,
) -> Result<DMatrix<f64>> {
    let n = positions.len();
    let mut f = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let fij = image_factor(positions[i], positions[j], soil_resistivity)?;
            f[(i, j)] = fij;
            f[(j, i)] = fij;
        }
    }
    Ok(f)
}

/// Effective mutual resistance at each cable for a given weight vector:
/// R_mut = F * w, the weights being per-cable heat output normalized to
/// the fleet mean.
pub fn weighted_mutual(coupling: &DMatrix<f64>, weights: &DVector<f64>) -> DVector<f64> {
    coupling * weights
}

/// Heated positions for an installation.
///
/// * Direct buried with spacing: the rated cable is the centre of a
///   three-cable flat circuit, neighbours at +-s.
/// * Conduit row: `num_conduits` centres spaced `spacing_m` apart at the
///   shared depth, rating the middle conduit (the thermally worst slot).
/// * Duct bank: one cable per occupied duct; ducts sit on the declared
///   lattice, centred inside the concrete envelope, row 0 at the top.
pub fn layout(installation: &Installation) -> Result<HeatSourceLayout> {
    match installation {
        Installation::DirectBuried {
            depth_m, spacing_m, ..
        } => {
            if *spacing_m > 0.0 {
                Ok(HeatSourceLayout {
                    positions: vec![
                        CablePosition {
                            x_m: -spacing_m,
                            y_m: *depth_m,
                        },
                        CablePosition {
                            x_m: 0.0,
                            y_m: *depth_m,
                        },
                        CablePosition {
                            x_m: *spacing_m,
                            y_m: *depth_m,
                        },
                    ],
                    target: 1,
                })
            } else {
                Ok(HeatSourceLayout {
                    positions: vec![CablePosition {
                        x_m: 0.0,
                        y_m: *depth_m,
                    }],
                    target: 0,
                })
            }
        }
        Installation::Conduit {
            depth_m,
            spacing_m,
            num_conduits,
            ..
        } => {
            let n = *num_conduits;
            let positions = (0..n)
                .map(|i| CablePosition {
                    x_m: (i as f64 - (n as f64 - 1.0) / 2.0) * spacing_m,
                    y_m: *depth_m,
                })
                .collect();
            Ok(HeatSourceLayout {
                positions,
                target: n / 2,
            })
        }
        Installation::DuctBank {
            depth_to_top_m,
            bank_height_m,
            rows,
            cols,
            spacing_h_m,
            spacing_v_m,
            occupied,
            target,
            ..
        } => {
            let mut seen = std::collections::HashSet::new();
            let mut positions = Vec::with_capacity(occupied.len());
            let mut target_index = None;
            for slot in occupied {
                if !seen.insert(*slot) {
                    return Err(RatingError::InvalidGeometry(format!(
                        "duct ({}, {}) is occupied twice",
                        slot.row, slot.col
                    )));
                }
                if slot == target {
                    target_index = Some(positions.len());
                }
                positions.push(duct_centre(
                    slot,
                    *rows,
                    *cols,
                    *depth_to_top_m,
                    *bank_height_m,
                    *spacing_h_m,
                    *spacing_v_m,
                ));
            }
            let target = target_index.ok_or_else(|| {
                RatingError::InvalidGeometry("target duct is not in the occupied set".into())
            })?;
            Ok(HeatSourceLayout { positions, target })
        }
    }
}

/// Centre of a duct slot, the lattice centred within the bank envelope.
pub fn duct_centre(
    slot: &DuctSlot,
    rows: usize,
    cols: usize,
    depth_to_top_m: f64,
    bank_height_m: f64,
    spacing_h_m: f64,
    spacing_v_m: f64,
) -> CablePosition {
    let x = (slot.col as f64 - (cols as f64 - 1.0) / 2.0) * spacing_h_m;
    let y = depth_to_top_m
        + bank_height_m / 2.0
        + (slot.row as f64 - (rows as f64 - 1.0) / 2.0) * spacing_v_m;
    CablePosition { x_m: x, y_m: y }
}

/// Perpendicular distances from a duct centre to the four faces of the
/// concrete envelope, for the Kennelly factor.
pub fn envelope_distances(
    position: CablePosition,
    depth_to_top_m: f64,
    bank_width_m: f64,
    bank_height_m: f64,
) -> (f64, f64, f64, f64) {
    let top = position.y_m - depth_to_top_m;
    let bottom = depth_to_top_m + bank_height_m - position.y_m;
    let left = position.x_m + bank_width_m / 2.0;
    let right = bank_width_m / 2.0 - position.x_m;
    (top, bottom, left, right)
}
