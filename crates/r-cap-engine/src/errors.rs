//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RatingError>;

/// Closed error taxonomy of the rating engine.
///
/// Validation failures abort a solve before any numerics run. The two
/// physical conditions (`ThermalInfeasible`, `IterationDivergence`) are
/// caught at the solve boundary and turned into degraded results so that
/// a report can still explain the failure; they only escape as errors from
/// the lower-level routines that detect them.
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("invalid operating conditions: {0}")]
    InvalidOperating(String),
    #[error("unknown material: {0}")]
    InvalidMaterial(String),
    #[error("dielectric losses exceed the thermal budget ({dielectric_rise_c:.1} degC rise against {budget_c:.1} degC available)")]
    ThermalInfeasible {
        dielectric_rise_c: f64,
        budget_c: f64,
    },
    #[error("mutual-heating loop failed to converge after {iterations} iterations (last relative shift {last_shift:.4})")]
    IterationDivergence { iterations: usize, last_shift: f64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}
