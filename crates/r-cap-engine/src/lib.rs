//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
pub mod ac_resistance;
pub mod errors;
pub mod io;
pub mod losses;
pub mod materials;
pub mod model;
pub mod mutual;
pub mod reports;
pub mod sizing;
pub mod solver;
pub mod thermal;

use chrono::{DateTime, Utc};
use model::RatingRequest;
use tracing::info;
use uuid::Uuid;

use crate::reports::ReportExporter;
use crate::solver::RatingResult;

pub use errors::{RatingError, Result};

/// A solved rating together with its provenance, ready for export.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RatingSummary {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub study: Option<String>,
    pub result: RatingResult,
}

impl RatingSummary {
    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }
}

/// Rate the target cable of `request`. Pure computation; nothing is
/// written anywhere.
pub fn rate_cable(request: &RatingRequest) -> Result<RatingSummary> {
    info!("running cable rating...");
    let result = solver::rate(request)?;
    Ok(RatingSummary {
        timestamp: Utc::now(),
        run_id: Uuid::new_v4(),
        study: request.study.clone(),
        result,
    })
}

/// Rate and export reports. When `output_dir` is `None` the default
/// `reports/` directory under the working directory is used.
pub fn rate_cable_with_options(
    request: &RatingRequest,
    output_dir: Option<&std::path::Path>,
) -> Result<RatingSummary> {
    let summary = rate_cable(request)?;
    let default_dir = std::path::Path::new("reports");
    let output_dir = output_dir.unwrap_or(default_dir);
    summary.exporter().export_all(output_dir)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CableDesign, Conductor, ConductorMaterial, Installation, Insulation, InsulationMaterial,
        Jacket, JacketMaterial, OperatingConditions, Stranding,
    };
    use crate::solver::DesignStatus;

    #[test]
    fn rating_pipeline_produces_an_exportable_summary() {
        let request = RatingRequest {
            study: Some("pipeline-test".into()),
            cable: CableDesign {
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
            },
            operating: OperatingConditions {
                voltage_v: 15_000.0,
                frequency_hz: 60.0,
                max_conductor_temp_c: None,
                load_factor: 1.0,
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

        let summary = rate_cable(&request).unwrap();
        assert_eq!(summary.study.as_deref(), Some("pipeline-test"));
        assert_eq!(summary.result.design_status, DesignStatus::Pass);
        assert!(summary.result.ampacity_a > 0.0);

        let text = reports::format_summary(&summary.result);
        assert!(text.contains("CABLE AMPACITY RATING"));
        assert!(text.contains("PASS"));
    }
}
