//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
use std::{fs, path::Path};

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::errors::Result;
use crate::solver::RatingResult;
use crate::RatingSummary;

/// Writes the rating summary to disk as a schema-tagged JSON document and
/// a plain-text engineering table.
#[derive(Debug)]
pub struct ReportExporter<'a> {
    summary: &'a RatingSummary,
}

impl<'a> ReportExporter<'a> {
    pub fn new(summary: &'a RatingSummary) -> Self {
        Self { summary }
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let envelope = ReportEnvelope {
            timestamp: self.summary.timestamp.to_rfc3339(),
            run_id: self.summary.run_id.to_string(),
            study: self.summary.study.clone(),
            schema: rating_schema(),
            data: &self.summary.result,
        };

        write_json(output_dir.join("rating.json"), &envelope)?;
        fs::write(
            output_dir.join("rating.txt"),
            format_summary(&self.summary.result),
        )?;

        info!("reports exported to {}", output_dir.display());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: String,
    run_id: String,
    study: Option<String>,
    schema: serde_json::Value,
    data: &'a T,
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

/// Fixed-width results table for engineering review.
pub fn format_summary(result: &RatingResult) -> String {
    let mut lines = vec![
        "=".repeat(60),
        "CABLE AMPACITY RATING".to_string(),
        "=".repeat(60),
        String::new(),
        format!("Ampacity (steady-state): {:>10.1} A", result.ampacity_a),
        format!("Ampacity (cyclic):       {:>10.1} A", result.ampacity_cyclic_a),
        format!("Design status:           {:>10}", match result.design_status {
            crate::solver::DesignStatus::Pass => "PASS",
            crate::solver::DesignStatus::Fail => "FAIL",
        }),
        String::new(),
        "TEMPERATURES".to_string(),
        "-".repeat(40),
        format!("  Max conductor temp:    {:>10.1} degC", result.max_conductor_temp_c),
        format!("  Emergency limit:       {:>10.1} degC", result.emergency_temp_c),
        format!("  Short-circuit limit:   {:>10.1} degC", result.short_circuit_temp_c),
        format!("  Ambient temp:          {:>10.1} degC", result.ambient_temp_c),
        format!("  Available dT:          {:>10.1} degC", result.delta_t_available_c),
        String::new(),
        "AC RESISTANCE".to_string(),
        "-".repeat(40),
        format!(
            "  DC resistance:         {:>10.4} mOhm/m",
            result.ac_resistance.rdc_ohm_per_m * 1000.0
        ),
        format!(
            "  AC resistance:         {:>10.4} mOhm/m",
            result.ac_resistance.rac_ohm_per_m * 1000.0
        ),
        format!("  Skin effect (ys):      {:>10.4}", result.ac_resistance.ys),
        format!("  Proximity effect (yp): {:>10.4}", result.ac_resistance.yp),
        String::new(),
        "LOSSES (at rated current)".to_string(),
        "-".repeat(40),
        format!("  Conductor:             {:>10.2} W/m", result.losses.conductor_w_per_m),
        format!("  Dielectric:            {:>10.4} W/m", result.losses.dielectric_w_per_m),
        format!("  Shield:                {:>10.2} W/m", result.losses.shield_w_per_m),
        format!("  Total:                 {:>10.2} W/m", result.losses.total_w_per_m),
        format!("  Shield loss factor:    {:>10.4}", result.shield_loss_factor),
        String::new(),
        "THERMAL RESISTANCES".to_string(),
        "-".repeat(40),
        format!("  R1 (insulation):       {:>10.4} K.m/W", result.thermal.r1_insulation),
        format!("  R2 (jacket):           {:>10.4} K.m/W", result.thermal.r2_jacket),
        format!("  R3 (conduit):          {:>10.4} K.m/W", result.thermal.r3_conduit),
        format!("  R (concrete):          {:>10.4} K.m/W", result.thermal.r_concrete),
        format!("  R4 (earth):            {:>10.4} K.m/W", result.thermal.r4_earth),
        format!("  R (mutual heating):    {:>10.4} K.m/W", result.thermal.r_mutual),
        format!("  R4 (effective):        {:>10.4} K.m/W", result.thermal.r4_effective),
        format!("  Total:                 {:>10.4} K.m/W", result.thermal.total),
        String::new(),
        "TEMPERATURE RISE".to_string(),
        "-".repeat(40),
        format!(
            "  From conductor losses: {:>10.2} degC",
            result.temperature_rise.from_conductor_c
        ),
        format!(
            "  From dielectric losses:{:>10.2} degC",
            result.temperature_rise.from_dielectric_c
        ),
        format!("  Total:                 {:>10.2} degC", result.temperature_rise.total_c),
        String::new(),
    ];

    if result.cables.len() > 1 {
        lines.push("PER-CABLE AMPACITIES".to_string());
        lines.push("-".repeat(40));
        for (index, cable) in result.cables.iter().enumerate() {
            let marker = if index == result.target_index { " *" } else { "" };
            lines.push(format!(
                "  ({:>6.2}, {:>5.2}) m:      {:>10.1} A{}",
                cable.position.x_m, cable.position.y_m, cable.ampacity_a, marker
            ));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(60));
    lines.join("\n")
}

fn rating_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "RatingResult",
        "type": "object",
        "properties": {
            "ampacity_a": {"type": "number"},
            "ampacity_cyclic_a": {"type": "number"},
            "max_conductor_temp_c": {"type": "number"},
            "ambient_temp_c": {"type": "number"},
            "delta_t_available_c": {"type": "number"},
            "ac_resistance": {"type": "object"},
            "losses": {"type": "object"},
            "shield_loss_factor": {"type": "number"},
            "thermal": {"type": "object"},
            "temperature_rise": {"type": "object"},
            "condition": {"type": "object"},
            "design_status": {"type": "string", "enum": ["PASS", "FAIL"]},
            "cables": {"type": "array"},
            "target_index": {"type": "integer"}
        },
        "required": [
            "ampacity_a",
            "ampacity_cyclic_a",
            "design_status",
            "thermal",
            "losses"
        ],
    })
}
