//! ---
//! cap_section: "05-cli"
//! cap_subsection: "binary"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Operator CLI for running ampacity studies."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use r_cap_common::AppConfig;
use r_cap_engine::model::{ConductorMaterial, Installation, InsulationMaterial};
use r_cap_engine::sizing::{suggest_conductor_size, SizingRequest};
use r_cap_engine::{io as engine_io, reports, solver::DesignStatus};

const CONFIG_CANDIDATES: &[&str] = &["r-cap.toml", "configs/r-cap.toml"];

#[derive(Debug, Parser)]
#[command(author, version, about = "R-CAP cable ampacity studies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rate the cable described by a JSON or YAML request file.
    Rate {
        /// Path to the rating request document.
        #[arg(short, long)]
        input: PathBuf,
        /// Directory the JSON and text reports are written to; defaults to
        /// the configured report directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Print the full result as JSON instead of the summary table.
        #[arg(long)]
        json: bool,
    },
    /// Suggest the smallest standard conductor for a target current in a
    /// direct-buried installation.
    Suggest {
        /// Required current capacity (A).
        #[arg(long)]
        target_current: f64,
        /// Phase-to-ground voltage (kV).
        #[arg(long)]
        voltage_kv: f64,
        #[arg(long, default_value = "copper")]
        material: ConductorMaterial,
        #[arg(long, default_value = "xlpe")]
        insulation: InsulationMaterial,
        /// Burial depth to the cable centre (m).
        #[arg(long, default_value_t = 1.0)]
        depth: f64,
        /// Soil thermal resistivity (K.m/W).
        #[arg(long, default_value_t = 1.0)]
        soil_resistivity: f64,
        /// Ambient soil temperature (degC).
        #[arg(long, default_value_t = 25.0)]
        ambient: f64,
        /// Supply frequency (Hz).
        #[arg(long, default_value_t = 60.0)]
        frequency: f64,
        /// Required margin over the target current (percent).
        #[arg(long, default_value_t = 0.0)]
        margin: f64,
    },
}

fn main() -> Result<()> {
    let config = AppConfig::load(CONFIG_CANDIDATES)?;
    r_cap_common::init_tracing("r-capctl", &config.logging)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Rate {
            input,
            output_dir,
            json,
        } => rate(&config, input, output_dir, json),
        Commands::Suggest {
            target_current,
            voltage_kv,
            material,
            insulation,
            depth,
            soil_resistivity,
            ambient,
            frequency,
            margin,
        } => suggest(
            target_current,
            voltage_kv,
            material,
            insulation,
            depth,
            soil_resistivity,
            ambient,
            frequency,
            margin,
        ),
    }
}

fn rate(
    config: &AppConfig,
    input: PathBuf,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let request = engine_io::load_rating_request_from_file(&input)
        .with_context(|| format!("failed to load rating request {}", input.display()))?;

    let output_dir = output_dir.unwrap_or_else(|| config.reports.directory.clone());
    let summary = r_cap_engine::rate_cable_with_options(&request, Some(&output_dir))
        .context("rating failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", reports::format_summary(&summary.result));
    }

    info!(
        run_id = %summary.run_id,
        output_dir = %output_dir.display(),
        "rating complete"
    );

    if summary.result.design_status == DesignStatus::Fail {
        std::process::exit(2);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn suggest(
    target_current: f64,
    voltage_kv: f64,
    material: ConductorMaterial,
    insulation: InsulationMaterial,
    depth: f64,
    soil_resistivity: f64,
    ambient: f64,
    frequency: f64,
    margin: f64,
) -> Result<()> {
    let suggestion = suggest_conductor_size(&SizingRequest {
        target_current_a: target_current,
        conductor_material: material,
        insulation_material: insulation,
        voltage_v: voltage_kv * 1000.0,
        frequency_hz: frequency,
        installation: Installation::DirectBuried {
            depth_m: depth,
            spacing_m: 0.0,
            soil_resistivity,
            ambient_temp_c: ambient,
        },
        margin_percent: margin,
    })
    .context("size suggestion failed")?;

    println!(
        "suggested size: {:.0} mm2 ({:.0} kcmil), expected ampacity {:.0} A ({:+.1}% margin)",
        suggestion.cross_section_mm2,
        suggestion.cross_section_kcmil,
        suggestion.expected_ampacity_a,
        suggestion.margin_percent
    );
    Ok(())
}
