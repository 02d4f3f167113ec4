//! facility-rollup CLI
//!
//! Assemble facility summaries and LoB rollups from source tables.
//!
//! # Usage
//!
//! ```bash
//! # Full run, writing the output tables to ./out
//! facility-rollup run --input tables.json --output-dir out
//!
//! # Override the reporting dates
//! facility-rollup run --input tables.json --as-of 2025-01-31 --prior-month 2024-12-31
//!
//! # Validation report only
//! facility-rollup validate --input tables.json
//!
//! # Generate a synthetic portfolio
//! facility-rollup generate --facilities 200 --counterparties 40 --output tables.json
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use facility_rollup::config::{PipelineConfig, ReportingCalendar};
use facility_rollup::pipeline::{run_from_path, PipelineOutput};
use facility_rollup::simulation::synthetic::{generate_sources, SyntheticConfig};
use log::info;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

/// Credit facility summary and line-of-business rollup pipeline
#[derive(Parser)]
#[command(name = "facility-rollup", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble, roll up and validate; optionally write the output tables
    Run(RunArgs),
    /// Print the validation report only
    Validate(InputArgs),
    /// Generate a deterministic synthetic set of source tables
    Generate(GenerateArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Path to the JSON source tables
    #[arg(long)]
    input: PathBuf,

    /// Path to a JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reporting as-of date (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Prior month-end comparison date (YYYY-MM-DD)
    #[arg(long)]
    prior_month: Option<NaiveDate>,

    /// Date used for maturity and aging arithmetic (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory to write the output tables to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of facilities
    #[arg(long, default_value_t = 60)]
    facilities: usize,

    /// Number of counterparties
    #[arg(long, default_value_t = 18)]
    counterparties: usize,

    /// Write to file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl InputArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_path(path)?,
            None => PipelineConfig::default(),
        };
        let calendar = &mut config.calendar;
        if let Some(as_of) = self.as_of {
            calendar.as_of_date = as_of;
        }
        if let Some(prior) = self.prior_month {
            calendar.prior_month_date = prior;
        }
        if let Some(today) = self.today {
            calendar.today = today;
        }
        config.validate()?;
        Ok(config)
    }
}

fn cmd_run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = args.input.pipeline_config()?;
    let output = run_from_path(&args.input.input, &config)?;

    if let Some(dir) = &args.output_dir {
        output.write_to_dir(dir)?;
    }
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_text(&output, &config.calendar),
    }
    Ok(())
}

fn cmd_validate(args: InputArgs) -> Result<(), Box<dyn Error>> {
    let config = args.pipeline_config()?;
    let output = run_from_path(&args.input, &config)?;
    println!("{}", output.validation);
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let config = SyntheticConfig {
        facility_count: args.facilities,
        counterparty_count: args.counterparties,
    };
    let tables = generate_sources(&config, &ReportingCalendar::default());
    let json = serde_json::to_string_pretty(&tables)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &json).map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
            eprintln!(
                "Generated {} facilities across {} counterparties → {}",
                tables.facilities.len(),
                tables.counterparties.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_text(output: &PipelineOutput, calendar: &ReportingCalendar) {
    println!("=== Facility Rollup ({}) ===", calendar.as_of_date);
    println!("Facilities: {}", output.facilities.len());
    println!();
    for l1 in &output.rollups.lob_l1 {
        println!(
            "{:<28} exposure {:>18}  facilities {:>4}  desks {:>3}",
            l1.lob_l1,
            l1.metrics.total_exposure_usd.round_dp(2).to_string(),
            l1.metrics.facility_count,
            l1.desk_count
        );
        for l2 in output.rollups.lob_l2.iter().filter(|g| g.lob_l1 == l1.lob_l1) {
            let status = l2.lob_limit_status.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<26} exposure {:>18}  DOI {:>6}  limit {}",
                l2.lob_l2,
                l2.metrics.total_exposure_usd.round_dp(2).to_string(),
                l2.doi_pct.round_dp(4).to_string(),
                status
            );
        }
    }
    println!();
    println!("{}", output.validation);
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Validate(args) => cmd_validate(args),
        Commands::Generate(args) => cmd_generate(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    info!("done");
}
