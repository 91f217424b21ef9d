//! CarPrice command line interface
//!
//! Loads a trained artifact once and estimates used-car prices, either for
//! a single vehicle given as flags or interactively from stdin.

mod format;
mod session;

use anyhow::{Context, Result};
use carprice_core::{PredictorState, RawRecord};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::format::format_price;
use crate::session::{run_session, AGE_ATTRIBUTE, YEAR_ATTRIBUTE};

#[derive(Parser)]
#[command(name = "carprice")]
#[command(about = "Used-car price estimator", long_about = None)]
#[command(version)]
struct Cli {
    /// Artifact directory written by carprice-train
    #[arg(short, long, global = true, default_value = "models/carprice")]
    artifact: PathBuf,

    /// Year that car ages are measured against
    #[arg(long, global = true, default_value = "2026")]
    reference_year: i64,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the price of one vehicle
    Predict(VehicleArgs),
    /// Read vehicles as key=value lines from stdin
    Session,
}

#[derive(Args)]
struct VehicleArgs {
    #[arg(long)]
    manufacturer: Option<String>,
    /// Model year (converted to car age)
    #[arg(long)]
    year: Option<i64>,
    /// Age in years (takes precedence over --year)
    #[arg(long)]
    car_age: Option<i64>,
    /// Mileage
    #[arg(long)]
    odometer: Option<i64>,
    #[arg(long)]
    cylinders: Option<String>,
    #[arg(long)]
    fuel: Option<String>,
    #[arg(long)]
    transmission: Option<String>,
    #[arg(long)]
    drive: Option<String>,
    /// Body type
    #[arg(long = "type")]
    body_type: Option<String>,
}

impl VehicleArgs {
    fn into_record(self, reference_year: i64) -> Result<RawRecord> {
        let mut record = RawRecord::new();

        let categories = [
            ("manufacturer", self.manufacturer),
            ("cylinders", self.cylinders),
            ("fuel", self.fuel),
            ("transmission", self.transmission),
            ("drive", self.drive),
            ("type", self.body_type),
        ];
        for (attribute, value) in categories {
            if let Some(value) = value {
                record.set_category(attribute, value);
            }
        }

        if let Some(odometer) = self.odometer {
            record.set_numeric("odometer", odometer);
        }
        if let Some(age) = self.car_age {
            record.set_numeric(AGE_ATTRIBUTE, age);
        }
        if let Some(year) = self.year {
            record.set_numeric(YEAR_ATTRIBUTE, year);
        }
        record.derive_age(YEAR_ATTRIBUTE, AGE_ATTRIBUTE, reference_year)?;

        Ok(record)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let state = PredictorState::load(&cli.artifact)
        .with_context(|| format!("Cannot start without a model artifact at {}", cli.artifact.display()))?;
    if let Some(manifest) = state.manifest() {
        info!(run_id = %manifest.run_id, columns = state.schema().len(), "model ready");
    }

    match cli.command {
        Commands::Predict(vehicle) => {
            let record = vehicle.into_record(cli.reference_year)?;
            let price = state.predict(&record).context("Prediction failed")?;
            println!("Estimated price: {}", format_price(price));
        }
        Commands::Session => {
            let stdin = io::stdin();
            let stats = run_session(&state, cli.reference_year, stdin.lock(), io::stdout())
                .context("Session I/O failed")?;
            info!(predicted = stats.predicted, failed = stats.failed, "session ended");
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle() -> VehicleArgs {
        VehicleArgs {
            manufacturer: Some("ford".into()),
            year: Some(2018),
            car_age: None,
            odometer: Some(50_000),
            cylinders: None,
            fuel: Some("gas".into()),
            transmission: None,
            drive: None,
            body_type: Some("truck".into()),
        }
    }

    #[test]
    fn test_year_becomes_age() {
        let record = vehicle().into_record(2026).unwrap();
        assert_eq!(record.numeric("car_age"), Some(8));
        assert_eq!(record.category("type"), Some("truck"));
        assert!(!record.contains("year"));
        assert!(!record.contains("cylinders"));
    }

    #[test]
    fn test_explicit_age_wins() {
        let args = VehicleArgs {
            car_age: Some(3),
            ..vehicle()
        };
        let record = args.into_record(2026).unwrap();
        assert_eq!(record.numeric("car_age"), Some(3));
    }

    #[test]
    fn test_cli_parses_type_flag() {
        let cli = Cli::try_parse_from([
            "carprice",
            "--artifact",
            "run",
            "predict",
            "--type",
            "sedan",
            "--odometer",
            "1000",
        ])
        .unwrap();
        assert_eq!(cli.artifact, PathBuf::from("run"));
        assert_eq!(cli.reference_year, 2026);
        match cli.command {
            Commands::Predict(args) => assert_eq!(args.body_type.as_deref(), Some("sedan")),
            Commands::Session => panic!("expected predict"),
        }
    }
}
