//! CarPrice trainer CLI
//!
//! Cleans raw listings, trains a deterministic GBDT price model and
//! inspects saved artifacts.

use anyhow::{Context, Result};
use carprice_core::ModelArtifact;
use carprice_trainer::{
    clean_csv, clean_table, run_training, train_from_table, PipelineConfig, Table,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "carprice-train")]
#[command(author = "CarPrice Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic used-car price model trainer", long_about = None)]
struct Cli {
    /// Pipeline configuration (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean a raw listings CSV
    Clean {
        /// Raw listings CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Destination for the cleaned CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Train a model and write its artifact
    Train(TrainArgs),
    /// Print the manifest of a saved artifact
    Inspect {
        /// Artifact directory
        #[arg(short, long)]
        artifact: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Cleaned CSV (or raw listings with --raw)
    #[arg(short, long)]
    input: PathBuf,

    /// Artifact directory (overrides output.artifact_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Clean the input before training
    #[arg(long)]
    raw: bool,

    /// Number of boosting trees
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long)]
    min_samples_leaf: Option<usize>,

    /// Learning rate (fixed-point, e.g., 100000 = 0.1)
    #[arg(long)]
    learning_rate: Option<i64>,

    /// Seed for the train/eval shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,
}

impl TrainArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(v) = self.trees {
            config.gbdt.num_trees = v;
        }
        if let Some(v) = self.max_depth {
            config.gbdt.max_depth = v;
        }
        if let Some(v) = self.min_samples_leaf {
            config.gbdt.min_samples_leaf = v;
        }
        if let Some(v) = self.learning_rate {
            config.gbdt.learning_rate = v;
        }
        if let Some(v) = self.seed {
            config.split.seed = v;
        }
        if let Some(v) = self.test_fraction {
            config.split.test_fraction = v;
        }
        if let Some(dir) = &self.output {
            config.output.artifact_dir = dir.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("CarPrice trainer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Clean { input, output } => {
            info!("Cleaning {} -> {}", input.display(), output.display());
            let report = clean_csv(&input, &output, &config.cleaning).context("Cleaning failed")?;
            info!(
                "Kept {} of {} rows ({} cells imputed)",
                report.rows_out, report.rows_in, report.filled_cells
            );
        }
        Commands::Train(args) => {
            args.apply(&mut config);
            config.validate().context("Invalid configuration")?;
            train(&args, &config)?;
        }
        Commands::Inspect { artifact } => {
            let (loaded, manifest) =
                ModelArtifact::load(&artifact).context("Failed to load artifact")?;
            info!(
                "Run {}: {} trees over {} columns",
                manifest.run_id,
                loaded.model.num_trees(),
                loaded.schema.len()
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&manifest).context("Failed to render manifest")?
            );
        }
    }

    Ok(())
}

fn train(args: &TrainArgs, config: &PipelineConfig) -> Result<()> {
    let output = &config.output.artifact_dir;

    let (outcome, manifest) = if args.raw {
        let mut table = Table::read_csv(&args.input).context("Failed to load dataset")?;
        clean_table(&mut table, &config.cleaning).context("Cleaning failed")?;
        let outcome = train_from_table(&table, config).context("Training failed")?;
        let manifest = outcome
            .artifact
            .save(output, &outcome.report)
            .context("Failed to save artifact")?;
        (outcome, manifest)
    } else {
        run_training(&args.input, output, config).context("Training failed")?
    };

    info!("Training completed successfully");
    info!("  Artifact: {}", output.display());
    info!("  Run id: {}", manifest.run_id);
    info!("  Model hash: {}", manifest.model_hash);
    info!(
        "  Rows: {} train / {} eval",
        outcome.report.train_rows, outcome.report.eval_rows
    );
    match &outcome.report.eval_metrics {
        Some(m) => info!("  Eval: MAE ${:.2}, RMSE ${:.2}, R² {:.4}", m.mae, m.rmse, m.r2),
        None => info!("  Eval: no held-out rows"),
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
