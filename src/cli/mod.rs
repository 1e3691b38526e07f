// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. clap parses the
// command line; each subcommand converts its arguments into an
// application config and hands off to Layer 2. Printing to
// stdout happens here and nowhere else.

pub mod commands;

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, FeaturesArgs, IngestArgs, PredictArgs, ServeArgs, TrainArgs};

use crate::application::{
    ingest_use_case::IngestUseCase,
    predict_use_case::{format_price, PredictPipeline},
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::traits::PricePredictor;
use crate::infra::artifact_store::ArtifactStore;
use crate::web::server::{self, ServeConfig};

#[derive(Parser, Debug)]
#[command(
    name = "ames-price",
    version,
    about = "Train a house-price model on the Ames dataset and serve predictions."
)]
pub struct Cli {
    /// Directory for the timestamped log files
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Ingest(args)   => run_ingest(args),
            Commands::Train(args)    => run_train(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Features(args) => run_features(args),
            Commands::Serve(args)    => run_serve(args),
        }
    }
}

fn run_ingest(args: IngestArgs) -> Result<()> {
    let out = IngestUseCase::new(args.into()).execute()?;
    println!("Train data: {} ({} rows)", out.train_path.display(), out.train_rows);
    println!("Test data:  {} ({} rows)", out.test_path.display(), out.test_rows);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config: TrainConfig = args.into();
    tracing::info!("Starting training on '{}'", config.ingest.input_csv);

    let report = TrainUseCase::new(config).execute()?;

    println!("{:<24} {:>8}", "Model", "R²");
    for s in &report.scores {
        println!("{:<24} {:>8.4}", s.name(), s.r2);
    }
    println!(
        "\nBest model: {} (R² = {:.4}), saved to {}",
        report.best_model.name(),
        report.best_score,
        report.model_path.display()
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let pipeline = PredictPipeline::load(&ArtifactStore::new(&args.model_dir))?;
    let price    = pipeline
        .predict(&args.features())
        .context("Prediction failed")?;
    println!("Predicted sale price ({}): {}", pipeline.model_name(), format_price(price));
    Ok(())
}

fn run_features(args: FeaturesArgs) -> Result<()> {
    let store = ArtifactStore::new(&args.model_dir);
    let pre   = store
        .load_preprocessor()
        .context("Cannot load the preprocessor. Have you run 'train' first?")?;

    let names: BTreeSet<&str> = pre.feature_names().into_iter().collect();
    let rule = "=".repeat(50);
    println!("{rule}\nREQUIRED FEATURE LIST FOR PREDICTION\n{rule}");
    for (i, name) in names.iter().enumerate() {
        println!("{:2}. {}", i + 1, name);
    }
    println!("{rule}\nTotal Features Found: {}", names.len());

    match store.load_config::<TrainConfig>() {
        Ok(cfg) => println!(
            "Trained on '{}' with seed {} and threshold {}",
            cfg.ingest.input_csv, cfg.trainer.seed, cfg.trainer.acceptance_threshold
        ),
        Err(e) => tracing::debug!("No training config to report: {}", e),
    }
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let config: ServeConfig = args.into();

    // Fail before binding if the artifacts are missing or stale
    let predictor = PredictPipeline::load(&ArtifactStore::new(&config.model_dir))?.into_shared();

    actix_web::rt::System::new()
        .block_on(server::run(config, predictor))
        .context("HTTP server stopped with an error")?;
    Ok(())
}
