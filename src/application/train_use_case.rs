// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Ingest and split the raw CSV   (IngestUseCase)
//   Step 2: Load the train/test splits     (Layer 4 - loader)
//   Step 3: Fit the feature builder        (Layer 4 - preprocessor)
//   Step 4: Train and select a model       (Layer 5 - trainer)
//   Step 5: Save the preprocessor          (Layer 6 - infra)
//   Step 6: Save the config                (Layer 6 - infra)
//
// The trainer persists the winning model itself. The
// preprocessor is written only after a model was accepted, so
// a rejected run leaves the previous artifact pair untouched.
// Both go through one ArtifactStore and carry its run id; a
// run that dies between the two writes leaves a pair that
// PredictPipeline::load refuses.

use std::path::PathBuf;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::application::ingest_use_case::{IngestConfig, IngestUseCase};
use crate::data::{columns::dense_column, loader::CsvLoader, preprocessor::FeatureBuilder};
use crate::domain::schema::{FeatureSchema, TARGET_COLUMN};
use crate::domain::traits::DatasetSource;
use crate::infra::{artifact_store::ArtifactStore, metrics::MetricsLogger};
use crate::ml::trainer::{ModelTrainer, TrainerConfig, TrainingReport};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run depends on. Saved next to the
// artifacts as train_config.json so a run can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub ingest:      IngestConfig,
    pub model_dir:   String,
    /// Reuse the existing train/test CSVs instead of re-ingesting
    pub skip_ingest: bool,
    pub trainer:     TrainerConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            ingest:      IngestConfig::default(),
            model_dir:   "models".to_string(),
            skip_ingest: false,
            trainer:     TrainerConfig::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    schema: FeatureSchema,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, schema: FeatureSchema::ames() }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Ingest ────────────────────────────────────────────────────
        let (train_path, test_path) = if cfg.skip_ingest {
            tracing::info!("Skipping ingestion; reusing '{}'", cfg.ingest.interim_dir);
            (cfg.ingest.train_path(), cfg.ingest.test_path())
        } else {
            let out = IngestUseCase::new(cfg.ingest.clone()).execute()?;
            (out.train_path, out.test_path)
        };

        // ── Step 2: Load the splits ───────────────────────────────────────────
        let train = self.load_split(train_path)?;
        let test  = self.load_split(test_path)?;
        tracing::info!("Loaded {} train rows and {} test rows", train.height(), test.height());

        // ── Step 3: Feature transformation ────────────────────────────────────
        // Statistics come from the training split only
        let builder                 = FeatureBuilder::new(self.schema.clone());
        let (preprocessor, train_x) = builder
            .fit_transform(&train)
            .context("Cannot fit the feature builder")?;
        let test_x = preprocessor
            .transform(&test)
            .context("Cannot transform the test split")?;

        let train_y = dense_column(&train, TARGET_COLUMN).context("Training target is incomplete")?;
        let test_y  = dense_column(&test, TARGET_COLUMN).context("Test target is incomplete")?;

        // ── Step 4: Train, select and persist the model ───────────────────────
        let store   = ArtifactStore::new(&cfg.model_dir);
        tracing::info!("Training run {}", store.run_id());
        let metrics = MetricsLogger::new(&cfg.model_dir)?;
        let trainer = ModelTrainer::new(cfg.trainer.clone());
        let report  = trainer
            .train(&train_x, &train_y, &test_x, &test_y, &self.schema, &store, &metrics)
            .context("Model training failed")?;

        // ── Step 5: Save the preprocessor ─────────────────────────────────────
        store.save_preprocessor(&preprocessor)?;

        // ── Step 6: Save config for reproducibility ───────────────────────────
        store.save_config(cfg)?;

        tracing::info!("Training complete!");
        Ok(report)
    }

    fn load_split(&self, path: PathBuf) -> Result<DataFrame> {
        let mut columns: Vec<&str> = self.schema.columns();
        columns.push(TARGET_COLUMN);
        let frame = CsvLoader::new(&path)
            .with_columns(columns.as_slice())
            .load()
            .with_context(|| format!("Cannot read '{}'. Has ingestion been run?", path.display()))?;
        Ok(frame)
    }
}
