// ============================================================
// Layer 2 — IngestUseCase
// ============================================================
// Turns the raw Ames CSV into the datasets training reads:
//
//   Step 1: Read the needed raw columns   (Layer 4 - loader)
//   Step 2: Keep a copy of the raw file   (Layer 4 - loader)
//   Step 3: Derive engineered columns     (Layer 4 - engineer)
//   Step 4: Stratified train/test split   (Layer 4 - splitter)
//   Step 5: Write train, test and the log-transformed table
//
// Output layout (defaults):
//   data/raw/raw_data.csv
//   data/interim/train.csv
//   data/interim/test.csv
//   data/interim/Log_Transformed_Features.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    engineer::{engineer, raw_columns},
    loader::{copy_raw, write_csv, CsvLoader},
    splitter::split_dataset,
};
use crate::domain::schema::FeatureSchema;
use crate::domain::traits::DatasetSource;

pub const DEFAULT_TEST_SIZE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// The Ames CSV as downloaded
    pub input_csv:   String,
    pub raw_dir:     String,
    pub interim_dir: String,
    pub test_size:   f64,
    pub seed:        u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_csv:   "data/raw/AmesHousing.csv".to_string(),
            raw_dir:     "data/raw".to_string(),
            interim_dir: "data/interim".to_string(),
            test_size:   DEFAULT_TEST_SIZE,
            seed:        42,
        }
    }
}

impl IngestConfig {
    pub fn raw_copy_path(&self) -> PathBuf {
        PathBuf::from(&self.raw_dir).join("raw_data.csv")
    }

    pub fn train_path(&self) -> PathBuf {
        PathBuf::from(&self.interim_dir).join("train.csv")
    }

    pub fn test_path(&self) -> PathBuf {
        PathBuf::from(&self.interim_dir).join("test.csv")
    }

    pub fn log_features_path(&self) -> PathBuf {
        PathBuf::from(&self.interim_dir).join("Log_Transformed_Features.csv")
    }
}

/// Where ingestion wrote the split and how big each side is.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub train_path: PathBuf,
    pub test_path:  PathBuf,
    pub train_rows: usize,
    pub test_rows:  usize,
}

pub struct IngestUseCase {
    config: IngestConfig,
    schema: FeatureSchema,
}

impl IngestUseCase {
    pub fn new(config: IngestConfig) -> Self {
        Self { config, schema: FeatureSchema::ames() }
    }

    pub fn execute(&self) -> Result<IngestOutput> {
        let cfg = &self.config;

        // ── Step 1: Read the raw columns ──────────────────────────────────────
        tracing::info!("Reading raw dataset from '{}'", cfg.input_csv);
        let loader = CsvLoader::new(&cfg.input_csv).with_columns(raw_columns(&self.schema).as_slice());
        let raw    = loader
            .load()
            .with_context(|| format!("Cannot read raw dataset '{}'", cfg.input_csv))?;
        tracing::info!("Read {} raw rows", raw.height());

        // ── Step 2: Keep an untouched copy ────────────────────────────────────
        let raw_copy = cfg.raw_copy_path();
        copy_raw(loader.path(), &raw_copy).context("Cannot copy the raw dataset")?;

        // ── Step 3: Feature engineering ───────────────────────────────────────
        let engineered = engineer(&raw, &self.schema).context("Feature engineering failed")?;

        // ── Step 4: Stratified split ──────────────────────────────────────────
        let split = split_dataset(&engineered, cfg.test_size, cfg.seed)
            .context("Stratified split failed")?;

        // ── Step 5: Write the datasets ────────────────────────────────────────
        let train_path = cfg.train_path();
        let test_path  = cfg.test_path();
        write_csv(&split.train, &train_path).context("Cannot write the training split")?;
        write_csv(&split.test, &test_path).context("Cannot write the test split")?;
        write_csv(&split.stratified, &cfg.log_features_path())
            .context("Cannot write the log-transformed features")?;

        tracing::info!(
            "Ingestion complete: {} train rows, {} test rows",
            split.train.height(),
            split.test.height()
        );

        Ok(IngestOutput {
            train_path,
            test_path,
            train_rows: split.train.height(),
            test_rows:  split.test.height(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::path::Path;

    /// A small Ames-shaped CSV whose price is a linear function of
    /// the ten features. Row 7 has a missing garage count.
    pub(crate) fn write_ames_csv(path: &Path, rows: usize) {
        let mut csv = String::from(
            "Order,MS Zoning,Overall Qual,Gr Liv Area,Garage Cars,Garage Area,1st Flr SF,\
             Total Bsmt SF,Lot Area,BsmtFin SF 1,Full Bath,Yr Sold,Year Remod/Add,SalePrice\n",
        );
        for i in 0..rows {
            let qual   = 1 + i % 10;
            let living = 600 + (i * 37) % 1500;
            let cars   = i % 4;
            let garage = 200 + (i * 53) % 600;
            let first  = 500 + (i * 29) % 1000;
            let bsmt   = 400 + (i * 41) % 1200;
            let lot    = 5000 + (i * 97) % 10000;
            let fin    = (i * 17) % 800;
            let bath   = 1 + i % 3;
            let sold   = 2006 + i % 5;
            let remod  = 1950 + (i * 7) % 55;
            let price  = 10_000 + 15_000 * qual + 50 * living + 5_000 * cars + 20 * garage
                + 30 * first + 25 * bsmt + lot + 10 * fin + 4_000 * bath
                - 300 * (sold - remod);
            let cars_cell = if i == 7 { "NA".to_string() } else { cars.to_string() };
            writeln!(
                csv,
                "{i},RL,{qual},{living},{cars_cell},{garage},{first},{bsmt},{lot},{fin},{bath},{sold},{remod},{price}"
            )
            .unwrap();
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, csv).unwrap();
    }

    pub(crate) fn config_in(root: &Path) -> IngestConfig {
        IngestConfig {
            input_csv:   root.join("input/AmesHousing.csv").to_string_lossy().into_owned(),
            raw_dir:     root.join("data/raw").to_string_lossy().into_owned(),
            interim_dir: root.join("data/interim").to_string_lossy().into_owned(),
            ..IngestConfig::default()
        }
    }

    #[test]
    fn test_ingest_writes_all_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_ames_csv(Path::new(&cfg.input_csv), 50);

        let out = IngestUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(out.train_rows + out.test_rows, 50);
        assert_eq!(out.test_rows, 10);
        assert!(out.train_path.exists());
        assert!(out.test_path.exists());
        assert!(cfg.raw_copy_path().exists());
        assert!(cfg.log_features_path().exists());

        let header = std::fs::read_to_string(&out.train_path).unwrap();
        let header = header.lines().next().unwrap();
        assert!(header.contains("year_since_remod"));
        assert!(header.contains("SalePrice"));
        assert!(!header.contains("Log_SalePrice"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(IngestUseCase::new(config_in(dir.path())).execute().is_err());
    }
}
