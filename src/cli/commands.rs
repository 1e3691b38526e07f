// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the five subcommands and all their flags:
//
//   ingest    raw CSV → train/test CSVs
//   train     ingest + fit + select + save artifacts
//   predict   one house from flags (defaults: the sample house)
//   features  list the preprocessor's input columns
//   serve     start the web frontend
//
// Args structs convert into the application-layer configs, so
// the layers below never see clap types.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{ingest_use_case::IngestConfig, train_use_case::TrainConfig};
use crate::domain::house::HouseFeatures;
use crate::ml::model::ModelKind;
use crate::ml::trainer::TrainerConfig;
use crate::web::server::ServeConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the raw Ames CSV, engineer features and write the stratified split
    Ingest(IngestArgs),

    /// Run the full training pipeline and save the best model
    Train(TrainArgs),

    /// Predict the price of one house with the saved artifacts
    Predict(PredictArgs),

    /// List the feature columns the saved preprocessor expects
    Features(FeaturesArgs),

    /// Serve the prediction web form
    Serve(ServeArgs),
}

/// Arguments for the `ingest` command (also used by `train`).
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// The raw Ames housing CSV
    #[arg(long, default_value = "data/raw/AmesHousing.csv")]
    pub input_csv: String,

    /// Where the untouched copy of the raw CSV is written
    #[arg(long, default_value = "data/raw")]
    pub raw_dir: String,

    /// Where train.csv, test.csv and the log-transformed table go
    #[arg(long, default_value = "data/interim")]
    pub interim_dir: String,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for the stratified shuffle and the random forest
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<IngestArgs> for IngestConfig {
    fn from(a: IngestArgs) -> Self {
        IngestConfig {
            input_csv:   a.input_csv,
            raw_dir:     a.raw_dir,
            interim_dir: a.interim_dir,
            test_size:   a.test_size,
            seed:        a.seed,
        }
    }
}

/// Candidate names accepted by `--candidates`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Linear,
    Tree,
    Forest,
    Knn,
}

impl From<Candidate> for ModelKind {
    fn from(c: Candidate) -> Self {
        match c {
            Candidate::Linear => ModelKind::LinearRegression,
            Candidate::Tree   => ModelKind::DecisionTree,
            Candidate::Forest => ModelKind::RandomForest,
            Candidate::Knn    => ModelKind::KNeighbors,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Directory for preprocessor.bin, model.bin, metrics.csv and train_config.json
    #[arg(long, default_value = "models")]
    pub model_dir: String,

    /// Reuse the train/test CSVs already in --interim-dir
    #[arg(long)]
    pub skip_ingest: bool,

    /// Minimum held-out R² for the best model to be accepted
    #[arg(long, default_value_t = 0.6)]
    pub threshold: f64,

    /// Candidate models, in tie-breaking order
    #[arg(long, value_enum, value_delimiter = ',', default_value = "linear,tree,forest,knn")]
    pub candidates: Vec<Candidate>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let seed = a.ingest.seed;
        TrainConfig {
            ingest:      a.ingest.into(),
            model_dir:   a.model_dir,
            skip_ingest: a.skip_ingest,
            trainer:     TrainerConfig {
                candidates:           a.candidates.into_iter().map(ModelKind::from).collect(),
                acceptance_threshold: a.threshold,
                seed,
            },
        }
    }
}

/// All arguments for the `predict` command.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long, default_value = "models")]
    pub model_dir: String,

    #[arg(long, default_value_t = 3.0)]
    pub overall_qual: f64,

    #[arg(long, default_value_t = 900.0)]
    pub gr_liv_area: f64,

    #[arg(long, default_value_t = 2.0)]
    pub garage_cars: f64,

    #[arg(long, default_value_t = 700.0)]
    pub garage_area: f64,

    #[arg(long, default_value_t = 800.0)]
    pub first_flr_sf: f64,

    #[arg(long, default_value_t = 1000.0)]
    pub total_bsmt_sf: f64,

    #[arg(long, default_value_t = 1000.0)]
    pub lot_area: f64,

    #[arg(long, default_value_t = 800.0)]
    pub bsmtfin_sf_1: f64,

    #[arg(long, default_value_t = 3.0)]
    pub full_bath: f64,

    /// Years between the sale and the last remodel
    #[arg(long, default_value_t = 4.0)]
    pub year_since_remod: f64,
}

impl PredictArgs {
    pub fn features(&self) -> HouseFeatures {
        HouseFeatures {
            overall_qual:     self.overall_qual,
            gr_liv_area:      self.gr_liv_area,
            garage_cars:      self.garage_cars,
            garage_area:      self.garage_area,
            first_flr_sf:     self.first_flr_sf,
            total_bsmt_sf:    self.total_bsmt_sf,
            lot_area:         self.lot_area,
            bsmtfin_sf_1:     self.bsmtfin_sf_1,
            full_bath:        self.full_bath,
            year_since_remod: self.year_since_remod,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FeaturesArgs {
    #[arg(long, default_value = "models")]
    pub model_dir: String,
}

/// All arguments for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    #[arg(long, default_value = "models")]
    pub model_dir: String,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig { host: a.host, port: a.port, model_dir: a.model_dir }
    }
}
