// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers. The application layer reads data
// through DatasetSource and the web layer asks for prices
// through PricePredictor, so both can be exercised in tests
// with in-memory stand-ins instead of CSV files and trained
// artifacts on disk.

use polars::prelude::DataFrame;

use crate::domain::error::PipelineResult;
use crate::domain::house::HouseFeatures;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce a table of Float64 columns.
///
/// Implementations:
///   - CsvLoader → reads an Ames CSV file through polars
pub trait DatasetSource {
    fn load(&self) -> PipelineResult<DataFrame>;
}

// ─── PricePredictor ───────────────────────────────────────────────────────────
/// Anything that can estimate a sale price for one house.
///
/// Implementations:
///   - PredictPipeline → fitted preprocessor + fitted regressor
pub trait PricePredictor: Send + Sync {
    fn predict(&self, features: &HouseFeatures) -> PipelineResult<f64>;
}
