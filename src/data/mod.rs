// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw Ames CSV to the numeric matrices the
// regressors are trained on.
//
// The pipeline flows in this order:
//
//   AmesHousing.csv
//       │
//       ▼
//   CsvLoader         → reads the needed columns (polars)
//       │
//       ▼
//   engineer          → year_since_remod, Log_SalePrice
//       │
//       ▼
//   split_dataset     → stratified 80/20 train/test split
//       │
//       ▼
//   FeatureBuilder    → median impute + standard scale
//       │
//       ▼
//   Array2<f64>       → fed to the regressors (Layer 5)
//
// Tables are polars DataFrames from the loader up to the
// FeatureBuilder, which is where ndarray takes over.

/// Float64 column access with schema-aware errors
pub mod columns;

/// Reads/writes CSV files through polars
pub mod loader;

/// Derived columns (years since remodel, log price)
pub mod engineer;

/// Stratified train/test split on binned log price
pub mod splitter;

/// Median imputation and standard scaling
pub mod preprocessor;
