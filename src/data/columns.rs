// ============================================================
// Layer 4 — Column Access
// ============================================================
// Typed access to DataFrame columns. Every numeric column the
// pipeline touches is read as Float64, and a column that is
// not there is reported as a schema mismatch rather than as a
// bare polars error.

use ndarray::Array1;
use polars::prelude::*;

use crate::domain::error::{PipelineError, PipelineResult};

/// The named column cast to Float64. Nulls survive the cast.
pub fn float_column(df: &DataFrame, name: &str) -> PipelineResult<Series> {
    let series = df.column(name).map_err(|_| {
        PipelineError::schema(format!(
            "column '{}' not found; available: [{}]",
            name,
            df.get_column_names().join(", ")
        ))
    })?;
    Ok(series.cast(&DataType::Float64)?)
}

/// A column that must be fully populated, as a vector.
pub fn dense_column(df: &DataFrame, name: &str) -> PipelineResult<Array1<f64>> {
    let series = float_column(df, name)?;
    let values = series.f64()?;
    if values.null_count() > 0 {
        return Err(PipelineError::data(format!(
            "column '{}' is missing {} of {} values",
            name,
            values.null_count(),
            values.len()
        )));
    }
    Ok(values.into_no_null_iter().collect())
}
