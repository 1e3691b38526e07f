// ============================================================
// Layer 4 — Feature Builder (column transform preprocessor)
// ============================================================
// Converts a DataFrame into the numeric matrix the regressors
// see.
//
// For each of the 10 schema columns, in schema order:
//   1. Impute   — missing cells take the column median
//   2. Scale    — (x - mean) / std, std of the imputed column
//                 (population std, ddof = 0)
// Every other column is dropped. Columns are selected by
// name, never inferred, so training and inference always see
// the same shape.
//
// The statistics are learnt once by `FeatureBuilder::fit` on
// the training split and frozen in a FittedPreprocessor, which
// is what gets persisted and reused (transform-only) by the
// prediction service.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::columns::float_column;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::FeatureSchema;

/// Learnt statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub median: f64,
    pub mean:   f64,
    /// Standard deviation, or 1.0 for a constant column
    pub scale:  f64,
}

/// Unfitted preprocessor: knows which columns to use.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
}

impl FeatureBuilder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    /// Learn median, mean and scale for every schema column.
    pub fn fit(&self, frame: &DataFrame) -> PipelineResult<FittedPreprocessor> {
        if frame.height() == 0 {
            return Err(PipelineError::data("cannot fit the preprocessor on an empty frame"));
        }

        let mut stats = Vec::with_capacity(self.schema.len());
        for name in self.schema.columns() {
            let column = float_column(frame, name)?;
            let values = column.f64()?;

            let median = values.median().ok_or_else(|| {
                PipelineError::data(format!("column '{name}' has no values to learn a median from"))
            })?;
            let imputed = values.fill_null_with_values(median)?;
            let mean    = imputed.mean().unwrap_or(median);
            let std     = imputed.std(0).unwrap_or(0.0);
            let scale   = if std > 0.0 && std.is_finite() { std } else { 1.0 };

            tracing::debug!(
                "Fitted '{}': median={:.3} mean={:.3} scale={:.3}",
                name, median, mean, scale
            );
            stats.push(ColumnStats { column: name.to_string(), median, mean, scale });
        }

        Ok(FittedPreprocessor { schema: self.schema.clone(), stats })
    }

    /// Fit on `frame` and return the fitted preprocessor together
    /// with the transformed training matrix.
    pub fn fit_transform(&self, frame: &DataFrame) -> PipelineResult<(FittedPreprocessor, Array2<f64>)> {
        let fitted = self.fit(frame)?;
        let matrix = fitted.transform(frame)?;
        Ok((fitted, matrix))
    }
}

/// Frozen preprocessor. Immutable once fit; shared read-only by
/// every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    schema: FeatureSchema,
    stats:  Vec<ColumnStats>,
}

impl FittedPreprocessor {
    /// Apply the stored statistics to `frame`. Returns an
    /// `n_rows × n_features` matrix in schema order.
    pub fn transform(&self, frame: &DataFrame) -> PipelineResult<Array2<f64>> {
        let mut x = Array2::<f64>::zeros((frame.height(), self.stats.len()));
        for (s, mut out) in self.stats.iter().zip(x.columns_mut()) {
            let column  = float_column(frame, &s.column)?;
            let imputed = column.f64()?.fill_null_with_values(s.median)?;
            for (cell, v) in out.iter_mut().zip(imputed.into_no_null_iter()) {
                *cell = (v - s.mean) / s.scale;
            }
        }
        Ok(x)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    /// Columns the preprocessor was fit on, in order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.stats.iter().map(|s| s.column.as_str()).collect()
    }
}
