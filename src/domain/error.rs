// ============================================================
// Layer 3 — Pipeline Error Kinds
// ============================================================
// One structured error type shared by the data, ml, infra and
// web layers. Every variant names the kind of failure, carries
// a human readable message and, where there is one, the
// underlying cause so the full chain can be printed with
// anyhow's `{:#}` formatting at the top of the program.
//
// The application and CLI layers wrap these with
// anyhow::Context to add which step of the pipeline failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by every library layer.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A user supplied value could not be turned into a feature.
    /// Recovered by the web layer and shown inline on the form.
    #[error("invalid value for '{field}': {detail}")]
    Validation { field: String, detail: String },

    /// A persisted artifact does not exist on disk.
    #[error("artifact not found at '{}'", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// A persisted artifact exists but cannot be decoded.
    #[error("artifact at '{}' is corrupt", path.display())]
    ArtifactCorrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// Column set, column order or artifact version disagrees
    /// with what the preprocessor/model was fit on.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// No candidate regressor cleared the acceptance threshold.
    #[error("no acceptable model found: best R² {best_score:.4} from '{best_model}' is below {threshold}")]
    NoAcceptableModel {
        best_model: String,
        best_score: f64,
        threshold:  f64,
    },

    /// Data is present but unusable (empty, all-missing column, ...).
    #[error("data error: {0}")]
    Data(String),

    /// Reading or writing a CSV dataset failed.
    #[error("dataset error for '{}'", path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    /// A polars operation on an in-memory table failed.
    #[error("table operation failed")]
    Frame(#[from] polars::error::PolarsError),

    /// The model produced an unusable estimate.
    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn validation(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), detail: detail.into() }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// True for errors caused by the caller's input rather than
    /// by the service itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
