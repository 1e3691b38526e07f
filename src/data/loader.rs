// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads and writes the Ames CSV files through polars.
//
// The raw Ames file has ~80 columns, many of them categorical
// ("1Fam", "NA", ...). Only numeric columns are needed
// downstream, so each requested column is cast to Float64.
// The cast is non-strict: anything that does not parse as a
// number (empty cells, "NA") becomes a null, which the
// preprocessor later imputes.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use polars::prelude::*;

use crate::data::columns::float_column;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::DatasetSource;

/// Rows polars samples when inferring column types. The raw
/// file has columns that are blank for the first few hundred
/// rows, so the default (100) is too small.
const INFER_SCHEMA_ROWS: usize = 10_000;

pub struct CsvLoader {
    path:    PathBuf,
    columns: Option<Vec<String>>,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), columns: None }
    }

    /// Restrict loading to these columns. Any of them missing from
    /// the file is a schema error.
    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dataset_err(&self, source: PolarsError) -> PipelineError {
        PipelineError::Dataset { path: self.path.clone(), source }
    }
}

impl DatasetSource for CsvLoader {
    fn load(&self) -> PipelineResult<DataFrame> {
        if !self.path.exists() {
            return Err(PipelineError::io(
                &self.path,
                io::Error::new(io::ErrorKind::NotFound, "dataset file does not exist"),
            ));
        }

        let df = CsvReader::from_path(self.path.clone())
            .and_then(|reader| {
                reader
                    .has_header(true)
                    .infer_schema(Some(INFER_SCHEMA_ROWS))
                    .finish()
            })
            .map_err(|e| self.dataset_err(e))?;

        tracing::info!(
            "Read '{}': {} rows, {} columns",
            self.path.display(),
            df.height(),
            df.width()
        );

        let wanted: Vec<String> = match &self.columns {
            Some(cols) => {
                let available = df.get_column_names();
                if let Some(missing) = cols.iter().find(|c| !available.contains(&c.as_str())) {
                    return Err(PipelineError::schema(format!(
                        "column '{}' not found in '{}'",
                        missing,
                        self.path.display()
                    )));
                }
                cols.clone()
            }
            None => df.get_column_names().iter().map(|s| s.to_string()).collect(),
        };

        let columns = wanted
            .iter()
            .map(|name| float_column(&df, name))
            .collect::<PipelineResult<Vec<Series>>>()?;
        Ok(DataFrame::new(columns)?)
    }
}

/// Write a table as CSV with a header row, creating parent
/// directories as needed. Nulls are written as empty cells.
pub fn write_csv(df: &DataFrame, path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let dataset_err = |source| PipelineError::Dataset { path: path.to_path_buf(), source };

    let mut out  = df.clone();
    let mut file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    CsvWriter::new(&mut file).finish(&mut out).map_err(dataset_err)?;

    tracing::debug!("Wrote {} rows to '{}'", df.height(), path.display());
    Ok(())
}

/// Keep an untouched copy of the input file next to the
/// derived datasets.
pub fn copy_raw(src: &Path, dst: &Path) -> PipelineResult<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    // Same path when the input already lives at the copy location.
    if src != dst {
        fs::copy(src, dst).map_err(|e| PipelineError::io(src, e))?;
    }
    Ok(())
}
