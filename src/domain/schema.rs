// ============================================================
// Layer 3 — Feature Schema
// ============================================================
// The ordered list of named numeric fields the preprocessor is
// fit on. Both artifacts carry a copy of this schema and it is
// compared against the compiled-in one when they are loaded,
// so a preprocessor fit on a different column set or order is
// rejected up front instead of silently mis-scaling inputs.
//
// Each field has two names:
//   column    — the header in the Ames CSV ("1st Flr SF")
//   form_name — the HTML form / CLI key ("First_Flr_SF")

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// Bumped whenever the field list or its order changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const TARGET_COLUMN:     &str = "SalePrice";
pub const LOG_TARGET_COLUMN: &str = "Log_SalePrice";
pub const STRATUM_COLUMN:    &str = "Sale_price_cat";
pub const YEAR_SOLD_COLUMN:  &str = "Yr Sold";
pub const REMOD_YEAR_COLUMN: &str = "Year Remod/Add";
pub const YEARS_SINCE_REMOD: &str = "year_since_remod";

/// (CSV column, form field) pairs in model order.
const AMES_FIELDS: [(&str, &str); 10] = [
    ("Overall Qual",    "Overall_Qual"),
    ("Gr Liv Area",     "Gr_Liv_Area"),
    ("Garage Cars",     "Garage_Cars"),
    ("Garage Area",     "Garage_Area"),
    ("1st Flr SF",      "First_Flr_SF"),
    ("Total Bsmt SF",   "Total_Bsmt_SF"),
    ("Lot Area",        "Lot_Area"),
    ("BsmtFin SF 1",    "BsmtFin_SF_1"),
    ("Full Bath",       "Full_Bath"),
    (YEARS_SINCE_REMOD, "year_since_remod"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Float64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub column:    String,
    pub form_name: String,
    pub dtype:     FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub fields:  Vec<FieldSpec>,
}

impl FeatureSchema {
    /// The 10-field schema used for the Ames dataset.
    pub fn ames() -> Self {
        let fields = AMES_FIELDS
            .iter()
            .map(|(column, form_name)| FieldSpec {
                column:    column.to_string(),
                form_name: form_name.to_string(),
                dtype:     FieldType::Float64,
            })
            .collect();
        Self { version: SCHEMA_VERSION, fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// CSV column names in model order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }

    /// Form field names in model order.
    pub fn form_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.form_name.as_str()).collect()
    }

    /// Fails unless `found` has the same version and the same fields
    /// in the same order.
    pub fn ensure_matches(&self, found: &FeatureSchema) -> PipelineResult<()> {
        if self.version != found.version {
            return Err(PipelineError::schema(format!(
                "expected schema version {}, found {}",
                self.version, found.version
            )));
        }
        if self.fields != found.fields {
            return Err(PipelineError::schema(format!(
                "expected fields [{}], found [{}]",
                self.columns().join(", "),
                found.columns().join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::ames()
    }
}
