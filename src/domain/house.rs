// ============================================================
// Layer 3 — House Features (prediction request)
// ============================================================
// One row of the 10 model inputs, as submitted by a user
// through the web form or the `predict` CLI command.
//
// Parsing happens here, before anything reaches the model:
// every field must be present, numeric and finite. Rust's
// f64 parser accepts "NaN" and "inf", so those are rejected
// explicitly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::FeatureSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseFeatures {
    pub overall_qual:     f64,
    pub gr_liv_area:      f64,
    pub garage_cars:      f64,
    pub garage_area:      f64,
    pub first_flr_sf:     f64,
    pub total_bsmt_sf:    f64,
    pub lot_area:         f64,
    pub bsmtfin_sf_1:     f64,
    pub full_bath:        f64,
    pub year_since_remod: f64,
}

impl HouseFeatures {
    /// The reference house used for smoke-testing a trained model.
    /// `predict` defaults its flags to the same values.
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            overall_qual:     3.0,
            gr_liv_area:      900.0,
            garage_cars:      2.0,
            garage_area:      700.0,
            first_flr_sf:     800.0,
            total_bsmt_sf:    1000.0,
            lot_area:         1000.0,
            bsmtfin_sf_1:     800.0,
            full_bath:        3.0,
            year_since_remod: 4.0,
        }
    }

    /// Build from form fields keyed by the schema's form names.
    pub fn from_form(form: &HashMap<String, String>) -> PipelineResult<Self> {
        let schema = FeatureSchema::ames();
        let mut values = [0.0f64; 10];
        for (slot, name) in values.iter_mut().zip(schema.form_names()) {
            let raw = form
                .get(name)
                .ok_or_else(|| PipelineError::validation(name, "field is missing"))?;
            *slot = parse_field(name, raw)?;
        }
        Ok(Self::from_values(values))
    }

    /// Values in schema order.
    pub fn values(&self) -> [f64; 10] {
        [
            self.overall_qual,
            self.gr_liv_area,
            self.garage_cars,
            self.garage_area,
            self.first_flr_sf,
            self.total_bsmt_sf,
            self.lot_area,
            self.bsmtfin_sf_1,
            self.full_bath,
            self.year_since_remod,
        ]
    }

    fn from_values(v: [f64; 10]) -> Self {
        Self {
            overall_qual:     v[0],
            gr_liv_area:      v[1],
            garage_cars:      v[2],
            garage_area:      v[3],
            first_flr_sf:     v[4],
            total_bsmt_sf:    v[5],
            lot_area:         v[6],
            bsmtfin_sf_1:     v[7],
            full_bath:        v[8],
            year_since_remod: v[9],
        }
    }
}

/// Parse one numeric field, trimming surrounding whitespace.
pub fn parse_field(name: &str, raw: &str) -> PipelineResult<f64> {
    let trimmed = raw.trim();
    let value: f64 = trimmed.parse().map_err(|_| {
        PipelineError::validation(name, format!("could not convert string to float: '{trimmed}'"))
    })?;
    if !value.is_finite() {
        return Err(PipelineError::validation(name, format!("value '{trimmed}' is not finite")));
    }
    Ok(value)
}
