// ============================================================
// Layer 4 — Feature Engineering
// ============================================================
// Turns raw Ames rows into the engineered table used for
// splitting and training:
//
//   year_since_remod = Yr Sold - Year Remod/Add
//   Log_SalePrice    = ln(1 + SalePrice)
//
// Output columns: the 10 schema features (in schema order),
// SalePrice, Log_SalePrice. Rows without a usable sale price
// cannot be stratified or scored, so they are dropped.

use polars::prelude::*;

use crate::data::columns::float_column;
use crate::domain::error::PipelineResult;
use crate::domain::schema::{
    FeatureSchema, LOG_TARGET_COLUMN, REMOD_YEAR_COLUMN, TARGET_COLUMN, YEARS_SINCE_REMOD,
    YEAR_SOLD_COLUMN,
};

/// Columns that must be read from the raw CSV.
pub fn raw_columns(schema: &FeatureSchema) -> Vec<String> {
    let mut cols: Vec<String> = schema
        .columns()
        .into_iter()
        .filter(|c| *c != YEARS_SINCE_REMOD)
        .map(str::to_string)
        .collect();
    cols.push(YEAR_SOLD_COLUMN.to_string());
    cols.push(REMOD_YEAR_COLUMN.to_string());
    cols.push(TARGET_COLUMN.to_string());
    cols
}

pub fn engineer(raw: &DataFrame, schema: &FeatureSchema) -> PipelineResult<DataFrame> {
    let sold  = float_column(raw, YEAR_SOLD_COLUMN)?;
    let remod = float_column(raw, REMOD_YEAR_COLUMN)?;
    // Null when either year is missing
    let mut years_since_remod = (sold.f64()? - remod.f64()?).into_series();
    years_since_remod.rename(YEARS_SINCE_REMOD);

    let price     = float_column(raw, TARGET_COLUMN)?;
    let log_price = Series::new(
        LOG_TARGET_COLUMN,
        price
            .f64()?
            .into_iter()
            .map(|p| p.map(f64::ln_1p).filter(|v| v.is_finite()))
            .collect::<Vec<Option<f64>>>(),
    );

    let mut columns = Vec::with_capacity(schema.len() + 2);
    for name in schema.columns() {
        if name == YEARS_SINCE_REMOD {
            columns.push(years_since_remod.clone());
        } else {
            columns.push(float_column(raw, name)?);
        }
    }
    let keep    = log_price.is_not_null();
    let dropped = log_price.null_count();
    columns.push(price);
    columns.push(log_price);

    if dropped > 0 {
        tracing::warn!("Dropping {} rows without a usable {}", dropped, TARGET_COLUMN);
    }

    let engineered = DataFrame::new(columns)?.filter(&keep)?;
    tracing::info!("Engineered {} rows", engineered.height());
    Ok(engineered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw_frame() -> DataFrame {
        let mut columns: Vec<Series> = raw_columns(&FeatureSchema::ames())
            .iter()
            .filter(|c| ![YEAR_SOLD_COLUMN, REMOD_YEAR_COLUMN, TARGET_COLUMN].contains(&c.as_str()))
            .map(|c| Series::new(c, &[1.0, 2.0, 3.0]))
            .collect();
        columns.push(Series::new(YEAR_SOLD_COLUMN, &[2010i64, 2008, 2009]));
        columns.push(Series::new(REMOD_YEAR_COLUMN, &[Some(1990i64), Some(2008), None]));
        columns.push(Series::new(TARGET_COLUMN, &[Some(215000.0), None, Some(172000.0)]));
        DataFrame::new(columns).unwrap()
    }

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_raw_columns_exclude_derived() {
        let cols = raw_columns(&FeatureSchema::ames());
        assert!(!cols.iter().any(|c| c == YEARS_SINCE_REMOD));
        assert!(cols.iter().any(|c| c == "Year Remod/Add"));
        assert_eq!(cols.len(), 12);
    }

    #[test]
    fn test_engineered_columns_and_order() {
        let schema = FeatureSchema::ames();
        let out    = engineer(&raw_frame(), &schema).unwrap();
        let mut expected = schema.columns();
        expected.push(TARGET_COLUMN);
        expected.push(LOG_TARGET_COLUMN);
        assert_eq!(out.get_column_names(), expected);
    }

    #[test]
    fn test_rows_without_price_dropped() {
        let out = engineer(&raw_frame(), &FeatureSchema::ames()).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(values(&out, TARGET_COLUMN), vec![Some(215000.0), Some(172000.0)]);
    }

    #[test]
    fn test_derived_values() {
        let out = engineer(&raw_frame(), &FeatureSchema::ames()).unwrap();
        // Row 3 has no remodel year, so the derived value is missing
        assert_eq!(values(&out, YEARS_SINCE_REMOD), vec![Some(20.0), None]);
        let log = values(&out, LOG_TARGET_COLUMN);
        assert_relative_eq!(log[0].unwrap(), (215001.0f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_raw_column_fails() {
        let raw = raw_frame().drop(YEAR_SOLD_COLUMN).unwrap();
        let err = engineer(&raw, &FeatureSchema::ames()).unwrap_err();
        assert!(matches!(err, crate::domain::error::PipelineError::SchemaMismatch(_)));
    }
}
