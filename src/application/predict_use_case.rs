// ============================================================
// Layer 2 — Prediction Pipeline
// ============================================================
// Serves single-house predictions:
//
//   HouseFeatures → finite check → one-row DataFrame
//                 → preprocessor.transform → model.predict → f64
//
// The finite check covers every caller, not only the web
// form: clap parses "NaN" and "inf" into f64 flags, and a NaN
// would otherwise sail through imputation and down one side
// of every tree split.
//
// Both artifacts are loaded once, when the pipeline is built,
// and are never mutated afterwards. The web layer shares one
// pipeline across all workers behind an Arc; no locking is
// needed because prediction only reads.

use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::data::preprocessor::FittedPreprocessor;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::house::HouseFeatures;
use crate::domain::traits::PricePredictor;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::model::{Model, Regressor};

pub struct PredictPipeline {
    preprocessor: FittedPreprocessor,
    model:        Model,
}

impl PredictPipeline {
    pub fn new(preprocessor: FittedPreprocessor, model: Model) -> Self {
        Self { preprocessor, model }
    }

    /// Load the preprocessor and model written by one `train` run.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        tracing::info!("Loading artifacts from '{}'", store.dir().display());
        let (preprocessor, model) = store
            .load_pair()
            .context("Cannot load the trained artifacts. Have you run 'train' first?")?;
        tracing::info!("Serving predictions with '{}'", model.name());
        Ok(Self::new(preprocessor, model))
    }

    pub fn into_shared(self) -> Arc<dyn PricePredictor> {
        Arc::new(self)
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }
}

impl PricePredictor for PredictPipeline {
    fn predict(&self, features: &HouseFeatures) -> PipelineResult<f64> {
        let schema = self.preprocessor.schema();
        let values = features.values();
        if let Some((field, v)) = schema.fields.iter().zip(values).find(|(_, v)| !v.is_finite()) {
            return Err(PipelineError::validation(&field.form_name, format!("value {v} is not finite")));
        }

        let row = DataFrame::new(
            schema
                .columns()
                .into_iter()
                .zip(values)
                .map(|(name, v)| Series::new(name, &[v]))
                .collect(),
        )?;
        let x = self.preprocessor.transform(&row)?;
        let y = self.model.predict(&x)?;

        let price = y
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Prediction("model returned no value".to_string()))?;
        if !price.is_finite() {
            return Err(PipelineError::Prediction(format!("model returned {price}")));
        }
        tracing::debug!("Predicted {:.2} for {:?}", price, features);
        Ok(price)
    }
}

/// Round to cents and render with exactly two decimals.
pub fn format_price(price: f64) -> String {
    format!("{:.2}", (price * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::FeatureBuilder;
    use crate::domain::schema::FeatureSchema;
    use crate::ml::model::ModelKind;
    use ndarray::Array1;

    /// A pipeline fit on 40 synthetic houses whose price rises with
    /// every feature except the years since remodelling.
    fn fitted_pipeline(kind: ModelKind) -> PredictPipeline {
        let schema = FeatureSchema::ames();
        let n      = 40;
        let columns: Vec<Series> = schema
            .columns()
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<f64> = (0..n).map(|i| ((i * (j + 3)) % 17) as f64 * (j + 1) as f64).collect();
                Series::new(name, values)
            })
            .collect();
        let frame = DataFrame::new(columns).unwrap();

        let (pre, x) = FeatureBuilder::new(schema).fit_transform(&frame).unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 200_000.0 + r.iter().take(9).sum::<f64>() * 5_000.0 - r[9] * 1_000.0)
            .collect();

        let mut model = kind.build(42);
        model.fit(&x, &y).unwrap();
        PredictPipeline::new(pre, model)
    }

    #[test]
    fn test_sample_house_is_finite_and_positive() {
        let pipeline = fitted_pipeline(ModelKind::LinearRegression);
        let price    = pipeline.predict(&HouseFeatures::sample()).unwrap();
        assert!(price.is_finite());
        assert!(price > 0.0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let pipeline = fitted_pipeline(ModelKind::RandomForest);
        let house    = HouseFeatures::sample();
        assert_eq!(pipeline.predict(&house).unwrap(), pipeline.predict(&house).unwrap());
    }

    #[test]
    fn test_every_model_kind_predicts() {
        for kind in ModelKind::all() {
            let price = fitted_pipeline(kind).predict(&HouseFeatures::sample()).unwrap();
            assert!(price.is_finite(), "{}", kind.name());
        }
    }

    #[test]
    fn test_non_finite_input_is_a_validation_error() {
        let pipeline = fitted_pipeline(ModelKind::RandomForest);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let house = HouseFeatures { lot_area: bad, ..HouseFeatures::sample() };
            let err   = pipeline.predict(&house).unwrap_err();
            assert!(err.is_validation(), "{bad}: {err}");
            assert!(err.to_string().contains("Lot_Area"));
        }
    }

    #[test]
    fn test_load_reports_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictPipeline::load(&ArtifactStore::new(dir.path())).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_load_uses_saved_artifacts() {
        let dir      = tempfile::tempdir().unwrap();
        let store    = ArtifactStore::new(dir.path());
        let pipeline = fitted_pipeline(ModelKind::DecisionTree);
        store.save_preprocessor(&pipeline.preprocessor).unwrap();
        store.save_model(&pipeline.model, &FeatureSchema::ames()).unwrap();

        let loaded = PredictPipeline::load(&store).unwrap();
        let house  = HouseFeatures::sample();
        assert_eq!(loaded.model_name(), "Decision Tree");
        assert_eq!(loaded.predict(&house).unwrap(), pipeline.predict(&house).unwrap());
    }

    #[test]
    fn test_load_rejects_artifacts_from_different_runs() {
        let dir      = tempfile::tempdir().unwrap();
        let pipeline = fitted_pipeline(ModelKind::LinearRegression);
        ArtifactStore::new(dir.path())
            .with_run_id("first")
            .save_preprocessor(&pipeline.preprocessor)
            .unwrap();
        ArtifactStore::new(dir.path())
            .with_run_id("second")
            .save_model(&pipeline.model, &FeatureSchema::ames())
            .unwrap();

        let err = PredictPipeline::load(&ArtifactStore::new(dir.path())).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_format_price_two_decimals() {
        assert_eq!(format_price(123456.789), "123456.79");
        assert_eq!(format_price(100.0), "100.00");
        assert_eq!(format_price(99.999), "100.00");
    }
}
