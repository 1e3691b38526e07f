// ============================================================
// Layer 5 — Model Trainer
// ============================================================
// Fits every configured candidate on the training split and
// scores it by R² on the held-out split.
//
//   for each candidate (in configured order):
//       fit(train_x, train_y)
//       r2 = r2_score(test_y, predict(test_x))
//   best = first candidate with the maximum r2
//   best < threshold  → NoAcceptableModel, nothing persisted
//   otherwise         → save the winner, return the report
//
// A candidate that fails to fit or predicts non-finite values
// is scored NaN and logged; NaN never wins. All scores are
// appended to the metrics CSV whether or not a winner exists.

use std::path::PathBuf;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::FeatureSchema;
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::metrics::{CandidateMetrics, MetricsLogger};
use crate::ml::model::{Model, ModelKind, Regressor};
use crate::ml::score::r2_score;

pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub candidates:           Vec<ModelKind>,
    pub acceptance_threshold: f64,
    pub seed:                 u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            candidates:           ModelKind::all(),
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            seed:                 DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub kind: ModelKind,
    pub r2:   f64,
}

impl CandidateScore {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Outcome of a successful training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best_model: ModelKind,
    pub best_score: f64,
    pub scores:     Vec<CandidateScore>,
    pub model_path: PathBuf,
}

pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Fit and score every candidate, select the best and persist it.
    #[allow(clippy::too_many_arguments)]
    pub fn train(
        &self,
        train_x: &Array2<f64>,
        train_y: &Array1<f64>,
        test_x:  &Array2<f64>,
        test_y:  &Array1<f64>,
        schema:  &FeatureSchema,
        store:   &ArtifactStore,
        metrics: &MetricsLogger,
    ) -> PipelineResult<TrainingReport> {
        if self.config.candidates.is_empty() {
            return Err(PipelineError::data("no candidate models configured"));
        }

        let (scores, mut models) = self.evaluate(train_x, train_y, test_x, test_y);
        let best      = select_best(&scores);
        let threshold = self.config.acceptance_threshold;
        let accepted  = best.filter(|&i| scores[i].r2 >= threshold);

        let rows: Vec<CandidateMetrics> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| CandidateMetrics::new(s.name(), s.r2, accepted == Some(i)))
            .collect();
        metrics.log_run(&rows)?;

        let Some(winner) = accepted else {
            let (best_model, best_score) = match best {
                Some(i) => (scores[i].name().to_string(), scores[i].r2),
                None    => ("none".to_string(), f64::NAN),
            };
            tracing::warn!("Best candidate '{}' scored R² {:.4}, below {}", best_model, best_score, threshold);
            return Err(PipelineError::NoAcceptableModel { best_model, best_score, threshold });
        };

        let model      = models.swap_remove(winner);
        let model_path = store.save_model(&model, schema)?;
        tracing::info!("Best model: {} (R² = {:.4})", model.name(), scores[winner].r2);

        Ok(TrainingReport {
            best_model: scores[winner].kind,
            best_score: scores[winner].r2,
            scores,
            model_path,
        })
    }

    /// Fit every candidate and score it on the test split.
    /// Returns the scores and the fitted models in candidate order.
    pub fn evaluate(
        &self,
        train_x: &Array2<f64>,
        train_y: &Array1<f64>,
        test_x:  &Array2<f64>,
        test_y:  &Array1<f64>,
    ) -> (Vec<CandidateScore>, Vec<Model>) {
        let mut scores = Vec::with_capacity(self.config.candidates.len());
        let mut models = Vec::with_capacity(self.config.candidates.len());

        for &kind in &self.config.candidates {
            let mut model = kind.build(self.config.seed);
            let r2 = match fit_and_score(&mut model, train_x, train_y, test_x, test_y) {
                Ok(r2) => r2,
                Err(e) => {
                    tracing::warn!("{} failed: {}", kind.name(), e);
                    f64::NAN
                }
            };
            tracing::info!("{:<22} R² = {:.4}", kind.name(), r2);
            scores.push(CandidateScore { kind, r2 });
            models.push(model);
        }
        (scores, models)
    }
}

fn fit_and_score(
    model:   &mut Model,
    train_x: &Array2<f64>,
    train_y: &Array1<f64>,
    test_x:  &Array2<f64>,
    test_y:  &Array1<f64>,
) -> PipelineResult<f64> {
    model.fit(train_x, train_y)?;
    let pred = model.predict(test_x)?;
    if pred.iter().any(|p| !p.is_finite()) {
        return Err(PipelineError::Prediction(format!("{} produced non-finite predictions", model.name())));
    }
    r2_score(test_y, &pred)
}

/// Index of the first maximum score. NaN scores are skipped.
pub fn select_best(scores: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scores.iter().enumerate() {
        if s.r2.is_nan() {
            continue;
        }
        if best.map_or(true, |b| s.r2 > scores[b].r2) {
            best = Some(i);
        }
    }
    best
}
