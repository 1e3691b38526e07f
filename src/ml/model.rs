// ============================================================
// Layer 5 — Regressor Trait and Model Catalogue
// ============================================================
// Every candidate implements `Regressor`. The trainer only
// talks to this trait, so adding a candidate means adding a
// ModelKind variant and a Model variant.
//
// `Model` is a closed enum rather than a Box<dyn Regressor> so
// the winning model can be serialised into the model artifact
// and restored without a type registry.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::{
    forest::RandomForest,
    knn::KNeighbors,
    linear::LinearRegression,
    tree::{DecisionTree, TreeParams},
};

pub trait Regressor {
    /// Fit on an `n × p` feature matrix and `n` targets.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()>;

    /// One prediction per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>>;
}

/// The candidates the trainer can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    DecisionTree,
    RandomForest,
    KNeighbors,
}

impl ModelKind {
    pub fn all() -> Vec<ModelKind> {
        vec![
            ModelKind::LinearRegression,
            ModelKind::DecisionTree,
            ModelKind::RandomForest,
            ModelKind::KNeighbors,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::DecisionTree     => "Decision Tree",
            ModelKind::RandomForest     => "Random Forest",
            ModelKind::KNeighbors       => "K-Neighbors Regressor",
        }
    }

    /// A fresh, unfitted model of this kind.
    pub fn build(self, seed: u64) -> Model {
        match self {
            ModelKind::LinearRegression => Model::Linear(LinearRegression::new()),
            ModelKind::DecisionTree     => Model::Tree(DecisionTree::new(TreeParams::default())),
            ModelKind::RandomForest     => Model::Forest(RandomForest::new(100, seed)),
            ModelKind::KNeighbors       => Model::Knn(KNeighbors::new(5)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Model {
    Linear(LinearRegression),
    Tree(DecisionTree),
    Forest(RandomForest),
    Knn(KNeighbors),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Linear(_) => ModelKind::LinearRegression,
            Model::Tree(_)   => ModelKind::DecisionTree,
            Model::Forest(_) => ModelKind::RandomForest,
            Model::Knn(_)    => ModelKind::KNeighbors,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Model::Linear(m) => m,
            Model::Tree(m)   => m,
            Model::Forest(m) => m,
            Model::Knn(m)    => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Model::Linear(m) => m,
            Model::Tree(m)   => m,
            Model::Forest(m) => m,
            Model::Knn(m)    => m,
        }
    }
}

impl Regressor for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>> {
        self.as_regressor().predict(x)
    }
}

/// Shared precondition for every `fit`: non-empty, aligned, finite.
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
    if x.nrows() == 0 {
        return Err(PipelineError::data("cannot fit a model on zero rows"));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::data(format!(
            "feature matrix has {} rows but target has {}",
            x.nrows(),
            y.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(PipelineError::data("training data contains non-finite values"));
    }
    Ok(())
}

/// Shared precondition for every `predict`.
pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> PipelineResult<()> {
    if x.ncols() != expected {
        return Err(PipelineError::schema(format!(
            "model was fit on {} features, got {}",
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

pub(crate) fn not_fitted(name: &str) -> PipelineError {
    PipelineError::Prediction(format!("{name} has not been fit"))
}
