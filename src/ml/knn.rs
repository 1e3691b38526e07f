// ============================================================
// Layer 5 — K-Nearest Neighbours Regressor
// ============================================================
// Lazy learner: `fit` only stores the (already standardised)
// training matrix. A prediction is the unweighted mean target
// of the k training rows closest in Euclidean distance.
//
// k is capped at the training size, so a tiny training set
// still predicts (the mean of everything).

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineResult;
use crate::ml::model::{check_training_data, check_width, not_fitted, Regressor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighbors {
    k: usize,
    x: Option<Array2<f64>>,
    y: Option<Array1<f64>>,
}

impl KNeighbors {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1), x: None, y: None }
    }

    fn predict_one(&self, train_x: &Array2<f64>, train_y: &Array1<f64>, query: ArrayView1<f64>) -> f64 {
        let mut dist: Vec<(f64, usize)> = train_x
            .outer_iter()
            .enumerate()
            .map(|(i, row)| (squared_distance(row, query), i))
            .collect();

        let k = self.k.min(dist.len());
        if k < dist.len() {
            dist.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }
        dist[..k].iter().map(|&(_, i)| train_y[i]).sum::<f64>() / k as f64
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum()
}

impl Regressor for KNeighbors {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
        check_training_data(x, y)?;
        self.x = Some(x.clone());
        self.y = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>> {
        let (Some(train_x), Some(train_y)) = (&self.x, &self.y) else {
            return Err(not_fitted("K-Neighbors Regressor"));
        };
        check_width(train_x.ncols(), x)?;
        Ok(x.outer_iter().map(|q| self.predict_one(train_x, train_y, q)).collect())
    }
}
