// ============================================================
// Layer 5 — Random Forest Regressor
// ============================================================
// An average of CART trees, each grown on a bootstrap sample
// (n rows drawn with replacement) of the training set. For
// regression every feature is considered at every split, so
// the randomness comes from the bootstrap alone.
//
// Reproducibility: a master StdRng seeded with `seed` hands
// each tree its own seed up front, then the trees are grown
// in parallel on the rayon pool. The result does not depend
// on how rayon schedules the work.

use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineResult;
use crate::ml::model::{check_training_data, check_width, not_fitted, Regressor};
use crate::ml::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_estimators: usize,
    seed:         u64,
    params:       TreeParams,
    trees:        Vec<DecisionTree>,
    n_features:   usize,
}

impl RandomForest {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            seed,
            params: TreeParams::default(),
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
        check_training_data(x, y)?;
        let n_rows = x.nrows();

        let mut master = StdRng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.n_estimators).map(|_| master.gen()).collect();

        let params = &self.params;
        self.trees = tree_seeds
            .into_par_iter()
            .map(|tree_seed| {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                let mut tree = DecisionTree::new(params.clone());
                tree.fit_rows(x, y, rows);
                tree
            })
            .collect();

        self.n_features = x.ncols();
        tracing::debug!("Random forest: grew {} trees", self.n_trees());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(not_fitted("Random Forest"));
        }
        check_width(self.n_features, x)?;

        let mut total = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            total += &tree.predict(x)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}
