// ============================================================
// Layer 5 — Regression Tree (CART)
// ============================================================
// Binary tree grown greedily on squared error.
//
// At each node, for every feature:
//   - sort the node's rows by that feature
//   - sweep left to right keeping running sums of y
//   - a cut between two distinct values scores
//       sum_L² / n_L + sum_R² / n_R
//     (maximising this is the same as minimising the summed
//      squared error of the two children)
// The threshold is the midpoint of the two values; rows with
// x <= threshold go left.
//
// Growth stops when a node is pure, has fewer than
// `min_samples_split` rows, or reaches `max_depth`. Leaves
// predict the mean target of their rows.
//
// Nodes live in a flat Vec and refer to children by index,
// which keeps the tree trivially serialisable.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineResult;
use crate::ml::model::{check_training_data, check_width, not_fitted, Regressor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// None grows until leaves are pure
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: None, min_samples_split: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    params:     TreeParams,
    nodes:      Vec<Node>,
    n_features: usize,
}

struct BestSplit {
    feature:   usize,
    threshold: f64,
    score:     f64,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self { params, nodes: Vec::new(), n_features: 0 }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Grow the tree on the given rows of `x` (rows may repeat,
    /// which is how the forest passes bootstrap samples).
    pub(crate) fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: Vec<usize>) {
        self.nodes.clear();
        self.n_features = x.ncols();
        self.grow(x, y, rows, 0);
    }

    /// Grow a subtree and return the index of its root.
    fn grow(
        &mut self,
        x:     &Array2<f64>,
        y:     &Array1<f64>,
        rows:  Vec<usize>,
        depth: usize,
    ) -> usize {
        let at   = self.nodes.len();
        let mean = rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64;
        self.nodes.push(Node::Leaf { value: mean });

        let depth_capped = self.params.max_depth.map_or(false, |d| depth >= d);
        let pure         = rows.iter().all(|&r| y[r] == y[rows[0]]);
        if depth_capped || pure || rows.len() < self.params.min_samples_split {
            return at;
        }

        let Some(best) = self.best_split(x, y, &rows) else {
            return at;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[[r, best.feature]] <= best.threshold);

        let left  = self.grow(x, y, left_rows,  depth + 1);
        let right = self.grow(x, y, right_rows, depth + 1);
        self.nodes[at] = Node::Split { feature: best.feature, threshold: best.threshold, left, right };
        at
    }

    fn best_split(
        &self,
        x:    &Array2<f64>,
        y:    &Array1<f64>,
        rows: &[usize],
    ) -> Option<BestSplit> {
        let n         = rows.len() as f64;
        let total_sum = rows.iter().map(|&r| y[r]).sum::<f64>();
        // A split must beat leaving the node whole
        let parent    = total_sum * total_sum / n;

        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();

        for f in 0..x.ncols() {
            sorted.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));

            let mut left_sum = 0.0;
            for i in 0..sorted.len() - 1 {
                left_sum += y[sorted[i]];
                let here = x[[sorted[i], f]];
                let next = x[[sorted[i + 1], f]];
                if here == next {
                    continue;
                }

                let n_left  = (i + 1) as f64;
                let n_right = n - n_left;
                let right_sum = total_sum - left_sum;
                let score = left_sum * left_sum / n_left + right_sum * right_sum / n_right;

                if score > parent + 1e-12 * parent.abs().max(1.0)
                    && best.as_ref().map_or(true, |b| score > b.score)
                {
                    let mid = here + (next - here) / 2.0;
                    // Guard against the midpoint rounding up to `next`
                    let threshold = if mid < next { mid } else { here };
                    best = Some(BestSplit { feature: f, threshold, score });
                }
            }
        }
        best
    }

    fn predict_row(&self, x: &Array2<f64>, row: usize) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    at = if x[[row, feature]] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
        check_training_data(x, y)?;
        self.fit_rows(x, y, (0..x.nrows()).collect());
        tracing::debug!("Decision tree: {} nodes, depth {}", self.node_count(), self.depth());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>> {
        if !self.is_fitted() {
            return Err(not_fitted("Decision Tree"));
        }
        check_width(self.n_features, x)?;
        Ok(Array1::from_shape_fn(x.nrows(), |row| self.predict_row(x, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_step_function_learnt_exactly() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut t = DecisionTree::new(TreeParams::default());
        t.fit(&x, &y).unwrap();

        assert_eq!(t.depth(), 1);
        assert_eq!(t.predict(&x).unwrap(), y);
        // threshold sits halfway between 3 and 10
        assert_eq!(t.predict(&array![[6.4]]).unwrap()[0], 5.0);
        assert_eq!(t.predict(&array![[6.6]]).unwrap()[0], 20.0);
    }

    #[test]
    fn test_unlimited_depth_memorises_training_set() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0], [4.0, 5.0]];
        let y = array![1.0, 7.0, 3.0, 9.0, 2.0];
        let mut t = DecisionTree::new(TreeParams::default());
        t.fit(&x, &y).unwrap();
        assert_eq!(t.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_max_depth_respected() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i * i) as f64);
        let params = TreeParams { max_depth: Some(2), ..TreeParams::default() };
        let mut t = DecisionTree::new(params);
        t.fit(&x, &y).unwrap();
        assert!(t.depth() <= 2);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4.0, 4.0, 4.0];
        let mut t = DecisionTree::new(TreeParams::default());
        t.fit(&x, &y).unwrap();
        assert_eq!(t.node_count(), 1);
    }

    #[test]
    fn test_identical_features_cannot_split() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut t = DecisionTree::new(TreeParams::default());
        t.fit(&x, &y).unwrap();
        assert_eq!(t.predict(&array![[1.0]]).unwrap()[0], 2.0);
    }
}
