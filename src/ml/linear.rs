// ============================================================
// Layer 5 — Linear Regression (ordinary least squares)
// ============================================================
// Fits y ≈ X·w + b by least squares.
//
// The data is centred first, which removes the intercept from
// the system:
//
//   (Xcᵀ Xc) w = Xcᵀ yc        b = mean(y) - mean(X)·w
//
// The p×p normal equations are solved with Gaussian
// elimination and partial pivoting. Inputs here are already
// standardised, so the system is well scaled; if it is still
// singular (duplicated or constant columns) a tiny ridge term
// is added to the diagonal and the solve is retried.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::model::{check_training_data, check_width, not_fitted, Regressor};

const PIVOT_EPS: f64 = 1e-12;
const RIDGE:     f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub coef:      Array1<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    params: Option<LinearParams>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> Option<&LinearParams> {
        self.params.as_ref()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> PipelineResult<()> {
        check_training_data(x, y)?;
        let x_mean = x.mean_axis(Axis(0)).ok_or_else(|| PipelineError::data("empty feature matrix"))?;
        let y_mean = y.mean().ok_or_else(|| PipelineError::data("empty target"))?;

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let gram = xc.t().dot(&xc);
        let rhs  = xc.t().dot(&yc);

        let coef = match solve(gram.clone(), rhs.clone()) {
            Some(w) => w,
            None => {
                tracing::debug!("Normal equations singular; retrying with ridge {}", RIDGE);
                let p     = gram.nrows();
                let scale = (gram.diag().sum() / p.max(1) as f64).max(1.0);
                let ridged = gram + Array2::<f64>::eye(p) * (RIDGE * scale);
                solve(ridged, rhs).ok_or_else(|| {
                    PipelineError::data("linear regression: normal equations are singular")
                })?
            }
        };

        let intercept = y_mean - x_mean.dot(&coef);
        self.params   = Some(LinearParams { coef, intercept });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> PipelineResult<Array1<f64>> {
        let params = self.params.as_ref().ok_or_else(|| not_fitted("Linear Regression"))?;
        check_width(params.coef.len(), x)?;
        Ok(x.dot(&params.coef) + params.intercept)
    }
}

/// Solve `a · w = b` for square `a`. None when a pivot vanishes.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let norm = a.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        // Partial pivoting: bring the largest remaining entry up
        let pivot_row = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot_row, col]].abs() < PIVOT_EPS * norm {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut w = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * w[k]).sum();
        w[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_recovers_exact_plane() {
        // y = 2·x0 - 3·x1 + 5
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [2.0, 3.0], [4.0, 1.0]];
        let y = x.map_axis(Axis(1), |r| 2.0 * r[0] - 3.0 * r[1] + 5.0);

        let mut m = LinearRegression::new();
        m.fit(&x, &y).unwrap();
        let p = m.params().unwrap();
        assert_abs_diff_eq!(p.coef[0],   2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.coef[1],  -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.intercept, 5.0, epsilon = 1e-9);

        let pred = m.predict(&array![[1.0, 1.0]]).unwrap();
        assert_abs_diff_eq!(pred[0], 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicated_column_falls_back_to_ridge() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut m = LinearRegression::new();
        m.fit(&x, &y).unwrap();
        let pred = m.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*p, *t, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut m = LinearRegression::new();
        m.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(m.predict(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_solve_small_system() {
        let w = solve(array![[2.0, 1.0], [1.0, 3.0]], array![3.0, 5.0]).unwrap();
        assert_abs_diff_eq!(w[0], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(w[1], 1.4, epsilon = 1e-12);
    }
}
