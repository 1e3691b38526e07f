// ============================================================
// Layer 5 — Scoring
// ============================================================
// Coefficient of determination, used to rank candidates on
// the held-out split:
//
//   R² = 1 - SS_res / SS_tot
//
// 1.0 is a perfect fit, 0.0 is no better than predicting the
// mean, negative is worse than the mean. A constant target
// has SS_tot = 0: a perfect prediction scores 1.0, anything
// else 0.0. An empty input scores NaN, which never wins
// model selection.

use ndarray::Array1;

use crate::domain::error::{PipelineError, PipelineResult};

pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> PipelineResult<f64> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::data(format!(
            "r2_score: {} targets but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Ok(f64::NAN);
    }

    let mean   = y_true.mean().unwrap_or(0.0);
    let ss_tot = y_true.iter().map(|y| (y - mean).powi(2)).sum::<f64>();
    let ss_res = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
