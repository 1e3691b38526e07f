// ============================================================
// Layer 4 — Stratified Train/Test Splitter
// ============================================================
// Splits the engineered rows into a training set and a
// held-out test set that share the same sale-price
// distribution.
//
// Why stratify?
//   Sale prices are heavily skewed. A plain random split can
//   leave most of the expensive houses on one side, and then
//   the held-out R² says more about the split than about the
//   model. Binning the log price into 5 strata and sampling
//   each stratum proportionally keeps both sides alike.
//
// Strata (log1p(SalePrice), right-inclusive):
//   1: (-inf,   11.728]      the lowest edge 9.455 is left open
//   2: (11.728, 11.859]      so nothing below it is dropped
//   3: (11.859, 12.091]
//   4: (12.091, 12.346]
//   5: (12.346, +inf)
//
// Procedure (one shuffle split):
//   n_test  = ceil(test_fraction * n)
//   n_train = n - n_test
//   Each stratum contributes test rows in proportion to its
//   size; rounding leftovers go to the strata with the largest
//   fractional share. Rows inside a stratum are shuffled with a
//   seeded StdRng, so the split is reproducible.

use std::collections::BTreeMap;

use polars::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::columns::dense_column;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::{LOG_TARGET_COLUMN, STRATUM_COLUMN};

/// Bin edges over log1p(SalePrice). The first edge is kept for
/// reference only: stratum 1 is open at the bottom.
pub const STRATUM_EDGES: [f64; 6] = [9.4550, 11.7280, 11.8590, 12.0910, 12.3460, f64::INFINITY];

pub const NUM_STRATA: u8 = 5;

/// Stratum label (1..=5) for a log price.
pub fn stratum_of(log_price: f64) -> u8 {
    STRATUM_EDGES[1..]
        .iter()
        .position(|&upper| log_price <= upper)
        .map_or(NUM_STRATA, |i| i as u8 + 1)
}

/// Row indices of the two sides of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Draw one stratified split over `strata` (one label per row).
pub fn stratified_split(
    strata:        &[u8],
    test_fraction: f64,
    seed:          u64,
) -> PipelineResult<SplitIndices> {
    let total = strata.len();
    if total < 2 {
        return Err(PipelineError::data(format!(
            "need at least 2 rows to split, got {total}"
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::data(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n_test = ((total as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.clamp(1, total - 1);

    // BTreeMap keeps strata in label order so allocation and
    // shuffling are deterministic for a given seed
    let mut groups: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (row, &label) in strata.iter().enumerate() {
        groups.entry(label).or_default().push(row);
    }

    let sizes: Vec<usize> = groups.values().map(Vec::len).collect();
    let quotas = allocate(&sizes, n_test);

    let mut rng   = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(total - n_test);
    let mut test  = Vec::with_capacity(n_test);

    for (rows, quota) in groups.into_values().zip(quotas) {
        let mut rows = rows;
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..quota]);
        train.extend_from_slice(&rows[quota..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(
        "Stratified split: {} training, {} test ({}% / {}%)",
        train.len(),
        test.len(),
        (train.len() * 100) / total,
        (test.len()  * 100) / total,
    );

    Ok(SplitIndices { train, test })
}

/// Share `n_pick` picks across groups of the given sizes in
/// proportion to their size (largest-remainder rounding).
fn allocate(sizes: &[usize], n_pick: usize) -> Vec<usize> {
    let total: usize = sizes.iter().sum();
    let exact: Vec<f64> = sizes
        .iter()
        .map(|&s| n_pick as f64 * s as f64 / total as f64)
        .collect();

    let mut quotas: Vec<usize> = exact
        .iter()
        .zip(sizes)
        .map(|(&e, &s)| (e.floor() as usize).min(s))
        .collect();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // Stable sort: ties keep stratum order
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa)
    });

    let mut left = n_pick - quotas.iter().sum::<usize>();
    while left > 0 {
        let before = left;
        for &g in &order {
            if left == 0 {
                break;
            }
            if quotas[g] < sizes[g] {
                quotas[g] += 1;
                left      -= 1;
            }
        }
        if before == left {
            break;
        }
    }
    quotas
}

/// The two sides of the split plus the stratified table
/// (engineered rows with their stratum label).
pub struct DatasetSplit {
    pub train:      DataFrame,
    pub test:       DataFrame,
    pub stratified: DataFrame,
}

fn row_index(rows: &[usize]) -> IdxCa {
    IdxCa::from_vec("", rows.iter().map(|&r| r as IdxSize).collect())
}

/// Stratify an engineered table on its log price and split it.
/// The train/test tables drop the log price and the stratum.
pub fn split_dataset(
    engineered:    &DataFrame,
    test_fraction: f64,
    seed:          u64,
) -> PipelineResult<DatasetSplit> {
    let log_price = dense_column(engineered, LOG_TARGET_COLUMN)?;
    let strata: Vec<u8> = log_price.iter().map(|&v| stratum_of(v)).collect();

    let indices = stratified_split(&strata, test_fraction, seed)?;

    let labels: Vec<i32> = strata.iter().map(|&s| i32::from(s)).collect();
    let mut stratified = engineered.clone();
    stratified.with_column(Series::new(STRATUM_COLUMN, labels))?;

    let model_rows = engineered.drop(LOG_TARGET_COLUMN)?;
    let train      = model_rows.take(&row_index(&indices.train))?;
    let test       = model_rows.take(&row_index(&indices.test))?;

    tracing::info!("Split {} rows into {} train / {} test", engineered.height(), train.height(), test.height());

    Ok(DatasetSplit { train, test, stratified })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 5) as u8 + 1).collect()
    }

    #[test]
    fn test_stratum_edges() {
        assert_eq!(stratum_of(9.0),     1);
        assert_eq!(stratum_of(11.728),  1);
        assert_eq!(stratum_of(11.7281), 2);
        assert_eq!(stratum_of(12.0),    3);
        assert_eq!(stratum_of(12.346),  4);
        assert_eq!(stratum_of(13.5),    5);
    }

    #[test]
    fn test_correct_split_sizes() {
        let split = stratified_split(&labels(100), 0.2, 42).unwrap();
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(),  20);
    }

    #[test]
    fn test_disjoint_and_complete() {
        let n     = 137;
        let split = stratified_split(&labels(n), 0.2, 7).unwrap();
        assert_eq!(split.train.len() + split.test.len(), n);

        let train: HashSet<_> = split.train.iter().copied().collect();
        let test:  HashSet<_> = split.test.iter().copied().collect();
        assert!(train.is_disjoint(&test));

        let all: HashSet<_> = train.union(&test).copied().collect();
        assert_eq!(all, (0..n).collect());
    }

    #[test]
    fn test_strata_proportions_preserved() {
        // 60% stratum 1, 40% stratum 5
        let strata: Vec<u8> = (0..200).map(|i| if i < 120 { 1 } else { 5 }).collect();
        let split = stratified_split(&strata, 0.2, 42).unwrap();
        let test_ones = split.test.iter().filter(|&&i| strata[i] == 1).count();
        assert_eq!(test_ones, 24);
        assert_eq!(split.test.len() - test_ones, 16);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(&labels(50), 0.2, 42).unwrap();
        let b = stratified_split(&labels(50), 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minimum_input() {
        // Five rows, one per stratum
        let split = stratified_split(&[1, 2, 3, 4, 5], 0.2, 42).unwrap();
        assert_eq!(split.test.len(),  1);
        assert_eq!(split.train.len(), 4);
    }

    #[test]
    fn test_too_small_or_bad_fraction() {
        assert!(stratified_split(&[],  0.2, 42).is_err());
        assert!(stratified_split(&[1], 0.2, 42).is_err());
        assert!(stratified_split(&[1, 2, 3], 1.5, 42).is_err());
    }

    #[test]
    fn test_allocate_sums_to_pick() {
        let quotas = allocate(&[3, 3, 3], 2);
        assert_eq!(quotas.iter().sum::<usize>(), 2);
        assert!(quotas.iter().zip([3, 3, 3]).all(|(q, s)| *q <= s));
    }

    #[test]
    fn test_split_dataset_drops_helper_columns() {
        let log: Vec<f64> = (0..20).map(|i| 11.0 + i as f64 * 0.1).collect();
        let lot: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let frame = df!("Lot Area" => lot, LOG_TARGET_COLUMN => log).unwrap();

        let split = split_dataset(&frame, 0.2, 42).unwrap();
        assert_eq!(split.train.height() + split.test.height(), 20);
        assert_eq!(split.train.get_column_names(), vec!["Lot Area"]);
        assert_eq!(
            split.stratified.get_column_names(),
            vec!["Lot Area", LOG_TARGET_COLUMN, STRATUM_COLUMN]
        );

        // Every input row lands on exactly one side
        let mut seen: Vec<f64> = dense_column(&split.train, "Lot Area").unwrap().to_vec();
        seen.extend(dense_column(&split.test, "Lot Area").unwrap().iter());
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, (0..20).map(|i| i as f64).collect::<Vec<_>>());
    }
}
