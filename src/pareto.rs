//! # Pareto Ranking
//!
//! Non-domination ranks over a matrix of minimized criteria. The rank of a row
//! is the number of rows that dominate it, so rank 0 is the non-dominated
//! front. This is the pairwise O(n²·k) formulation; every row's rank is
//! computed independently, which lets large pools be ranked in parallel
//! without changing any value.
//!
//! ```rust
//! use ndarray::array;
//! use paretoga::pareto::compute_ranks;
//!
//! let m = array![
//!     [1.0, 5.0], // non-dominated
//!     [5.0, 1.0], // non-dominated
//!     [3.0, 3.0], // non-dominated
//!     [4.0, 4.0], // dominated by (3, 3)
//!     [6.0, 6.0], // dominated by everything else
//! ];
//! assert_eq!(compute_ranks(&m.view()), vec![0, 0, 0, 1, 4]);
//! ```

use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Pools at least this large are ranked on the rayon thread pool.
const PARALLEL_RANK_THRESHOLD: usize = 512;

/// Returns `true` if `a` Pareto-dominates `b` under minimization.
///
/// `a` dominates `b` when it is no worse in every column and strictly better in
/// at least one. Comparisons involving NaN are neither better nor worse.
pub fn dominates(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut strictly_better = false;
    for (&av, &bv) in a.iter().zip(b.iter()) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Computes the domination count of every row of `m`.
pub fn compute_ranks(m: &ArrayView2<'_, f64>) -> Vec<usize> {
    let n = m.nrows();
    let rank_of = |i: usize| {
        let row = m.row(i);
        (0..n)
            .filter(|&j| j != i && dominates(&m.row(j), &row))
            .count()
    };

    if n >= PARALLEL_RANK_THRESHOLD {
        (0..n).into_par_iter().map(rank_of).collect()
    } else {
        (0..n).map(rank_of).collect()
    }
}

/// Stable argsort of `ranks`: ascending rank, original order among equal ranks.
pub fn sort_by_rank(ranks: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ranks.len()).collect();
    order.sort_by_key(|&i| ranks[i]);
    order
}

/// Indices of the rank-0 rows.
pub fn front_indices(ranks: &[usize]) -> Vec<usize> {
    ranks
        .iter()
        .enumerate()
        .filter(|(_, &r)| r == 0)
        .map(|(i, _)| i)
        .collect()
}
