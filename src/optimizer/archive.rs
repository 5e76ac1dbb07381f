//! # Archive
//!
//! The elite archive holds the best individuals seen so far as three
//! index-aligned matrices: designs `x`, objectives `y` and penalties `p`, all in
//! physical units. Row `i` of each matrix always describes the same individual.
//!
//! The `EpsilonDominanceArchiver` thins an archive by gridding normalized
//! objective space into equal-width bins and keeping one representative per
//! occupied bin.

use std::collections::{hash_map::Entry, HashMap, HashSet};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

use crate::{
    bounds::Bounds,
    error::{OptimizerError, Result},
    pareto::{compute_ranks, front_indices},
    penalty::{penalized_objectives, total_penalty},
    store::GenerationSnapshot,
};

/// One archive member, borrowed from the archive matrices.
#[derive(Debug, Clone, Copy)]
pub struct Individual<'a> {
    pub x: ArrayView1<'a, f64>,
    pub y: ArrayView1<'a, f64>,
    pub penalty: ArrayView1<'a, f64>,
}

impl Individual<'_> {
    /// `true` when no constraint is violated.
    pub fn is_feasible(&self) -> bool {
        self.penalty.iter().all(|&p| p == 0.0)
    }
}

/// Index-aligned elite designs, objectives and penalties.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    x: Array2<f64>,
    y: Array2<f64>,
    p: Array2<f64>,
}

impl Archive {
    /// An archive with no rows.
    pub fn empty(xdim: usize, ydim: usize, cdim: usize) -> Self {
        Self {
            x: Array2::zeros((0, xdim)),
            y: Array2::zeros((0, ydim)),
            p: Array2::zeros((0, cdim)),
        }
    }

    pub fn from_parts(x: Array2<f64>, y: Array2<f64>, p: Array2<f64>) -> Result<Self> {
        if x.nrows() != y.nrows() || x.nrows() != p.nrows() {
            return Err(OptimizerError::ShapeMismatch(format!(
                "archive rows must align: x has {}, y has {}, p has {}",
                x.nrows(),
                y.nrows(),
                p.nrows()
            )));
        }
        Ok(Self { x, y, p })
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elite designs (`xbest`).
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Elite objectives (`ybest`).
    pub fn y(&self) -> ArrayView2<'_, f64> {
        self.y.view()
    }

    /// Elite penalties (`pbest`).
    pub fn p(&self) -> ArrayView2<'_, f64> {
        self.p.view()
    }

    pub fn total_penalty(&self) -> Array1<f64> {
        total_penalty(&self.p.view())
    }

    pub fn individual(&self, i: usize) -> Option<Individual<'_>> {
        (i < self.len()).then(|| Individual {
            x: self.x.row(i),
            y: self.y.row(i),
            penalty: self.p.row(i),
        })
    }

    pub fn individuals(&self) -> impl Iterator<Item = Individual<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.individual(i))
    }

    /// Smallest value of every objective column, `+inf` for an empty archive.
    pub fn best_objectives(&self) -> Vec<f64> {
        self.y
            .axis_iter(Axis(1))
            .map(|column| column.fold(f64::INFINITY, |acc, &v| acc.min(v)))
            .collect()
    }

    /// Indices of the archive members on the penalized non-dominated front.
    pub fn pareto_front(&self, ybounds: &Bounds) -> Result<Vec<usize>> {
        let y_norm = ybounds.to_normalized(&self.y.view())?;
        let criteria = penalized_objectives(&y_norm.view(), &self.p.view());
        Ok(front_indices(&compute_ranks(&criteria.view())))
    }

    /// A new archive made of the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            p: self.p.select(Axis(0), indices),
        }
    }

    /// Deletes the given rows from all three matrices, keeping the order of the rest.
    pub fn remove_rows(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let keep: Vec<usize> = (0..self.len()).filter(|i| !doomed.contains(i)).collect();
        *self = self.select(&keep);
    }

    pub fn snapshot(&self, iteration: usize) -> GenerationSnapshot {
        GenerationSnapshot {
            iteration,
            x: self.x.clone(),
            y: self.y.clone(),
            p: self.p.clone(),
        }
    }
}

/// Which row survives when two archive members fall into the same bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinPreference {
    /// Keep the row farther from the bin's lower edge.
    #[default]
    FartherFromEdge,
    /// Keep the row closer to the bin's lower edge.
    CloserToEdge,
}

/// Keeps at most one archive member per epsilon bin of normalized objective space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonDominanceArchiver {
    bins: usize,
    preference: BinPreference,
}

impl EpsilonDominanceArchiver {
    pub fn new(bins: usize, preference: BinPreference) -> Result<Self> {
        if bins < 2 {
            return Err(OptimizerError::Configuration(format!(
                "Epsilon dominance needs at least 2 bins per dimension, got {}",
                bins
            )));
        }
        Ok(Self { bins, preference })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn preference(&self) -> BinPreference {
        self.preference
    }

    /// Composite bin key of a normalized objective row.
    ///
    /// Values are clamped to `[0,1]`; a value of exactly 1 falls into the last bin.
    pub fn bin_key(&self, normalized: &ArrayView1<'_, f64>) -> Vec<usize> {
        normalized
            .iter()
            .map(|&v| self.bin_index(v))
            .collect()
    }

    fn bin_index(&self, v: f64) -> usize {
        let scaled = v.clamp(0.0, 1.0) * self.bins as f64;
        (scaled.floor() as usize).min(self.bins - 1)
    }

    /// Squared distance of a row from the lower corner of its bin.
    ///
    /// Unlike the bin index, the distance uses the unclamped value.
    fn edge_distance(&self, normalized: &ArrayView1<'_, f64>, key: &[usize]) -> f64 {
        normalized
            .iter()
            .zip(key)
            .map(|(&v, &k)| {
                let offset = v - k as f64 / self.bins as f64;
                offset * offset
            })
            .sum()
    }

    /// Ties go to the later row under both preferences.
    fn challenger_wins(&self, challenger: f64, incumbent: f64) -> bool {
        match self.preference {
            BinPreference::FartherFromEdge => challenger >= incumbent,
            BinPreference::CloserToEdge => challenger <= incumbent,
        }
    }

    /// Thins `archive` in place and returns the number of rows removed.
    pub fn prune(&self, archive: &mut Archive, ybounds: &Bounds) -> Result<usize> {
        let y_norm = ybounds.to_normalized(&archive.y())?;
        let mut occupied: HashMap<Vec<usize>, (f64, usize)> = HashMap::new();
        let mut doomed = Vec::new();

        for (n, row) in y_norm.axis_iter(Axis(0)).enumerate() {
            let key = self.bin_key(&row);
            let distance = self.edge_distance(&row, &key);

            match occupied.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert((distance, n));
                }
                Entry::Occupied(mut slot) => {
                    let (incumbent_distance, incumbent) = *slot.get();
                    if self.challenger_wins(distance, incumbent_distance) {
                        doomed.push(incumbent);
                        slot.insert((distance, n));
                    } else {
                        doomed.push(n);
                    }
                }
            }
        }

        archive.remove_rows(&doomed);
        debug!(
            removed = doomed.len(),
            occupied_bins = occupied.len(),
            "epsilon dominance pruned archive"
        );
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoundsKind;
    use ndarray::array;

    fn unit_bounds(dim: usize) -> Bounds {
        Bounds::new(BoundsKind::Objective, &vec![(0.0, 1.0); dim]).unwrap()
    }

    fn archive_from_y(y: Array2<f64>) -> Archive {
        let n = y.nrows();
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        Archive::from_parts(x, y, Array2::zeros((n, 0))).unwrap()
    }

    #[test]
    fn test_from_parts_rejects_misaligned_rows() {
        let result = Archive::from_parts(
            Array2::zeros((3, 2)),
            Array2::zeros((2, 1)),
            Array2::zeros((3, 0)),
        );
        assert!(matches!(result, Err(OptimizerError::ShapeMismatch(_))));
    }

    #[test]
    fn test_remove_rows_keeps_alignment() {
        let mut archive = Archive::from_parts(
            array![[0.0], [1.0], [2.0], [3.0]],
            array![[10.0], [11.0], [12.0], [13.0]],
            array![[0.0], [0.5], [0.0], [2.0]],
        )
        .unwrap();

        archive.remove_rows(&[3, 1]);

        assert_eq!(archive.x(), array![[0.0], [2.0]]);
        assert_eq!(archive.y(), array![[10.0], [12.0]]);
        assert_eq!(archive.p(), array![[0.0], [0.0]]);
    }

    #[test]
    fn test_individuals() {
        let archive = Archive::from_parts(
            array![[0.0], [1.0]],
            array![[5.0], [6.0]],
            array![[0.0], [1.5]],
        )
        .unwrap();

        let feasible: Vec<bool> = archive.individuals().map(|i| i.is_feasible()).collect();
        assert_eq!(feasible, vec![true, false]);
        assert!(archive.individual(2).is_none());
        assert_eq!(archive.best_objectives(), vec![5.0]);
    }

    #[test]
    fn test_pareto_front_respects_penalty() {
        let archive = Archive::from_parts(
            array![[0.0], [1.0], [2.0]],
            array![[0.1, 0.9], [0.9, 0.1], [0.05, 0.05]],
            array![[0.0], [0.0], [1.5]],
        )
        .unwrap();

        // Row 2 would dominate both without its penalty
        assert_eq!(archive.pareto_front(&unit_bounds(2)).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_bin_key() {
        let archiver = EpsilonDominanceArchiver::new(4, BinPreference::default()).unwrap();

        assert_eq!(archiver.bin_key(&array![0.0, 0.24, 0.25].view()), vec![0, 0, 1]);
        assert_eq!(archiver.bin_key(&array![1.0, 1.7, -0.3].view()), vec![3, 3, 0]);
    }

    #[test]
    fn test_too_few_bins() {
        assert!(EpsilonDominanceArchiver::new(1, BinPreference::FartherFromEdge).is_err());
    }

    #[test]
    fn test_prune_keeps_farther_row() {
        let archiver = EpsilonDominanceArchiver::new(2, BinPreference::FartherFromEdge).unwrap();
        let mut archive = archive_from_y(array![[0.1, 0.1], [0.4, 0.3], [0.2, 0.45], [0.9, 0.1]]);

        let removed = archiver.prune(&mut archive, &unit_bounds(2)).unwrap();

        // Rows 0, 1, 2 share bin (0, 0); row 1 is farthest from its corner (0.25)
        assert_eq!(removed, 2);
        assert_eq!(archive.x(), array![[1.0], [3.0]]);
    }

    #[test]
    fn test_out_of_bounds_distance_is_unclamped() {
        let archiver = EpsilonDominanceArchiver::new(6, BinPreference::FartherFromEdge).unwrap();
        // Both rows land in the last bin; clamping would make them tie
        let mut archive = archive_from_y(array![[1.3], [1.1]]);

        let removed = archiver.prune(&mut archive, &unit_bounds(1)).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(archive.y(), array![[1.3]]);
    }

    #[test]
    fn test_prune_keeps_closer_row() {
        let archiver = EpsilonDominanceArchiver::new(2, BinPreference::CloserToEdge).unwrap();
        let mut archive = archive_from_y(array![[0.1, 0.1], [0.4, 0.3], [0.2, 0.45], [0.9, 0.1]]);

        let removed = archiver.prune(&mut archive, &unit_bounds(2)).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(archive.x(), array![[0.0], [3.0]]);
    }

    #[test]
    fn test_prune_tie_goes_to_later_row() {
        let archiver = EpsilonDominanceArchiver::new(3, BinPreference::FartherFromEdge).unwrap();
        let mut archive = archive_from_y(array![[0.5], [0.5]]);

        archiver.prune(&mut archive, &unit_bounds(1)).unwrap();

        assert_eq!(archive.x(), array![[1.0]]);
    }

    #[test]
    fn test_prune_leaves_unique_bins() {
        let archiver = EpsilonDominanceArchiver::new(5, BinPreference::default()).unwrap();
        let y = Array2::from_shape_fn((40, 2), |(i, j)| ((i * 7 + j * 13) % 40) as f64 / 40.0);
        let mut archive = archive_from_y(y);
        let bounds = unit_bounds(2);

        archiver.prune(&mut archive, &bounds).unwrap();

        let y_norm = bounds.to_normalized(&archive.y()).unwrap();
        let keys: HashSet<Vec<usize>> = y_norm
            .axis_iter(Axis(0))
            .map(|row| archiver.bin_key(&row))
            .collect();
        assert_eq!(keys.len(), archive.len());
        assert_eq!(archive.x().nrows(), archive.p().nrows());
    }

    #[test]
    fn test_prune_uses_objective_bounds() {
        let archiver = EpsilonDominanceArchiver::new(2, BinPreference::default()).unwrap();
        let bounds = Bounds::new(BoundsKind::Objective, &[(0.0, 100.0)]).unwrap();
        let mut archive = archive_from_y(array![[10.0], [40.0], [60.0]]);

        archiver.prune(&mut archive, &bounds).unwrap();

        assert_eq!(archive.y(), array![[40.0], [60.0]]);
    }
}
