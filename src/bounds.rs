//! # Bounds
//!
//! Affine mapping between the unit hypercube and physical variable bounds.
//!
//! The optimizer searches in normalized space (`[0,1]` per dimension) and hands
//! physical values to the evaluator. Objective bounds are reused the same way to
//! bring objectives of different scales onto a comparable range before ranking.
//!
//! ```rust
//! use ndarray::array;
//! use paretoga::bounds::Bounds;
//! use paretoga::error::BoundsKind;
//!
//! let bounds = Bounds::new(BoundsKind::Design, &[(-5.0, 5.0), (0.0, 10.0)]).unwrap();
//! let u = array![[0.5, 0.25]];
//! let x = bounds.to_physical(&u.view()).unwrap();
//! assert_eq!(x, array![[0.0, 2.5]]);
//! assert_eq!(bounds.to_normalized(&x.view()).unwrap(), u);
//! ```

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{BoundsKind, OptimizerError, Result};

/// Validated lower/upper bounds, one pair per dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Builds bounds from `(lower, upper)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidBounds`] for the first dimension where a bound
    /// is not finite or `upper <= lower`.
    pub fn new(kind: BoundsKind, pairs: &[(f64, f64)]) -> Result<Self> {
        for (dimension, &(lower, upper)) in pairs.iter().enumerate() {
            if !lower.is_finite() || !upper.is_finite() || upper <= lower {
                return Err(OptimizerError::InvalidBounds {
                    kind,
                    dimension,
                    lower,
                    upper,
                });
            }
        }

        Ok(Self {
            lower: pairs.iter().map(|&(l, _)| l).collect(),
            upper: pairs.iter().map(|&(_, u)| u).collect(),
        })
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> ArrayView1<'_, f64> {
        self.lower.view()
    }

    pub fn upper(&self) -> ArrayView1<'_, f64> {
        self.upper.view()
    }

    /// Per-dimension width `upper - lower`.
    pub fn width(&self) -> Array1<f64> {
        &self.upper - &self.lower
    }

    /// Maps a `[n, dim]` matrix from the unit hypercube to physical values.
    pub fn to_physical(&self, u: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_columns(u)?;
        Ok(to_physical(u, &self.lower.view(), &self.upper.view()))
    }

    /// Maps a `[n, dim]` matrix of physical values onto the unit hypercube.
    pub fn to_normalized(&self, x: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_columns(x)?;
        Ok(to_normalized(x, &self.lower.view(), &self.upper.view()))
    }

    /// Normalizes a single row.
    pub fn normalize_row(&self, x: &ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if x.len() != self.dim() {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected a row of {} values, got {}",
                self.dim(),
                x.len()
            )));
        }
        Ok((x - &self.lower) / &self.width())
    }

    fn check_columns(&self, m: &ArrayView2<'_, f64>) -> Result<()> {
        if m.ncols() != self.dim() {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected {} columns, got {}",
                self.dim(),
                m.ncols()
            )));
        }
        Ok(())
    }
}

/// `lb + u * (ub - lb)`, elementwise over the rows of `u`.
///
/// Callers guarantee `ub > lb`; [`Bounds`] enforces it at construction.
pub fn to_physical(
    u: &ArrayView2<'_, f64>,
    lb: &ArrayView1<'_, f64>,
    ub: &ArrayView1<'_, f64>,
) -> Array2<f64> {
    let width = ub - lb;
    u * &width + lb
}

/// `(x - lb) / (ub - lb)`, elementwise over the rows of `x`.
pub fn to_normalized(
    x: &ArrayView2<'_, f64>,
    lb: &ArrayView1<'_, f64>,
    ub: &ArrayView1<'_, f64>,
) -> Array2<f64> {
    let width = ub - lb;
    (x - lb) / &width
}
