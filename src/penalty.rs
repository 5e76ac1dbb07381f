//! # Penalty
//!
//! Converts raw constraint values into penalties that are injected into the
//! ranking criteria. A constraint value inside its bounds costs nothing; a value
//! outside costs `offset + scale * violation / width`, where `width` is the span
//! of the constraint bounds. With objectives normalized to `[0,1]`, the default
//! offset of `1.0` places every infeasible design strictly behind the attainable
//! objective range.
//!
//! ```rust
//! use ndarray::array;
//! use paretoga::bounds::Bounds;
//! use paretoga::error::BoundsKind;
//! use paretoga::penalty::PenaltyPolicy;
//!
//! let cbounds = Bounds::new(BoundsKind::Constraint, &[(2.0, 8.0)]).unwrap();
//! let policy = PenaltyPolicy::default();
//! let p = policy.penalties(&array![[5.0], [1.0], [11.0]].view(), &cbounds).unwrap();
//! assert_eq!(p, array![[0.0], [1.0 + 1.0 / 6.0], [1.5]]);
//! ```

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

use crate::{
    bounds::Bounds,
    error::{OptimizerError, Result},
};

/// Parameters of the constraint-violation to penalty conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyPolicy {
    /// Flat penalty added to any violated constraint.
    pub offset: f64,
    /// Multiplier of the violation magnitude, relative to the bound width.
    pub scale: f64,
}

impl PenaltyPolicy {
    pub fn new(offset: f64, scale: f64) -> Result<Self> {
        let policy = Self { offset, scale };
        policy.validate()?;
        Ok(policy)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(OptimizerError::Configuration(format!(
                "Penalty offset must be finite and non-negative, got {}",
                self.offset
            )));
        }
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(OptimizerError::Configuration(format!(
                "Penalty scale must be finite and non-negative, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Penalty of a single constraint value against `[lower, upper]`.
    pub fn penalty(&self, value: f64, lower: f64, upper: f64) -> f64 {
        let violation = (lower - value).max(0.0) + (value - upper).max(0.0);
        if violation > 0.0 {
            self.offset + self.scale * violation / (upper - lower)
        } else {
            0.0
        }
    }

    /// Penalty matrix `[n, cdim]` for a constraint matrix `c` of the same shape.
    pub fn penalties(&self, c: &ArrayView2<'_, f64>, cbounds: &Bounds) -> Result<Array2<f64>> {
        if c.ncols() != cbounds.dim() {
            return Err(OptimizerError::ShapeMismatch(format!(
                "expected {} constraint columns, got {}",
                cbounds.dim(),
                c.ncols()
            )));
        }

        let mut p = Array2::zeros(c.raw_dim());
        for (k, (mut p_col, c_col)) in p
            .axis_iter_mut(Axis(1))
            .zip(c.axis_iter(Axis(1)))
            .enumerate()
        {
            let (lower, upper) = (cbounds.lower()[k], cbounds.upper()[k]);
            Zip::from(&mut p_col)
                .and(&c_col)
                .for_each(|p, &v| *p = self.penalty(v, lower, upper));
        }
        Ok(p)
    }
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            offset: 1.0,
            scale: 1.0,
        }
    }
}

/// Total penalty per individual, the row sums of a penalty matrix.
pub fn total_penalty(p: &ArrayView2<'_, f64>) -> Array1<f64> {
    p.sum_axis(Axis(1))
}

/// Ranking criteria: normalized objectives with each row's total penalty added
/// to every objective column.
pub fn penalized_objectives(y_norm: &ArrayView2<'_, f64>, p: &ArrayView2<'_, f64>) -> Array2<f64> {
    let total = total_penalty(p).insert_axis(Axis(1));
    y_norm + &total
}
