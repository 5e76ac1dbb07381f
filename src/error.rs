//! # Error Types
//!
//! This module defines the error type for the optimizer. Construction errors
//! (`InvalidBounds`, `InsufficientPopulation`, `Configuration`) are reported
//! before any generation runs. Errors raised while a generation is in flight
//! (`Evaluation`, `ShapeMismatch`, `InvalidNumericValue`) abort that
//! generation and leave the archive at its last committed state.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use paretoga::error::{OptimizerError, Result};
//!
//! fn check_population(npop: usize) -> Result<()> {
//!     if npop < 4 {
//!         return Err(OptimizerError::InsufficientPopulation(npop));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_population(3).is_err());
//! assert!(check_population(20).is_ok());
//! ```
//!
//! Using the `ResultExt` trait to add context to foreign errors:
//!
//! ```rust
//! use ndarray::{concatenate, Array2, Axis};
//! use paretoga::error::{Result, ResultExt};
//!
//! fn stack(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
//!     concatenate(Axis(0), &[a.view(), b.view()]).context("Failed to stack populations")
//! }
//!
//! let a = Array2::<f64>::zeros((2, 3));
//! let b = Array2::<f64>::zeros((1, 2));
//! assert!(stack(&a, &b).is_err());
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Error type reported by external collaborators (evaluators and stores).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Which set of bounds an [`OptimizerError::InvalidBounds`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsKind {
    Design,
    Objective,
    Constraint,
}

impl fmt::Display for BoundsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsKind::Design => write!(f, "design"),
            BoundsKind::Objective => write!(f, "objective"),
            BoundsKind::Constraint => write!(f, "constraint"),
        }
    }
}

/// Represents errors that can occur while configuring or running the optimizer.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// A bound pair is not strictly increasing or not finite.
    #[error("Invalid {kind} bounds in dimension {dimension}: lower {lower} must be finite and strictly below upper {upper}")]
    InvalidBounds {
        kind: BoundsKind,
        dimension: usize,
        lower: f64,
        upper: f64,
    },

    /// The population is too small to draw three distinct donors per slot.
    #[error("Insufficient population: npop must be at least 4, got {0}")]
    InsufficientPopulation(usize),

    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The evaluator collaborator failed during a generation.
    #[error("Evaluation failed in generation {generation}: {source}")]
    Evaluation {
        generation: usize,
        #[source]
        source: BoxError,
    },

    /// A matrix does not have the expected shape.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error that occurs when NaN or infinity values are encountered.
    #[error("Invalid numeric value: {0}")]
    InvalidNumericValue(String),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use paretoga::error::ResultExt;
///
/// fn parse(s: &str) -> paretoga::error::Result<f64> {
///     s.parse::<f64>().context("Failed to parse bound")
/// }
///
/// assert!(parse("1.5").is_ok());
/// assert!(parse("abc").is_err());
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to an [`OptimizerError::Other`] prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| OptimizerError::Other(format!("{}: {}", context, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bounds_message() {
        let err = OptimizerError::InvalidBounds {
            kind: BoundsKind::Design,
            dimension: 1,
            lower: 2.0,
            upper: 2.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("design"));
        assert!(msg.contains("dimension 1"));
    }

    #[test]
    fn test_evaluation_error_keeps_source() {
        let source: BoxError = "simulation diverged".into();
        let err = OptimizerError::Evaluation {
            generation: 3,
            source,
        };
        assert!(err.to_string().contains("generation 3"));
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("simulation diverged".to_string())
        );
    }

    #[test]
    fn test_context() {
        let result: std::result::Result<(), std::fmt::Error> = Err(std::fmt::Error);
        match result.context("formatting") {
            Err(OptimizerError::Other(msg)) => assert!(msg.starts_with("formatting: ")),
            _ => panic!("Expected Other error"),
        }
    }
}
