//! Error types for the mining engine.

use thiserror::Error;

/// Failures the mining engine reports to its caller.
///
/// An empty itemset or rule list is not an error; it is returned as an
/// empty collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiningError {
    #[error("Invalid {name} threshold {value}: expected a value in {expected}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Mining deadline exceeded after level {completed_level}")]
    DeadlineExceeded { completed_level: usize },

    #[error("Itemset of {size} items is too large to split into rules (at most {max})")]
    ItemsetTooLarge { size: usize, max: usize },
}

impl MiningError {
    pub(crate) fn invalid_threshold(name: &'static str, value: f64, expected: &'static str) -> Self {
        Self::InvalidThreshold {
            name,
            value,
            expected,
        }
    }
}

/// Result type for engine operations.
pub type MiningResult<T> = std::result::Result<T, MiningError>;

/// Check that `value` lies within `[lo, hi]`, rejecting NaN.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
    expected: &'static str,
) -> MiningResult<()> {
    if value.is_nan() || value < lo || value > hi {
        return Err(MiningError::invalid_threshold(name, value, expected));
    }
    Ok(())
}
