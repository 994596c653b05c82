//! Error types for the Spatial Pooler.

use thiserror::Error;

/// Errors raised while building or driving a `SpatialPooler`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolerError {
    /// A configuration value is invalid. Construction fails and no pooler is returned.
    #[error("invalid configuration for '{name}': {message}")]
    Configuration {
        /// Name of the offending parameter.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A column or input index lies outside its valid interval.
    #[error("index {index} out of range (len: {len})")]
    OutOfRange {
        /// The invalid index.
        index: usize,
        /// Size of the indexed collection.
        len: usize,
    },

    /// An input vector does not have `num_inputs` entries.
    #[error("input has {actual} entries, expected {expected}")]
    DimensionMismatch {
        /// The pooler's number of inputs.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
}

impl PoolerError {
    pub(crate) fn configuration(name: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            name,
            message: message.into(),
        }
    }
}

/// Result type alias using `PoolerError`.
pub type Result<T> = std::result::Result<T, PoolerError>;

/// Fails with `OutOfRange` unless `index < len`.
#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(PoolerError::OutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PoolerError::configuration("potential_pct", "must be in (0, 1]");
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'potential_pct': must be in (0, 1]"
        );
        assert_eq!(
            PoolerError::DimensionMismatch {
                expected: 10,
                actual: 9
            }
            .to_string(),
            "input has 9 entries, expected 10"
        );
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(3, 4).is_ok());
        assert_eq!(
            check_index(4, 4),
            Err(PoolerError::OutOfRange { index: 4, len: 4 })
        );
    }
}
