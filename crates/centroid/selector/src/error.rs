//! Selector error types.
//!
//! The selector is total over well-shaped input, so the only failure is a
//! caller handing it something of the wrong shape.

use thiserror::Error;

/// Errors raised when raw input does not have the shape the selector needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The centroid sequence did not contain exactly eight points.
    #[error("expected {expected} centroids, got {actual}")]
    CentroidCount { expected: usize, actual: usize },

    /// The mask value does not fit in eight bits.
    #[error("mask {0} is outside the 8-bit range 0..=255")]
    MaskOutOfRange(i64),
}

/// Result type for selector operations.
pub type SelectorResult<T> = Result<T, SelectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_count_display() {
        let e = SelectorError::CentroidCount {
            expected: 8,
            actual: 7,
        };
        assert_eq!(e.to_string(), "expected 8 centroids, got 7");
    }

    #[test]
    fn mask_out_of_range_display() {
        let e = SelectorError::MaskOutOfRange(256);
        assert!(e.to_string().contains("256"));
    }

    #[test]
    fn error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SelectorError::MaskOutOfRange(-1));
        assert!(e.to_string().contains("-1"));
    }
}
