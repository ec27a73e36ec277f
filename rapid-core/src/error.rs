//! Error types for rapid bitstreams and generators.
//!
//! Only expected, recoverable outcomes are represented here. Broken
//! invariants (empty groups, mismatched handles, out of range draw widths)
//! are programming errors and panic instead.

use thiserror::Error;

/// Main error type for rapid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RapidError {
    /// A buffered bitstream ran out of words mid-draw.
    ///
    /// During shrinking this only means the candidate buffer is too short
    /// for the code path it drove; the attempt should be abandoned.
    #[error("bitstream overrun after {drawn} words")]
    Overrun { drawn: usize },

    /// A filtering generator never produced an acceptable value.
    #[error("generator {label:?} rejected {tries} values in a row")]
    Rejected { label: String, tries: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl RapidError {
    /// Whether this error signals an exhausted replay buffer.
    pub fn is_overrun(&self) -> bool {
        matches!(self, RapidError::Overrun { .. })
    }

    /// Whether the attempt that produced this error should simply be
    /// skipped rather than reported.
    pub fn is_invalid_data(&self) -> bool {
        matches!(
            self,
            RapidError::Overrun { .. } | RapidError::Rejected { .. }
        )
    }
}

/// Result type for rapid operations.
pub type Result<T> = std::result::Result<T, RapidError>;
