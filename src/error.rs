//! Error types for LCI encoding and decoding.
//!
//! Only faults that stop a call are errors. Anomalies in subelement content
//! are reported through [`crate::Diagnostics`] instead.

use thiserror::Error;

/// Errors that abort an LCI encode or decode call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LciError {
    /// A character that is not a hexadecimal digit was found in the wire text
    #[error("invalid hex digit {found:?} at character {index}")]
    InvalidHexDigit { index: usize, found: char },

    /// An access would read or write past the end of the buffer
    #[error("out of bounds: {len} units at offset {offset}, only {available} available")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// Bit count outside 0..=64
    #[error("invalid bit count: {0} (must be 0-64)")]
    InvalidBitCount(usize),

    /// Input ended before a mandatory structure (header, subelement ID/length)
    #[error("truncated input: need {needed} octets, got {available}")]
    Truncated { needed: usize, available: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LciError>;
