//! Error type shared by every prehash entry point.

use thiserror::Error;

use crate::pipeline::PrehashRun;

/// Errors surfaced by configuration loading and the prehash driver.
///
/// Per-index work never fails; everything here is detected either at
/// startup or at the driver level between phases.
#[derive(Debug, Error)]
pub enum PrehashError {
    #[error("configuration error: {0}")]
    /// `N`, `Q`, the threshold or the buffer layout is zero or inconsistent.
    Configuration(String),
    #[error("packed input has {actual} bytes, layout expects {expected}")]
    /// The packed input buffer does not match the configured layout.
    BufferLength {
        /// Byte length required by the layout.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },
    #[error("update did not converge after {rounds} rounds ({remaining} indices still invalid)")]
    /// The Update phase hit the round bound with a non-empty invalid list.
    ConvergenceExceeded {
        /// Number of Update rounds executed.
        rounds: u32,
        /// Length of the invalid list when the driver gave up.
        remaining: usize,
        /// Unfinalised array and statistics at the point the driver gave up.
        /// Filled in by the drivers; `None` from `Prehasher::converge`, whose
        /// caller still holds the array.
        partial: Option<Box<PrehashRun>>,
    },
    #[error("final phase invoked with {pending} unresolved invalid indices")]
    /// A Final phase was requested before the invalid list was empty.
    PreconditionViolation {
        /// Length of the outstanding invalid list.
        pending: usize,
    },
    #[error("invalid index {index} outside 1..={n}")]
    /// An externally supplied invalid list referenced a slot that does not exist.
    InvalidIndex {
        /// Offending 1-based index.
        index: u32,
        /// Array size.
        n: usize,
    },
    #[error("io error: {0}")]
    /// Underlying filesystem failure.
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    /// Configuration or buffer decoding failure.
    Decode(String),
}

impl From<serde_json::Error> for PrehashError {
    fn from(err: serde_json::Error) -> Self {
        PrehashError::Decode(err.to_string())
    }
}

impl From<hex::FromHexError> for PrehashError {
    fn from(err: hex::FromHexError) -> Self {
        PrehashError::Decode(err.to_string())
    }
}
