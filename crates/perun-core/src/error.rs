//! Error types for the distance scan engine.
//!
//! Every failure is detected synchronously at call entry and indicates a
//! contract violation by the caller, never a transient condition. On any
//! error the output buffer is left untouched and must be discarded.

use thiserror::Error;

/// Status code returned for a successful call at the C ABI boundary.
pub const STATUS_OK: i32 = 0;
/// Status code for [`ScanError::InvalidParameter`].
pub const STATUS_INVALID_PARAMETER: i32 = -1;
/// Status code for [`ScanError::InvalidBuffer`].
pub const STATUS_INVALID_POINTER: i32 = -2;
/// Status code for [`ScanError::UnsafeCopy`].
pub const STATUS_UNSAFE_MEMORY: i32 = -3;

/// Scan engine error kinds.
///
/// The three variants map 1:1 onto the stable status codes exposed at the
/// C ABI boundary (`-1`, `-2`, `-3`); `0` is success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A dimension or count is outside its documented bounds, or the
    /// stored element width has no kernel in this engine.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A required pointer is null, or a destination buffer's capacity is
    /// smaller than what the call needs.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    /// A tail-block copy would overflow its destination even though the
    /// top-level capacity check passed. No bytes were written.
    #[error("unsafe copy: destination capacity {dst} is smaller than source length {src}")]
    UnsafeCopy {
        /// Source length in elements.
        src: usize,
        /// Destination capacity in elements.
        dst: usize,
    },

    /// Layered configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Stable integer status code for the C ABI boundary.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::InvalidParameter(_) | Self::Config(_) => STATUS_INVALID_PARAMETER,
            Self::InvalidBuffer(_) => STATUS_INVALID_POINTER,
            Self::UnsafeCopy { .. } => STATUS_UNSAFE_MEMORY,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ScanError>;
