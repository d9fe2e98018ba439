//! Host error codes

use crate::types::KeyHandle;
use thiserror::Error;

/// Result type for host store calls
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by the host store
///
/// These mirror the status codes of a native registry API. Callers are
/// expected to treat [`HostError::NoMoreItems`] as the normal end of an
/// enumeration and [`HostError::MoreData`] as a request to retry with a
/// larger buffer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum HostError {
    /// The named key or value does not exist
    #[error("not found")]
    NotFound,

    /// The caller lacks the rights requested
    #[error("access denied")]
    AccessDenied,

    /// Enumeration ordinal is past the last item
    #[error("no more items")]
    NoMoreItems,

    /// The supplied buffer is smaller than the data
    #[error("buffer too small ({required} bytes required)")]
    MoreData { required: usize },

    /// The handle is not open (or was never valid)
    #[error("invalid handle {0}")]
    InvalidHandle(KeyHandle),

    /// Any other host failure, by raw code
    #[error("host failure (code {0})")]
    Other(u32),
}

impl HostError {
    /// Returns the native status code for this error
    pub fn code(&self) -> u32 {
        match self {
            HostError::NotFound => 2,
            HostError::AccessDenied => 5,
            HostError::InvalidHandle(_) => 6,
            HostError::MoreData { .. } => 234,
            HostError::NoMoreItems => 259,
            HostError::Other(code) => *code,
        }
    }

    /// Returns true if this marks the end of an enumeration
    pub fn is_no_more_items(&self) -> bool {
        matches!(self, HostError::NoMoreItems)
    }
}
