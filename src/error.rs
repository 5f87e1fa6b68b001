//! Error types for the binding layer.

use thiserror::Error;

/// Errors surfaced by the binding.
///
/// Allocation and operation failures are returned synchronously to the
/// caller. Stream faults discovered on a background draining task are
/// delivered as the terminal item of the result channel instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdfError {
    /// The native engine returned a null handle from a constructor
    /// (unknown storage kind, malformed URI, unknown parser name, ...).
    #[error("native engine failed to allocate {what}")]
    Allocation { what: &'static str },

    /// A call was made but the native engine reported failure.
    #[error("{operation} failed: {detail}")]
    OperationFailed {
        operation: &'static str,
        detail: String,
    },

    /// An operation was attempted on a handle that was already released.
    #[error("{what} used after release")]
    UseAfterRelease { what: &'static str },

    /// The native cursor violated its contract, e.g. produced a null item
    /// where an item was required. Fatal to the stream it occurred on.
    #[error("native stream fault: {detail}")]
    StreamFault { detail: String },
}

impl RdfError {
    pub(crate) fn operation(operation: &'static str, detail: impl Into<String>) -> Self {
        RdfError::OperationFailed {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn fault(detail: impl Into<String>) -> Self {
        RdfError::StreamFault {
            detail: detail.into(),
        }
    }
}

pub type RdfResult<T> = Result<T, RdfError>;
