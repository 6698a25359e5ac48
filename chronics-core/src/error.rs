//! Errors raised by the time series contract.
use thiserror::Error;

/// Failures surfaced to the environment driver.
///
/// Running out of data is not an error: per-step operations signal
/// exhaustion with `Ok(None)` and [`Handler::done`](crate::Handler::done).
#[derive(Debug, Error)]
pub enum ChronicsError {
    /// An operation was invoked on a handler whose role does not implement it.
    #[error("handler \"{array_name}\" does not support `{operation}`")]
    NotSupported {
        /// Name of the operation that was invoked.
        operation: &'static str,
        /// Quantity served by the handler.
        array_name: String,
    },

    /// Required configuration was missing when a lifecycle or stepping
    /// operation was invoked.
    #[error("handler \"{array_name}\" is not configured: {reason}")]
    NotConfigured {
        /// Quantity served by the handler.
        array_name: String,
        /// What was missing.
        reason: String,
    },

    /// A key was looked up in an injection record that does not contain it.
    #[error("Key error: {0}")]
    RecordKeyError(String),
}
