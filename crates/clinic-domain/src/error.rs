//! Errors raised by sibling operations

use crate::PatientId;
use thiserror::Error;

/// Errors from the clique maintainer, generic over the backing store's error
///
/// Storage-level invariant failures (such as an attempted self-loop edge)
/// are reported by the store itself and arrive wrapped in `Store`.
#[derive(Error, Debug)]
pub enum SiblingError<E> {
    /// Referenced patient does not exist
    #[error("Patient not found: {0}")]
    NotFound(PatientId),

    /// Operation rejected before touching storage
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Store(#[source] E),
}
