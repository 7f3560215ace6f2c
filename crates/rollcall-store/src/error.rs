//! Error types for the store layer.

/// A fault in the backing store (connectivity, constraint violation).
///
/// This is the only error class a caller may retry with identical input.
/// Every other failure in Rollcall is a decision about the input itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write (unique key, foreign key, ...).
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Errors from resolving a credential to an identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The credential is unknown, expired, or otherwise not accepted.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The identity store itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
