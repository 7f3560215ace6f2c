//! Error types for the decision engine.

use rollcall_store::StoreError;

/// A failure that is not a decision about the presented token.
///
/// Rejections are [`Outcome::Rejected`](crate::Outcome::Rejected), not
/// errors. This type only carries faults from the backing stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    /// A session or attendance store call failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl AttendanceError {
    /// Whether the caller may retry the identical request.
    ///
    /// Always `true` today; kept as a method so callers do not match on
    /// variants to decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
