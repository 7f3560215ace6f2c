//! The authorization guard for lifecycle operations.
//!
//! Route middleware usually checks roles before a request reaches the
//! core. The lifecycle manager checks again on every call, through this one
//! function, so a direct caller that skipped the middleware is still
//! refused.

use rollcall_store::Identity;
use rollcall_token::ParticipantId;

use crate::SessionError;

/// Proof that the caller holds the coordinator role.
///
/// Only [`authorize`] can build one (the field is private), so a function
/// that takes a `&Coordinator` cannot be reached without passing the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinator {
    participant_id: ParticipantId,
}

impl Coordinator {
    /// Who was authorized.
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }
}

/// Checks that `caller` is a coordinator.
///
/// # Errors
/// Returns [`SessionError::Unauthorized`] for any other role.
pub fn authorize(caller: &Identity) -> Result<Coordinator, SessionError> {
    if !caller.is_coordinator() {
        tracing::warn!(
            participant_id = %caller.participant_id,
            role = ?caller.role,
            "lifecycle call refused: not a coordinator"
        );
        return Err(SessionError::Unauthorized(caller.participant_id.clone()));
    }
    Ok(Coordinator {
        participant_id: caller.participant_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_coordinator_returns_capability() {
        let cap = authorize(&Identity::coordinator("alice")).expect("coordinator passes");
        assert_eq!(cap.participant_id(), &ParticipantId::new("alice"));
    }

    #[test]
    fn test_authorize_participant_returns_unauthorized() {
        let result = authorize(&Identity::participant("bob"));
        assert_eq!(result, Err(SessionError::Unauthorized(ParticipantId::new("bob"))));
    }
}
