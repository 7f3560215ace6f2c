//! In-process store implementations.
//!
//! [`MemoryStore`] holds sessions and attendance records in two
//! `HashMap`s behind `tokio::sync::RwLock`s and implements both
//! [`SessionStore`] and [`AttendanceStore`]. Keeping both tables in one
//! value is what lets [`SessionStore::delete`] cascade to attendance the
//! way a foreign key with `ON DELETE CASCADE` would.
//!
//! Because both traits have a `get`/`put`, calling them on a concrete
//! `MemoryStore` needs fully-qualified syntax:
//! `SessionStore::get(&store, &id)`.

use std::collections::HashMap;

use rollcall_token::{ParticipantId, SessionId};
use tokio::sync::RwLock;

use crate::{
    AttendanceKey, AttendanceRecord, AttendanceStore, Identity, IdentityError,
    IdentityStore, Session, SessionStore, StoreError,
};

/// Sessions and attendance records held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    records: RwLock<HashMap<AttendanceKey, AttendanceRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    sessions
}

fn by_key(mut records: Vec<AttendanceRecord>) -> Vec<AttendanceRecord> {
    records.sort_by(|a, b| {
        (&a.session_id, &a.participant_id).cmp(&(&b.session_id, &b.participant_id))
    });
    records
}

impl SessionStore for MemoryStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn put(&self, session: Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError> {
        // Sessions first, then records; nothing else takes both locks.
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_none() {
            return Ok(false);
        }
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|(_, session_id), _| session_id != id);
        tracing::debug!(
            session_id = %id,
            cascaded = before - records.len(),
            "session deleted from memory store"
        );
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read().await.values().cloned().collect();
        Ok(newest_first(sessions))
    }

    async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect();
        Ok(newest_first(sessions))
    }
}

impl AttendanceStore for MemoryStore {
    async fn get(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let key = (participant_id.clone(), session_id.clone());
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn put(&self, record: AttendanceRecord) -> Result<(), StoreError> {
        // Sessions then records, the same order as `delete`. The sessions
        // guard stays held so a delete cannot cascade between the check
        // and the insert.
        let sessions = self.sessions.read().await;
        if !sessions.contains_key(&record.session_id) {
            return Err(StoreError::Conflict(format!(
                "session {} does not exist",
                record.session_id
            )));
        }
        self.records.write().await.insert(record.key(), record);
        drop(sessions);
        Ok(())
    }

    async fn list_by_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let records = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.participant_id == participant_id)
            .cloned()
            .collect();
        Ok(by_key(records))
    }

    async fn list_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let records = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect();
        Ok(by_key(records))
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let records = self.records.read().await.values().cloned().collect();
        Ok(by_key(records))
    }
}

/// Credentials mapped to identities, held in memory.
///
/// Useful for tests and demos where "authentication" is a lookup table.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl MemoryIdentityStore {
    /// Creates an empty identity store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration, for setting up a store before sharing it.
    pub fn with_identity(mut self, credential: impl Into<String>, identity: Identity) -> Self {
        self.identities.get_mut().insert(credential.into(), identity);
        self
    }

    /// Registers (or replaces) the identity behind `credential`.
    pub async fn register(&self, credential: impl Into<String>, identity: Identity) {
        self.identities
            .write()
            .await
            .insert(credential.into(), identity);
    }

    /// Forgets `credential`. Later resolutions fail as unauthenticated.
    pub async fn revoke(&self, credential: &str) -> bool {
        self.identities.write().await.remove(credential).is_some()
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn resolve(&self, credential: &str) -> Result<Identity, IdentityError> {
        self.identities
            .read()
            .await
            .get(credential)
            .cloned()
            .ok_or(IdentityError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use rollcall_token::AttendanceKind;

    use super::*;
    use crate::Provenance;

    fn session(id: &str, created_at: u64) -> Session {
        Session::new(SessionId::new(id), id, AttendanceKind::CheckIn, created_at)
    }

    fn checked_in(participant: &str, session: &str) -> AttendanceRecord {
        let mut r = AttendanceRecord::new(ParticipantId::new(participant), SessionId::new(session));
        r.check_in(1, &Provenance::default()).unwrap();
        r
    }

    #[tokio::test]
    async fn test_session_put_then_get_returns_copy() {
        let store = MemoryStore::new();
        SessionStore::put(&store, session("s1", 0)).await.unwrap();

        let loaded = SessionStore::get(&store, &SessionId::new("s1")).await.unwrap();

        assert_eq!(loaded.map(|s| s.name), Some("s1".to_string()));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_list_active_filters() {
        let store = MemoryStore::new();
        SessionStore::put(&store, session("old", 1)).await.unwrap();
        SessionStore::put(&store, session("new", 2)).await.unwrap();
        let mut inactive = session("off", 3);
        inactive.active = false;
        SessionStore::put(&store, inactive).await.unwrap();

        let all: Vec<_> = SessionStore::list(&store).await.unwrap();
        let active = store.list_active().await.unwrap();

        fn ids(v: &[Session]) -> Vec<String> {
            v.iter().map(|s| s.id.to_string()).collect()
        }
        assert_eq!(ids(&all), ["off", "new", "old"]);
        assert_eq!(ids(&active), ["new", "old"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_attendance_records() {
        let store = MemoryStore::new();
        SessionStore::put(&store, session("s1", 0)).await.unwrap();
        SessionStore::put(&store, session("s2", 0)).await.unwrap();
        AttendanceStore::put(&store, checked_in("p1", "s1")).await.unwrap();
        AttendanceStore::put(&store, checked_in("p1", "s2")).await.unwrap();

        let deleted = SessionStore::delete(&store, &SessionId::new("s1")).await.unwrap();

        assert!(deleted);
        let left = AttendanceStore::list(&store).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].session_id, SessionId::new("s2"));
    }

    #[tokio::test]
    async fn test_delete_unknown_session_returns_false() {
        let store = MemoryStore::new();
        let deleted = SessionStore::delete(&store, &SessionId::new("nope")).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_attendance_put_for_missing_session_is_conflict() {
        let store = MemoryStore::new();

        let result = AttendanceStore::put(&store, checked_in("p1", "ghost")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_attendance_list_filters() {
        let store = MemoryStore::new();
        SessionStore::put(&store, session("s1", 0)).await.unwrap();
        SessionStore::put(&store, session("s2", 0)).await.unwrap();
        AttendanceStore::put(&store, checked_in("p1", "s1")).await.unwrap();
        AttendanceStore::put(&store, checked_in("p2", "s1")).await.unwrap();
        AttendanceStore::put(&store, checked_in("p1", "s2")).await.unwrap();

        let p1 = store.list_by_participant(&ParticipantId::new("p1")).await.unwrap();
        let s1 = store.list_by_session(&SessionId::new("s1")).await.unwrap();

        assert_eq!(p1.len(), 2);
        assert_eq!(s1.len(), 2);
        assert!(s1.iter().all(|r| r.session_id == SessionId::new("s1")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_attendance_put_racing_delete_leaves_no_orphans() {
        let store = std::sync::Arc::new(MemoryStore::new());

        for i in 0..500 {
            let id = format!("race-{i}");
            SessionStore::put(&*store, session(&id, i)).await.unwrap();

            let writer = {
                let store = std::sync::Arc::clone(&store);
                let record = checked_in("p1", &id);
                tokio::spawn(async move { AttendanceStore::put(&*store, record).await })
            };
            let deleter = {
                let store = std::sync::Arc::clone(&store);
                let id = SessionId::new(id.as_str());
                tokio::spawn(async move { SessionStore::delete(&*store, &id).await })
            };
            let put = writer.await.unwrap();
            assert!(deleter.await.unwrap().unwrap());

            // Either the put lost (Conflict) or the cascade removed its row.
            if let Err(e) = put {
                assert!(matches!(e, StoreError::Conflict(_)));
            }
            let left = store.list_by_session(&SessionId::new(id.as_str())).await.unwrap();
            assert!(left.is_empty(), "orphan record for {id}");
        }
    }

    #[tokio::test]
    async fn test_identity_resolve_known_and_unknown() {
        let store = MemoryIdentityStore::new()
            .with_identity("alice-key", Identity::coordinator("alice"));

        let alice = store.resolve("alice-key").await.unwrap();
        let nobody = store.resolve("bogus").await;

        assert!(alice.is_coordinator());
        assert_eq!(nobody, Err(IdentityError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_identity_revoke_makes_credential_unauthenticated() {
        let store = MemoryIdentityStore::new();
        store.register("bob-key", Identity::participant("bob")).await;

        assert!(store.revoke("bob-key").await);

        assert_eq!(store.resolve("bob-key").await, Err(IdentityError::Unauthenticated));
    }
}
