//! Session capability set and the standard implementation

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::SessionState;
use crate::Result;

/// What the registry needs from a session.
///
/// Equality is identity: two handles denote the same session only if they
/// point at the same instance (see [`same_session`]). Config and state use
/// interior mutability so a session can be shared through a [`SessionHandle`].
pub trait Session: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    fn config(&self) -> SessionConfig;

    fn set_config(&self, config: SessionConfig);

    fn state(&self) -> SessionState;

    /// Optional teardown capability. Sessions without one are simply
    /// dropped from the registry on destroy.
    fn as_destroyable(&self) -> Option<&dyn DestroyableSession> {
        None
    }
}

/// Explicit teardown hook a session may expose.
pub trait DestroyableSession {
    /// Release the session's resources and move it to [`SessionState::Destroyed`].
    fn destroy(&self) -> Result<()>;
}

pub type SessionHandle = Arc<dyn Session>;

/// Identity comparison. Ignores vtable pointers, so two handles to the same
/// instance compare equal regardless of how they were coerced.
pub fn same_session(a: &SessionHandle, b: &SessionHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[derive(Debug)]
struct Inner {
    config: SessionConfig,
    state: SessionState,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct StandardSession {
    /// Unique identifier
    id: String,
    /// When the session was created
    created_at: DateTime<Utc>,
    inner: RwLock<Inner>,
}

impl StandardSession {
    pub fn new(id: impl Into<String>, config: SessionConfig) -> Self {
        let now = Utc::now();

        Self {
            id: id.into(),
            created_at: now,
            inner: RwLock::new(Inner {
                config,
                state: SessionState::Active,
                updated_at: now,
            }),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification time
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.inner.read().updated_at
    }

    /// Attempt to transition to a new state
    fn transition_to(&self, new_state: SessionState) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.state.can_transition_to(new_state) {
            return Err(SessionError::InvalidTransition {
                from: inner.state.to_string(),
                to: new_state.to_string(),
            });
        }

        tracing::debug!(
            session_id = %self.id,
            from = %inner.state,
            to = %new_state,
            "Session state transition"
        );

        inner.state = new_state;
        inner.updated_at = Utc::now();
        Ok(())
    }
}

impl Session for StandardSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn config(&self) -> SessionConfig {
        self.inner.read().config.clone()
    }

    fn set_config(&self, config: SessionConfig) {
        let mut inner = self.inner.write();
        inner.config = config;
        inner.updated_at = Utc::now();
    }

    fn state(&self) -> SessionState {
        self.inner.read().state
    }

    fn as_destroyable(&self) -> Option<&dyn DestroyableSession> {
        Some(self)
    }
}

impl DestroyableSession for StandardSession {
    fn destroy(&self) -> Result<()> {
        self.transition_to(SessionState::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = StandardSession::new("s-1", SessionConfig::named("Work"));
        assert_eq!(session.id(), "s-1");
        assert_eq!(session.config().name, "Work");
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.created_at(), session.updated_at());
    }

    #[test]
    fn test_destroy_is_one_way() {
        let session = StandardSession::new("s-1", SessionConfig::default());

        session.destroy().unwrap();
        assert_eq!(session.state(), SessionState::Destroyed);

        let result = session.destroy();
        assert!(matches!(
            result,
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(session.state(), SessionState::Destroyed);
    }

    #[test]
    fn test_set_config() {
        let session = StandardSession::new("s-1", SessionConfig::default());
        session.set_config(SessionConfig::named("Renamed"));
        assert_eq!(session.config().name, "Renamed");
        assert!(session.updated_at() >= session.created_at());
    }

    #[test]
    fn test_identity_not_value() {
        let a: SessionHandle = Arc::new(StandardSession::new("same", SessionConfig::default()));
        let b: SessionHandle = Arc::new(StandardSession::new("same", SessionConfig::default()));
        let a2 = Arc::clone(&a);

        assert!(same_session(&a, &a2));
        assert!(!same_session(&a, &b));
    }
}
