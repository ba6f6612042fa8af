//! Sessions Holder
//!
//! Owns the live sessions and the default session. Restores the last
//! snapshot on construction and destroys everything it tracks when dropped.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::maker::SessionMaker;
use crate::session::{same_session, SessionHandle};
use crate::storage::{SessionRecord, SessionsStorage};
use crate::Result;

/// Single-owner registry. Callers sharing it across threads must provide
/// their own locking.
pub struct SessionsHolder {
    maker: Arc<dyn SessionMaker>,
    storage: Arc<dyn SessionsStorage>,
    /// Live sessions keyed by id
    sessions: HashMap<String, SessionHandle>,
    /// Materialized on first access when nothing was restored
    default: Option<SessionHandle>,
    /// Only lifted during teardown
    can_destroy_default: bool,
}

impl SessionsHolder {
    pub fn new(maker: Arc<dyn SessionMaker>, storage: Arc<dyn SessionsStorage>) -> Self {
        let mut holder = Self {
            maker,
            storage,
            sessions: HashMap::new(),
            default: None,
            can_destroy_default: false,
        };

        // A missing or corrupt snapshot leaves the registry empty
        if let Err(e) = holder.restore_from_storage() {
            tracing::warn!(error = %e, "Failed to restore sessions, starting empty");
        }

        holder
    }

    fn restore_from_storage(&mut self) -> Result<()> {
        let records: Vec<SessionRecord> = self
            .storage
            .restore()?
            .into_iter()
            .filter(|record| !record.id.is_empty())
            .collect();

        let mut default = None;
        for record in &records {
            let session = self.maker.session(&record.id, record.config.clone());
            // First default record wins, and it's that record's own session
            let is_default_record = record.is_default && default.is_none();
            if is_default_record {
                default = Some(Arc::clone(&session));
            }

            // Duplicate ids: the first record stays tracked
            if self.sessions.contains_key(session.id()) {
                tracing::warn!(session_id = %session.id(), "Skipping duplicate session record");
                if !is_default_record {
                    discard(&session);
                }
                continue;
            }

            self.insert(session);
        }
        self.default = default;

        tracing::info!(
            session_count = self.sessions.len(),
            default_id = ?self.default.as_ref().map(|s| s.id().to_string()),
            "Restored sessions"
        );

        Ok(())
    }

    /// The default session, created with the default config on first access.
    pub fn default_session(&mut self) -> SessionHandle {
        if let Some(session) = &self.default {
            return Arc::clone(session);
        }

        let session = self.make(None);
        self.default = Some(Arc::clone(&session));

        tracing::info!(session_id = %session.id(), "Materialized default session");

        session
    }

    /// Create and track a new session
    pub fn make(&mut self, config: Option<SessionConfig>) -> SessionHandle {
        let config = config.unwrap_or_default();
        let session = self.maker.session(&generate_session_id(), config.clone());
        // The maker may not have applied the config it was given
        session.set_config(config);

        self.insert(Arc::clone(&session));

        tracing::info!(
            session_id = %session.id(),
            session_name = %session.config().name,
            "Created session"
        );

        session
    }

    /// Destroy a session and stop tracking it.
    ///
    /// The default session is refused until teardown, and a session already
    /// in the destroyed state is refused always.
    pub fn destroy(&mut self, session: &SessionHandle) -> Result<()> {
        if !self.can_destroy_default && self.is_default(session) {
            return Err(SessionError::CannotDestroyDefaultSession);
        }

        if session.state().is_destroyed() {
            // Destroyed behind the registry's back; stop tracking it anyway
            self.remove(session);
            return Err(SessionError::AlreadyDestroyed(session.id().to_string()));
        }

        if let Some(destroyable) = session.as_destroyable() {
            destroyable.destroy()?;
        }

        self.remove(session);

        tracing::info!(session_id = %session.id(), "Destroyed session");

        Ok(())
    }

    /// Make `session` the default.
    ///
    /// Membership isn't required; a session the registry doesn't track can
    /// still be promoted.
    pub fn mark_as_default(&mut self, session: SessionHandle) -> Result<()> {
        if session.state().is_destroyed() {
            return Err(SessionError::AlreadyDestroyed(session.id().to_string()));
        }

        if !self.contains(&session) {
            tracing::debug!(session_id = %session.id(), "Promoting untracked session");
        }

        tracing::info!(session_id = %session.id(), "Marked session as default");

        self.default = Some(session);
        Ok(())
    }

    /// All live sessions, in no particular order
    pub fn all(&self) -> Vec<SessionHandle> {
        self.sessions.values().cloned().collect()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).cloned()
    }

    pub fn contains(&self, session: &SessionHandle) -> bool {
        self.sessions
            .get(session.id())
            .is_some_and(|member| same_session(member, session))
    }

    /// Identity check against the current default. Never materializes one.
    pub fn is_default(&self, session: &SessionHandle) -> bool {
        self.default
            .as_ref()
            .is_some_and(|default| same_session(default, session))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Records for every live, non-ephemeral session, sorted by id.
    ///
    /// Only a tracked default is flagged; an untracked one isn't written.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self
            .sessions
            .values()
            .filter_map(|session| {
                let config = session.config();
                if config.ephemeral {
                    return None;
                }
                Some(SessionRecord {
                    id: session.id().to_string(),
                    config,
                    is_default: self.is_default(session),
                })
            })
            .collect();

        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Write the current snapshot to storage
    pub fn persist(&self) -> Result<()> {
        let records = self.snapshot();
        self.storage.persist(&records)?;

        tracing::debug!(record_count = records.len(), "Persisted sessions");

        Ok(())
    }

    fn insert(&mut self, session: SessionHandle) {
        let session_id = session.id().to_string();
        if let Some(previous) = self.sessions.insert(session_id.clone(), session) {
            if !self.contains(&previous) {
                tracing::warn!(session_id = %session_id, "Replaced session with duplicate id");
                if !self.is_default(&previous) {
                    discard(&previous);
                }
            }
        }
    }

    fn remove(&mut self, session: &SessionHandle) {
        if self.contains(session) {
            self.sessions.remove(session.id());
        }
    }

    fn teardown(&mut self) {
        self.can_destroy_default = true;

        let sessions = self.all();
        for session in &sessions {
            if let Err(e) = self.destroy(session) {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %e,
                    "Failed to destroy session during teardown"
                );
            }
        }

        tracing::debug!(session_count = sessions.len(), "Tore down sessions");
    }
}

impl Drop for SessionsHolder {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Run the destroy hook of a session the registry won't track
fn discard(session: &SessionHandle) {
    if let Some(destroyable) = session.as_destroyable() {
        if let Err(e) = destroyable.destroy() {
            tracing::warn!(
                session_id = %session.id(),
                error = %e,
                "Failed to destroy discarded session"
            );
        }
    }
}

/// Fixed-length opaque id
fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}
