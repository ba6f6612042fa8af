//! Session host
//!
//! Wraps the single-owner registry so it can be shared across threads, and
//! keeps the SQLite snapshot in sync with it.

use parking_lot::RwLock;
use std::sync::Arc;

use keel_session::{
    SessionConfig, SessionHandle, SessionMaker, SessionsHolder, SqliteSessionsStorage,
    StandardSessionMaker,
};
use keel_storage::Database;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

/// Thread-safe handle to the session registry.
///
/// Clones share the same registry. After [`SessionHost::shutdown`] every
/// operation fails with [`CoreError::ShutDown`].
pub struct SessionHost {
    /// Configuration
    config: Config,
    /// Database backing the snapshot
    db: Database,
    /// `None` once shut down
    holder: Arc<RwLock<Option<SessionsHolder>>>,
}

impl SessionHost {
    /// Open the configured database and restore standard sessions
    pub fn new(config: Config) -> Result<Self> {
        Self::with_maker(config, Arc::new(StandardSessionMaker))
    }

    pub fn with_maker(config: Config, maker: Arc<dyn SessionMaker>) -> Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database_path)?;
        Ok(Self::with_database(config, db, maker))
    }

    /// Build on an already-open database
    pub fn with_database(config: Config, db: Database, maker: Arc<dyn SessionMaker>) -> Self {
        let storage = Arc::new(SqliteSessionsStorage::new(db.clone()));
        let holder = SessionsHolder::new(maker, storage);

        tracing::info!(
            session_count = holder.len(),
            autosave = config.autosave,
            "Session host started"
        );

        Self {
            config,
            db,
            holder: Arc::new(RwLock::new(Some(holder))),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn with_holder<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SessionsHolder) -> Result<T>,
    {
        let guard = self.holder.read();
        match guard.as_ref() {
            Some(holder) => f(holder),
            None => Err(CoreError::ShutDown),
        }
    }

    fn with_holder_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SessionsHolder) -> Result<T>,
    {
        let mut guard = self.holder.write();
        match guard.as_mut() {
            Some(holder) => f(holder),
            None => Err(CoreError::ShutDown),
        }
    }

    /// Best-effort: the registry has already changed, so a failed write is
    /// logged and left for the next save.
    fn autosave(&self, holder: &SessionsHolder) {
        if !self.config.autosave {
            return;
        }
        if let Err(e) = holder.persist() {
            tracing::warn!(error = %e, "Failed to autosave sessions");
        }
    }

    // === Session operations ===

    pub fn default_session(&self) -> Result<SessionHandle> {
        self.with_holder_mut(|holder| {
            let before = holder.len();
            let session = holder.default_session();
            if holder.len() != before {
                self.autosave(holder);
            }
            Ok(session)
        })
    }

    pub fn create_session(&self, config: Option<SessionConfig>) -> Result<SessionHandle> {
        self.with_holder_mut(|holder| {
            let session = holder.make(config);
            self.autosave(holder);
            Ok(session)
        })
    }

    pub fn destroy_session(&self, session: &SessionHandle) -> Result<()> {
        self.with_holder_mut(|holder| {
            holder.destroy(session)?;
            self.autosave(holder);
            Ok(())
        })
    }

    pub fn mark_as_default(&self, session: SessionHandle) -> Result<()> {
        self.with_holder_mut(|holder| {
            holder.mark_as_default(session)?;
            self.autosave(holder);
            Ok(())
        })
    }

    pub fn get_session(&self, session_id: &str) -> Result<SessionHandle> {
        self.with_holder(|holder| {
            holder
                .get(session_id)
                .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))
        })
    }

    /// Get all sessions, ordered by id
    pub fn list_sessions(&self) -> Result<Vec<SessionHandle>> {
        self.with_holder(|holder| {
            let mut sessions = holder.all();
            sessions.sort_by(|a, b| a.id().cmp(b.id()));
            Ok(sessions)
        })
    }

    /// Persist the snapshot now, regardless of autosave
    pub fn save(&self) -> Result<()> {
        self.with_holder(|holder| Ok(holder.persist()?))
    }

    /// Persist (if configured) and tear down every session.
    pub fn shutdown(&self) -> Result<()> {
        let holder = self.holder.write().take().ok_or(CoreError::ShutDown)?;

        let saved = if self.config.persist_on_shutdown {
            holder.persist()
        } else {
            Ok(())
        };

        let session_count = holder.len();
        drop(holder);

        tracing::info!(session_count, "Session host shut down");

        saved.map_err(Into::into)
    }
}

impl Clone for SessionHost {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            holder: Arc::clone(&self.holder),
        }
    }
}
