//! Keel Core
//!
//! Host-facing entry point: opens the database, restores the session
//! registry and serializes access to it.

mod config;
mod error;
mod host;

pub use config::Config;
pub use error::CoreError;
pub use host::SessionHost;

// Re-export core components
pub use keel_session::{
    same_session, DestroyableSession, MemorySessionsStorage, Session, SessionConfig,
    SessionError, SessionHandle, SessionMaker, SessionRecord, SessionState, SessionsHolder,
    SessionsStorage, SqliteSessionsStorage, StandardSession, StandardSessionMaker,
};
pub use keel_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
