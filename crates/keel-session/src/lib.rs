//! Keel Session Registry
//!
//! - A session is created only through a [`SessionMaker`]
//! - Exactly one session is the default; it cannot be destroyed outside teardown
//! - A destroyed session can't be destroyed again or promoted
//! - Prior sessions are restored from [`SessionsStorage`] on construction (best-effort)

mod config;
mod error;
mod holder;
mod maker;
mod session;
mod state;
mod storage;

pub use config::SessionConfig;
pub use error::SessionError;
pub use holder::SessionsHolder;
pub use maker::{SessionMaker, StandardSessionMaker};
pub use session::{same_session, DestroyableSession, Session, SessionHandle, StandardSession};
pub use state::SessionState;
pub use storage::{MemorySessionsStorage, SessionRecord, SessionsStorage, SqliteSessionsStorage};

pub type Result<T> = std::result::Result<T, SessionError>;
