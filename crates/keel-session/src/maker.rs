//! Session factories

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::session::{SessionHandle, StandardSession};

/// Builds a session bound to an id.
///
/// Must not fail. The registry may call it more than once for the same
/// `(id, config)` pair and does not rely on getting the same instance back.
pub trait SessionMaker: Send + Sync {
    fn session(&self, id: &str, config: SessionConfig) -> SessionHandle;
}

impl<F> SessionMaker for F
where
    F: Fn(&str, SessionConfig) -> SessionHandle + Send + Sync,
{
    fn session(&self, id: &str, config: SessionConfig) -> SessionHandle {
        self(id, config)
    }
}

/// Produces [`StandardSession`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSessionMaker;

impl SessionMaker for StandardSessionMaker {
    fn session(&self, id: &str, config: SessionConfig) -> SessionHandle {
        Arc::new(StandardSession::new(id, config))
    }
}
