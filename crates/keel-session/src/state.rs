//! Session lifecycle
//!
//! ```text
//! Active
//!   ↓ destroy (once, irreversible)
//! Destroyed
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session is live and usable
    Active,
    /// Session has been torn down
    Destroyed,
}

impl SessionState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        match (self, target) {
            (SessionState::Active, SessionState::Active) => true,
            (SessionState::Active, SessionState::Destroyed) => true,
            // Nothing leaves Destroyed, not even Destroyed itself
            (SessionState::Destroyed, _) => false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, SessionState::Destroyed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Destroyed => "destroyed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionState::Active),
            "destroyed" => Ok(SessionState::Destroyed),
            _ => Err(format!("Unknown session state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(SessionState::Active.can_transition_to(SessionState::Destroyed));
        assert!(SessionState::Active.can_transition_to(SessionState::Active));

        assert!(!SessionState::Destroyed.can_transition_to(SessionState::Active));
        assert!(!SessionState::Destroyed.can_transition_to(SessionState::Destroyed));
    }

    #[test]
    fn test_parse() {
        assert_eq!("ACTIVE".parse::<SessionState>(), Ok(SessionState::Active));
        assert_eq!(
            SessionState::Destroyed.to_string().parse::<SessionState>(),
            Ok(SessionState::Destroyed)
        );
        assert!("frozen".parse::<SessionState>().is_err());
    }
}
