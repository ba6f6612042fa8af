//! Session configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a session should be constructed.
///
/// Stored as JSON alongside each persisted session, so missing fields fall
/// back to their defaults when an older snapshot is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Human-readable name
    pub name: String,
    /// Ephemeral sessions are never written to storage
    pub ephemeral: bool,
    /// Host-defined options passed through to the session
    pub options: BTreeMap<String, String>,
}

impl SessionConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            ephemeral: false,
            options: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"name":"Work"}"#).unwrap();
        assert_eq!(config.name, "Work");
        assert!(!config.ephemeral);
        assert!(config.options.is_empty());

        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::named("Private")
            .ephemeral()
            .with_option("proxy", "socks5://localhost:9050");

        assert_eq!(config.name, "Private");
        assert!(config.ephemeral);
        assert_eq!(
            config.options.get("proxy").map(String::as_str),
            Some("socks5://localhost:9050")
        );
    }
}
