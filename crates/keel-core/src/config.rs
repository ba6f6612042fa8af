//! Host configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Persist the snapshot after every mutation
    pub autosave: bool,
    /// Persist the snapshot before tearing down on shutdown
    pub persist_on_shutdown: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("sessions.db"),
            autosave: true,
            persist_on_shutdown: true,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Keel"))
            .unwrap_or_else(|| PathBuf::from(".keel"))
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(CoreError::Config(
                "database_path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = Config::new(PathBuf::from("/tmp/keel"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/keel/sessions.db"));
        assert!(config.autosave);
        assert!(config.persist_on_shutdown);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.json");
        std::fs::write(&path, r#"{"database_path":"/var/lib/keel/s.db","autosave":false}"#)
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/keel/s.db"));
        assert!(!config.autosave);
        assert!(config.persist_on_shutdown);
    }

    #[test]
    fn test_load_rejects_empty_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.json");
        std::fs::write(&path, r#"{"database_path":""}"#).unwrap();

        assert!(matches!(Config::load(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
