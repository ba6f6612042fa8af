//! Persisted session snapshot

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use keel_storage::Database;

use crate::config::SessionConfig;
use crate::Result;

/// One persisted session.
///
/// Storage may hold any number of default records; the registry takes the
/// first one on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub config: SessionConfig,
    pub is_default: bool,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, config: SessionConfig, is_default: bool) -> Self {
        Self {
            id: id.into(),
            config,
            is_default,
        }
    }
}

/// Durable home for the registry snapshot.
pub trait SessionsStorage: Send + Sync {
    /// Records in the order they were persisted.
    fn restore(&self) -> Result<Vec<SessionRecord>>;

    /// Replace the stored snapshot with `records`.
    fn persist(&self, records: &[SessionRecord]) -> Result<()>;
}

/// Snapshot kept in the `sessions` table.
pub struct SqliteSessionsStorage {
    db: Database,
}

impl SqliteSessionsStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SessionsStorage for SqliteSessionsStorage {
    fn restore(&self) -> Result<Vec<SessionRecord>> {
        let rows = self.db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, config, is_default FROM sessions ORDER BY position")?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i32>(2)? != 0,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })?;

        // One undecodable row fails the whole restore
        let records = rows
            .into_iter()
            .map(|(id, config_json, is_default)| -> Result<SessionRecord> {
                let config: SessionConfig = serde_json::from_str(&config_json)?;
                Ok(SessionRecord {
                    id,
                    config,
                    is_default,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = records.len(), "Read session snapshot");

        Ok(records)
    }

    fn persist(&self, records: &[SessionRecord]) -> Result<()> {
        let configs = records
            .iter()
            .map(|record| serde_json::to_string(&record.config))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let updated_at = Utc::now().to_rfc3339();

        self.db.transaction(|conn| {
            conn.execute("DELETE FROM sessions", [])?;

            for (position, (record, config_json)) in records.iter().zip(&configs).enumerate() {
                conn.execute(
                    "INSERT OR REPLACE INTO sessions
                     (id, config, is_default, position, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        record.id,
                        config_json,
                        record.is_default as i32,
                        position as i64,
                        updated_at,
                    ],
                )?;
            }
            Ok(())
        })?;

        tracing::debug!(count = records.len(), "Wrote session snapshot");

        Ok(())
    }
}

/// In-process snapshot, for hosts that don't persist to disk.
#[derive(Debug, Default)]
pub struct MemorySessionsStorage {
    records: RwLock<Vec<SessionRecord>>,
}

impl MemorySessionsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SessionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.read().clone()
    }
}

impl SessionsStorage for MemorySessionsStorage {
    fn restore(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.records.read().clone())
    }

    fn persist(&self, records: &[SessionRecord]) -> Result<()> {
        *self.records.write() = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;

    #[test]
    fn test_sqlite_keeps_order() {
        let storage = SqliteSessionsStorage::new(Database::open_in_memory().unwrap());
        let records = vec![
            SessionRecord::new("c", SessionConfig::named("Third"), false),
            SessionRecord::new("a", SessionConfig::named("First"), true),
            SessionRecord::new("b", SessionConfig::default(), true),
        ];

        storage.persist(&records).unwrap();
        assert_eq!(storage.restore().unwrap(), records);
    }

    #[test]
    fn test_sqlite_persist_replaces_snapshot() {
        let storage = SqliteSessionsStorage::new(Database::open_in_memory().unwrap());
        storage
            .persist(&[
                SessionRecord::new("old-1", SessionConfig::default(), true),
                SessionRecord::new("old-2", SessionConfig::default(), false),
            ])
            .unwrap();

        storage
            .persist(&[SessionRecord::new("new", SessionConfig::default(), false)])
            .unwrap();

        let restored = storage.restore().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, "new");
    }

    #[test]
    fn test_sqlite_corrupt_config_fails_restore() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, config, is_default, position, updated_at)
                 VALUES ('good', '{}', 1, 0, ''), ('bad', 'not json', 0, 1, '')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let storage = SqliteSessionsStorage::new(db);
        assert!(matches!(storage.restore(), Err(SessionError::Json(_))));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemorySessionsStorage::new();
        assert!(storage.restore().unwrap().is_empty());

        let records = vec![SessionRecord::new("x", SessionConfig::default(), false)];
        storage.persist(&records).unwrap();
        assert_eq!(storage.records(), records);
    }
}
