//! Session persistence stores.
//!
//! `SessionStore` is the persistence seam: one record per user, replaced
//! wholesale on save. `InMemorySessionStore` backs tests and the demo;
//! `SqliteSessionStore` is the durable implementation, keeping the turn
//! list as a JSON column so the row schema never chases the turn model.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use valet_contracts::{
    error::{ValetError, ValetResult},
    session::{ChatTurn, SessionRecord},
};

/// One conversation record per user, loaded at command start and replaced
/// on save.
pub trait SessionStore: Send + Sync {
    fn load(&self, user_id: &str) -> ValetResult<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> ValetResult<()>;
    fn delete(&self, user_id: &str) -> ValetResult<()>;
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// A `HashMap`-backed store for tests and the demo.
pub struct InMemorySessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, user_id: &str) -> ValetResult<Option<SessionRecord>> {
        let records = self.records.lock().map_err(|e| ValetError::SessionStore {
            reason: format!("session store lock poisoned: {}", e),
        })?;
        Ok(records.get(user_id).cloned())
    }

    fn save(&self, record: &SessionRecord) -> ValetResult<()> {
        let mut records = self.records.lock().map_err(|e| ValetError::SessionStore {
            reason: format!("session store lock poisoned: {}", e),
        })?;
        records.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str) -> ValetResult<()> {
        let mut records = self.records.lock().map_err(|e| ValetError::SessionStore {
            reason: format!("session store lock poisoned: {}", e),
        })?;
        records.remove(user_id);
        Ok(())
    }
}

// ── SQLite store ──────────────────────────────────────────────────────────────

/// A SQLite-backed store: one row per user, turns as a JSON column.
///
/// `rusqlite::Connection` is not `Sync`, so the connection lives behind a
/// `Mutex`; session traffic is light enough that serializing access is not
/// a concern.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> ValetResult<Self> {
        let conn = Connection::open(path).map_err(|e| ValetError::SessionStore {
            reason: format!("failed to open session database '{}': {}", path.display(), e),
        })?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                user_id    TEXT PRIMARY KEY,
                turns      TEXT NOT NULL,
                turn_count INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ValetError::SessionStore {
            reason: format!("failed to create sessions table: {}", e),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> ValetResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ValetError::SessionStore {
            reason: format!("session connection lock poisoned: {}", e),
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, user_id: &str) -> ValetResult<Option<SessionRecord>> {
        let conn = self.lock()?;
        let row: Option<(String, usize, String)> = conn
            .query_row(
                "SELECT turns, turn_count, updated_at FROM sessions WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| ValetError::SessionStore {
                reason: format!("failed to load session for '{}': {}", user_id, e),
            })?;

        let (turns_json, turn_count, updated_at) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let turns: Vec<ChatTurn> =
            serde_json::from_str(&turns_json).map_err(|e| ValetError::SessionStore {
                reason: format!("corrupt turn list for '{}': {}", user_id, e),
            })?;
        let updated_at = updated_at
            .parse::<DateTime<Utc>>()
            .map_err(|e| ValetError::SessionStore {
                reason: format!("corrupt timestamp for '{}': {}", user_id, e),
            })?;

        Ok(Some(SessionRecord {
            user_id: user_id.to_string(),
            turns,
            turn_count,
            updated_at,
        }))
    }

    fn save(&self, record: &SessionRecord) -> ValetResult<()> {
        let turns_json =
            serde_json::to_string(&record.turns).map_err(|e| ValetError::SessionStore {
                reason: format!("failed to serialize turns: {}", e),
            })?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (user_id, turns, turn_count, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                turns = excluded.turns,
                turn_count = excluded.turn_count,
                updated_at = excluded.updated_at",
            params![
                record.user_id,
                turns_json,
                record.turn_count,
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ValetError::SessionStore {
            reason: format!("failed to save session for '{}': {}", record.user_id, e),
        })?;
        Ok(())
    }

    fn delete(&self, user_id: &str) -> ValetResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])
            .map_err(|e| ValetError::SessionStore {
                reason: format!("failed to delete session for '{}': {}", user_id, e),
            })?;
        Ok(())
    }
}
