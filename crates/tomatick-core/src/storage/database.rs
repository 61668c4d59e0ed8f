//! SQLite-based persistence for the session log, tasks and app state.
//!
//! The session log is append-only and listed most-recent-first. Batch
//! import prepends the batch ahead of existing entries without
//! deduplicating (caller responsibility, documented on `import_sessions`).

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, StorageError};
use crate::history::FocusSession;
use crate::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// SQLite database at `~/.config/tomatick/tomatick.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database in the data dir, creating schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tomatick.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path (tests, tooling).
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS focus_sessions (
                    id             TEXT PRIMARY KEY,
                    started_at     TEXT NOT NULL,
                    ended_at       TEXT NOT NULL,
                    minutes        INTEGER NOT NULL,
                    category       TEXT NOT NULL,
                    linked_task_id TEXT
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id                  TEXT PRIMARY KEY,
                    title               TEXT NOT NULL,
                    completed           INTEGER NOT NULL DEFAULT 0,
                    estimated_pomodoros INTEGER NOT NULL DEFAULT 1,
                    completed_pomodoros INTEGER NOT NULL DEFAULT 0,
                    active              INTEGER NOT NULL DEFAULT 0,
                    created_at          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at
                    ON focus_sessions(started_at);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    // ── Session log ──────────────────────────────────────────────────

    /// Append one completed session. Local append is synchronous; any
    /// remote mirroring happens elsewhere, after this returns.
    pub fn append_session(&self, session: &FocusSession) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO focus_sessions (id, started_at, ended_at, minutes, category, linked_task_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id.to_string(),
                session.started_at.to_rfc3339(),
                session.ended_at.to_rfc3339(),
                session.minutes,
                session.category,
                session.linked_task_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Merge an externally supplied batch by prepending it to the log.
    ///
    /// Rows are inserted so that `list_sessions` yields the batch in its
    /// given order, ahead of all existing entries. No deduplication is
    /// performed; that is the caller's responsibility.
    pub fn import_sessions(&self, sessions: &[FocusSession]) -> Result<usize, StorageError> {
        for session in sessions.iter().rev() {
            self.append_session(session)?;
        }
        Ok(sessions.len())
    }

    /// Sessions in reverse-chronological insertion order (most recent
    /// first).
    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<FocusSession>, StorageError> {
        let sql = match limit {
            Some(_) => {
                "SELECT id, started_at, ended_at, minutes, category, linked_task_id
                 FROM focus_sessions ORDER BY rowid DESC LIMIT ?1"
            }
            None => {
                "SELECT id, started_at, ended_at, minutes, category, linked_task_id
                 FROM focus_sessions ORDER BY rowid DESC"
            }
        };
        let mut stmt = self.conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<FocusSession> {
            Ok(FocusSession {
                id: parse_uuid(row.get::<_, String>(0)?)?,
                started_at: parse_ts(row.get::<_, String>(1)?)?,
                ended_at: parse_ts(row.get::<_, String>(2)?)?,
                minutes: row.get(3)?,
                category: row.get(4)?,
                linked_task_id: row
                    .get::<_, Option<String>>(5)?
                    .map(parse_uuid)
                    .transpose()?,
            })
        };
        let rows = match limit {
            Some(n) => stmt.query_map(params![n as i64], map)?,
            None => stmt.query_map([], map)?,
        };
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Replace the entire log (remote-wins reconcile).
    pub fn replace_sessions(&self, sessions: &[FocusSession]) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM focus_sessions", [])?;
        self.import_sessions(sessions)?;
        Ok(())
    }

    pub fn count_sessions(&self) -> Result<u64, StorageError> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM focus_sessions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        let (total_sessions, total_focus_min): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(minutes), 0) FROM focus_sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_focus_min): (u64, u64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(minutes), 0)
             FROM focus_sessions WHERE started_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Stats {
            total_sessions,
            total_focus_min,
            today_sessions,
            today_focus_min,
        })
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        let all = self.stats_all()?;
        Ok(Stats {
            total_sessions: all.today_sessions,
            total_focus_min: all.today_focus_min,
            ..all
        })
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&self, task: &Task) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, completed, estimated_pomodoros,
                                completed_pomodoros, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id.to_string(),
                task.title,
                task.completed,
                task.estimated_pomodoros,
                task.completed_pomodoros,
                task.active,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, completed, estimated_pomodoros,
                    completed_pomodoros, active, created_at
             FROM tasks ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], row_to_task)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    pub fn get_task(&self, id: &Uuid) -> Result<Option<Task>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, completed, estimated_pomodoros,
                    completed_pomodoros, active, created_at
             FROM tasks WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id.to_string()], row_to_task);
        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn update_task(&self, task: &Task) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?2, completed = ?3, estimated_pomodoros = ?4,
                              completed_pomodoros = ?5, active = ?6
             WHERE id = ?1",
            params![
                task.id.to_string(),
                task.title,
                task.completed,
                task.estimated_pomodoros,
                task.completed_pomodoros,
                task.active,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(task.id.to_string()));
        }
        Ok(())
    }

    pub fn delete_task(&self, id: &Uuid) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    /// Mark one task active, clearing any other. `None` clears all.
    pub fn set_active_task(&self, id: Option<&Uuid>) -> Result<(), StorageError> {
        self.conn.execute("UPDATE tasks SET active = 0", [])?;
        if let Some(id) = id {
            let changed = self.conn.execute(
                "UPDATE tasks SET active = 1 WHERE id = ?1",
                params![id.to_string()],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(id.to_string()));
            }
        }
        Ok(())
    }

    pub fn active_task(&self) -> Result<Option<Task>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, completed, estimated_pomodoros,
                    completed_pomodoros, active, created_at
             FROM tasks WHERE active = 1 LIMIT 1",
        )?;
        let result = stmt.query_row([], row_to_task);
        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn increment_task_progress(&self, id: &Uuid) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed_pomodoros = completed_pomodoros + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    // ── KV store ─────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parse_uuid(row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        completed: row.get(2)?,
        estimated_pomodoros: row.get(3)?,
        completed_pomodoros: row.get(4)?,
        active: row.get(5)?,
        created_at: parse_ts(row.get::<_, String>(6)?)?,
    })
}

fn parse_ts(raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_uuid(raw: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
