// SQLite persistence for the signed-in session, cached missions and local
// task progress.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::api::Session;
use crate::mission::board::TaskFlags;
use crate::mission::{Mission, MissionSummary};

/// SQLite-backed local state. The backend has no completion or delete
/// endpoint, so task progress lives here only.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS client_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mission_cache (
                mission_id TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                fetched_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS task_progress (
                mission_id TEXT NOT NULL,
                task_id    TEXT NOT NULL,
                completed  INTEGER NOT NULL DEFAULT 0,
                hidden     INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (mission_id, task_id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO client_state (key, value) VALUES (?1, ?2)",
            params![key, json],
        )
        .with_context(|| format!("failed to save state '{key}'"))?;
        Ok(())
    }

    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to load state '{key}'"))?;
        raw.map(|s| serde_json::from_str(&s).context("failed to parse state value"))
            .transpose()
    }

    fn delete_state(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])
            .with_context(|| format!("failed to delete state '{key}'"))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    const SESSION_KEY: &'static str = "session";

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let value = serde_json::to_value(session).context("failed to serialize session")?;
        self.save_state(Self::SESSION_KEY, &value)
    }

    /// The stored session, if any. An unreadable entry counts as none.
    pub fn load_session(&self) -> Result<Option<Session>> {
        Ok(self
            .load_state(Self::SESSION_KEY)?
            .and_then(|v| serde_json::from_value(v).ok()))
    }

    pub fn clear_session(&self) -> Result<()> {
        self.delete_state(Self::SESSION_KEY)
    }

    // ------------------------------------------------------------------
    // Mission cache
    // ------------------------------------------------------------------

    fn mission_list_key(user_id: &str) -> String {
        format!("missions:{user_id}")
    }

    pub fn cache_mission_list(&self, user_id: &str, missions: &[MissionSummary]) -> Result<()> {
        let value = serde_json::to_value(missions).context("failed to serialize mission list")?;
        self.save_state(&Self::mission_list_key(user_id), &value)
    }

    pub fn cached_mission_list(&self, user_id: &str) -> Result<Option<Vec<MissionSummary>>> {
        Ok(self
            .load_state(&Self::mission_list_key(user_id))?
            .and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Store the mission detail, tasks included.
    pub fn cache_mission(&self, mission: &Mission) -> Result<()> {
        let conn = self.conn();
        let payload = serde_json::to_string(mission).context("failed to serialize mission")?;
        conn.execute(
            "INSERT OR REPLACE INTO mission_cache (mission_id, payload) VALUES (?1, ?2)",
            params![mission.id, payload],
        )
        .context("failed to cache mission")?;
        Ok(())
    }

    pub fn cached_mission(&self, mission_id: &str) -> Result<Option<Mission>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT payload FROM mission_cache WHERE mission_id = ?1",
                params![mission_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load cached mission")?;
        raw.map(|s| serde_json::from_str(&s).context("failed to parse cached mission"))
            .transpose()
    }

    // ------------------------------------------------------------------
    // Task progress
    // ------------------------------------------------------------------

    pub fn set_completed(&self, mission_id: &str, task_id: &str, completed: bool) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO task_progress (mission_id, task_id, completed) VALUES (?1, ?2, ?3)
             ON CONFLICT(mission_id, task_id) DO UPDATE SET
                completed = excluded.completed,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![mission_id, task_id, completed],
        )
        .context("failed to store task completion")?;
        Ok(())
    }

    pub fn set_hidden(&self, mission_id: &str, task_id: &str, hidden: bool) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO task_progress (mission_id, task_id, hidden) VALUES (?1, ?2, ?3)
             ON CONFLICT(mission_id, task_id) DO UPDATE SET
                hidden = excluded.hidden,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![mission_id, task_id, hidden],
        )
        .context("failed to store task visibility")?;
        Ok(())
    }

    /// Flags for every task of `mission_id` that has local state.
    pub fn task_flags(&self, mission_id: &str) -> Result<HashMap<String, TaskFlags>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT task_id, completed, hidden FROM task_progress WHERE mission_id = ?1",
            )
            .context("failed to prepare task_flags query")?;

        let rows = stmt
            .query_map(params![mission_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    TaskFlags {
                        completed: row.get(1)?,
                        hidden: row.get(2)?,
                    },
                ))
            })
            .context("failed to query task progress")?
            .collect::<rusqlite::Result<HashMap<_, _>>>()
            .context("failed to read task progress row")?;
        Ok(rows)
    }

    /// Forget local progress for a mission.
    pub fn clear_progress(&self, mission_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM task_progress WHERE mission_id = ?1",
            params![mission_id],
        )
        .context("failed to clear task progress")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{Participant, User};

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_user() -> User {
        User {
            id: "u1".to_string(),
            username: "spongebob".to_string(),
            email: "sb@krusty.krab".to_string(),
            avatar: None,
        }
    }

    fn sample_mission() -> Mission {
        Mission {
            id: "m1".to_string(),
            name: "Jellyfishing".to_string(),
            description: Some("net required".to_string()),
            created_by_id: "u1".to_string(),
            tasks: Vec::new(),
            participants: vec![Participant {
                mission_id: "m1".to_string(),
                user_id: "u1".to_string(),
                total_points: 30,
                user: sample_user(),
            }],
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"client_state".to_string()));
        assert!(tables.contains(&"mission_cache".to_string()));
        assert!(tables.contains(&"task_progress".to_string()));
    }

    #[test]
    fn session_save_load_clear() {
        let db = test_db();
        assert!(db.load_session().unwrap().is_none());

        let session = Session {
            token: "jwt".to_string(),
            user: sample_user(),
        };
        db.save_session(&session).unwrap();
        assert_eq!(db.load_session().unwrap(), Some(session));

        db.clear_session().unwrap();
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn corrupt_session_reads_as_none() {
        let db = test_db();
        db.save_state("session", &serde_json::json!({"token": 5})).unwrap();
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn mission_cache_round_trip_and_overwrite() {
        let db = test_db();
        assert!(db.cached_mission("m1").unwrap().is_none());

        let mut mission = sample_mission();
        db.cache_mission(&mission).unwrap();
        assert_eq!(db.cached_mission("m1").unwrap(), Some(mission.clone()));

        mission.name = "Jellyfishing 2".to_string();
        db.cache_mission(&mission).unwrap();
        assert_eq!(db.cached_mission("m1").unwrap().unwrap().name, "Jellyfishing 2");
    }

    #[test]
    fn mission_list_cached_per_user() {
        let db = test_db();
        let list = vec![sample_mission().summary()];
        db.cache_mission_list("u1", &list).unwrap();
        assert_eq!(db.cached_mission_list("u1").unwrap(), Some(list));
        assert!(db.cached_mission_list("u2").unwrap().is_none());
    }

    #[test]
    fn task_flags_upsert_independently() {
        let db = test_db();
        db.set_completed("m1", "t1", true).unwrap();
        db.set_hidden("m1", "t1", true).unwrap();
        db.set_hidden("m1", "t2", true).unwrap();
        db.set_completed("m2", "t9", true).unwrap();

        let flags = db.task_flags("m1").unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags["t1"], TaskFlags { completed: true, hidden: true });
        assert_eq!(flags["t2"], TaskFlags { completed: false, hidden: true });

        db.set_completed("m1", "t1", false).unwrap();
        assert!(!db.task_flags("m1").unwrap()["t1"].completed);
        assert!(db.task_flags("m1").unwrap()["t1"].hidden);
    }

    #[test]
    fn clear_progress_is_scoped() {
        let db = test_db();
        db.set_completed("m1", "t1", true).unwrap();
        db.set_completed("m2", "t1", true).unwrap();
        db.clear_progress("m1").unwrap();
        assert!(db.task_flags("m1").unwrap().is_empty());
        assert_eq!(db.task_flags("m2").unwrap().len(), 1);
    }

    #[test]
    fn state_missing_key_is_none() {
        let db = test_db();
        assert!(db.load_state("nope").unwrap().is_none());
    }
}
