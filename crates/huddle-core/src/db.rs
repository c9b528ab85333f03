// SQLite persistence layer for the draft log and settings.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::draft::pick::{Owner, Pick};
use crate::settings::Settings;

/// SQLite-backed crash-recovery copy of the draft log, plus a key-value store
/// for settings and the current draft id.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_picks (
                seq       INTEGER NOT NULL,
                draft_id  TEXT NOT NULL,
                player_id TEXT NOT NULL,
                owner     TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (seq, draft_id),
                UNIQUE (draft_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_draft_picks_draft_id ON draft_picks(draft_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Draft log
    // ------------------------------------------------------------------

    /// Append a pick at 1-based log position `seq` for `draft_id`.
    pub fn append_pick(&self, pick: &Pick, seq: usize, draft_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO draft_picks (seq, draft_id, player_id, owner, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                seq as i64,
                draft_id,
                pick.player_id,
                pick.owner.as_str(),
                pick.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ],
        )
        .with_context(|| format!("failed to record pick {} at seq {seq}", pick.player_id))?;
        Ok(())
    }

    /// Delete `player_id` from the stored log of `draft_id`. Returns `false`
    /// when no such row exists, which happens when the pick was never
    /// persisted.
    pub fn remove_pick(&self, draft_id: &str, player_id: &str) -> Result<bool> {
        let conn = self.conn();
        let deleted = conn
            .execute(
                "DELETE FROM draft_picks WHERE draft_id = ?1 AND player_id = ?2",
                params![draft_id, player_id],
            )
            .with_context(|| format!("failed to remove pick {player_id}"))?;
        Ok(deleted > 0)
    }

    /// Delete every pick of `draft_id`. Returns how many were removed.
    pub fn clear_picks(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let deleted = conn
            .execute(
                "DELETE FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
            )
            .context("failed to clear draft picks")?;
        Ok(deleted)
    }

    /// Load the picks of `draft_id` in log order.
    ///
    /// Rows with an unrecognised owner or timestamp are skipped with a
    /// warning rather than failing the whole load.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT seq, player_id, owner, timestamp
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY seq",
            )
            .context("failed to prepare load_picks query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        let mut picks = Vec::with_capacity(rows.len());
        for (seq, player_id, owner, timestamp) in rows {
            let Some(owner) = Owner::from_str_owner(&owner) else {
                warn!("Skipping stored pick #{seq} ({player_id}): unknown owner '{owner}'");
                continue;
            };
            let timestamp = match DateTime::parse_from_rfc3339(&timestamp) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    warn!("Skipping stored pick #{seq} ({player_id}): bad timestamp: {e}");
                    continue;
                }
            };
            picks.push(Pick {
                player_id,
                owner,
                timestamp,
            });
        }
        Ok(picks)
    }

    /// Returns `true` if at least one pick has been recorded for `draft_id`.
    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check draft_picks existence")?;
        Ok(exists)
    }

    /// Number of picks recorded for `draft_id`.
    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Key-value state: settings and the current draft id
    // ------------------------------------------------------------------

    pub(crate) const SETTINGS_KEY: &'static str = "settings";
    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// Store `value` as JSON text under `key`, replacing any earlier value.
    pub(crate) fn put_value(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let text = serde_json::to_string(value).context("failed to encode stored value")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
                params![key, text],
            )
            .with_context(|| format!("failed to store {key}"))?;
        Ok(())
    }

    /// The JSON value stored under `key`, if any.
    pub(crate) fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let text: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read {key}"))?;

        text.map(|t| serde_json::from_str(&t).with_context(|| format!("stored {key} is not JSON")))
            .transpose()
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let value = serde_json::to_value(settings).context("failed to serialize settings")?;
        self.put_value(Self::SETTINGS_KEY, &value)
    }

    /// Stored settings, or `None` if none were ever saved. A stored value that
    /// no longer decodes is an error; the caller decides whether to ignore it.
    pub fn load_settings(&self) -> Result<Option<Settings>> {
        self.get_value(Self::SETTINGS_KEY)?
            .map(|v| serde_json::from_value(v).context("failed to decode stored settings"))
            .transpose()
    }

    /// The draft id picks are recorded under, once one has been chosen.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.get_value(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.put_value(Self::DRAFT_ID_KEY, &serde_json::Value::from(draft_id))
    }

    /// Run raw SQL against the connection, for tests that need to corrupt or
    /// block the stored copy.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn().execute_batch(sql).context("test SQL failed")
    }

    /// Generate a new unique draft ID based on the current UTC timestamp.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_SSS` (e.g. `draft_20260907_193015_042`).
    pub fn generate_draft_id() -> String {
        let now = Utc::now();
        now.format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }
}
