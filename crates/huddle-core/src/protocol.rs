// Wire protocol between the draft server and its polling clients (the helper
// device recording every pick and the remote device of the drafter being
// assisted).
//
// Every client message is one JSON request tagged by `type`; the server
// answers each with exactly one `OK` or `ERROR` response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{PlayerId, Position};
use crate::draft::counts::PositionalCounts;
use crate::draft::pick::Owner;
use crate::draft::roster::Roster;
use crate::settings::{Settings, SettingsPatch};

// ---------------------------------------------------------------------------
// Requests (client -> server)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientRequest {
    /// Everything a polling view needs in one round trip.
    GetSnapshot,
    /// Ranked available players, optionally truncated and/or filtered to a
    /// single position after ranking.
    GetRankings {
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        position: Option<Position>,
    },
    GetRoster,
    GetCounts,
    /// The full player catalog.
    GetPlayers,
    /// The draft log in order.
    GetPicks,
    AddPick {
        player_id: PlayerId,
        owner: Owner,
    },
    Undo,
    Reset,
    GetSettings,
    /// Partial settings update; fields sit beside `type`.
    PatchSettings(SettingsPatch),
}

// ---------------------------------------------------------------------------
// Responses (server -> client)
// ---------------------------------------------------------------------------

/// Machine-readable error kinds.
pub mod error_kind {
    pub const INVALID_PICK: &str = "INVALID_PICK";
    pub const MALFORMED_SETTINGS_PATCH: &str = "MALFORMED_SETTINGS_PATCH";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerResponse {
    Ok { data: serde_json::Value },
    Error { kind: String, message: String },
}

impl ServerResponse {
    /// Wrap any serializable payload in an `OK` response.
    pub fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => ServerResponse::Ok { data },
            Err(e) => ServerResponse::error(error_kind::INTERNAL, format!("failed to encode response: {e}")),
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        ServerResponse::Error {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    /// Serialize for the wire. Falls back to a hand-built error if encoding
    /// somehow fails, so the client always gets a reply.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"ERROR","kind":"INTERNAL","message":"encode failed: {e}"}}"#)
        })
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// One entry of the draft log as shown to clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PickEntry {
    /// 1-based position in the log (the overall pick number).
    pub seq: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub owner: Owner,
    pub timestamp: DateTime<Utc>,
}

/// State summary for polling clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub draft_id: String,
    pub picks_made: usize,
    pub current_round: u32,
    /// Slot on the clock, or `None` once every round is complete.
    pub slot_on_clock: Option<u32>,
    pub next_self_pick: Option<u32>,
    pub picks_until_self_turn: Option<u32>,
    pub draft_complete: bool,
    pub settings: Settings,
    pub roster: Roster,
    pub counts: PositionalCounts,
    pub last_pick: Option<PickEntry>,
    pub clients_connected: usize,
    pub poll_interval_ms: u64,
}
