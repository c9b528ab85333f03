// Individual pick representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::PlayerId;

/// Who made a pick: the remote user being assisted, or anyone else in the
/// room (recorded by the helper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "self", alias = "me")]
    SelfOwner,
    #[serde(rename = "other", alias = "taken")]
    Other,
}

impl Owner {
    pub fn from_str_owner(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "self" | "me" => Some(Owner::SelfOwner),
            "other" | "taken" => Some(Owner::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::SelfOwner => "self",
            Owner::Other => "other",
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded pick. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub player_id: PlayerId,
    pub owner: Owner,
    pub timestamp: DateTime<Utc>,
}

impl Pick {
    pub fn new(player_id: impl Into<PlayerId>, owner: Owner) -> Self {
        Pick {
            player_id: player_id.into(),
            owner,
            timestamp: Utc::now(),
        }
    }

    pub fn is_mine(&self) -> bool {
        self.owner == Owner::SelfOwner
    }
}
