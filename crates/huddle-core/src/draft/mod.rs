// Draft log and the views derived from it.

pub mod counts;
pub mod log;
pub mod pick;
pub mod roster;
pub mod snake;

use thiserror::Error;

use crate::catalog::PlayerId;
use crate::protocol::error_kind;
use pick::Owner;

/// Errors surfaced at the state-mutation boundary. None of them is fatal;
/// the log and settings are unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("unknown player id: {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("player {player_id} was already taken ({owner})")]
    AlreadyTaken { player_id: PlayerId, owner: Owner },

    #[error("invalid setting `{field}`: {message}")]
    InvalidSettings { field: String, message: String },
}

impl DraftError {
    /// Stable machine-readable kind for wire responses.
    pub fn kind(&self) -> &'static str {
        match self {
            DraftError::UnknownPlayer { .. } | DraftError::AlreadyTaken { .. } => {
                error_kind::INVALID_PICK
            }
            DraftError::InvalidSettings { .. } => error_kind::MALFORMED_SETTINGS_PATCH,
        }
    }
}
