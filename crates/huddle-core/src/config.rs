// Configuration loading and parsing (league.toml, server.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::roster::{RosterTemplate, SlotCategory};
use crate::settings::{ScoringMode, Settings};
use crate::valuation::PositionCaps;

/// Largest starter count accepted for a single position slot.
const MAX_STARTERS_PER_SLOT: usize = 5;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    /// Interface to bind; clients on other devices need `0.0.0.0`.
    pub ws_host: String,
    pub ws_port: u16,
    /// As written in server.toml; see [`Config::resolve_db_path`].
    pub db_path: String,
    pub catalog_path: String,
    pub poll_interval_ms: u64,
}

impl Config {
    /// Where the SQLite file lives. An empty `database.path` means
    /// `<platform data dir>/huddle.db`.
    pub fn resolve_db_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.db_path.trim().is_empty() {
            return Ok(PathBuf::from(&self.db_path));
        }
        let dirs = directories::ProjectDirs::from("", "", "huddle").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "database.path".into(),
                message: "empty and no platform data directory is available".into(),
            }
        })?;
        Ok(dirs.data_dir().join("huddle.db"))
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub league_size: u32,
    pub draft_slot: u32,
    pub rounds: u32,
    pub scoring: ScoringMode,
    pub qb_influence: f64,
    pub run_sensitivity: f64,
    /// Slot counts keyed by category name. Absent means the standard
    /// QB/RB/RB/WR/WR/TE/FLEX/DST/K + 7 bench + 1 IR layout.
    #[serde(default)]
    pub roster: Option<HashMap<String, usize>>,
    /// Hard positional caps. Absent means QB 1, TE 2, DST 1, K 1.
    #[serde(default)]
    pub caps: Option<HashMap<String, usize>>,
}

impl LeagueConfig {
    /// The initial live draft settings.
    pub fn settings(&self) -> Settings {
        Settings {
            league_size: self.league_size,
            draft_slot: self.draft_slot,
            rounds: self.rounds,
            scoring: self.scoring,
            qb_influence: self.qb_influence,
            run_sensitivity: self.run_sensitivity,
        }
    }

    pub fn roster_template(&self) -> RosterTemplate {
        self.roster
            .as_ref()
            .map(RosterTemplate::from_config)
            .unwrap_or_default()
    }

    pub fn position_caps(&self) -> PositionCaps {
        self.caps
            .as_ref()
            .map(PositionCaps::from_config)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire server.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ServerFile {
    websocket: WebsocketSection,
    database: DatabaseSection,
    data: DataSection,
    #[serde(default)]
    polling: PollingSection,
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    #[serde(default = "default_ws_host")]
    host: String,
    port: u16,
}

fn default_ws_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    catalog: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PollingSection {
    interval_ms: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        PollingSection { interval_ms: 1500 }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/server.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- server.toml (required) ---
    let server_path = config_dir.join("server.toml");
    let server_text = read_file(&server_path)?;
    let server_file: ServerFile =
        toml::from_str(&server_text).map_err(|e| ConfigError::ParseError {
            path: server_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        ws_host: server_file.websocket.host,
        ws_port: server_file.websocket.port,
        db_path: server_file.database.path,
        catalog_path: server_file.data.catalog,
        poll_interval_ms: server_file.polling.interval_ms,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` with `league.toml` and `server.toml` from `defaults/` on
/// first run. Files already in `config/` are left alone, so league edits
/// survive upgrades. Returns the paths that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        // create_new so a user-edited file is never overwritten.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load the league and server config from the working directory, seeding any
/// missing file first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    // The initial settings follow the same range rules as live patches.
    if let Err(crate::draft::DraftError::InvalidSettings { field, message }) =
        config.league.settings().validate()
    {
        return Err(ConfigError::ValidationError {
            field: format!("league.{field}"),
            message,
        });
    }

    let template = config.league.roster_template();
    for category in [
        SlotCategory::QB,
        SlotCategory::RB,
        SlotCategory::WR,
        SlotCategory::TE,
        SlotCategory::DST,
        SlotCategory::K,
    ] {
        let count = template.capacity(category);
        if count > MAX_STARTERS_PER_SLOT {
            return Err(ConfigError::ValidationError {
                field: format!("league.roster.{category}"),
                message: format!("must be at most {MAX_STARTERS_PER_SLOT}, got {count}"),
            });
        }
    }

    if let Some(caps) = &config.league.caps {
        for (key, &cap) in caps {
            if cap == 0 {
                return Err(ConfigError::ValidationError {
                    field: format!("league.caps.{key}"),
                    message: "must be at least 1".into(),
                });
            }
        }
    }

    if config.ws_host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "websocket.host".into(),
            message: "must not be empty".into(),
        });
    }

    if config.ws_port == 0 {
        return Err(ConfigError::ValidationError {
            field: "websocket.port".into(),
            message: "must be non-zero".into(),
        });
    }

    if config.catalog_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.catalog".into(),
            message: "must not be empty".into(),
        });
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "polling.interval_ms".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}
