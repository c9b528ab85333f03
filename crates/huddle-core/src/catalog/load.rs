// Catalog loading from JSON or CSV player files.
//
// Both formats share one row shape: the column names written by the
// spreadsheet import tool (`proj_pts`, `proj_rec`, ...) plus optional bye
// week, ADP and quarterback-context columns.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::player::{Player, Position, ProjectedStats};
use super::Catalog;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    position: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    bye: Option<f64>,
    #[serde(default)]
    adp: Option<f64>,
    #[serde(default)]
    proj_pts: Option<f64>,
    #[serde(default)]
    proj_pass_att: Option<f64>,
    #[serde(default)]
    proj_pass_yds: Option<f64>,
    #[serde(default)]
    proj_pass_td: Option<f64>,
    #[serde(default)]
    proj_int: Option<f64>,
    /// Rush attempts.
    #[serde(default)]
    proj_rush: Option<f64>,
    #[serde(default)]
    proj_rush_yds: Option<f64>,
    #[serde(default)]
    proj_rush_td: Option<f64>,
    #[serde(default)]
    proj_rec: Option<f64>,
    #[serde(default)]
    proj_rec_yds: Option<f64>,
    #[serde(default)]
    proj_rec_td: Option<f64>,
    #[serde(default)]
    qb_pass_att: Option<f64>,
    #[serde(default)]
    qb_rush_share: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase, collapse runs of non-alphanumerics to `_`, trim `_`.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Build the `name|team|pos` id the import tool assigns when a row has none.
pub fn derive_player_id(name: &str, team: Option<&str>, position: Position) -> String {
    format!(
        "{}|{}|{}",
        slugify(name),
        team.map(slugify).unwrap_or_default(),
        position.display_str().to_lowercase()
    )
}

/// Drop non-finite values so they behave like missing ones.
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Bye weeks arrive as `7` or `7.0` depending on the exporter. Anything that
/// is not a whole positive week is treated as missing.
fn bye_week(v: Option<f64>) -> Option<u8> {
    finite(v)
        .filter(|b| b.fract() == 0.0 && *b >= 1.0 && *b <= f64::from(u8::MAX))
        .map(|b| b as u8)
}

/// Convert raw rows into players, skipping rows that cannot be used.
fn players_from_rows(rows: Vec<RawPlayerRow>) -> Vec<Player> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut players = Vec::with_capacity(rows.len());

    for raw in rows {
        let name = raw.name.as_deref().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            warn!("skipping catalog row with empty name");
            continue;
        }
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping '{}': unknown position '{}'", name, raw.position);
            continue;
        };
        if raw.proj_pts.is_some_and(|p| !p.is_finite()) {
            warn!("skipping '{}': non-finite projection", name);
            continue;
        }

        let team = raw
            .team
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        let id = raw
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| derive_player_id(&name, team.as_deref(), position));

        if !seen.insert(id.clone()) {
            warn!("skipping duplicate catalog id '{}'", id);
            continue;
        }

        players.push(Player {
            id,
            name,
            position,
            team,
            bye_week: bye_week(raw.bye),
            adp: finite(raw.adp),
            stats: ProjectedStats {
                points: raw.proj_pts.unwrap_or(0.0),
                pass_att: finite(raw.proj_pass_att),
                pass_yds: finite(raw.proj_pass_yds),
                pass_td: finite(raw.proj_pass_td),
                interceptions: finite(raw.proj_int),
                rush_att: finite(raw.proj_rush),
                rush_yds: finite(raw.proj_rush_yds),
                rush_td: finite(raw.proj_rush_td),
                receptions: finite(raw.proj_rec),
                rec_yds: finite(raw.proj_rec_yds),
                rec_td: finite(raw.proj_rec_td),
                qb_pass_att: finite(raw.qb_pass_att),
                qb_rush_share: finite(raw.qb_rush_share),
            },
        });
    }

    players
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_csv_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => rows.push(raw),
            Err(e) => warn!("skipping malformed catalog row: {}", e),
        }
    }
    Ok(players_from_rows(rows))
}

/// The file must be a JSON array. Individual entries that do not fit the row
/// shape are skipped, like malformed CSV records.
fn load_json_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_reader(rdr)?;
    let mut rows = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawPlayerRow>(value) {
            Ok(raw) => rows.push(raw),
            Err(e) => warn!("skipping malformed catalog entry #{}: {}", i + 1, e),
        }
    }
    Ok(players_from_rows(rows))
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load the player catalog from `path`. Files ending in `.csv` are read as
/// CSV, everything else as a JSON array.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let path_str = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
        path: path_str.clone(),
        source: e,
    })?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let players = if is_csv {
        load_csv_from_reader(file).map_err(|e| CatalogError::Csv {
            path: path_str.clone(),
            source: e,
        })?
    } else {
        load_json_from_reader(file).map_err(|e| CatalogError::Json {
            path: path_str.clone(),
            source: e,
        })?
    };

    if players.is_empty() {
        return Err(CatalogError::Validation(format!(
            "catalog {path_str} produced zero valid players"
        )));
    }

    info!("Loaded {} players from {}", players.len(), path_str);
    Ok(Catalog::new(players))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
