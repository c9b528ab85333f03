// Application state and the main event loop.
//
// `AppState` owns the catalog, the draft log, and the live settings. The app
// task is the only writer: every client request reaches it through one mpsc
// channel and is answered before the next one is read.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Player, Position};
use crate::config::Config;
use crate::db::Database;
use crate::draft::counts::PositionalCounts;
use crate::draft::log::DraftLog;
use crate::draft::pick::{Owner, Pick};
use crate::draft::roster::{project_roster, Roster, RosterTemplate};
use crate::draft::snake;
use crate::draft::DraftError;
use crate::protocol::{error_kind, ClientRequest, PickEntry, ServerResponse, Snapshot};
use crate::settings::{Settings, SettingsPatch};
use crate::valuation::{rank_players, PositionCaps, RankedPlayer, RankingInputs};
use crate::ws_server::WsEvent;

/// Commands from the process owner (not from clients).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Quit,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub catalog: Catalog,
    pub log: DraftLog,
    pub settings: Settings,
    pub template: RosterTemplate,
    pub caps: PositionCaps,
    pub db: Database,
    pub draft_id: String,
    pub poll_interval_ms: u64,
    pub clients_connected: usize,
}

impl AppState {
    pub fn new(config: &Config, catalog: Catalog, db: Database, draft_id: String) -> Self {
        AppState {
            catalog,
            log: DraftLog::new(),
            settings: config.league.settings(),
            template: config.league.roster_template(),
            caps: config.league.position_caps(),
            db,
            draft_id,
            poll_interval_ms: config.poll_interval_ms,
            clients_connected: 0,
        }
    }

    // --- Queries ---

    /// The self-owner's roster, rebuilt from the log.
    pub fn roster(&self) -> Roster {
        project_roster(self.log.my_picks(), &self.catalog, &self.template)
    }

    pub fn counts(&self) -> PositionalCounts {
        PositionalCounts::from_picks(self.log.picks(), &self.catalog)
    }

    /// Full ranking of available players. `position` and `limit` trim the
    /// output afterwards, so ranks stay overall.
    pub fn rankings(&self, limit: Option<usize>, position: Option<Position>) -> Vec<RankedPlayer> {
        let taken = self.log.taken_ids();
        let roster = self.roster();
        let counts = self.counts();
        let inputs = RankingInputs {
            catalog: &self.catalog,
            taken: &taken,
            roster: &roster,
            counts: &counts,
            settings: &self.settings,
            template: &self.template,
            caps: &self.caps,
            picks_made: self.log.len(),
        };

        rank_players(&inputs)
            .into_iter()
            .filter(|r| position.map_or(true, |p| r.position == p))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    pub fn players(&self) -> &[Player] {
        self.catalog.players()
    }

    /// The log in order, joined with catalog names.
    pub fn pick_entries(&self) -> Vec<PickEntry> {
        self.log
            .picks()
            .iter()
            .enumerate()
            .filter_map(|(i, pick)| self.pick_entry(i + 1, pick))
            .collect()
    }

    fn pick_entry(&self, seq: usize, pick: &Pick) -> Option<PickEntry> {
        let player = self.catalog.get(&pick.player_id)?;
        Some(PickEntry {
            seq,
            player_id: pick.player_id.clone(),
            name: player.name.clone(),
            position: player.position,
            owner: pick.owner,
            timestamp: pick.timestamp,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        let s = &self.settings;
        let picks_made = self.log.len();
        let total_picks = s.league_size as usize * s.rounds as usize;
        let draft_complete = picks_made >= total_picks;

        Snapshot {
            draft_id: self.draft_id.clone(),
            picks_made,
            current_round: snake::current_round(picks_made, s.league_size),
            slot_on_clock: (!draft_complete)
                .then(|| snake::slot_on_clock(picks_made, s.league_size)),
            next_self_pick: snake::next_pick_for_slot(
                picks_made,
                s.draft_slot,
                s.league_size,
                s.rounds,
            ),
            picks_until_self_turn: snake::picks_until_turn(
                picks_made,
                s.draft_slot,
                s.league_size,
                s.rounds,
            ),
            draft_complete,
            settings: s.clone(),
            roster: self.roster(),
            counts: self.counts(),
            last_pick: self
                .log
                .picks()
                .last()
                .and_then(|pick| self.pick_entry(picks_made, pick)),
            clients_connected: self.clients_connected,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    // --- Mutations ---
    //
    // The in-memory state changes first; the database copy follows. A failed
    // write is logged and the in-memory change stands.

    pub fn add_pick(&mut self, player_id: &str, owner: Owner) -> Result<PickEntry, DraftError> {
        let pick = self
            .log
            .record(Pick::new(player_id, owner), &self.catalog)?
            .clone();
        let seq = self.log.len();
        info!("Pick #{seq}: {} ({owner})", pick.player_id);

        if let Err(e) = self.db.append_pick(&pick, seq, &self.draft_id) {
            warn!("Failed to persist pick #{seq}: {e:#}");
        }

        // record() only accepts catalog players, so the entry always exists.
        self.pick_entry(seq, &pick).ok_or(DraftError::UnknownPlayer {
            player_id: pick.player_id,
        })
    }

    /// Remove the latest pick. `None` (and no error) on an empty log.
    pub fn undo(&mut self) -> Option<PickEntry> {
        let seq = self.log.len();
        let Some(pick) = self.log.undo() else {
            debug!("Undo on empty log ignored");
            return None;
        };
        info!("Undid pick #{seq}: {}", pick.player_id);

        // By player id: if this pick's own write failed, the row before it
        // must stay.
        match self.db.remove_pick(&self.draft_id, &pick.player_id) {
            Ok(true) => {}
            Ok(false) => debug!("Pick #{seq} was not in the database"),
            Err(e) => warn!("Failed to remove pick #{seq} from database: {e:#}"),
        }
        self.pick_entry(seq, &pick)
    }

    /// Clear the log. Returns how many picks were removed.
    pub fn reset(&mut self) -> usize {
        let cleared = self.log.len();
        self.log.reset();
        info!("Draft reset, {cleared} picks cleared");

        if let Err(e) = self.db.clear_picks(&self.draft_id) {
            warn!("Failed to clear picks in database: {e:#}");
        }
        cleared
    }

    /// Merge `patch` into the live settings. On error nothing changes.
    pub fn patch_settings(&mut self, patch: &SettingsPatch) -> Result<&Settings, DraftError> {
        self.settings.apply(patch)?;
        info!("Settings updated: {:?}", self.settings);

        if let Err(e) = self.db.save_settings(&self.settings) {
            warn!("Failed to persist settings: {e:#}");
        }
        Ok(&self.settings)
    }

    // --- Request dispatch ---

    pub fn handle_request(&mut self, request: ClientRequest) -> ServerResponse {
        match request {
            ClientRequest::GetSnapshot => ServerResponse::ok(&self.snapshot()),
            ClientRequest::GetRankings { limit, position } => {
                ServerResponse::ok(&self.rankings(limit, position))
            }
            ClientRequest::GetRoster => ServerResponse::ok(&self.roster()),
            ClientRequest::GetCounts => ServerResponse::ok(&self.counts()),
            ClientRequest::GetPlayers => ServerResponse::ok(&self.players()),
            ClientRequest::GetPicks => ServerResponse::ok(&self.pick_entries()),
            ClientRequest::AddPick { player_id, owner } => {
                match self.add_pick(&player_id, owner) {
                    Ok(entry) => ServerResponse::ok(&entry),
                    Err(e) => draft_error(e),
                }
            }
            ClientRequest::Undo => ServerResponse::ok(&self.undo()),
            ClientRequest::Reset => {
                let cleared = self.reset();
                ServerResponse::ok(&serde_json::json!({ "cleared": cleared }))
            }
            ClientRequest::GetSettings => ServerResponse::ok(&self.settings),
            ClientRequest::PatchSettings(patch) => match self.patch_settings(&patch) {
                Ok(settings) => ServerResponse::ok(settings),
                Err(e) => draft_error(e),
            },
        }
    }

    /// Parse one raw request and return the serialized response.
    pub fn handle_message(&mut self, payload: &str) -> String {
        let response = match serde_json::from_str::<ClientRequest>(payload) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!("Rejected malformed request: {e}");
                let kind = if is_settings_patch(payload) {
                    error_kind::MALFORMED_SETTINGS_PATCH
                } else {
                    error_kind::BAD_REQUEST
                };
                ServerResponse::error(kind, format!("malformed request: {e}"))
            }
        };
        response.to_json()
    }
}

/// Whether an unparseable payload was at least tagged as a settings patch.
fn is_settings_patch(payload: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(payload)
        .is_ok_and(|v| v["type"] == "PATCH_SETTINGS")
}

fn draft_error(e: DraftError) -> ServerResponse {
    warn!("Request rejected: {e}");
    ServerResponse::error(e.kind(), e.to_string())
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop until `Quit` or until every channel
/// closes.
pub async fn run(
    mut ws_rx: mpsc::Receiver<WsEvent>,
    mut cmd_rx: mpsc::Receiver<AppCommand>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    loop {
        tokio::select! {
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(WsEvent::Connected { addr }) => {
                        state.clients_connected += 1;
                        info!("Client connected from {addr} ({} connected)", state.clients_connected);
                    }
                    Some(WsEvent::Disconnected { addr }) => {
                        state.clients_connected = state.clients_connected.saturating_sub(1);
                        info!("Client {addr} disconnected ({} connected)", state.clients_connected);
                    }
                    Some(WsEvent::Request { addr, payload, reply }) => {
                        let response = state.handle_message(&payload);
                        if reply.send(response).is_err() {
                            debug!("Client {addr} went away before its reply");
                        }
                    }
                    None => {
                        info!("WebSocket channel closed, shutting down");
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(AppCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

/// Restore settings and the draft log from the database after a restart.
///
/// Stored settings override the config defaults. Picks of the current draft
/// id are replayed in order; if any had to be skipped the stored log is
/// rewritten to match memory. Returns whether a draft was in progress.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    match state.db.load_settings() {
        Ok(Some(settings)) => match settings.validate() {
            Ok(()) => {
                info!("Restored settings from database: {:?}", settings);
                state.settings = settings;
            }
            Err(e) => warn!("Ignoring stored settings: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Ignoring stored settings: {e:#}"),
    }

    if !state.db.has_draft_in_progress(&state.draft_id)? {
        info!("No draft in progress for draft_id={}, starting fresh", state.draft_id);
        return Ok(false);
    }

    let picks = state.db.load_picks(&state.draft_id)?;
    let stored = picks.len();
    let skipped = state.log.restore_from_picks(picks, &state.catalog);

    if skipped > 0 || state.db.pick_count(&state.draft_id)? != state.log.len() {
        warn!("Rewriting stored draft log after skipping {skipped} picks");
        state.db.clear_picks(&state.draft_id)?;
        for (i, pick) in state.log.picks().iter().enumerate() {
            state.db.append_pick(pick, i + 1, &state.draft_id)?;
        }
    }

    info!(
        "Crash recovery complete: {} of {} stored picks restored for draft_id={}",
        state.log.len(),
        stored,
        state.draft_id
    );
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProjectedStats;
    use crate::config::LeagueConfig;
    use crate::draft::roster::SlotCategory;
    use crate::settings::ScoringMode;
    use std::time::Duration;
    use tokio::sync::oneshot;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    fn player(id: &str, position: Position, team: &str, points: f64) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_uppercase(),
            position,
            team: Some(team.to_string()),
            bye_week: None,
            adp: None,
            stats: ProjectedStats {
                points,
                ..ProjectedStats::default()
            },
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::new(vec![
            player("rb1", Position::RB, "SF", 320.0),
            player("rb2", Position::RB, "ATL", 290.0),
            player("wr1", Position::WR, "MIA", 310.0),
            player("wr2", Position::WR, "DAL", 280.0),
            player("qb1", Position::QB, "KC", 380.0),
            player("qb2", Position::QB, "BUF", 370.0),
            player("te1", Position::TE, "KC", 220.0),
            player("k1", Position::K, "BAL", 150.0),
            player("dst1", Position::DST, "NYJ", 140.0),
        ])
    }

    fn test_config() -> Config {
        Config {
            league: LeagueConfig {
                name: "Test League".into(),
                league_size: 12,
                draft_slot: 6,
                rounds: 16,
                scoring: ScoringMode::Ppr,
                qb_influence: 0.5,
                run_sensitivity: 1.0,
                roster: None,
                caps: None,
            },
            ws_host: "127.0.0.1".into(),
            ws_port: 9002,
            db_path: ":memory:".into(),
            catalog_path: "unused.json".into(),
            poll_interval_ms: 1500,
        }
    }

    fn create_test_app_state() -> AppState {
        AppState::new(
            &test_config(),
            test_catalog(),
            Database::open(":memory:").expect("in-memory db"),
            "test-draft".into(),
        )
    }

    fn parse(json: &str) -> serde_json::Value {
        serde_json::from_str(json).expect("valid JSON response")
    }

    // -----------------------------------------------------------------------
    // Tests: mutations and persistence
    // -----------------------------------------------------------------------

    #[test]
    fn add_pick_records_and_persists() {
        let mut state = create_test_app_state();
        let entry = state.add_pick("rb1", Owner::SelfOwner).unwrap();

        assert_eq!(entry.seq, 1);
        assert_eq!(entry.name, "RB1");
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 1);
        assert_eq!(state.roster().players_in(SlotCategory::RB).len(), 1);
    }

    #[test]
    fn rejected_pick_leaves_state_unchanged() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::Other).unwrap();

        let err = state.add_pick("rb1", Owner::SelfOwner).unwrap_err();
        assert_eq!(err.kind(), error_kind::INVALID_PICK);
        let err = state.add_pick("nobody", Owner::SelfOwner).unwrap_err();
        assert_eq!(err.kind(), error_kind::INVALID_PICK);

        assert_eq!(state.log.len(), 1);
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 1);
    }

    #[test]
    fn undo_removes_from_memory_and_database() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::Other).unwrap();
        state.add_pick("wr1", Owner::SelfOwner).unwrap();

        let undone = state.undo().unwrap();
        assert_eq!(undone.player_id, "wr1");
        assert_eq!(undone.seq, 2);
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 1);
        assert_eq!(state.roster().total(), 0);
    }

    #[test]
    fn undo_after_failed_write_keeps_earlier_stored_pick() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::Other).unwrap();
        state
            .db
            .execute_batch(
                "CREATE TRIGGER reject_wr1 BEFORE INSERT ON draft_picks
                 WHEN NEW.player_id = 'wr1'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        // The in-memory pick stands even though its write failed.
        state.add_pick("wr1", Owner::SelfOwner).unwrap();
        assert_eq!(state.log.len(), 2);
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 1);

        assert_eq!(state.undo().unwrap().player_id, "wr1");
        let stored = state.db.load_picks("test-draft").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].player_id, "rb1");

        state.log = DraftLog::new();
        assert!(recover_from_db(&mut state).unwrap());
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.log.picks()[0].player_id, "rb1");
    }

    #[test]
    fn undo_on_empty_log_is_noop() {
        let mut state = create_test_app_state();
        assert!(state.undo().is_none());
        assert!(state.log.is_empty());
    }

    #[test]
    fn reset_clears_memory_and_database() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::Other).unwrap();
        state.add_pick("wr1", Owner::SelfOwner).unwrap();

        assert_eq!(state.reset(), 2);
        assert!(state.log.is_empty());
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 0);
        assert_eq!(state.counts().total(), 0);
        assert_eq!(state.roster(), Roster::empty());
    }

    #[test]
    fn patch_settings_is_partial_and_persisted() {
        let mut state = create_test_app_state();
        let patch = SettingsPatch {
            run_sensitivity: Some(1.8),
            ..SettingsPatch::default()
        };
        state.patch_settings(&patch).unwrap();

        assert_eq!(state.settings.run_sensitivity, 1.8);
        assert_eq!(state.settings.draft_slot, 6);
        assert_eq!(state.settings.league_size, 12);
        assert_eq!(state.db.load_settings().unwrap(), Some(state.settings.clone()));
    }

    #[test]
    fn invalid_patch_keeps_prior_settings() {
        let mut state = create_test_app_state();
        let before = state.settings.clone();
        let patch = SettingsPatch {
            run_sensitivity: Some(0.5),
            draft_slot: Some(13),
            ..SettingsPatch::default()
        };
        let err = state.patch_settings(&patch).unwrap_err();
        assert_eq!(err.kind(), error_kind::MALFORMED_SETTINGS_PATCH);
        assert_eq!(state.settings, before);
        assert_eq!(state.db.load_settings().unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Tests: queries
    // -----------------------------------------------------------------------

    #[test]
    fn rankings_filter_and_limit_keep_overall_ranks() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::Other).unwrap();

        let all = state.rankings(None, None);
        assert!(all.iter().all(|r| r.player_id != "rb1"));

        let wrs = state.rankings(None, Some(Position::WR));
        assert!(!wrs.is_empty());
        assert!(wrs.iter().all(|r| r.position == Position::WR));
        let overall = all.iter().find(|r| r.player_id == wrs[0].player_id).unwrap();
        assert_eq!(wrs[0].rank, overall.rank);

        assert_eq!(state.rankings(Some(3), None).len(), 3);
    }

    #[test]
    fn rankings_exclude_capped_positions() {
        let mut state = create_test_app_state();
        state.add_pick("qb1", Owner::SelfOwner).unwrap();
        let ranked = state.rankings(None, None);
        assert!(ranked.iter().all(|r| r.position != Position::QB));
    }

    #[test]
    fn snapshot_tracks_snake_order() {
        let mut state = create_test_app_state();
        let snap = state.snapshot();
        assert_eq!(snap.picks_made, 0);
        assert_eq!(snap.current_round, 1);
        assert_eq!(snap.slot_on_clock, Some(1));
        assert_eq!(snap.next_self_pick, Some(6));
        assert_eq!(snap.picks_until_self_turn, Some(5));
        assert!(snap.last_pick.is_none());
        assert_eq!(snap.poll_interval_ms, 1500);

        for id in ["rb1", "rb2", "wr1", "wr2", "qb1"] {
            state.add_pick(id, Owner::Other).unwrap();
        }
        state.add_pick("qb2", Owner::SelfOwner).unwrap();

        let snap = state.snapshot();
        assert_eq!(snap.picks_made, 6);
        assert_eq!(snap.slot_on_clock, Some(7));
        // Slot 6 picks again at 19 (round 2 runs 12..1).
        assert_eq!(snap.next_self_pick, Some(19));
        assert_eq!(snap.picks_until_self_turn, Some(12));
        assert_eq!(snap.last_pick.as_ref().map(|p| p.player_id.as_str()), Some("qb2"));
        assert_eq!(snap.roster.players_in(SlotCategory::QB).len(), 1);
        assert!(!snap.draft_complete);
    }

    #[test]
    fn snapshot_reports_completed_draft() {
        let mut state = create_test_app_state();
        state
            .patch_settings(&SettingsPatch {
                league_size: Some(2),
                draft_slot: Some(1),
                rounds: Some(2),
                ..SettingsPatch::default()
            })
            .unwrap();
        for id in ["rb1", "rb2", "wr1", "wr2"] {
            state.add_pick(id, Owner::Other).unwrap();
        }
        let snap = state.snapshot();
        assert!(snap.draft_complete);
        assert_eq!(snap.slot_on_clock, None);
        assert_eq!(snap.next_self_pick, None);
    }

    #[test]
    fn pick_entries_follow_log_order() {
        let mut state = create_test_app_state();
        state.add_pick("wr2", Owner::Other).unwrap();
        state.add_pick("te1", Owner::SelfOwner).unwrap();

        let entries = state.pick_entries();
        let ids: Vec<(usize, &str)> = entries
            .iter()
            .map(|e| (e.seq, e.player_id.as_str()))
            .collect();
        assert_eq!(ids, vec![(1, "wr2"), (2, "te1")]);
        assert_eq!(entries[1].position, Position::TE);
    }

    // -----------------------------------------------------------------------
    // Tests: wire dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn handle_message_add_pick_and_duplicate() {
        let mut state = create_test_app_state();

        let ok = parse(&state.handle_message(
            r#"{"type":"ADD_PICK","player_id":"wr1","owner":"self"}"#,
        ));
        assert_eq!(ok["type"], "OK");
        assert_eq!(ok["data"]["seq"], 1);
        assert_eq!(ok["data"]["owner"], "self");

        let dup = parse(&state.handle_message(
            r#"{"type":"ADD_PICK","player_id":"wr1","owner":"other"}"#,
        ));
        assert_eq!(dup["type"], "ERROR");
        assert_eq!(dup["kind"], "INVALID_PICK");
    }

    #[test]
    fn handle_message_rejects_malformed_json() {
        let mut state = create_test_app_state();
        for bad in ["not json", r#"{"type":"NOMINATE"}"#, r#"{"type":"ADD_PICK"}"#] {
            let v = parse(&state.handle_message(bad));
            assert_eq!(v["type"], "ERROR", "payload {bad}");
            assert_eq!(v["kind"], "BAD_REQUEST");
        }
    }

    #[test]
    fn handle_message_rejects_unknown_patch_field() {
        let mut state = create_test_app_state();
        let v = parse(&state.handle_message(r#"{"type":"PATCH_SETTINGS","runSensitivity":1.5}"#));
        assert_eq!(v["type"], "ERROR");
        assert_eq!(v["kind"], "MALFORMED_SETTINGS_PATCH");
        assert_eq!(state.settings, test_config().league.settings());

        let v = parse(&state.handle_message(r#"{"type":"PATCH_SETTINGS","rounds":"many"}"#));
        assert_eq!(v["kind"], "MALFORMED_SETTINGS_PATCH");
    }

    #[test]
    fn handle_message_undo_and_reset_shapes() {
        let mut state = create_test_app_state();

        let empty = parse(&state.handle_message(r#"{"type":"UNDO"}"#));
        assert_eq!(empty["type"], "OK");
        assert!(empty["data"].is_null());

        state.add_pick("k1", Owner::Other).unwrap();
        let reset = parse(&state.handle_message(r#"{"type":"RESET"}"#));
        assert_eq!(reset["data"]["cleared"], 1);
    }

    #[test]
    fn handle_message_patch_settings_returns_merged() {
        let mut state = create_test_app_state();
        let v = parse(&state.handle_message(
            r#"{"type":"PATCH_SETTINGS","scoring":"standard"}"#,
        ));
        assert_eq!(v["type"], "OK");
        assert_eq!(v["data"]["scoring"], "standard");
        assert_eq!(v["data"]["league_size"], 12);

        let bad = parse(&state.handle_message(r#"{"type":"PATCH_SETTINGS","league_size":1}"#));
        assert_eq!(bad["kind"], "MALFORMED_SETTINGS_PATCH");
        assert_eq!(state.settings.scoring, ScoringMode::Standard);
    }

    // -----------------------------------------------------------------------
    // Tests: crash recovery
    // -----------------------------------------------------------------------

    #[test]
    fn recover_restores_picks_and_settings() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::SelfOwner).unwrap();
        state.add_pick("wr1", Owner::Other).unwrap();
        state
            .patch_settings(&SettingsPatch {
                draft_slot: Some(3),
                ..SettingsPatch::default()
            })
            .unwrap();

        // Same database, fresh in-memory state.
        state.log = DraftLog::new();
        state.settings = Settings::default();

        assert!(recover_from_db(&mut state).unwrap());
        let ids: Vec<&str> = state.log.picks().iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["rb1", "wr1"]);
        assert_eq!(state.log.picks()[0].owner, Owner::SelfOwner);
        assert_eq!(state.settings.draft_slot, 3);
    }

    #[test]
    fn recover_with_empty_database_starts_fresh() {
        let mut state = create_test_app_state();
        assert!(!recover_from_db(&mut state).unwrap());
        assert!(state.log.is_empty());
        assert_eq!(state.settings, test_config().league.settings());
    }

    #[test]
    fn recover_ignores_undecodable_settings() {
        let mut state = create_test_app_state();
        state.add_pick("rb1", Owner::SelfOwner).unwrap();
        state
            .db
            .put_value(
                Database::SETTINGS_KEY,
                &serde_json::json!({"league_size": "twelve", "scoring": "points"}),
            )
            .unwrap();

        state.log = DraftLog::new();
        assert!(recover_from_db(&mut state).unwrap());
        assert_eq!(state.settings, test_config().league.settings());
        assert_eq!(state.log.len(), 1);
    }

    #[test]
    fn recover_drops_picks_missing_from_catalog() {
        let mut state = create_test_app_state();
        state
            .db
            .append_pick(&Pick::new("rb1", Owner::Other), 1, "test-draft")
            .unwrap();
        state
            .db
            .append_pick(&Pick::new("retired", Owner::Other), 2, "test-draft")
            .unwrap();
        state
            .db
            .append_pick(&Pick::new("wr1", Owner::SelfOwner), 3, "test-draft")
            .unwrap();

        assert!(recover_from_db(&mut state).unwrap());
        assert_eq!(state.log.len(), 2);
        // The stored copy now matches memory, so the next pick lands at seq 3.
        assert_eq!(state.db.pick_count("test-draft").unwrap(), 2);
        state.add_pick("te1", Owner::SelfOwner).unwrap();
        assert_eq!(state.db.load_picks("test-draft").unwrap().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Tests: event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_answers_requests_and_tracks_clients() {
        let (ws_tx, ws_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let handle = tokio::spawn(run(ws_rx, cmd_rx, create_test_app_state()));

        ws_tx
            .send(WsEvent::Connected { addr: "a".into() })
            .await
            .unwrap();
        ws_tx
            .send(WsEvent::Connected { addr: "b".into() })
            .await
            .unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        ws_tx
            .send(WsEvent::Request {
                addr: "a".into(),
                payload: r#"{"type":"ADD_PICK","player_id":"rb2","owner":"self"}"#.into(),
                reply: reply_tx,
            })
            .await
            .unwrap();
        assert_eq!(parse(&reply_rx.await.unwrap())["type"], "OK");

        ws_tx
            .send(WsEvent::Disconnected { addr: "b".into() })
            .await
            .unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        ws_tx
            .send(WsEvent::Request {
                addr: "a".into(),
                payload: r#"{"type":"GET_SNAPSHOT"}"#.into(),
                reply: reply_tx,
            })
            .await
            .unwrap();
        let snap = parse(&reply_rx.await.unwrap());
        assert_eq!(snap["data"]["picks_made"], 1);
        assert_eq!(snap["data"]["clients_connected"], 1);

        cmd_tx.send(AppCommand::Quit).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should stop on Quit")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn run_survives_dropped_reply_channel() {
        let (ws_tx, ws_rx) = mpsc::channel(16);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let handle = tokio::spawn(run(ws_rx, cmd_rx, create_test_app_state()));

        let (reply_tx, reply_rx) = oneshot::channel();
        drop(reply_rx);
        ws_tx
            .send(WsEvent::Request {
                addr: "gone".into(),
                payload: r#"{"type":"GET_COUNTS"}"#.into(),
                reply: reply_tx,
            })
            .await
            .unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        ws_tx
            .send(WsEvent::Request {
                addr: "here".into(),
                payload: r#"{"type":"GET_COUNTS"}"#.into(),
                reply: reply_tx,
            })
            .await
            .unwrap();
        assert_eq!(parse(&reply_rx.await.unwrap())["type"], "OK");

        drop(ws_tx);
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should stop when the ws channel closes")
            .unwrap();
        assert!(result.is_ok());
    }
}
