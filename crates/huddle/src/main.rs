// Draft huddle server entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Load the player catalog
// 4. Open database, resolve the draft id, check for crash recovery
// 5. Create mpsc channels
// 6. Spawn WebSocket server task
// 7. Spawn app logic task
// 8. Wait for Ctrl+C, then shut down

use huddle_core::app;
use huddle_core::catalog::load::load_catalog;
use huddle_core::config;
use huddle_core::db::Database;
use huddle_core::ws_server;

use anyhow::Context;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Draft huddle starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, slot {}, {} rounds",
        config.league.name, config.league.league_size, config.league.draft_slot, config.league.rounds
    );

    // 3. Load the player catalog
    let catalog = load_catalog(Path::new(&config.catalog_path))
        .with_context(|| format!("failed to load player catalog {}", config.catalog_path))?;

    // 4. Open database
    let db_path = config.resolve_db_path()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path_str = db_path.to_string_lossy().into_owned();
    let db = Database::open(&db_path_str).context("failed to open database")?;
    info!("Database opened at {}", db_path_str);

    let draft_id = match db.get_draft_id()? {
        Some(id) => id,
        None => {
            let id = Database::generate_draft_id();
            db.set_draft_id(&id)?;
            info!("Started new draft {}", id);
            id
        }
    };

    let mut app_state = app::AppState::new(&config, catalog, db, draft_id);

    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Draft state restored from previous session"),
        Ok(false) => info!("Starting fresh draft session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 5. Create mpsc channels
    let (ws_tx, ws_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(8);

    // 6. Spawn WebSocket server task
    let ws_host = config.ws_host.clone();
    let ws_port = config.ws_port;
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(&ws_host, ws_port, ws_tx).await {
            error!("WebSocket server error on {}:{}: {}", ws_host, ws_port, e);
        }
    });

    // 7. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(ws_rx, cmd_rx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    info!(
        "Ready. WebSocket server listening on {}:{}",
        config.ws_host, config.ws_port
    );
    println!(
        "huddle: serving on ws://{}:{} (Ctrl+C to stop)",
        config.ws_host, config.ws_port
    );

    // 8. Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("Ctrl+C received");
    let _ = cmd_tx.send(app::AppCommand::Quit).await;

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    // Abort WebSocket server (it loops forever)
    ws_handle.abort();

    info!("Draft huddle shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("huddle.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("huddle=info,huddle_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
