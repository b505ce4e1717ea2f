// QuestTasks entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the local cache database
// 4. Build the HTTP client
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use questtasks_core::api::client::HttpApi;
use questtasks_core::api::MissionApi;
use questtasks_core::config;
use questtasks_core::db::Database;
use questtasks_tui::app::{self, AppState};
use questtasks_tui::tui::{self, ViewState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("QuestTasks starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: server={}, layout={}",
        config.server.base_url,
        config.map.layout.label()
    );

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. HTTP client
    let api: Arc<dyn MissionApi> =
        Arc::new(HttpApi::from_config(&config.server).context("failed to build HTTP client")?);

    // 5. Channels
    let (api_tx, api_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let view_state = ViewState::new(config.authoring.default_points);
    let app_state = AppState::new(config, db, api, api_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(api_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {:#}", e);
        }
    });

    // 7. Run the TUI (blocks until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx, view_state).await {
        error!("TUI error: {:#}", e);
    }

    // 8. Cleanup: wait for the app task to finish (with timeout)
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("QuestTasks shut down cleanly");
    Ok(())
}

/// Log to a file; the terminal belongs to the TUI.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_file = std::fs::File::create(log_dir.join("questtasks.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("questtasks=info,questtasks_tui=info,questtasks_core=info,warn")
            }),
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

/// Platform data directory, or `./logs` when none is known.
fn log_dir() -> anyhow::Result<PathBuf> {
    match directories::ProjectDirs::from("", "", "questtasks") {
        Some(dirs) => Ok(dirs.data_local_dir().join("logs")),
        None => Ok(std::env::current_dir()?.join("logs")),
    }
}
