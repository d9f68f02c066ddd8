//! Synthetic Alarm - a software alarm panel for home automation
//! 
//! This is the main entry point for the synthetic-alarm application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use synthetic_alarm::{
    api::create_router,
    config::Config,
    services::{IndicatorBoard, ScriptRunner},
    state::{AlarmStateMachine, AppState},
    tasks::{state_reporter_task, TokioScheduler},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("synthetic_alarm={},tower_http=info", config.log_level()))
        .init();

    info!("Starting synthetic-alarm server v{}", env!("CARGO_PKG_VERSION"));

    // Configuration errors prevent the panel from being created
    let panel_config = config.panel_config()?;
    let scripts = ScriptRunner::new(config.scripts_dir.clone());
    info!(
        "Configuration: host={}, port={}, scripts={}, panel={}",
        config.host,
        config.port,
        scripts.scripts_dir().display(),
        panel_config.unique_id()
    );

    if !scripts.scripts_dir().is_dir() {
        tracing::warn!(
            "Scripts directory {} does not exist, actions will fail",
            scripts.scripts_dir().display()
        );
    }

    let indicators = IndicatorBoard::new(config.indicator_command.clone());
    let panel = AlarmStateMachine::new(
        panel_config,
        Arc::new(scripts),
        Arc::new(indicators.clone()),
        Arc::new(TokioScheduler::new()),
    )?;

    // Log every mode transition in the background
    tokio::spawn(state_reporter_task(panel.clone()));

    let state = Arc::new(AppState::new(
        panel.clone(),
        indicators,
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /alarm/arm_home - Arm home (body: {{\"code\": ...}})");
    info!("  POST /alarm/arm_away - Arm away (body: {{\"code\": ...}})");
    info!("  POST /alarm/disarm   - Disarm (body: {{\"code\": ...}})");
    info!("  POST /alarm/trigger  - Sensor trip");
    info!("  GET  /status         - Panel state, timer and indicators");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for signals: {}", e),
            }
        }
    }

    panel.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
