//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::state::{AlarmError, AlarmMode, AppState, ArmTarget};
use super::responses::{ApiResponse, CodeRequest, EntityInfo, HealthResponse, StatusResponse};

type CommandResult = (StatusCode, Json<ApiResponse>);

/// Parse the optional `{"code": ...}` body. An empty body means no code.
fn parse_code(state: &AppState, body: &Bytes) -> Result<Option<String>, CommandResult> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<CodeRequest>(body)
        .map(|request| request.code)
        .map_err(|e| {
            warn!("Rejecting malformed command body: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    format!("Invalid request body: {}", e),
                    state.panel.snapshot(),
                )),
            )
        })
}

/// Map a state machine result onto an HTTP response
fn respond(state: &AppState, command: &str, result: Result<AlarmMode, AlarmError>) -> CommandResult {
    let snapshot = state.panel.snapshot();
    match result {
        Ok(mode) => {
            info!("{} endpoint called - panel is {}", command, mode);
            (
                StatusCode::OK,
                Json(ApiResponse::ok(format!("Panel is {}", mode), snapshot)),
            )
        }
        Err(e) => {
            let status = match e {
                AlarmError::InvalidCode => StatusCode::FORBIDDEN,
                AlarmError::InvalidState { .. } => StatusCode::CONFLICT,
                AlarmError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!("{} rejected: {}", command, e);
            (status, Json(ApiResponse::error(e.to_string(), snapshot)))
        }
    }
}

fn arm(state: &AppState, target: ArmTarget, body: &Bytes) -> CommandResult {
    let command = match target {
        ArmTarget::Home => "arm_home",
        ArmTarget::Away => "arm_away",
    };
    match parse_code(state, body) {
        Ok(code) => respond(state, command, state.panel.arm(target, code.as_deref())),
        Err(rejection) => rejection,
    }
}

/// Handle POST /alarm/arm_home - Arm in home mode
pub async fn arm_home_handler(State(state): State<Arc<AppState>>, body: Bytes) -> CommandResult {
    arm(&state, ArmTarget::Home, &body)
}

/// Handle POST /alarm/arm_away - Arm in away mode
pub async fn arm_away_handler(State(state): State<Arc<AppState>>, body: Bytes) -> CommandResult {
    arm(&state, ArmTarget::Away, &body)
}

/// Handle POST /alarm/disarm - Disarm the panel
pub async fn disarm_handler(State(state): State<Arc<AppState>>, body: Bytes) -> CommandResult {
    match parse_code(&state, &body) {
        Ok(code) => respond(&state, "disarm", state.panel.disarm(code.as_deref())),
        Err(rejection) => rejection,
    }
}

/// Handle POST /alarm/trigger - Sensor trip
pub async fn trigger_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    respond(&state, "trigger", state.panel.trigger())
}

/// Handle GET /status - Return current panel status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let panel = state.panel.snapshot();

    Json(StatusResponse {
        entity: EntityInfo::from_config(state.panel.config()),
        timer_remaining_seconds: panel.timer.remaining_seconds(state.panel.now()),
        panel,
        indicators: state.indicators.values(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
