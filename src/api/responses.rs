//! API request and response structures

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::{PanelConfig, MANUFACTURER, MODEL},
    state::PanelSnapshot,
};

/// Optional body of the arm and disarm endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub panel: PanelSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, panel: PanelSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            panel,
        }
    }

    /// Create a success response
    pub fn ok(message: String, panel: PanelSnapshot) -> Self {
        Self::new("ok".to_string(), message, panel)
    }

    /// Create an error response
    pub fn error(message: String, panel: PanelSnapshot) -> Self {
        Self::new("error".to_string(), message, panel)
    }
}

/// Entity metadata a frontend needs to render the panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInfo {
    pub unique_id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub code_format: Option<String>,
    pub code_arm_required: bool,
    pub supported_features: Vec<String>,
}

impl EntityInfo {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            unique_id: config.unique_id(),
            name: config.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
            code_format: config.code_format().map(str::to_string),
            code_arm_required: config.code_arm_required,
            supported_features: vec!["arm_home".to_string(), "arm_away".to_string()],
        }
    }
}

/// Status response with timer and indicator information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub entity: EntityInfo,
    pub panel: PanelSnapshot,
    pub timer_remaining_seconds: Option<u64>,
    pub indicators: BTreeMap<String, bool>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
