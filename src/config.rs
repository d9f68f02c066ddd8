//! Configuration and CLI argument handling

use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::state::AlarmError;

pub const DOMAIN: &str = "synthetic_alarm";
pub const DEFAULT_NAME: &str = "Synthetic Alarm";
pub const MANUFACTURER: &str = "Synthetic";
pub const MODEL: &str = "Synthetic Alarm Panel";

pub const MAX_DELAY_TIME: u32 = 300;
pub const MAX_TRIGGER_TIME: u32 = 3600;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "synthetic-alarm")]
#[command(about = "A synthetic alarm panel driving scripts and indicator devices")]
#[command(version = "2.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// JSON file holding the panel configuration
    #[arg(long)]
    pub panel: Option<PathBuf>,

    /// Panel display name
    #[arg(long)]
    pub name: Option<String>,

    /// Panel code, empty for none
    #[arg(long)]
    pub code: Option<String>,

    /// Require the code for arming as well as disarming
    /// (`--code-arm-required` alone means true)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub code_arm_required: Option<bool>,

    /// Seconds to wait before an arm command takes effect
    #[arg(long)]
    pub delay_time: Option<u32>,

    /// Seconds the triggered state lasts
    #[arg(long)]
    pub trigger_time: Option<u32>,

    /// Directory holding the action scripts
    #[arg(long, default_value = "./scripts")]
    pub scripts_dir: PathBuf,

    /// Command run as `<command> <device> on|off` for indicator updates
    #[arg(long)]
    pub indicator_command: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the validated panel configuration: the panel file if given,
    /// then any CLI overrides on top
    pub fn panel_config(&self) -> Result<PanelConfig, AlarmError> {
        let mut panel = match &self.panel {
            Some(path) => {
                info!("Loading panel configuration from {}", path.display());
                let raw = fs::read_to_string(path).map_err(|e| {
                    AlarmError::Configuration(format!("cannot read {}: {}", path.display(), e))
                })?;
                PanelConfig::from_json_str(&raw)?
            }
            None => PanelConfig::default(),
        };

        if let Some(name) = &self.name {
            panel.name = name.clone();
        }
        if let Some(code) = &self.code {
            panel.code = code.clone();
        }
        if let Some(required) = self.code_arm_required {
            panel.code_arm_required = required;
        }
        if let Some(delay) = self.delay_time {
            panel.delay_time = delay;
        }
        if let Some(trigger) = self.trigger_time {
            panel.trigger_time = trigger;
        }

        panel.validate()?;
        Ok(panel)
    }
}

/// Transition events that may run an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEvent {
    ArmHome,
    DisarmHome,
    ArmAway,
    DisarmAway,
}

impl ActionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionEvent::ArmHome => "arm_home",
            ActionEvent::DisarmHome => "disarm_home",
            ActionEvent::ArmAway => "arm_away",
            ActionEvent::DisarmAway => "disarm_away",
        }
    }
}

/// Script reference per transition event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMap {
    #[serde(rename = "script_arm_home", default, deserialize_with = "empty_as_none")]
    pub arm_home: Option<String>,
    #[serde(rename = "script_disarm_home", default, deserialize_with = "empty_as_none")]
    pub disarm_home: Option<String>,
    #[serde(rename = "script_arm_away", default, deserialize_with = "empty_as_none")]
    pub arm_away: Option<String>,
    #[serde(rename = "script_disarm_away", default, deserialize_with = "empty_as_none")]
    pub disarm_away: Option<String>,
}

impl ActionMap {
    pub fn get(&self, event: ActionEvent) -> Option<&str> {
        match event {
            ActionEvent::ArmHome => self.arm_home.as_deref(),
            ActionEvent::DisarmHome => self.disarm_home.as_deref(),
            ActionEvent::ArmAway => self.arm_away.as_deref(),
            ActionEvent::DisarmAway => self.disarm_away.as_deref(),
        }
    }
}

/// Device reference per logical indicator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorMap {
    #[serde(rename = "armed_indicator", default, deserialize_with = "empty_as_none")]
    pub armed: Option<String>,
    #[serde(rename = "alarm_indicator", default, deserialize_with = "empty_as_none")]
    pub alarm: Option<String>,
}

/// Panel configuration, fixed once the panel is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub name: String,
    pub code: String,
    pub code_arm_required: bool,
    /// Arming delay in seconds
    pub delay_time: u32,
    /// Trigger window in seconds
    pub trigger_time: u32,
    #[serde(flatten)]
    pub actions: ActionMap,
    #[serde(flatten)]
    pub indicators: IndicatorMap,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            code: String::new(),
            code_arm_required: false,
            delay_time: 30,
            trigger_time: 600,
            actions: ActionMap::default(),
            indicators: IndicatorMap::default(),
        }
    }
}

impl PanelConfig {
    /// Parse and validate a JSON panel configuration
    pub fn from_json_str(raw: &str) -> Result<Self, AlarmError> {
        let panel: PanelConfig = serde_json::from_str(raw)
            .map_err(|e| AlarmError::Configuration(format!("invalid panel configuration: {}", e)))?;
        panel.validate()?;
        Ok(panel)
    }

    pub fn validate(&self) -> Result<(), AlarmError> {
        if self.name.trim().is_empty() {
            return Err(AlarmError::Configuration("name must not be empty".to_string()));
        }
        if self.delay_time > MAX_DELAY_TIME {
            return Err(AlarmError::Configuration(format!(
                "delay_time {} outside 0..={}",
                self.delay_time, MAX_DELAY_TIME
            )));
        }
        if self.trigger_time > MAX_TRIGGER_TIME {
            return Err(AlarmError::Configuration(format!(
                "trigger_time {} outside 0..={}",
                self.trigger_time, MAX_TRIGGER_TIME
            )));
        }
        Ok(())
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.delay_time))
    }

    pub fn trigger_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.trigger_time))
    }

    /// Stable identifier of the panel entity
    pub fn unique_id(&self) -> String {
        format!("{}_{}", DOMAIN, self.name)
    }

    /// Keypad format shown to frontends, `None` when no code is set
    pub fn code_format(&self) -> Option<&'static str> {
        self.has_code().then_some("number")
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
