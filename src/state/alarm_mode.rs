//! Alarm modes and arm targets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target of an arm command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmTarget {
    Home,
    Away,
}

impl ArmTarget {
    /// Mode entered while waiting for the arming delay
    pub fn arming_mode(self) -> AlarmMode {
        match self {
            ArmTarget::Home => AlarmMode::ArmingHome,
            ArmTarget::Away => AlarmMode::ArmingAway,
        }
    }

    /// Mode entered once arming is committed
    pub fn armed_mode(self) -> AlarmMode {
        match self {
            ArmTarget::Home => AlarmMode::ArmedHome,
            ArmTarget::Away => AlarmMode::ArmedAway,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArmTarget::Home => "home",
            ArmTarget::Away => "away",
        }
    }
}

impl fmt::Display for ArmTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every mode the panel can be in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmMode {
    #[default]
    Disarmed,
    ArmingHome,
    ArmingAway,
    ArmedHome,
    ArmedAway,
    Triggered,
}

impl AlarmMode {
    /// Home/away family of the mode. `Disarmed` and `Triggered` have none;
    /// for `Triggered` the family comes from where the trigger happened.
    pub fn family(self) -> Option<ArmTarget> {
        match self {
            AlarmMode::ArmingHome | AlarmMode::ArmedHome => Some(ArmTarget::Home),
            AlarmMode::ArmingAway | AlarmMode::ArmedAway => Some(ArmTarget::Away),
            AlarmMode::Disarmed | AlarmMode::Triggered => None,
        }
    }

    pub fn is_armed(self) -> bool {
        matches!(self, AlarmMode::ArmedHome | AlarmMode::ArmedAway)
    }

    pub fn is_arming(self) -> bool {
        matches!(self, AlarmMode::ArmingHome | AlarmMode::ArmingAway)
    }

    pub fn is_triggered(self) -> bool {
        self == AlarmMode::Triggered
    }

    /// Modes that own a pending timer
    pub fn holds_timer(self) -> bool {
        self.is_arming() || self.is_triggered()
    }

    /// State string as a home-automation frontend expects it.
    /// Both arming modes collapse to `arming`.
    pub fn platform_state(self) -> &'static str {
        match self {
            AlarmMode::Disarmed => "disarmed",
            AlarmMode::ArmingHome | AlarmMode::ArmingAway => "arming",
            AlarmMode::ArmedHome => "armed_home",
            AlarmMode::ArmedAway => "armed_away",
            AlarmMode::Triggered => "triggered",
        }
    }
}

impl fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arming_modes_collapse_for_the_frontend() {
        assert_eq!(AlarmMode::ArmingHome.to_string(), "arming");
        assert_eq!(AlarmMode::ArmingAway.to_string(), "arming");
        assert_eq!(AlarmMode::ArmedAway.to_string(), "armed_away");
    }

    #[test]
    fn family_follows_target() {
        assert_eq!(AlarmMode::ArmingHome.family(), Some(ArmTarget::Home));
        assert_eq!(AlarmMode::ArmedAway.family(), Some(ArmTarget::Away));
        assert_eq!(AlarmMode::Triggered.family(), None);
        assert_eq!(AlarmMode::Disarmed.family(), None);
    }

    #[test]
    fn only_arming_and_triggered_hold_timers() {
        let holding: Vec<_> = [
            AlarmMode::Disarmed,
            AlarmMode::ArmingHome,
            AlarmMode::ArmingAway,
            AlarmMode::ArmedHome,
            AlarmMode::ArmedAway,
            AlarmMode::Triggered,
        ]
        .into_iter()
        .filter(|m| m.holds_timer())
        .collect();
        assert_eq!(
            holding,
            vec![AlarmMode::ArmingHome, AlarmMode::ArmingAway, AlarmMode::Triggered]
        );
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&AlarmMode::ArmingHome).unwrap();
        assert_eq!(json, "\"arming_home\"");
    }
}
