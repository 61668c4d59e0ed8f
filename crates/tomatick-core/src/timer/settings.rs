//! User-facing timer settings.
//!
//! Validation lives here, at the mutation boundary. The engine treats a
//! `TimerSettings` it receives as a precondition: durations are positive and
//! the cadence is at least 2.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notify::SoundKind;

/// Timer durations, cadence and behavior flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Completed work phases per long break.
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    /// Whether the next phase starts counting down on its own after a
    /// natural completion.
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub sound: SoundKind,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_categories() -> Vec<String> {
    ["General", "Coding", "English", "Reading", "Work"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_until_long_break: default_sessions_until_long_break(),
            auto_start: false,
            sound: SoundKind::default(),
            categories: default_categories(),
        }
    }
}

impl TimerSettings {
    /// Reject out-of-range values before they ever reach the engine.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timer.work_minutes", self.work_minutes),
            ("timer.short_break_minutes", self.short_break_minutes),
            ("timer.long_break_minutes", self.long_break_minutes),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "duration must be at least 1 minute".into(),
                });
            }
        }
        if self.sessions_until_long_break < 2 {
            return Err(ConfigError::InvalidValue {
                key: "timer.sessions_until_long_break".into(),
                message: "cadence must be at least 2".into(),
            });
        }
        Ok(())
    }
}
