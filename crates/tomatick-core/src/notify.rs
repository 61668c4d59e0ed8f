//! Notification sink.
//!
//! The runtime fires the sink exactly once per natural phase completion
//! (driven off `Event::PhaseCompleted`). Implementations must tolerate a
//! missing audio backend; [`NullSink`] is the canonical no-op.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which cue to play at a phase boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    #[default]
    Bell,
    Digital,
    Bird,
    Custom,
}

impl fmt::Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SoundKind::Bell => "bell",
            SoundKind::Digital => "digital",
            SoundKind::Bird => "bird",
            SoundKind::Custom => "custom",
        };
        f.write_str(s)
    }
}

impl FromStr for SoundKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bell" => Ok(SoundKind::Bell),
            "digital" => Ok(SoundKind::Digital),
            "bird" => Ok(SoundKind::Bird),
            "custom" => Ok(SoundKind::Custom),
            other => Err(format!("unknown sound: {other}")),
        }
    }
}

/// Audible-cue capability.
pub trait NotificationSink {
    fn notify(&self, sound: SoundKind);
}

/// Sink for environments with no audio backend.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _sound: SoundKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_kind_round_trips_through_str() {
        for kind in [
            SoundKind::Bell,
            SoundKind::Digital,
            SoundKind::Bird,
            SoundKind::Custom,
        ] {
            assert_eq!(kind.to_string().parse::<SoundKind>(), Ok(kind));
        }
        assert!("chime".parse::<SoundKind>().is_err());
    }
}
