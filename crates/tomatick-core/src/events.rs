use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{RunState, TimerPhase};

/// Every state change in the engine produces an Event.
/// The rendering layer subscribes to these; the engine itself performs no
/// side effects and has no dependency on any UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: TimerPhase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: TimerPhase,
        at: DateTime<Utc>,
    },
    /// Manual phase override (tab click). Never granted a long break and
    /// never counted toward the cadence.
    ModeSwitched {
        phase: TimerPhase,
        run_state: RunState,
        at: DateTime<Utc>,
    },
    /// A settings edit was accepted. `deferred` means a countdown was in
    /// flight and the edit only takes effect at the next phase boundary.
    SettingsUpdated {
        deferred: bool,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero naturally. This is the at-most-once
    /// notification boundary: one sound per completion.
    PhaseCompleted {
        phase: TimerPhase,
        at: DateTime<Utc>,
    },
    /// A work phase ended with at least one elapsed minute. Consumers build
    /// the persistent focus-session record from this.
    SessionCompleted {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        minutes: u32,
    },
    /// The engine re-armed itself for the next phase.
    PhaseEntered {
        phase: TimerPhase,
        total_seconds: u32,
        auto_started: bool,
        at: DateTime<Utc>,
    },
}
