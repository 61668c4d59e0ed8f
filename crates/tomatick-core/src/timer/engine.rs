//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine: the caller (normally a
//! [`Ticker`](super::Ticker) loop) delivers one `tick()` per elapsed second
//! and the engine decides countdown progress, phase transitions, long-break
//! cadence and session accounting. It performs no side effects of its own;
//! every state change is reported through [`Event`]s.
//!
//! ## States
//!
//! The state space is the cross product of `TimerPhase` (work, short break,
//! long break) and `RunState` (idle, running, paused). Idle means the
//! countdown is frozen at the full phase duration awaiting start.
//!
//! Settings edits are adopted immediately while idle and deferred to the
//! next phase boundary otherwise, so an in-flight countdown is never
//! re-shaped under the user.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::settings::TimerSettings;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerPhase {
    pub fn is_break(self) -> bool {
        matches!(self, TimerPhase::ShortBreak | TimerPhase::LongBreak)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Point-in-time view of the engine, for display layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub run_state: RunState,
    pub seconds_remaining: u32,
    pub total_seconds: u32,
    pub phase_started_at: Option<DateTime<Utc>>,
    pub completed_work_cycles: u32,
}

/// Core timer state machine.
///
/// Constructed from explicit settings; holds no statics and never blocks.
/// `completed_work_cycles` is process-local state: it serializes with the
/// engine but no durable counter survives a fresh construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    /// Settings edit received while a countdown was in flight; adopted at
    /// the next phase boundary.
    #[serde(default)]
    pending_settings: Option<TimerSettings>,
    phase: TimerPhase,
    run_state: RunState,
    seconds_remaining: u32,
    total_seconds: u32,
    /// Wall-clock start of the current work phase; None while idle or in a
    /// break. Fallback for session timestamps when ticks were missed.
    #[serde(default)]
    phase_started_at: Option<DateTime<Utc>>,
    completed_work_cycles: u32,
}

impl TimerEngine {
    /// Create an engine in `Work`/`Idle` at the full work duration.
    ///
    /// `settings` must already be validated; see
    /// [`TimerSettings::validate`].
    pub fn new(settings: TimerSettings) -> Self {
        let total = settings.work_minutes * 60;
        Self {
            settings,
            pending_settings: None,
            phase: TimerPhase::Work,
            run_state: RunState::Idle,
            seconds_remaining: total,
            total_seconds: total,
            phase_started_at: None,
            completed_work_cycles: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.seconds_remaining as f64 / self.total_seconds as f64)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            run_state: self.run_state,
            seconds_remaining: self.seconds_remaining,
            total_seconds: self.total_seconds,
            phase_started_at: self.phase_started_at,
            completed_work_cycles: self.completed_work_cycles,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown.
    ///
    /// Starting a work phase from idle at the full duration stamps
    /// `phase_started_at`; resuming from pause keeps the original stamp.
    pub fn start(&mut self) -> Option<Event> {
        match self.run_state {
            RunState::Idle | RunState::Paused => {
                if self.run_state == RunState::Idle
                    && self.seconds_remaining == self.total_seconds
                    && self.phase == TimerPhase::Work
                {
                    self.phase_started_at = Some(Utc::now());
                }
                self.run_state = RunState::Running;
                Some(Event::TimerStarted {
                    phase: self.phase,
                    seconds_remaining: self.seconds_remaining,
                    at: Utc::now(),
                })
            }
            RunState::Running => None,
        }
    }

    /// Freeze the countdown. The remaining seconds are retained.
    pub fn pause(&mut self) -> Option<Event> {
        match self.run_state {
            RunState::Running => {
                self.run_state = RunState::Paused;
                Some(Event::TimerPaused {
                    seconds_remaining: self.seconds_remaining,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Deliver one elapsed second. Only meaningful while running.
    ///
    /// Reaching zero triggers phase completion: the returned events then
    /// include `PhaseCompleted`, possibly `SessionCompleted`, and
    /// `PhaseEntered` for the re-armed next phase. The countdown is never
    /// left displaying zero.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.complete_phase()
        } else {
            Vec::new()
        }
    }

    /// Return to idle at the full duration of the current phase.
    ///
    /// Never logs a session, even mid-work. Any deferred settings edit is
    /// adopted here: the countdown it was protecting is being discarded.
    pub fn reset(&mut self) -> Event {
        self.adopt_pending_settings();
        self.total_seconds = self.duration_for(self.phase);
        self.seconds_remaining = self.total_seconds;
        self.run_state = RunState::Idle;
        self.phase_started_at = None;
        Event::TimerReset {
            phase: self.phase,
            at: Utc::now(),
        }
    }

    /// End the current phase now.
    ///
    /// In a work phase: if at least a minute elapsed, emit a
    /// `SessionCompleted` with `floor(elapsed / 60)` minutes and count the
    /// cycle; either way advance to a break chosen by the cadence. In a
    /// break: advance straight to work. `manual` overrides autostart, so an
    /// explicit finish always lands in idle.
    pub fn finish(&mut self, manual: bool) -> Vec<Event> {
        let now = Utc::now();
        let mut events = Vec::new();

        let next = match self.phase {
            TimerPhase::Work => {
                let elapsed = self.total_seconds - self.seconds_remaining;
                if elapsed >= 60 {
                    let started = self
                        .phase_started_at
                        .unwrap_or_else(|| now - Duration::seconds(i64::from(elapsed)));
                    events.push(Event::SessionCompleted {
                        started_at: started,
                        ended_at: now,
                        minutes: elapsed / 60,
                    });
                    self.completed_work_cycles += 1;
                }
                self.next_break_kind()
            }
            TimerPhase::ShortBreak | TimerPhase::LongBreak => TimerPhase::Work,
        };

        self.adopt_pending_settings();
        events.push(self.enter_phase(next, manual, now));
        events
    }

    /// Force a phase, e.g. from a manual tab click.
    ///
    /// Never consults the cadence (a long break is only reached via
    /// completion) and never touches the cycle counter.
    pub fn switch_mode(&mut self, target: TimerPhase, start_immediately: bool) -> Event {
        self.adopt_pending_settings();
        self.phase = target;
        self.total_seconds = self.duration_for(target);
        self.seconds_remaining = self.total_seconds;
        self.run_state = if start_immediately {
            RunState::Running
        } else {
            RunState::Idle
        };
        let now = Utc::now();
        self.phase_started_at = if start_immediately && target == TimerPhase::Work {
            Some(now)
        } else {
            None
        };
        Event::ModeSwitched {
            phase: self.phase,
            run_state: self.run_state,
            at: now,
        }
    }

    /// Accept a (validated) settings edit.
    ///
    /// Idle: takes effect immediately, recomputing the displayed duration.
    /// Running/Paused: recorded and deferred to the next phase boundary so
    /// the in-flight countdown keeps its shape.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Event {
        let deferred = self.run_state != RunState::Idle;
        if deferred {
            self.pending_settings = Some(settings);
        } else {
            self.settings = settings;
            self.total_seconds = self.duration_for(self.phase);
            self.seconds_remaining = self.total_seconds;
        }
        Event::SettingsUpdated {
            deferred,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Natural completion: tick reached zero.
    fn complete_phase(&mut self) -> Vec<Event> {
        let now = Utc::now();
        let finished = self.phase;
        let mut events = vec![Event::PhaseCompleted {
            phase: finished,
            at: now,
        }];

        let next = match finished {
            TimerPhase::Work => {
                if let Some(started) = self.phase_started_at {
                    // Logged minutes come from the configured duration, not
                    // from tick counting, so delivery jitter cannot skew the
                    // record.
                    events.push(Event::SessionCompleted {
                        started_at: started,
                        ended_at: now,
                        minutes: self.settings.work_minutes,
                    });
                    self.completed_work_cycles += 1;
                }
                self.next_break_kind()
            }
            TimerPhase::ShortBreak | TimerPhase::LongBreak => TimerPhase::Work,
        };

        self.adopt_pending_settings();
        events.push(self.enter_phase(next, false, now));
        events
    }

    /// Break kind by post-increment cadence: the Nth completed work phase
    /// earns the long break when N divides evenly.
    fn next_break_kind(&self) -> TimerPhase {
        if self.completed_work_cycles > 0
            && self.completed_work_cycles % self.settings.sessions_until_long_break == 0
        {
            TimerPhase::LongBreak
        } else {
            TimerPhase::ShortBreak
        }
    }

    fn enter_phase(&mut self, next: TimerPhase, manual: bool, now: DateTime<Utc>) -> Event {
        self.phase = next;
        self.total_seconds = self.duration_for(next);
        self.seconds_remaining = self.total_seconds;
        let auto_started = self.settings.auto_start && !manual;
        if auto_started {
            self.run_state = RunState::Running;
            self.phase_started_at = if next == TimerPhase::Work {
                Some(now)
            } else {
                None
            };
        } else {
            self.run_state = RunState::Idle;
            self.phase_started_at = None;
        }
        Event::PhaseEntered {
            phase: next,
            total_seconds: self.total_seconds,
            auto_started,
            at: now,
        }
    }

    fn adopt_pending_settings(&mut self) {
        if let Some(settings) = self.pending_settings.take() {
            self.settings = settings;
        }
    }

    fn duration_for(&self, phase: TimerPhase) -> u32 {
        let minutes = match phase {
            TimerPhase::Work => self.settings.work_minutes,
            TimerPhase::ShortBreak => self.settings.short_break_minutes,
            TimerPhase::LongBreak => self.settings.long_break_minutes,
        };
        minutes * 60
    }
}
