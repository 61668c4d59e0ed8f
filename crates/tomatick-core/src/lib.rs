//! # Tomatick Core Library
//!
//! Core business logic for the Tomatick Pomodoro timer. All operations are
//! available through a standalone CLI binary; any richer frontend is a thin
//! layer over this same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure tick-driven state machine; the caller advances
//!   it by invoking `tick()` once per elapsed second
//! - **Runtime**: applies engine events to storage, notifications and the
//!   optional remote mirror
//! - **Storage**: SQLite-based session log and task list, TOML-based
//!   configuration
//! - **History**: CSV export and best-effort CSV import of the session log
//! - **Sync**: optional JSON-over-HTTP mirror of settings and sessions
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerRuntime`]: engine plus its side-effect collaborators
//! - [`Database`]: session, task and statistics persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, ImportError, StorageError, SyncError};
pub use events::Event;
pub use history::FocusSession;
pub use notify::{NotificationSink, NullSink, SoundKind};
pub use runtime::TimerRuntime;
pub use storage::{Config, Database, Stats, SyncConfig};
pub use sync::{ReconcileOutcome, RemoteIdentity, RemoteStore};
pub use task::Task;
pub use timer::{RunState, Ticker, TimerEngine, TimerPhase, TimerSettings, TimerSnapshot};
