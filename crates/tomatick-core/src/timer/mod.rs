mod engine;
mod settings;
mod ticker;

pub use engine::{RunState, TimerEngine, TimerPhase, TimerSnapshot};
pub use settings::TimerSettings;
pub use ticker::Ticker;
