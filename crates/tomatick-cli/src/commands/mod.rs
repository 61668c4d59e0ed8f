pub mod config;
pub mod history;
pub mod stats;
pub mod sync;
pub mod task;
pub mod timer;
