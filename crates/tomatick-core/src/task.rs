//! Task records linked to focus sessions.
//!
//! At most one task is active at a time; the active task supplies the
//! category (`Task: {title}`) and the linked-task reference for sessions
//! logged while it is active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub estimated_pomodoros: u32,
    pub completed_pomodoros: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, estimated_pomodoros: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            estimated_pomodoros,
            completed_pomodoros: 0,
            active: false,
            created_at: Utc::now(),
        }
    }

    /// Category label for sessions logged while this task is active.
    pub fn category_label(&self) -> String {
        format!("Task: {}", self.title)
    }
}
