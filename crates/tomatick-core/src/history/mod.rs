//! Completed focus sessions.

mod csv;

pub use csv::{export_csv, parse_csv, CsvImport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged, completed work phase.
///
/// Created only when a work phase ends with at least one elapsed minute;
/// the engine enforces `minutes >= 1` at creation time and storage does not
/// re-validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub minutes: u32,
    pub category: String,
    pub linked_task_id: Option<Uuid>,
}

impl FocusSession {
    /// Display label, e.g. `2026/08/29`.
    pub fn date_label(&self) -> String {
        self.started_at.format("%Y/%m/%d").to_string()
    }

    /// Display range, e.g. `09:00 - 09:25`.
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.started_at.format("%H:%M"),
            self.ended_at.format("%H:%M")
        )
    }

    /// Calendar date, e.g. `2026-08-29`.
    pub fn iso_date(&self) -> String {
        self.started_at.format("%Y-%m-%d").to_string()
    }
}
