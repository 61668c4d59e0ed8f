//! Delimited import/export of the session log.
//!
//! Row shape: `date label, time range, minutes, category, iso date`, e.g.
//! `2026/08/29,09:00 - 09:25,25,General,2026-08-29`. The iso date and time
//! range are authoritative on import; the date label is display-only.
//!
//! Malformed rows are skipped and counted rather than failing the batch; an
//! input with no parseable rows at all is an error, and in that case the
//! existing session log is left untouched (parsing never mutates storage).

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use super::FocusSession;
use crate::error::ImportError;

const HEADER: &str = "date,range,minutes,category,iso_date";

/// Result of parsing an import payload.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub sessions: Vec<FocusSession>,
    /// Malformed rows that were skipped.
    pub skipped: usize,
}

/// Render sessions in their stored (most recent first) order.
pub fn export_csv(sessions: &[FocusSession]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for s in sessions {
        // A comma inside the category would split the row into six fields
        // on re-import.
        let category = s.category.replace(',', ";");
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            s.date_label(),
            s.time_range(),
            s.minutes,
            category,
            s.iso_date()
        ));
    }
    out
}

/// Parse an import payload.
///
/// # Errors
/// `ImportError::Empty` for a blank input, `ImportError::NoValidRows` when
/// every row was malformed.
pub fn parse_csv(input: &str) -> Result<CsvImport, ImportError> {
    let mut sessions = Vec::new();
    let mut skipped = 0usize;
    let mut saw_row = false;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !saw_row && line == HEADER {
            continue;
        }
        saw_row = true;
        match parse_row(line) {
            Some(session) => sessions.push(session),
            None => skipped += 1,
        }
    }

    if !saw_row {
        return Err(ImportError::Empty);
    }
    if sessions.is_empty() {
        return Err(ImportError::NoValidRows { skipped });
    }
    Ok(CsvImport { sessions, skipped })
}

fn parse_row(line: &str) -> Option<FocusSession> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return None;
    }
    let minutes: u32 = fields[2].parse().ok()?;
    if minutes == 0 {
        return None;
    }
    let category = fields[3];
    if category.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(fields[4], "%Y-%m-%d").ok()?;

    let (start_raw, end_raw) = fields[1].split_once('-')?;
    let start = NaiveTime::parse_from_str(start_raw.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end_raw.trim(), "%H:%M").ok()?;

    let started_at = date.and_time(start).and_utc();
    let mut ended_at = date.and_time(end).and_utc();
    if ended_at < started_at {
        // Range crosses midnight.
        ended_at += chrono::Duration::days(1);
    }

    Some(FocusSession {
        id: Uuid::new_v4(),
        started_at,
        ended_at,
        minutes,
        category: category.to_string(),
        linked_task_id: None,
    })
}
