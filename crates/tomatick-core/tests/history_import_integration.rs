//! Integration tests for session-log import and export.
//!
//! These cover the full workflow: parsing an external payload, merging it
//! into an existing log, and exporting the merged result.

use tomatick_core::history::{export_csv, parse_csv};
use tomatick_core::{Database, FocusSession, ImportError};

use chrono::{TimeZone, Utc};
use uuid::Uuid;

fn existing_session() -> FocusSession {
    FocusSession {
        id: Uuid::new_v4(),
        started_at: Utc.with_ymd_and_hms(2026, 8, 28, 14, 0, 0).unwrap(),
        ended_at: Utc.with_ymd_and_hms(2026, 8, 28, 14, 25, 0).unwrap(),
        minutes: 25,
        category: "existing".into(),
        linked_task_id: None,
    }
}

#[test]
fn import_merges_valid_rows_ahead_of_existing_log() {
    let db = Database::open_memory().unwrap();
    db.append_session(&existing_session()).unwrap();

    let payload = "\
2026/08/29,09:00 - 09:25,25,Coding,2026-08-29
broken line without fields
2026/08/29,10:00 - 10:25,25,General,2026-08-29
2026/08/29,11:00 - 11:25,NaN,Reading,2026-08-29
2026/08/29,12:00 - 12:25,25,Reading,2026-08-29
";
    let parsed = parse_csv(payload).unwrap();
    assert_eq!(parsed.sessions.len(), 3);
    assert_eq!(parsed.skipped, 2);

    db.import_sessions(&parsed.sessions).unwrap();

    let listed = db.list_sessions(None).unwrap();
    let categories: Vec<_> = listed.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(categories, ["Coding", "General", "Reading", "existing"]);
    // The pre-existing entry is untouched.
    assert_eq!(listed[3].minutes, 25);
    assert_eq!(listed[3].started_at, existing_session().started_at);
}

#[test]
fn unusable_payload_leaves_log_untouched() {
    let db = Database::open_memory().unwrap();
    db.append_session(&existing_session()).unwrap();

    let err = parse_csv("junk\nmore junk\n").unwrap_err();
    assert!(matches!(err, ImportError::NoValidRows { skipped: 2 }));

    assert_eq!(db.count_sessions().unwrap(), 1);
}

#[test]
fn export_of_merged_log_parses_back() {
    let db = Database::open_memory().unwrap();
    db.append_session(&existing_session()).unwrap();

    let payload = "2026/08/29,09:00 - 09:25,25,Coding,2026-08-29";
    let parsed = parse_csv(payload).unwrap();
    db.import_sessions(&parsed.sessions).unwrap();

    let exported = export_csv(&db.list_sessions(None).unwrap());
    let reparsed = parse_csv(&exported).unwrap();
    assert_eq!(reparsed.sessions.len(), 2);
    assert_eq!(reparsed.skipped, 0);
    assert_eq!(reparsed.sessions[0].category, "Coding");
    assert_eq!(reparsed.sessions[1].category, "existing");
}
