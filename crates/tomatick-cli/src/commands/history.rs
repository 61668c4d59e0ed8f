//! Session log listing, export and import.

use std::path::PathBuf;

use clap::Subcommand;
use tomatick_core::history::{export_csv, parse_csv};
use tomatick_core::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List logged sessions, most recent first
    List {
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export the session log as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import sessions from a CSV file, prepending them to the log
    Import {
        /// CSV file to import
        file: PathBuf,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let sessions = db.list_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        HistoryAction::Export { output } => {
            let csv = export_csv(&db.list_sessions(None)?);
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    println!("exported to {}", path.display());
                }
                None => print!("{csv}"),
            }
        }
        HistoryAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            // Parse fully before touching the log; a payload with no usable
            // rows errors out here and the log stays as it was.
            let parsed = parse_csv(&content)?;
            let imported = db.import_sessions(&parsed.sessions)?;
            if parsed.skipped > 0 {
                println!("imported {imported} session(s), skipped {} malformed row(s)", parsed.skipped);
            } else {
                println!("imported {imported} session(s)");
            }
        }
    }
    Ok(())
}
