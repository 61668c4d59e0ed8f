//! Task management commands.

use clap::Subcommand;
use tomatick_core::{Database, Task};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Estimated pomodoros
        #[arg(long, default_value = "1")]
        estimated: u32,
    },
    /// List tasks
    List,
    /// Mark a task as the active one (its sessions get its category)
    Activate {
        /// Task ID
        id: String,
    },
    /// Clear the active task
    Deactivate,
    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

fn parse_id(raw: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Ok(Uuid::parse_str(raw).map_err(|_| format!("invalid task id: {raw}"))?)
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TaskAction::Create { title, estimated } => {
            let task = Task::new(title, estimated);
            db.create_task(&task)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List => {
            let tasks = db.list_tasks()?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Activate { id } => {
            let id = parse_id(&id)?;
            db.set_active_task(Some(&id))?;
            println!("active task: {id}");
        }
        TaskAction::Deactivate => {
            db.set_active_task(None)?;
            println!("no active task");
        }
        TaskAction::Done { id } => {
            let id = parse_id(&id)?;
            let mut task = db
                .get_task(&id)?
                .ok_or_else(|| format!("no such task: {id}"))?;
            task.completed = true;
            task.active = false;
            db.update_task(&task)?;
            println!(
                "done: {} ({}/{} pomodoros)",
                task.title, task.completed_pomodoros, task.estimated_pomodoros
            );
        }
        TaskAction::Delete { id } => {
            let id = parse_id(&id)?;
            db.delete_task(&id)?;
            println!("deleted: {id}");
        }
    }
    Ok(())
}
