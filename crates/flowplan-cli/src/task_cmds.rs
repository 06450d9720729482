//! CLI handlers for `flowplan task` subcommands (the checklist).

use anyhow::Result;

use flowplan_core::{IdGenerator, UuidIds};
use flowplan_store::queries::tasks as task_queries;
use flowplan_store::{Store, Task};

use crate::TaskCommands;

/// Dispatch a `TaskCommands` variant to the appropriate handler.
pub fn run_task_command(command: TaskCommands, store: &Store) -> Result<()> {
    match command {
        TaskCommands::Add {
            text,
            due,
            estimate,
        } => {
            let due = crate::parse_date_arg(due.as_deref(), "--due")?;
            let task = Task {
                id: UuidIds.next_id("task"),
                text: text.trim().to_string(),
                done: false,
                due,
                estimate_hours: estimate,
            };
            let id = task.id.clone();
            let mut state = store.load();
            task_queries::insert_task(&mut state, task)?;
            store.save(&state)?;
            println!("Task {id} added.");
        }
        TaskCommands::List { all } => {
            let state = store.load();
            let tasks = task_queries::list_tasks(&state, all);
            if tasks.is_empty() {
                println!("No tasks.");
                return Ok(());
            }
            for task in tasks {
                let mark = if task.done { "x" } else { " " };
                println!(
                    "[{mark}] {:<10} {:>4}h  {}  ({})",
                    task.due.to_string(),
                    task.estimate_hours,
                    task.text,
                    task.id
                );
            }
        }
        TaskCommands::Toggle { task_id } => {
            let mut state = store.load();
            let done = task_queries::toggle_task(&mut state, &task_id)?;
            store.save(&state)?;
            println!(
                "Task {task_id} marked {}.",
                if done { "done" } else { "not done" }
            );
        }
        TaskCommands::Remove { task_id } => {
            let mut state = store.load();
            let removed = task_queries::remove_task(&mut state, &task_id)?;
            store.save(&state)?;
            println!("Removed task {}: {}", removed.id, removed.text);
        }
    }
    Ok(())
}
