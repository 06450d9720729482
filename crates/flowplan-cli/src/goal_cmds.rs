//! CLI handlers for `flowplan goal` subcommands.
//!
//! Implements:
//! - `flowplan goal add <title>`     -- plan and schedule a goal (or just save it)
//! - `flowplan goal list`            -- list goals, newest first
//! - `flowplan goal show <goal-id>`  -- subtasks and events of one goal
//! - `flowplan goal delete <goal-id>` -- delete a goal with its tasks and events

use anyhow::{Context, Result, bail};

use flowplan_core::GoalDraft;
use flowplan_store::queries::{events as event_queries, goals as goal_queries};
use flowplan_store::{Priority, Scope};

use crate::GoalCommands;
use crate::calendar_cmd::print_week;
use crate::config::FlowplanConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `GoalCommands` variant to the appropriate handler.
pub async fn run_goal_command(command: GoalCommands, config: &FlowplanConfig) -> Result<()> {
    match command {
        GoalCommands::Add {
            title,
            description,
            due,
            scope,
            priority,
            no_plan,
        } => {
            let scope: Scope = scope.parse()?;
            let priority: Priority = priority.parse()?;
            let due = crate::parse_date_arg(due.as_deref(), "--due")?;
            let draft = GoalDraft::new(title, due, scope)
                .with_description(description)
                .with_priority(priority);
            cmd_add(config, &draft, no_plan).await
        }
        GoalCommands::List { scope } => {
            let scope = scope.map(|s| s.parse::<Scope>()).transpose()?;
            cmd_list(config, scope)
        }
        GoalCommands::Show { goal_id } => cmd_show(config, &goal_id),
        GoalCommands::Delete { goal_id } => cmd_delete(config, &goal_id).await,
    }
}

// -----------------------------------------------------------------------
// flowplan goal add
// -----------------------------------------------------------------------

async fn cmd_add(config: &FlowplanConfig, draft: &GoalDraft, no_plan: bool) -> Result<()> {
    let service = config.goal_service()?;

    if no_plan {
        match service.add_unplanned(draft).await? {
            Some(goal) => println!("Goal {} saved without a plan.", goal.id),
            None => println!("Nothing to do: the goal title is empty."),
        }
        return Ok(());
    }

    let Some(created) = service
        .create_goal(draft)
        .await
        .context("failed to plan goal")?
    else {
        println!("Nothing to do: the goal title is empty.");
        return Ok(());
    };

    println!("Goal planned.");
    println!();
    println!("  Goal ID:   {}", created.goal.id);
    println!("  Title:     {}", created.goal.title);
    println!("  Scope:     {}", created.goal.scope);
    println!("  Due:       {}", created.goal.due);
    println!("  Subtasks:  {}", created.goal.subtasks.len());
    println!("  Events:    {}", created.events.len());

    if !created.unscheduled.is_empty() {
        println!();
        println!("Unscheduled (no free slot found):");
        for id in &created.unscheduled {
            if let Some(subtask) = created.goal.subtasks.iter().find(|s| &s.id == id) {
                println!("  - {}", subtask.text);
            }
        }
    }

    if let Some(earliest) = created.events.iter().map(|e| e.date).min() {
        println!();
        let state = service.store().load();
        print_week(&state, earliest);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// flowplan goal list
// -----------------------------------------------------------------------

fn cmd_list(config: &FlowplanConfig, scope: Option<Scope>) -> Result<()> {
    let state = config.open_store()?.load();
    let goals = goal_queries::list_goals(&state, scope);

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<40} {:<8} {:<8} {:<10} {:<8} TITLE",
        "ID", "SCOPE", "PRIORITY", "DUE", "SUBTASKS"
    );
    for goal in goals {
        println!(
            "{:<40} {:<8} {:<8} {:<10} {:<8} {}",
            goal.id,
            goal.scope.to_string(),
            goal.priority.to_string(),
            goal.due.to_string(),
            goal.subtasks.len(),
            goal.title
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// flowplan goal show <goal-id>
// -----------------------------------------------------------------------

fn cmd_show(config: &FlowplanConfig, goal_id: &str) -> Result<()> {
    let state = config.open_store()?.load();
    let Some(goal) = goal_queries::get_goal(&state, goal_id) else {
        bail!("goal {goal_id} not found");
    };

    println!("Goal: {}", goal.title);
    println!("  ID:       {}", goal.id);
    println!("  Scope:    {}", goal.scope);
    println!("  Priority: {}", goal.priority);
    println!("  Due:      {}", goal.due);
    println!("  Planned:  {}", if goal.planned { "yes" } else { "no" });
    if !goal.description.is_empty() {
        println!("  Description:");
        for line in goal.description.lines() {
            println!("    {line}");
        }
    }

    if !goal.subtasks.is_empty() {
        println!();
        println!("Subtasks:");
        for subtask in &goal.subtasks {
            let date = subtask
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unscheduled".to_string());
            println!(
                "  {:>3}. {} ({}h, {date})",
                subtask.id, subtask.text, subtask.duration_hours
            );
        }
    }

    let events = event_queries::events_for_goal(&state, goal_id);
    if !events.is_empty() {
        println!();
        println!("Events:");
        for event in events {
            println!(
                "  {} {:02}:00-{:02}:00  {}",
                event.date,
                event.start_hour,
                event.end_hour(),
                event.title
            );
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// flowplan goal delete <goal-id>
// -----------------------------------------------------------------------

async fn cmd_delete(config: &FlowplanConfig, goal_id: &str) -> Result<()> {
    let service = config.goal_service()?;
    match service.delete_goal(goal_id).await? {
        Some(deleted) => {
            println!(
                "Deleted goal {} ({} tasks, {} events).",
                deleted.goal.id, deleted.tasks_removed, deleted.events_removed
            );
            Ok(())
        }
        None => bail!("goal {goal_id} not found"),
    }
}
