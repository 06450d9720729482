mod calendar_cmd;
mod config;
mod export_cmd;
mod goal_cmds;
mod serve_cmd;
mod task_cmds;

use clap::{Parser, Subcommand};

use config::FlowplanConfig;

#[derive(Parser)]
#[command(name = "flowplan", about = "Break goals into subtasks and schedule them on a work calendar")]
struct Cli {
    /// Data directory (overrides FLOWPLAN_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Never contact the remote planning/scheduling service
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a flowplan config file (records --data-dir when given)
    Init {
        /// Base URL of a remote planning/scheduling service
        #[arg(long)]
        remote_url: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Goal management
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Checklist management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show the events of one Monday-Sunday week
    Calendar {
        /// Any date in the week (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        week_of: Option<String>,
    },
    /// Export one week of events as an .ics file
    Export {
        /// Any date in the week (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        week_of: Option<String>,
        /// Output directory (defaults to the current directory)
        #[arg(long)]
        output: Option<String>,
    },
    /// Serve the planning, scheduling and export endpoints over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Add a goal and schedule its subtasks
    Add {
        /// Goal title
        title: String,
        /// Free-text description; bullets, sentences and "then" split it into subtasks
        #[arg(long, default_value = "")]
        description: String,
        /// Due date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        due: Option<String>,
        /// daily, weekly or monthly
        #[arg(long, default_value = "weekly")]
        scope: String,
        /// low, normal or high
        #[arg(long, default_value = "normal")]
        priority: String,
        /// Save the goal without planning or scheduling it
        #[arg(long)]
        no_plan: bool,
    },
    /// List goals, newest first
    List {
        /// Only goals of this scope
        #[arg(long)]
        scope: Option<String>,
    },
    /// Show a goal with its subtasks and events
    Show {
        /// Goal ID
        goal_id: String,
    },
    /// Delete a goal with its tasks and events
    Delete {
        /// Goal ID
        goal_id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a checklist item
    Add {
        /// Task text
        text: String,
        /// Due date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        due: Option<String>,
        /// Estimate in hours
        #[arg(long, default_value_t = 1.0)]
        estimate: f64,
    },
    /// List checklist items
    List {
        /// Include completed items
        #[arg(long)]
        all: bool,
    },
    /// Toggle the done flag of an item
    Toggle {
        /// Task ID
        task_id: String,
    },
    /// Remove an item
    Remove {
        /// Task ID
        task_id: String,
    },
}

/// Execute the `flowplan init` command: write config file.
fn cmd_init(data_dir: Option<String>, remote_url: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    cfg.store.data_dir = data_dir.map(Into::into);
    cfg.remote.url = remote_url;
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match &cfg.store.data_dir {
        Some(dir) => println!("  store.data_dir = {}", dir.display()),
        None => println!(
            "  store.data_dir = {} (default)",
            flowplan_store::StoreConfig::default_data_dir().display()
        ),
    }
    match &cfg.remote.url {
        Some(url) => println!("  remote.url     = {url}"),
        None => println!("  remote.url     = (none, local planning only)"),
    }
    Ok(())
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today.
pub fn parse_date_arg(value: Option<&str>, flag: &str) -> anyhow::Result<chrono::NaiveDate> {
    use anyhow::Context;

    match value {
        Some(s) => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid {flag} {s:?} (expected YYYY-MM-DD)")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { remote_url, force } => {
            cmd_init(cli.data_dir, remote_url, force)?;
        }
        Commands::Goal { command } => {
            let resolved = FlowplanConfig::resolve(cli.data_dir.as_deref(), cli.offline)?;
            goal_cmds::run_goal_command(command, &resolved).await?;
        }
        Commands::Task { command } => {
            let resolved = FlowplanConfig::resolve(cli.data_dir.as_deref(), cli.offline)?;
            let store = resolved.open_store()?;
            task_cmds::run_task_command(command, &store)?;
        }
        Commands::Calendar { week_of } => {
            let resolved = FlowplanConfig::resolve(cli.data_dir.as_deref(), cli.offline)?;
            let store = resolved.open_store()?;
            let date = parse_date_arg(week_of.as_deref(), "--week-of")?;
            calendar_cmd::run_calendar(&store, date)?;
        }
        Commands::Export { week_of, output } => {
            let resolved = FlowplanConfig::resolve(cli.data_dir.as_deref(), cli.offline)?;
            let store = resolved.open_store()?;
            let date = parse_date_arg(week_of.as_deref(), "--week-of")?;
            export_cmd::run_export(&store, date, output.as_deref())?;
        }
        Commands::Serve { bind, port } => {
            let resolved = FlowplanConfig::resolve(cli.data_dir.as_deref(), cli.offline)?;
            serve_cmd::run_serve(resolved.planner, &bind, port).await?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn goal_add_parses_flags() {
        let cli = Cli::try_parse_from([
            "flowplan",
            "--offline",
            "goal",
            "add",
            "Launch",
            "--description",
            "- research\n- build",
            "--due",
            "2024-03-15",
            "--scope",
            "daily",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Commands::Goal {
                command:
                    GoalCommands::Add {
                        title,
                        scope,
                        no_plan,
                        ..
                    },
            } => {
                assert_eq!(title, "Launch");
                assert_eq!(scope, "daily");
                assert!(!no_plan);
            }
            _ => panic!("expected goal add"),
        }
    }

    #[test]
    fn parse_date_arg_validates() {
        assert_eq!(
            parse_date_arg(Some("2024-03-15"), "--due").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        let err = parse_date_arg(Some("15/03/2024"), "--due").unwrap_err();
        assert!(err.to_string().contains("--due"));
        assert!(parse_date_arg(None, "--due").is_ok());
    }
}
