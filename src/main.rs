//! # Upkeep
//!
//! A terminal maintenance tracker. Keep a list of recurring chores such as
//! oil changes, filter swaps or generator checks, complete them when done and
//! let the next occurrence schedule itself.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! Run without arguments to open the dashboard:
//!
//! ```bash
//! upkeep
//! # or explicitly
//! upkeep ui
//! ```
//!
//! *   `q`: Quit
//! *   `Space`: Complete selected task
//! *   `a`: Add task
//! *   `t`: Edit next due date
//! *   `d`: Delete selected task
//! *   `c`: Toggle completed tasks
//! *   `v`: Switch between tasks and categories
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # Oil change every 6 months, next due date suggested automatically
//! upkeep add "Oil change" --category Vehicle --last 2024-03-01 --every 6m --cost 80
//!
//! # Pending tasks, earliest due first
//! upkeep list
//!
//! # Complete by id prefix; recurring tasks get their next occurrence
//! upkeep complete 3f2a
//!
//! # What needs attention
//! upkeep alerts
//! upkeep critical
//! ```
//!
//! ## Data Storage
//!
//! Records live in `records.json` and `categories.json` under the local data
//! directory (`~/.local/share/upkeep` on Linux). Set `UPKEEP_DB` to use a
//! different directory. Logging goes to stderr and is controlled by `RUST_LOG`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use upkeep::commands::*;
use upkeep::dates::parse_date;
use upkeep::history::HistoryFilter;
use upkeep::storage::JsonRepository;
use upkeep::tui::run_tui;

#[derive(Parser)]
#[command(name = "upkeep")]
#[command(about = "Recurring maintenance tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a maintenance task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Category name
        #[arg(short, long)]
        category: String,
        /// Date of the last service in YYYY-MM-DD
        #[arg(short, long)]
        last: String,
        /// Next due date in YYYY-MM-DD (suggested from --every when omitted)
        #[arg(short, long)]
        next: Option<String>,
        /// Periodicity (none, 30d, 3m, 6m, 1y, custom)
        #[arg(short, long)]
        every: Option<String>,
        /// Cost of the service
        #[arg(long)]
        cost: Option<f64>,
        /// Free-form notes
        #[arg(short, long)]
        description: Option<String>,
        /// Disable alerts for this task
        #[arg(long)]
        quiet: bool,
        /// Record the task as already done
        #[arg(long)]
        done: bool,
    },
    /// List tasks, earliest due first
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Name contains
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Mark a task as done
    Complete {
        /// Task id or unique prefix
        id: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New last service date
        #[arg(short, long)]
        last: Option<String>,
        /// New due date ("none" clears it)
        #[arg(short, long)]
        next: Option<String>,
        /// New periodicity
        #[arg(short, long)]
        every: Option<String>,
        #[arg(long)]
        cost: Option<f64>,
        /// Enable or disable alerts
        #[arg(long)]
        notify: Option<bool>,
        /// pending or completed
        #[arg(long)]
        status: Option<String>,
    },
    /// Show due, soon-due and overdue alerts
    Alerts,
    /// Show tasks due within 7 days
    Critical,
    /// Show totals and per-category counts
    Stats,
    /// Show completed maintenance
    History {
        #[arg(short, long)]
        category: Option<String>,
        /// Scheduled on or after
        #[arg(long)]
        due_from: Option<String>,
        /// Scheduled on or before
        #[arg(long)]
        due_to: Option<String>,
        /// Done on or after
        #[arg(long)]
        done_from: Option<String>,
        /// Done on or before
        #[arg(long)]
        done_to: Option<String>,
        #[arg(long)]
        min_cost: Option<f64>,
        #[arg(long)]
        max_cost: Option<f64>,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Export all data to a JSON backup
    Export {
        path: PathBuf,
    },
    /// Replace all data with a JSON backup
    Import {
        path: PathBuf,
    },
    /// Reset the database (delete all tasks and categories)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Add a category
    Add {
        name: String,
        #[arg(short, long)]
        icon: Option<String>,
        #[arg(short = 'C', long)]
        color: Option<String>,
    },
    /// List categories
    List,
    /// Remove an unused category
    Remove {
        name: String,
    },
}

fn parse_opt_date(raw: Option<String>) -> upkeep::Result<Option<chrono::NaiveDate>> {
    raw.as_deref().map(parse_date).transpose()
}

fn run(command: Commands, repo: &JsonRepository) -> upkeep::Result<()> {
    match command {
        Commands::Add { name, category, last, next, every, cost, description, quiet, done } => {
            let input = TaskInput {
                name,
                category,
                last_date: last,
                next_date: next,
                periodicity: every,
                cost,
                description,
                notifications: !quiet,
                done,
            };
            cmd_add(repo, input, false).map(|_| ())
        }
        Commands::List { all, category, search } => cmd_list(repo, &ListOptions { all, category, search }),
        Commands::Complete { id } => cmd_complete(repo, &id, false).map(|_| ()),
        Commands::Remove { id } => cmd_remove(repo, &id, false),
        Commands::Edit { id, name, category, description, last, next, every, cost, notify, status } => {
            let edit = TaskEdit {
                name,
                category,
                description,
                last_date: last,
                next_date: next,
                periodicity: every,
                cost,
                notifications: notify,
                status,
            };
            cmd_edit(repo, &id, edit, false)
        }
        Commands::Alerts => cmd_alerts(repo, false).map(|_| ()),
        Commands::Critical => cmd_critical(repo),
        Commands::Stats => cmd_stats(repo),
        Commands::History { category, due_from, due_to, done_from, done_to, min_cost, max_cost } => {
            let filter = HistoryFilter {
                category,
                due_from: parse_opt_date(due_from)?,
                due_to: parse_opt_date(due_to)?,
                done_from: parse_opt_date(done_from)?,
                done_to: parse_opt_date(done_to)?,
                min_cost,
                max_cost,
            };
            cmd_history(repo, &filter, false).map(|_| ())
        }
        Commands::Category { command } => match command {
            CategoryCommands::Add { name, icon, color } => cmd_category_add(repo, name, icon, color, false),
            CategoryCommands::List => cmd_category_list(repo),
            CategoryCommands::Remove { name } => cmd_category_remove(repo, &name, false),
        },
        Commands::Export { path } => cmd_export(repo, &path, false),
        Commands::Import { path } => cmd_import(repo, &path, false),
        Commands::Reset { force } => cmd_reset(repo, force),
        Commands::Completions { shell } => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "upkeep", &mut io::stdout());
            Ok(())
        }
        Commands::Ui => run_tui(repo).map_err(upkeep::Error::Io),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);

    // The dashboard owns the terminal, so only line-oriented commands log.
    if !matches!(command, Commands::Ui) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upkeep=warn")))
            .with_writer(io::stderr)
            .init();
    }

    let repo = JsonRepository::from_env();
    match run(command, &repo) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
