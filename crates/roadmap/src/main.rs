//! Roadmap CLI - manage project and task dependencies from the command line.
//!
//! Every dependency change goes through the same validation as the library:
//! self-loops, duplicates and cycles are refused with an explanation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use roadmap::{DependencyKind, EntityKind, EntityRef};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::display::OutputMode;

/// Roadmap: cycle-safe dependencies between projects and tasks.
#[derive(Parser)]
#[command(name = "roadmap")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "directory", global = true)]
    directory: Option<PathBuf>,

    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `.roadmap/` with a config file and an empty database
    Init {
        /// Database path relative to the project root
        #[arg(long)]
        database: Option<String>,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage dependencies between projects and tasks
    Dep {
        #[command(subcommand)]
        action: DepAction,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Add a project
    Add {
        /// Display name
        name: String,

        /// Use this id instead of generating one
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove a project (its dependencies become orphans)
    Rm {
        /// Project id
        id: String,
    },

    /// List projects
    List,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task
    Add {
        /// Display name
        name: String,

        /// Use this id instead of generating one
        #[arg(long)]
        id: Option<String>,

        /// Owning project id
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Remove a task (its dependencies become orphans)
    Rm {
        /// Task id
        id: String,
    },

    /// List tasks
    List,
}

#[derive(Subcommand)]
enum DepAction {
    /// Add a dependency: FROM must happen before TO
    Add {
        /// Predecessor, as `project:ID` or `task:ID`
        from: EntityRef,

        /// Successor, as `project:ID` or `task:ID`
        to: EntityRef,

        /// Dependency kind (FS, SS, FF, SF)
        #[arg(short, long, default_value = "FS")]
        kind: DependencyKind,

        /// Lag in days (negative for lead time)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        lag: i32,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Remove a dependency
    Rm {
        /// Dependency id
        id: String,
    },

    /// Change the kind, lag or note of a dependency
    Update {
        /// Dependency id
        id: String,

        /// New kind (FS, SS, FF, SF)
        #[arg(short, long)]
        kind: Option<DependencyKind>,

        /// New lag in days
        #[arg(short, long, allow_negative_numbers = true)]
        lag: Option<i32>,

        /// New note
        #[arg(short, long, conflicts_with = "clear_note")]
        note: Option<String>,

        /// Remove the note
        #[arg(long)]
        clear_note: bool,
    },

    /// Show the dependencies of one entity
    Show {
        /// Entity, as `project:ID` or `task:ID`
        entity: EntityRef,
    },

    /// List all dependencies, oldest first
    List,

    /// Show dependency counts by kind
    Stats,

    /// Check whether a dependency could be added, without adding it
    Check {
        /// Predecessor, as `project:ID` or `task:ID`
        from: EntityRef,

        /// Successor, as `project:ID` or `task:ID`
        to: EntityRef,

        /// Dependency kind (FS, SS, FF, SF)
        #[arg(short, long, default_value = "FS")]
        kind: DependencyKind,
    },

    /// Scan stored dependencies for cycles
    Cycles,

    /// List dependencies whose endpoints no longer exist
    Orphans {
        /// Delete them
        #[arg(long)]
        prune: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let directory = match cli.directory {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let result = match cli.command {
        Commands::Init { database } => cli::init::run(&directory, database.as_deref(), mode),
        Commands::Project { action } => match action {
            ProjectAction::Add { name, id } => cli::entity::add(
                &directory,
                EntityKind::Project,
                &name,
                id.as_deref(),
                None,
                mode,
            ),
            ProjectAction::Rm { id } => cli::entity::remove(&directory, EntityRef::project(id), mode),
            ProjectAction::List => cli::entity::list(&directory, EntityKind::Project, mode),
        },
        Commands::Task { action } => match action {
            TaskAction::Add { name, id, project } => cli::entity::add(
                &directory,
                EntityKind::Task,
                &name,
                id.as_deref(),
                project.as_deref(),
                mode,
            ),
            TaskAction::Rm { id } => cli::entity::remove(&directory, EntityRef::task(id), mode),
            TaskAction::List => cli::entity::list(&directory, EntityKind::Task, mode),
        },
        Commands::Dep { action } => match action {
            DepAction::Add {
                from,
                to,
                kind,
                lag,
                note,
            } => cli::dep::add(&directory, from, to, kind, lag, note, mode),
            DepAction::Rm { id } => cli::dep::remove(&directory, &id, mode),
            DepAction::Update {
                id,
                kind,
                lag,
                note,
                clear_note,
            } => cli::dep::update(&directory, &id, kind, lag, note, clear_note, mode),
            DepAction::Show { entity } => cli::dep::show(&directory, &entity, mode),
            DepAction::List => cli::dep::list(&directory, mode),
            DepAction::Stats => cli::dep::stats(&directory, mode),
            DepAction::Check { from, to, kind } => {
                cli::dep::check(&directory, from, to, kind, mode)
            }
            DepAction::Cycles => cli::dep::cycles(&directory, mode),
            DepAction::Orphans { prune } => cli::dep::orphans(&directory, prune, mode),
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
