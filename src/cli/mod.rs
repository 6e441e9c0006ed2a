//! Command-line interface for dg
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in the `task` and `user` submodules.

use clap::{Parser, Subcommand};

use crate::error::Result;

mod task;
mod user;

pub use task::parse_duration;

/// dg - Deadline Groups
///
/// A local-first tracker for deadline-bound commitments: solo or group
/// tasks with a one-hour execution window before the deadline, progress
/// updates, subtasks, and focus sessions.
#[derive(Parser, Debug)]
#[command(name = "dg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform application data dir)
    #[arg(long, global = true, env = "DG_DATA_DIR")]
    pub data_dir: Option<std::path::PathBuf>,

    /// Act as this display name instead of the persisted identity
    #[arg(long, global = true, env = "DG_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    New {
        /// Task title (at most 100 characters)
        title: String,

        /// Longer description (at most 500 characters)
        #[arg(long = "desc", default_value = "")]
        description: String,

        /// What exactly will be delivered; immutable once set
        #[arg(long)]
        commitment: Option<String>,

        /// Create a group task with an invite link
        #[arg(long)]
        group: bool,

        /// Absolute deadline, RFC 3339 (e.g. 2026-09-01T17:00:00Z)
        #[arg(long)]
        deadline: Option<String>,

        /// Relative deadline from now (e.g. "2h", "45m", "3d")
        #[arg(long = "in", value_name = "DURATION")]
        due_in: Option<String>,
    },

    /// List tasks (live dashboard by default)
    List {
        /// Show finished tasks (completed and expired) instead
        #[arg(long)]
        archive: bool,

        /// Show everything: dashboard first, then archive
        #[arg(long)]
        all: bool,
    },

    /// Show one task in full
    Show {
        /// Task id
        task: String,
    },

    /// Join a group task (only while it is upcoming)
    Join {
        /// Task id
        task: String,
    },

    /// Leave a group task (the creator never can)
    Leave {
        /// Task id
        task: String,
    },

    /// Post a progress update (only inside the execution window)
    Post {
        /// Task id
        task: String,

        /// Update text
        content: String,
    },

    /// Subtask management
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Mark a task completed
    Complete {
        /// Task id
        task: String,
    },

    /// Log a finished focus session ending now
    Focus {
        /// Task id
        task: String,

        /// Session length (e.g. "25m", "90s")
        #[arg(long, default_value = "25m")]
        duration: String,
    },

    /// Set self-reported progress (0-100, clamped)
    Progress {
        /// Task id
        task: String,

        /// Percent complete
        value: i64,
    },

    /// Show the current identity
    Whoami,
}

/// Subtask subcommands
#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Add a subtask (only inside the execution window)
    Add {
        /// Task id
        task: String,

        /// Subtask title
        title: String,
    },

    /// Flip a subtask between open and done
    Toggle {
        /// Task id
        task: String,

        /// Subtask id
        subtask: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::New {
                title,
                description,
                commitment,
                group,
                deadline,
                due_in,
            } => task::run_new(task::NewOptions {
                title,
                description,
                commitment,
                group,
                deadline,
                due_in,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List { archive, all } => task::run_list(task::ListOptions {
                archive,
                all,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Show { task } => task::run_show(task::ShowOptions {
                task,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Join { task } => task::run_join(task::MembershipOptions {
                task,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Leave { task } => task::run_leave(task::MembershipOptions {
                task,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Post { task, content } => task::run_post(task::PostOptions {
                task,
                content,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Subtask(cmd) => match cmd {
                SubtaskCommands::Add { task, title } => {
                    task::run_subtask_add(task::SubtaskAddOptions {
                        task,
                        title,
                        data_dir: self.data_dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
                SubtaskCommands::Toggle { task, subtask } => {
                    task::run_subtask_toggle(task::SubtaskToggleOptions {
                        task,
                        subtask,
                        data_dir: self.data_dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
            Commands::Complete { task } => task::run_complete(task::CompleteOptions {
                task,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Focus { task, duration } => task::run_focus(task::FocusOptions {
                task,
                duration,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Progress { task, value } => task::run_progress(task::ProgressOptions {
                task,
                value,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Whoami => user::run_whoami(user::WhoamiOptions {
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}
