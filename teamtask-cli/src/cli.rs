//! Command-line definitions
//!
//! One subcommand per user-facing operation; the handlers live in
//! `commands`.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use teamtask_shared::models::{TaskPriority, TaskStatus};

/// Small-team task assignment tracker
#[derive(Debug, Parser)]
#[command(name = "teamtask", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify an endpoint URL and store it for future runs
    Setup {
        /// Endpoint URL of the deployed store script
        url: String,
    },

    /// Clear the stored endpoint URL (also logs out)
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Register a new account
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Login secret; prompted for when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Log in and persist the session
    Login {
        /// Email address
        #[arg(long)]
        email: String,

        /// Login secret; prompted for when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Clear the persisted session
    Logout,

    /// Show the current session
    Whoami,

    /// List tasks in your inbox (or outbox)
    List {
        /// Show tasks you created instead of tasks assigned to you
        #[arg(long)]
        outbox: bool,

        /// Case-insensitive search across title, creator, and description
        #[arg(long, default_value = "")]
        query: String,

        /// Keep only tasks with this status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show one task in full (records your read receipt)
    Show {
        /// Task identifier, or an unambiguous prefix of one
        task: String,
    },

    /// Create a task and assign it to teammates
    Create {
        /// Short title
        #[arg(long)]
        title: String,

        /// Free-form description
        #[arg(long)]
        description: String,

        /// Assignee email; repeat for multiple assignees
        #[arg(long = "to", required = true)]
        to: Vec<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,

        /// Priority level
        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,
    },

    /// Advance a task to its next status
    Advance {
        /// Task identifier, or an unambiguous prefix of one
        task: String,
    },

    /// List teammates (admins may add --pending)
    Users {
        /// Only registrations waiting for an admin decision
        #[arg(long)]
        pending: bool,
    },

    /// Approve a pending registration (admin)
    Approve {
        /// Email of the pending user
        email: String,
    },

    /// Reject a pending registration (admin)
    Reject {
        /// Email of the pending user
        email: String,
    },

    /// Poll for updates and print notifications until interrupted
    Watch,
}

/// Status filter accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Assigned,
    Received,
    InProgress,
    Done,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Assigned => TaskStatus::Assigned,
            StatusArg::Received => TaskStatus::Received,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Done => TaskStatus::Done,
        }
    }
}

/// Priority accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for TaskPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => TaskPriority::High,
            PriorityArg::Medium => TaskPriority::Medium,
            PriorityArg::Low => TaskPriority::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_list_with_filters() {
        let cli = Cli::try_parse_from([
            "teamtask",
            "list",
            "--outbox",
            "--query",
            "report",
            "--status",
            "in-progress",
        ])
        .unwrap();

        match cli.command {
            Command::List {
                outbox,
                query,
                status,
            } => {
                assert!(outbox);
                assert_eq!(query, "report");
                assert_eq!(status, Some(StatusArg::InProgress));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parses_create_with_repeated_assignees() {
        let cli = Cli::try_parse_from([
            "teamtask",
            "create",
            "--title",
            "Quote",
            "--description",
            "Confirm it",
            "--to",
            "a@example.com",
            "--to",
            "b@example.com",
            "--due",
            "2026-03-01",
            "--priority",
            "high",
        ])
        .unwrap();

        match cli.command {
            Command::Create { to, due, priority, .. } => {
                assert_eq!(to.len(), 2);
                assert_eq!(due, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
                assert_eq!(priority, PriorityArg::High);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_an_assignee() {
        let result = Cli::try_parse_from([
            "teamtask",
            "create",
            "--title",
            "Quote",
            "--description",
            "Confirm it",
            "--due",
            "2026-03-01",
        ]);
        assert!(result.is_err());
    }
}
