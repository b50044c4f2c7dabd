//! Task model for the `Tasks` collection
//!
//! Tasks are created by one user and assigned to one or more teammates.
//! A task carries a single global status shared by all assignees, plus a
//! read-receipt list of the assignees who have opened it.
//!
//! # State Machine
//!
//! ```text
//! assigned → received → in_progress → done
//! ```
//!
//! Status only advances forward through that fixed total order, one step
//! at a time; `done` is terminal. Tasks are never deleted or reassigned.
//!
//! # Example
//!
//! ```
//! use teamtask_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
//! use teamtask_shared::models::user::{User, UserRole, UserStatus};
//! use uuid::Uuid;
//!
//! let creator = User::new(
//!     "Ada".to_string(),
//!     "ada@example.com".to_string(),
//!     "digest".to_string(),
//!     UserRole::Admin,
//!     UserStatus::Active,
//! );
//! let assignee = Uuid::new_v4();
//!
//! let task = Task::new(&creator, CreateTask {
//!     title: "Confirm the quote".to_string(),
//!     description: "Customer is waiting on the revised quote".to_string(),
//!     assigned_to: vec![assignee],
//!     due_date: "2026-03-01".parse().unwrap(),
//!     priority: TaskPriority::High,
//! });
//!
//! assert_eq!(task.status, TaskStatus::Assigned);
//! assert!(task.read_by.is_empty());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::User;

/// Task lifecycle status
///
/// A single global status shared by all assignees, not per-assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Assigned, not yet acknowledged
    Assigned,

    /// Acknowledged by an assignee
    Received,

    /// Being worked on
    InProgress,

    /// Completed (terminal)
    Done,
}

impl TaskStatus {
    /// Converts status to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::Received => "RECEIVED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Human-readable label for display surfaces
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "assigned",
            TaskStatus::Received => "received",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }

    /// The sole following status, or `None` at `Done`
    pub fn next(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Assigned => Some(TaskStatus::Received),
            TaskStatus::Received => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Done),
            TaskStatus::Done => None,
        }
    }

    /// Label of the action that advances out of this status
    ///
    /// `None` once the task is done.
    pub fn next_action_label(&self) -> Option<&'static str> {
        match self {
            TaskStatus::Assigned => Some("acknowledge"),
            TaskStatus::Received => Some("start"),
            TaskStatus::InProgress => Some("mark done"),
            TaskStatus::Done => None,
        }
    }

    /// Checks if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Checks if transition to target status is valid
    ///
    /// Only the immediate next step is ever allowed; no jumps, no
    /// reversals.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        self.next() == Some(target)
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    /// Urgent
    High,

    /// Normal
    Medium,

    /// Whenever
    Low,
}

impl TaskPriority {
    /// Converts priority to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
        }
    }

    /// Human-readable label for display surfaces
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Task record as stored in the `Tasks` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (UUID v4, generated client-side)
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// User who created the task
    pub created_by: Uuid,

    /// Creator display name, denormalized for rendering without a join
    pub created_by_name: String,

    /// Assignee user IDs
    ///
    /// Non-empty; stored as an ordered list with set semantics.
    /// De-duplicated at creation time.
    pub assigned_to: Vec<Uuid>,

    /// Current lifecycle status (global, shared by all assignees)
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Due date (calendar date, no time component)
    pub due_date: NaiveDate,

    /// When the task was created (epoch millis)
    pub created_at: i64,

    /// Assignees who have opened the task at least once
    #[serde(default)]
    pub read_by: Vec<Uuid>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    /// Short title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Free-form description
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// Assignee user IDs (at least one)
    #[validate(length(min = 1, message = "At least one assignee is required"))]
    pub assigned_to: Vec<Uuid>,

    /// Due date
    pub due_date: NaiveDate,

    /// Priority level
    pub priority: TaskPriority,
}

impl Task {
    /// Creates a new task record in `Assigned` status
    ///
    /// Generates the ID client-side, stamps the creation time, copies the
    /// creator's display name, and de-duplicates the assignee list while
    /// preserving its order.
    pub fn new(creator: &User, data: CreateTask) -> Self {
        let mut assigned_to = Vec::with_capacity(data.assigned_to.len());
        for id in data.assigned_to {
            if !assigned_to.contains(&id) {
                assigned_to.push(id);
            }
        }

        Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            created_by: creator.id,
            created_by_name: creator.name.clone(),
            assigned_to,
            status: TaskStatus::Assigned,
            priority: data.priority,
            due_date: data.due_date,
            created_at: super::now_millis(),
            read_by: Vec::new(),
        }
    }

    /// Checks if `user_id` is one of the assignees
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assigned_to.contains(&user_id)
    }

    /// Checks if `user_id` has already opened the task
    pub fn is_read_by(&self, user_id: Uuid) -> bool {
        self.read_by.contains(&user_id)
    }

    /// Checks if any assignee has opened the task
    ///
    /// Accurate for 1-on-1 assignments; an approximation for
    /// multi-assignee tasks.
    pub fn seen_by_any_assignee(&self) -> bool {
        !self.read_by.is_empty()
    }

    /// Checks if the task is overdue as of `today`
    ///
    /// A done task is never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && !self.status.is_terminal()
    }
}
