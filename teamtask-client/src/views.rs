//! Pure view derivations over a task snapshot
//!
//! Everything here is a pure function of the current snapshot: no side
//! effects, recomputed on every state change. Display layers (the CLI)
//! only ever render what these functions return.

use teamtask_shared::models::{Task, TaskStatus, User};
use uuid::Uuid;

/// Which partition of the task set to view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Tasks assigned to the user
    Inbox,

    /// Tasks created by the user
    Outbox,
}

/// Partitions the snapshot into the user's inbox or outbox
pub fn view_set<'a>(tasks: &'a [Task], user: &User, mode: ViewMode) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| match mode {
            ViewMode::Inbox => task.is_assigned_to(user.id),
            ViewMode::Outbox => task.created_by == user.id,
        })
        .collect()
}

/// Aggregate counts over a view set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    /// Tasks still waiting to be started (assigned or received)
    pub pending: usize,

    /// Tasks being worked on
    pub in_progress: usize,

    /// Completed tasks
    pub done: usize,
}

impl TaskStats {
    /// Total number of tasks counted
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.done
    }

    /// Completion rate as a whole percentage
    ///
    /// `round(100 × done / total)`; 0 for an empty view set, never NaN.
    pub fn completion_rate(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (self.done as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Computes aggregate counts over a view set
pub fn stats(view: &[&Task]) -> TaskStats {
    let mut out = TaskStats::default();
    for task in view {
        match task.status {
            TaskStatus::Assigned | TaskStatus::Received => out.pending += 1,
            TaskStatus::InProgress => out.in_progress += 1,
            TaskStatus::Done => out.done += 1,
        }
    }
    out
}

/// Search and status filter over a view set
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title, creator name,
    /// and description (OR across the three); empty matches everything
    pub query: String,

    /// Exact status to keep; `None` keeps all statuses
    pub status: Option<TaskStatus>,
}

/// Applies a filter to a view set and orders the result
///
/// Ordering is descending by creation timestamp (newest first), ties
/// broken by ascending task id so repeated renders are deterministic.
pub fn filtered<'a>(view: &[&'a Task], filter: &TaskFilter) -> Vec<&'a Task> {
    let query = filter.query.to_lowercase();

    let mut out: Vec<&Task> = view
        .iter()
        .copied()
        .filter(|task| {
            if let Some(status) = filter.status {
                if task.status != status {
                    return false;
                }
            }
            if query.is_empty() {
                return true;
            }
            task.title.to_lowercase().contains(&query)
                || task.created_by_name.to_lowercase().contains(&query)
                || task.description.to_lowercase().contains(&query)
        })
        .collect();

    out.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

/// Number of open tasks assigned to the user (the header badge)
///
/// Open means any status other than done; unlike [`TaskStats::pending`],
/// this includes in-progress work.
pub fn open_count(tasks: &[Task], user_id: Uuid) -> usize {
    tasks
        .iter()
        .filter(|t| t.is_assigned_to(user_id) && !t.status.is_terminal())
        .count()
}
