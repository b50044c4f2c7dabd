//! Status advancement and read receipts
//!
//! The task lifecycle is a strict one-step forward machine (see
//! [`TaskStatus`]); this module resolves the transition an assignee may
//! take and tracks read receipts.
//!
//! # Optimistic Updates
//!
//! Advancing a status goes through the synchronizer
//! ([`crate::sync::SyncCommand::Advance`]): the local cache is mutated
//! immediately, then the remote store is asked to persist the same
//! value. A remote failure is logged and the optimistic value is not
//! rolled back; the next poll restores server truth.
//!
//! # Read Receipts
//!
//! A receipt fires at most once per task per client session, guarded by
//! a local "already attempted" set so repeated renders cannot duplicate
//! the write. The append is a read-modify-write: the store replaces the
//! whole read-by list on update, so concurrent writers can lose each
//! other's receipts, a small-team risk the backing service forces on
//! us. A failed attempt clears the guard and retries on the next
//! natural trigger; there is no timer-driven retry.

use std::collections::HashSet;

use teamtask_shared::models::{Task, TaskStatus};
use uuid::Uuid;

use crate::store::{RecordStore, TaskUpdate};

/// Status advancement error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    /// Only an assignee may advance a task
    #[error("only an assignee may advance this task")]
    NotAssignee,

    /// The task is already done; advancing is a no-op
    #[error("task is already done")]
    AlreadyDone,
}

/// Resolves the one-step transition for an assignee's view of a task
///
/// # Errors
///
/// - [`AdvanceError::NotAssignee`] when `user_id` is not assigned
/// - [`AdvanceError::AlreadyDone`] at the terminal status; callers
///   treat this as a no-op
pub fn advance_target(task: &Task, user_id: Uuid) -> Result<TaskStatus, AdvanceError> {
    if !task.is_assigned_to(user_id) {
        return Err(AdvanceError::NotAssignee);
    }
    task.status.next().ok_or(AdvanceError::AlreadyDone)
}

/// Session-scoped read-receipt guard
///
/// Tracks which task ids this client session has already attempted to
/// mark as read.
#[derive(Debug, Default)]
pub struct ReadReceipts {
    attempted: HashSet<Uuid>,
}

impl ReadReceipts {
    /// Creates an empty guard
    pub fn new() -> Self {
        ReadReceipts::default()
    }

    /// Marks a task as read by `user_id` if a receipt is due
    ///
    /// No-op (no network write) when the user is not an assignee, is
    /// already in the read-by list, or this session has already
    /// attempted the receipt. Failures are logged, the guard is cleared
    /// for a later natural retry, and nothing propagates to the caller.
    ///
    /// # Returns
    ///
    /// `true` if a receipt was written to the store
    pub async fn mark_read(
        &mut self,
        store: &dyn RecordStore,
        task: &Task,
        user_id: Uuid,
    ) -> bool {
        if !task.is_assigned_to(user_id) || task.is_read_by(user_id) {
            return false;
        }
        if !self.attempted.insert(task.id) {
            return false;
        }

        match self.append_receipt(store, task.id, user_id).await {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "Failed to mark task as read");
                // Clear the guard so the next natural trigger retries.
                self.attempted.remove(&task.id);
                false
            }
        }
    }

    /// Read-modify-write append against the read-by list
    ///
    /// Re-reads the collection first: the snapshot that triggered the
    /// receipt may be stale, and the update replaces the whole list.
    async fn append_receipt(
        &self,
        store: &dyn RecordStore,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, crate::store::StoreError> {
        let tasks = store.read_tasks().await?;
        let Some(current) = tasks.into_iter().find(|t| t.id == task_id) else {
            // The task vanished server-side; nothing to record.
            return Ok(false);
        };

        if current.is_read_by(user_id) {
            return Ok(false);
        }

        let mut read_by = current.read_by;
        read_by.push(user_id);
        store
            .update_task(
                task_id,
                TaskUpdate {
                    status: None,
                    read_by: Some(read_by),
                },
            )
            .await?;

        tracing::debug!(task_id = %task_id, user_id = %user_id, "Recorded read receipt");
        Ok(true)
    }
}
