//! Task synchronizer
//!
//! This module implements the polling loop that keeps the client's view
//! of the `Tasks` collection fresh and raises notifications for newly
//! assigned work.
//!
//! # Architecture
//!
//! ```text
//! TaskSynchronizer (owns the cache)
//!   ├─> RecordStore: full-collection fetch every poll tick
//!   ├─> Notifier: at most one notification per cycle (best-effort)
//!   ├─> watch channel: immutable snapshots out to subscribers
//!   └─> mpsc channel: commands in (refresh, optimistic advance,
//!       read-receipt overlay)
//! ```
//!
//! The synchronizer is the *only* owner of the task cache; every
//! mutation funnels through its command channel, and consumers observe
//! immutable snapshots. Poll iterations are strictly serialized (the
//! next tick waits for the previous iteration to finish), so there are
//! no overlapping in-flight polls.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamtask_client::notify::LogNotifier;
//! use teamtask_client::store::SheetStore;
//! use teamtask_client::sync::TaskSynchronizer;
//! use uuid::Uuid;
//!
//! # async fn example(user_id: Uuid) {
//! let store = Arc::new(SheetStore::new("https://example/exec".to_string()));
//! let (sync, handle) = TaskSynchronizer::new(store, Arc::new(LogNotifier::new()), user_id);
//!
//! tokio::spawn(sync.run());
//!
//! // ... render handle.snapshot(), send handle.refresh(), etc.
//! handle.shutdown(); // logout cancels the loop
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use teamtask_shared::models::{Task, TaskStatus};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::notify::Notifier;
use crate::store::{RecordStore, StoreError, TaskUpdate};

/// Default poll cadence
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// An immutable view of the task cache
pub type TaskSnapshot = Arc<Vec<Task>>;

/// Synchronizer configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Poll cadence
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Commands accepted by the synchronizer
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Fetch the collection now and publish it verbatim (manual refresh)
    Refresh,

    /// Optimistic status advance: mutate the cache immediately, then
    /// persist the same value remotely
    Advance {
        /// Task to advance
        task_id: Uuid,
        /// Target status (already validated one-step-forward)
        status: TaskStatus,
    },

    /// Overlay a locally confirmed read receipt onto the cache
    MarkRead {
        /// Task that was read
        task_id: Uuid,
        /// Assignee who read it
        user_id: Uuid,
    },
}

/// Cloneable handle onto a running synchronizer
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
    snapshot: watch::Receiver<TaskSnapshot>,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// The latest published snapshot
    pub fn snapshot(&self) -> TaskSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.snapshot.clone()
    }

    /// Requests a manual refresh
    pub fn refresh(&self) {
        self.send(SyncCommand::Refresh);
    }

    /// Requests an optimistic status advance
    pub fn advance(&self, task_id: Uuid, status: TaskStatus) {
        self.send(SyncCommand::Advance { task_id, status });
    }

    /// Overlays a read receipt that was already written to the store
    pub fn mark_read(&self, task_id: Uuid, user_id: Uuid) {
        self.send(SyncCommand::MarkRead { task_id, user_id });
    }

    /// Cancels the synchronizer loop (logout)
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled when the loop should stop
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn send(&self, command: SyncCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Synchronizer is gone; command dropped");
        }
    }
}

/// Task synchronizer
///
/// Owns the task cache and the last-observed id set. Runs only while a
/// user is authenticated and an endpoint is configured; the caller
/// enforces that precondition and cancels the loop when it stops
/// holding.
pub struct TaskSynchronizer {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    user_id: Uuid,
    config: SyncConfig,

    /// The owned cache; published as immutable snapshots
    tasks: Vec<Task>,

    /// Ids observed by the previous poll or refresh
    seen: HashSet<Uuid>,

    snapshot_tx: watch::Sender<TaskSnapshot>,
    commands: mpsc::UnboundedReceiver<SyncCommand>,
    cancel: CancellationToken,
}

impl TaskSynchronizer {
    /// Creates a synchronizer for `user_id` with the default config
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        user_id: Uuid,
    ) -> (Self, SyncHandle) {
        Self::with_config(store, notifier, user_id, SyncConfig::default())
    }

    /// Creates a synchronizer with a custom configuration
    pub fn with_config(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        user_id: Uuid,
        config: SyncConfig,
    ) -> (Self, SyncHandle) {
        let (snapshot_tx, snapshot_rx) = watch::channel(TaskSnapshot::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let handle = SyncHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            cancel: cancel.clone(),
        };

        let synchronizer = TaskSynchronizer {
            store,
            notifier,
            user_id,
            config,
            tasks: Vec::new(),
            seen: HashSet::new(),
            snapshot_tx,
            commands: command_rx,
            cancel,
        };

        (synchronizer, handle)
    }

    /// Fetches the full collection and publishes it verbatim
    ///
    /// The fetched set is the new authoritative state; no client-side
    /// merging with prior state; the last writer at the server wins.
    /// Resets the observed-id baseline and raises no notification.
    ///
    /// Usable directly for one-shot flows without spawning [`run`].
    ///
    /// [`run`]: TaskSynchronizer::run
    pub async fn refresh(&mut self) -> Result<TaskSnapshot, StoreError> {
        let fetched = self.store.read_tasks().await?;
        self.seen = fetched.iter().map(|t| t.id).collect();
        self.tasks = fetched;
        Ok(self.publish())
    }

    /// Runs the poll/command loop until cancelled
    ///
    /// Starts with a baseline [`refresh`], so assignments that already
    /// existed at startup never notify; only tasks appearing in a later
    /// poll do. Poll failures are logged and the previous snapshot is
    /// preserved; the next tick retries by cadence (no backoff).
    ///
    /// [`refresh`]: TaskSynchronizer::refresh
    pub async fn run(mut self) {
        tracing::info!(user_id = %self.user_id, "Task synchronizer starting");

        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Initial fetch failed; starting with an empty snapshot");
        }

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Task synchronizer stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.poll_once().await;
                }
                Some(command) = self.commands.recv() => {
                    self.apply(command).await;
                }
            }
        }
    }

    /// One poll cycle: fetch, diff, notify, republish
    ///
    /// [`run`] calls this on every tick; it is public so callers and
    /// tests can drive cycles without the timer.
    ///
    /// [`run`]: TaskSynchronizer::run
    pub async fn poll_once(&mut self) {
        let fetched = match self.store.read_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "Poll failed; keeping previous snapshot");
                return;
            }
        };

        // Tasks assigned to me that the previous state had not observed.
        let newly_assigned: Vec<&Task> = fetched
            .iter()
            .filter(|t| t.is_assigned_to(self.user_id) && !self.seen.contains(&t.id))
            .collect();

        if let Some(first) = newly_assigned.first() {
            // At most one notification per cycle, summarizing the first
            // new task. Delivery failure must never halt polling.
            let body = format!("{} assigned: {}", first.created_by_name, first.title);
            if let Err(e) = self.notifier.notify("New task assigned", &body).await {
                tracing::debug!(error = %e, "Notification delivery failed");
            }
        }

        // The observed set is replaced regardless of notification
        // outcome.
        self.seen = fetched.iter().map(|t| t.id).collect();
        self.tasks = fetched;
        self.publish();
    }

    /// Applies one command to the owned cache
    ///
    /// [`run`] calls this for every received command; it is public so
    /// callers and tests can apply commands without the loop.
    ///
    /// [`run`]: TaskSynchronizer::run
    pub async fn apply(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::Refresh => {
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, "Manual refresh failed; keeping previous snapshot");
                }
            }
            SyncCommand::Advance { task_id, status } => {
                // Optimistic: cache first, remote after.
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
                    task.status = status;
                }
                self.publish();

                let updates = TaskUpdate {
                    status: Some(status),
                    read_by: None,
                };
                if let Err(e) = self.store.update_task(task_id, updates).await {
                    // The optimistic value is not rolled back; the next
                    // poll restores server truth.
                    tracing::warn!(task_id = %task_id, error = %e, "Failed to persist status update");
                } else {
                    tracing::info!(task_id = %task_id, status = status.as_str(), "Task status updated");
                }
            }
            SyncCommand::MarkRead { task_id, user_id } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
                    if !task.read_by.contains(&user_id) {
                        task.read_by.push(user_id);
                    }
                }
                self.publish();
            }
        }
    }

    fn publish(&self) -> TaskSnapshot {
        let snapshot: TaskSnapshot = Arc::new(self.tasks.clone());
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }
}
