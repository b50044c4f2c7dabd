//! Integration tests for the client engine
//!
//! These tests verify the engine end-to-end over the in-memory store:
//! - Registration and the first-user rule
//! - Login gates
//! - Task creation round-trip
//! - Poll diffing and notification semantics
//! - Optimistic status advancement
//! - Read receipts
//! - Synchronizer lifecycle (cancellation)

use std::sync::Arc;
use std::time::Duration;

use teamtask_client::notify::RecordingNotifier;
use teamtask_client::session::AuthGate;
use teamtask_client::status::{advance_target, ReadReceipts};
use teamtask_client::store::{MemoryStore, RecordStore};
use teamtask_client::sync::{SyncCommand, SyncConfig, TaskSynchronizer};
use teamtask_client::views::{filtered, stats, view_set, TaskFilter, ViewMode};
use teamtask_shared::models::{
    now_millis, CreateTask, RegisterUser, Task, TaskPriority, TaskStatus, User,
};

fn register_input(name: &str, email: &str) -> RegisterUser {
    RegisterUser {
        name: name.to_string(),
        email: email.to_string(),
        secret: format!("{}_super_secret", name.to_lowercase()),
    }
}

fn create_input(title: &str, assignees: Vec<uuid::Uuid>) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: format!("{} description", title),
        assigned_to: assignees,
        due_date: "2026-03-01".parse().unwrap(),
        priority: TaskPriority::Medium,
    }
}

/// Registers an active admin and an approved member
async fn team(gate: &AuthGate) -> (User, User) {
    let admin = gate
        .register(register_input("Ada", "ada@example.com"))
        .await
        .unwrap();
    let member = gate
        .register(register_input("Bob", "bob@example.com"))
        .await
        .unwrap();
    gate.approve(&member).await.unwrap();
    (admin, member)
}

#[tokio::test]
async fn test_create_task_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let before = now_millis();
    let task = Task::new(&admin, create_input("Confirm the quote", vec![member.id]));
    store.create_task(&task).await.unwrap();

    let read_back = store.read_tasks().await.unwrap();
    assert_eq!(read_back.len(), 1);
    let stored = &read_back[0];
    assert_eq!(stored.id, task.id);
    assert_eq!(stored.status, TaskStatus::Assigned);
    assert!(stored.read_by.is_empty());
    assert!(stored.created_at >= before && stored.created_at <= now_millis());
    assert_eq!(stored.created_by_name, "Ada");

    // A second task gets a distinct identifier.
    let other = Task::new(&admin, create_input("Another", vec![member.id]));
    assert_ne!(other.id, task.id);
}

#[tokio::test]
async fn test_poll_notifies_once_for_new_assignments() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    // Baseline poll over an empty collection.
    sync.poll_once().await;
    assert!(notifier.delivered().await.is_empty());

    // Two new tasks appear in one cycle: exactly one notification,
    // summarizing the first.
    let first = Task::new(&admin, create_input("First", vec![member.id]));
    let second = Task::new(&admin, create_input("Second", vec![member.id]));
    store.create_task(&first).await.unwrap();
    store.create_task(&second).await.unwrap();

    sync.poll_once().await;
    let delivered = notifier.delivered().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "New task assigned");
    assert_eq!(delivered[0].1, "Ada assigned: First");

    // Both tasks are in the published snapshot either way.
    assert_eq!(handle.snapshot().len(), 2);

    // Next cycle sees nothing new: no further notification.
    sync.poll_once().await;
    assert_eq!(notifier.delivered().await.len(), 1);
}

#[tokio::test]
async fn test_poll_ignores_tasks_assigned_to_others() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let for_admin = Task::new(&member, create_input("For Ada", vec![admin.id]));
    store.create_task(&for_admin).await.unwrap();

    sync.poll_once().await;
    assert!(notifier.delivered().await.is_empty());
    // Still published: the snapshot is the full collection.
    assert_eq!(handle.snapshot().len(), 1);
}

#[tokio::test]
async fn test_notifier_failure_does_not_halt_polling() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    notifier.set_fail(true);
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let task = Task::new(&admin, create_input("First", vec![member.id]));
    store.create_task(&task).await.unwrap();

    sync.poll_once().await;
    // Delivery failed, but the observed set was replaced anyway...
    assert!(notifier.delivered().await.is_empty());
    assert_eq!(handle.snapshot().len(), 1);

    // ...so the same task never re-notifies once delivery recovers.
    notifier.set_fail(false);
    sync.poll_once().await;
    assert!(notifier.delivered().await.is_empty());
}

#[tokio::test]
async fn test_poll_failure_preserves_previous_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let task = Task::new(&admin, create_input("First", vec![member.id]));
    store.create_task(&task).await.unwrap();
    sync.poll_once().await;
    assert_eq!(handle.snapshot().len(), 1);

    store.set_fail_reads(true);
    sync.poll_once().await;
    assert_eq!(handle.snapshot().len(), 1);

    // Polling retries by cadence once the store recovers.
    store.set_fail_reads(false);
    let second = Task::new(&admin, create_input("Second", vec![member.id]));
    store.create_task(&second).await.unwrap();
    sync.poll_once().await;
    assert_eq!(handle.snapshot().len(), 2);
    assert_eq!(notifier.delivered().await.len(), 2);
}

#[tokio::test]
async fn test_refresh_resets_baseline_without_notifying() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, _handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let task = Task::new(&admin, create_input("First", vec![member.id]));
    store.create_task(&task).await.unwrap();

    let snapshot = sync.refresh().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(notifier.delivered().await.is_empty());

    // The refresh observed the task, so the next poll stays quiet.
    sync.poll_once().await;
    assert!(notifier.delivered().await.is_empty());
}

#[tokio::test]
async fn test_optimistic_advance_without_rollback() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let task = Task::new(&admin, create_input("Work", vec![member.id]));
    store.create_task(&task).await.unwrap();
    sync.refresh().await.unwrap();

    // The one-step transition for the assignee's view.
    let target = advance_target(&handle.snapshot()[0], member.id).unwrap();
    assert_eq!(target, TaskStatus::Received);

    // Remote write fails: the optimistic value still lands in the
    // snapshot and is not rolled back.
    store.set_fail_writes(true);
    sync.apply(SyncCommand::Advance {
        task_id: task.id,
        status: target,
    })
    .await;
    assert_eq!(handle.snapshot()[0].status, TaskStatus::Received);
    assert_eq!(
        store.read_tasks().await.unwrap()[0].status,
        TaskStatus::Assigned
    );

    // The next poll restores server truth.
    sync.poll_once().await;
    assert_eq!(handle.snapshot()[0].status, TaskStatus::Assigned);

    // With a healthy store the same value persists remotely.
    store.set_fail_writes(false);
    sync.apply(SyncCommand::Advance {
        task_id: task.id,
        status: target,
    })
    .await;
    assert_eq!(
        store.read_tasks().await.unwrap()[0].status,
        TaskStatus::Received
    );
}

#[tokio::test]
async fn test_read_receipt_flow_feeds_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let task = Task::new(&admin, create_input("Read me", vec![member.id]));
    store.create_task(&task).await.unwrap();
    sync.refresh().await.unwrap();

    let mut receipts = ReadReceipts::new();
    let rendered = handle.snapshot()[0].clone();
    assert!(receipts.mark_read(store.as_ref(), &rendered, member.id).await);

    sync.apply(SyncCommand::MarkRead {
        task_id: task.id,
        user_id: member.id,
    })
    .await;
    assert!(handle.snapshot()[0].is_read_by(member.id));
    assert!(handle.snapshot()[0].seen_by_any_assignee());

    // Re-render: already read, nothing fires.
    let rendered = handle.snapshot()[0].clone();
    assert!(!receipts.mark_read(store.as_ref(), &rendered, member.id).await);
    assert_eq!(store.read_tasks().await.unwrap()[0].read_by, vec![member.id]);
}

#[tokio::test]
async fn test_views_over_live_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let (mut sync, handle) = TaskSynchronizer::new(store.clone(), notifier.clone(), member.id);

    let inbound = Task::new(&admin, create_input("Inbound", vec![member.id]));
    let outbound = Task::new(&member, create_input("Outbound", vec![admin.id]));
    store.create_task(&inbound).await.unwrap();
    store.create_task(&outbound).await.unwrap();
    sync.refresh().await.unwrap();

    let snapshot = handle.snapshot();
    let inbox = view_set(&snapshot, &member, ViewMode::Inbox);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, inbound.id);

    let outbox = view_set(&snapshot, &member, ViewMode::Outbox);
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].id, outbound.id);

    let s = stats(&inbox);
    assert_eq!(s.pending, 1);
    assert_eq!(s.completion_rate(), 0);

    let hits = filtered(
        &inbox,
        &TaskFilter {
            query: "inbound".to_string(),
            status: None,
        },
    );
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_run_loop_polls_and_stops_on_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(store.clone());
    let (admin, member) = team(&gate).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let config = SyncConfig {
        poll_interval: Duration::from_millis(20),
    };
    let (sync, handle) =
        TaskSynchronizer::with_config(store.clone(), notifier.clone(), member.id, config);

    let existing = Task::new(&admin, create_input("Existing", vec![member.id]));
    store.create_task(&existing).await.unwrap();

    let join = tokio::spawn(sync.run());

    // Wait for the baseline snapshot.
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while rx.borrow_and_update().is_empty() {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("baseline fetch publishes a snapshot");
    assert_eq!(handle.snapshot().len(), 1);
    // Pre-existing assignments never notify at startup.
    assert!(notifier.delivered().await.is_empty());

    // A task appearing while the loop runs does notify.
    let fresh = Task::new(&admin, create_input("Fresh", vec![member.id]));
    store.create_task(&fresh).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while notifier.delivered().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("a later poll notifies about the new task");
    assert_eq!(notifier.delivered().await[0].1, "Ada assigned: Fresh");

    // Logout cancels the loop.
    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(2), join)
        .await
        .expect("loop exits after shutdown")
        .unwrap();
}
