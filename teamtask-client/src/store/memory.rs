//! In-memory store for testing and demos
//!
//! Implements [`RecordStore`] against two in-process vectors. It's
//! useful for:
//! - Testing the engine without a live endpoint
//! - Demonstrating flows offline
//!
//! # Failure Injection
//!
//! Reads and writes can be made to fail on demand, so error paths
//! (polling over a dead link, lost read receipts, failed optimistic
//! persistence) can be exercised deterministically.
//!
//! # Example
//!
//! ```
//! use teamtask_client::store::{MemoryStore, RecordStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! assert!(store.read_users().await?.is_empty());
//!
//! store.set_fail_reads(true);
//! assert!(store.read_users().await.is_err());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use teamtask_shared::models::{Task, User};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult, TaskUpdate, UserUpdate};

/// Record collections held in memory
#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    tasks: Vec<Task>,
}

/// In-memory `RecordStore` implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Makes every read fail with a remote error until cleared
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail with a remote error until cleared
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seeds a task directly, bypassing the write path
    ///
    /// Lets tests stage server-side state even while writes are failing.
    pub async fn insert_task(&self, task: Task) {
        self.collections.lock().await.tasks.push(task);
    }

    /// Seeds a user directly, bypassing the write path
    pub async fn insert_user(&self, user: User) {
        self.collections.lock().await.users.push(user);
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Remote("injected read failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Remote("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn read_users(&self) -> StoreResult<Vec<User>> {
        self.check_read()?;
        Ok(self.collections.lock().await.users.clone())
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        self.check_write()?;
        self.collections.lock().await.users.push(user.clone());
        Ok(())
    }

    async fn update_user(&self, id: Uuid, updates: UserUpdate) -> StoreResult<()> {
        self.check_write()?;
        let mut collections = self.collections.lock().await;
        let user = collections
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::Remote(format!("no user record with id {}", id)))?;

        if let Some(status) = updates.status {
            user.status = status;
        }
        Ok(())
    }

    async fn read_tasks(&self) -> StoreResult<Vec<Task>> {
        self.check_read()?;
        Ok(self.collections.lock().await.tasks.clone())
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        self.check_write()?;
        self.collections.lock().await.tasks.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, id: Uuid, updates: TaskUpdate) -> StoreResult<()> {
        self.check_write()?;
        let mut collections = self.collections.lock().await;
        let task = collections
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::Remote(format!("no task record with id {}", id)))?;

        if let Some(status) = updates.status {
            task.status = status;
        }
        if let Some(read_by) = updates.read_by {
            // Whole-list replacement, exactly like the real endpoint.
            task.read_by = read_by;
        }
        Ok(())
    }
}
