//! Remote store adapter
//!
//! The backing store is a remote spreadsheet service that exposes two
//! record collections (`Users`, `Tasks`) behind a single generic HTTP
//! endpoint. This module defines the contract the rest of the engine
//! programs against, plus two implementations:
//!
//! - [`SheetStore`]: the real HTTP implementation of the wire protocol
//! - [`MemoryStore`]: an in-memory implementation for tests and demos
//!
//! # Update Semantics
//!
//! `update_*` performs a **field-level overwrite**, not a deep merge:
//! sending a replacement value for a list-typed field (read-by) replaces
//! the whole list. Any "append" must read the current value, compute the
//! new list, and write it back, a non-atomic sequence that can lose
//! updates under concurrent writers. The backing service offers no
//! array-append primitive, so callers document the race instead.

pub mod memory;
pub mod sheet;

pub use memory::MemoryStore;
pub use sheet::{ProbeError, SheetStore};

use async_trait::async_trait;
use serde::Serialize;
use teamtask_shared::models::{Task, TaskStatus, User, UserStatus};
use uuid::Uuid;

/// Collection names in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sheet {
    /// The `Users` collection
    Users,

    /// The `Tasks` collection
    Tasks,
}

impl Sheet {
    /// Converts the collection to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Sheet::Users => "Users",
            Sheet::Tasks => "Tasks",
        }
    }
}

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No endpoint URL is configured; blocks every remote call
    #[error("no endpoint configured; run setup first")]
    NotConfigured,

    /// The HTTP request itself failed
    #[error("request to the endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON envelope
    #[error("endpoint returned an unrecognizable response: {0}")]
    InvalidResponse(String),

    /// The endpoint reported a failure
    #[error("endpoint reported an error: {0}")]
    Remote(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Partial update for a user record
///
/// Only non-None fields are written; each named field is overwritten
/// wholesale.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New account status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// Partial update for a task record
///
/// Only non-None fields are written; each named field is overwritten
/// wholesale; `read_by` replaces the entire list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// New lifecycle status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    /// Full replacement read-receipt list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_by: Option<Vec<Uuid>>,
}

/// Typed operations over the two remote collections
///
/// Every method is one network round trip; there is no pagination,
/// filtering, or partial fetch; reads return the full collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the full `Users` collection
    async fn read_users(&self) -> StoreResult<Vec<User>>;

    /// Appends a user record
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    /// Overwrites the named fields of the user record matching `id`
    async fn update_user(&self, id: Uuid, updates: UserUpdate) -> StoreResult<()>;

    /// Reads the full `Tasks` collection
    async fn read_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Appends a task record
    async fn create_task(&self, task: &Task) -> StoreResult<()>;

    /// Overwrites the named fields of the task record matching `id`
    async fn update_task(&self, id: Uuid, updates: TaskUpdate) -> StoreResult<()>;
}
