//! # TeamTask Client Engine
//!
//! This library implements the client side of the TeamTask tracker: the
//! remote store adapter, the session/auth gate, the task synchronizer,
//! the status/read-receipt machinery, and the pure view derivations.
//!
//! ## Architecture
//!
//! ```text
//! SessionGate ──login/register──> RecordStore (Users)
//!      │
//!      └─> TaskSynchronizer ──poll/refresh──> RecordStore (Tasks)
//!               │  owns the task cache, publishes immutable snapshots
//!               ├─> Notifier (best-effort, newly assigned tasks)
//!               └─> watch channel ──> views (pure derivations)
//! ```
//!
//! User actions flow back through `status` into the store adapter and
//! then trigger a resynchronization.
//!
//! ## Modules
//!
//! - `store`: remote store adapter (trait, HTTP impl, in-memory impl)
//! - `config`: environment configuration
//! - `local`: durable local state slots (endpoint URL, session user)
//! - `session`: registration, login, admin approval
//! - `sync`: polling synchronizer and snapshot publication
//! - `status`: status advancement and read receipts
//! - `views`: inbox/outbox partitions, stats, filtering
//! - `notify`: best-effort local notifications

pub mod config;
pub mod local;
pub mod notify;
pub mod session;
pub mod status;
pub mod store;
pub mod sync;
pub mod views;
