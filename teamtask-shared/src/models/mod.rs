//! Data models for the two remote collections
//!
//! Records are serialized with the wire field names the spreadsheet
//! endpoint stores (camelCase fields, SCREAMING_SNAKE_CASE enum values),
//! so a round trip through the remote store is lossless.

pub mod task;
pub mod user;

pub use task::{CreateTask, Task, TaskPriority, TaskStatus};
pub use user::{RegisterUser, User, UserRole, UserStatus};

/// Current wall-clock time as epoch milliseconds.
///
/// Creation timestamps are stored as epoch millis in the remote
/// collections.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_recent() {
        // Anything after 2024-01-01 counts as a sane clock.
        assert!(now_millis() > 1_704_067_200_000);
    }
}
