//! User model for the `Users` collection
//!
//! Users register themselves and wait for an admin to approve them. The
//! very first registrant in the store's history becomes the active admin;
//! everyone after that starts out pending.
//!
//! # State Machine
//!
//! ```text
//! pending → active
//!         → rejected
//! ```
//!
//! Both transitions are performed by an admin. Users are never deleted.
//!
//! # Example
//!
//! ```
//! use teamtask_shared::models::user::{User, UserRole, UserStatus};
//!
//! let admin = User::new(
//!     "Ada".to_string(),
//!     "ada@example.com".to_string(),
//!     "digest".to_string(),
//!     UserRole::Admin,
//!     UserStatus::Active,
//! );
//! assert!(admin.role.is_admin());
//! assert!(admin.status.is_active());
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Can approve or reject pending registrations
    Admin,

    /// Regular team member
    Member,
}

impl UserRole {
    /// Converts role to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Member => "MEMBER",
        }
    }

    /// Checks if the role is admin
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Registered, waiting for admin approval
    Pending,

    /// Approved, may log in and be assigned tasks
    Active,

    /// Rejected by an admin; may not log in
    Rejected,
}

impl UserStatus {
    /// Converts status to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Active => "ACTIVE",
            UserStatus::Rejected => "REJECTED",
        }
    }

    /// Human-readable label for display surfaces
    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending approval",
            UserStatus::Active => "active",
            UserStatus::Rejected => "rejected",
        }
    }

    /// Checks if the account is approved
    pub fn is_active(&self) -> bool {
        matches!(self, UserStatus::Active)
    }

    /// Checks if transition to target status is valid
    ///
    /// Only an admin decision moves an account, and only out of pending.
    pub fn can_transition_to(&self, target: UserStatus) -> bool {
        matches!(
            (self, target),
            (UserStatus::Pending, UserStatus::Active) | (UserStatus::Pending, UserStatus::Rejected)
        )
    }
}

/// User record as stored in the `Users` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4, generated client-side)
    pub id: Uuid,

    /// Email address
    ///
    /// Unique across the collection; compared case-sensitively, exactly
    /// as stored.
    pub email: String,

    /// Display name
    pub name: String,

    /// Role (first registrant is admin, everyone else member)
    pub role: UserRole,

    /// Account status
    pub status: UserStatus,

    /// Opaque credential secret (hex SHA-256 digest of the login secret)
    ///
    /// Login is an exact-match lookup against this field, so the digest
    /// must be deterministic. Never store the plaintext secret.
    pub password_hash: String,

    /// When the account was created (epoch millis)
    pub created_at: i64,
}

/// Input for registering a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Login secret (plaintext; digested before it leaves the process)
    #[validate(length(min = 8, message = "Secret must be at least 8 characters"))]
    pub secret: String,
}

impl User {
    /// Creates a new user record with a fresh ID and creation timestamp
    ///
    /// `password_hash` must already be the credential digest; see
    /// [`crate::auth::secret::hash_secret`].
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: UserRole,
        status: UserStatus,
    ) -> Self {
        User {
            id: Uuid::new_v4(),
            email,
            name,
            role,
            status,
            password_hash,
            created_at: super::now_millis(),
        }
    }

    /// Checks if the account may authenticate
    ///
    /// Admins always pass; everyone else must be active.
    pub fn may_log_in(&self) -> bool {
        self.status.is_active() || self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, status: UserStatus) -> User {
        User::new(
            "Test".to_string(),
            "test@example.com".to_string(),
            "digest".to_string(),
            role,
            status,
        )
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "ADMIN");
        assert_eq!(UserRole::Member.as_str(), "MEMBER");
    }

    #[test]
    fn test_status_transitions() {
        assert!(UserStatus::Pending.can_transition_to(UserStatus::Active));
        assert!(UserStatus::Pending.can_transition_to(UserStatus::Rejected));

        assert!(!UserStatus::Active.can_transition_to(UserStatus::Rejected));
        assert!(!UserStatus::Active.can_transition_to(UserStatus::Pending));
        assert!(!UserStatus::Rejected.can_transition_to(UserStatus::Active));
        assert!(!UserStatus::Pending.can_transition_to(UserStatus::Pending));
    }

    #[test]
    fn test_may_log_in() {
        assert!(user(UserRole::Member, UserStatus::Active).may_log_in());
        assert!(!user(UserRole::Member, UserStatus::Pending).may_log_in());
        assert!(!user(UserRole::Member, UserStatus::Rejected).may_log_in());

        // Admins pass regardless of status.
        assert!(user(UserRole::Admin, UserStatus::Pending).may_log_in());
    }

    #[test]
    fn test_wire_field_names() {
        let u = user(UserRole::Admin, UserStatus::Active);
        let json = serde_json::to_value(&u).unwrap();

        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["status"], "ACTIVE");
        assert!(json["passwordHash"].is_string());
        assert!(json["createdAt"].is_i64());
    }

    #[test]
    fn test_register_user_validation() {
        let ok = RegisterUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            secret: "longenough".to_string(),
        };
        assert!(validator::Validate::validate(&ok).is_ok());

        let bad_email = RegisterUser {
            email: "not-an-email".to_string(),
            ..ok.clone()
        };
        assert!(validator::Validate::validate(&bad_email).is_err());

        let short_secret = RegisterUser {
            secret: "short".to_string(),
            ..ok
        };
        assert!(validator::Validate::validate(&short_secret).is_err());
    }
}
