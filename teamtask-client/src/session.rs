//! Session/auth gate
//!
//! Registration and login run against the `Users` collection; admins
//! approve or reject pending registrations. There is no token exchange:
//! identity is established by an exact-match lookup and then persisted
//! in the local session slot until logout.
//!
//! # First-User Rule
//!
//! The first successful registration in the store's history becomes the
//! active admin; every later registrant starts as a pending member and
//! cannot log in until approved.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamtask_client::session::AuthGate;
//! use teamtask_client::store::SheetStore;
//! use teamtask_shared::models::RegisterUser;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SheetStore::new("https://example/exec".to_string()));
//! let gate = AuthGate::new(store);
//!
//! let admin = gate
//!     .register(RegisterUser {
//!         name: "Ada".to_string(),
//!         email: "ada@example.com".to_string(),
//!         secret: "super_secret_1".to_string(),
//!     })
//!     .await?;
//!
//! let logged_in = gate.login("ada@example.com", "super_secret_1").await?;
//! assert_eq!(logged_in.unwrap().id, admin.id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use teamtask_shared::auth::secret::hash_secret;
use teamtask_shared::models::{RegisterUser, User, UserRole, UserStatus};
use validator::Validate;

use crate::store::{RecordStore, StoreError, UserUpdate};

/// Auth gate error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// An existing user already holds this email (case-sensitive exact
    /// match)
    #[error("this email is already registered")]
    DuplicateEmail,

    /// Credentials matched a user who may not log in yet
    #[error("account is not yet approved or has been rejected; contact an admin")]
    NotAuthorized,

    /// Registration input failed validation
    #[error("invalid input: {0}")]
    Validation(String),

    /// Admin decision on a user who is not pending
    #[error("user is not pending approval")]
    NotPending,

    /// Remote store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session/auth gate over the `Users` collection
pub struct AuthGate {
    store: Arc<dyn RecordStore>,
}

impl AuthGate {
    /// Creates a gate over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        AuthGate { store }
    }

    /// Registers a new user
    ///
    /// The duplicate-email check runs against the current snapshot; the
    /// check-then-create sequence is not atomic, so two racing
    /// registrations can both pass it. The same window applies to the
    /// first-user rule. Small-team risk, documented here rather than
    /// solved; the backing store has no transactional primitive.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] on malformed input
    /// - [`AuthError::DuplicateEmail`] if the email is taken
    /// - [`AuthError::Store`] on remote failure
    pub async fn register(&self, input: RegisterUser) -> Result<User, AuthError> {
        input
            .validate()
            .map_err(|e| AuthError::Validation(validation_message(&e)))?;

        let users = self.store.read_users().await?;
        if users.iter().any(|u| u.email == input.email) {
            return Err(AuthError::DuplicateEmail);
        }

        let is_first = users.is_empty();
        let (role, status) = if is_first {
            (UserRole::Admin, UserStatus::Active)
        } else {
            (UserRole::Member, UserStatus::Pending)
        };

        let user = User::new(
            input.name,
            input.email,
            hash_secret(&input.secret),
            role,
            status,
        );
        self.store.create_user(&user).await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Registered user");
        Ok(user)
    }

    /// Authenticates a user by email and secret
    ///
    /// Returns `Ok(None)` when no record matches the pair; a wrong
    /// email and a wrong secret are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthorized`] if the matched account is not
    ///   active (admins always pass)
    /// - [`AuthError::Store`] on remote failure
    pub async fn login(&self, email: &str, secret: &str) -> Result<Option<User>, AuthError> {
        let digest = hash_secret(secret);
        let users = self.store.read_users().await?;

        match users
            .into_iter()
            .find(|u| u.email == email && u.password_hash == digest)
        {
            Some(user) if user.may_log_in() => {
                tracing::info!(user_id = %user.id, "Login succeeded");
                Ok(Some(user))
            }
            Some(_) => Err(AuthError::NotAuthorized),
            None => Ok(None),
        }
    }

    /// Lists registrations waiting for an admin decision
    pub async fn pending_users(&self) -> Result<Vec<User>, AuthError> {
        let users = self.store.read_users().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.status == UserStatus::Pending)
            .collect())
    }

    /// Approves a pending registration (admin)
    pub async fn approve(&self, user: &User) -> Result<(), AuthError> {
        self.decide(user, UserStatus::Active).await
    }

    /// Rejects a pending registration (admin)
    pub async fn reject(&self, user: &User) -> Result<(), AuthError> {
        self.decide(user, UserStatus::Rejected).await
    }

    async fn decide(&self, user: &User, target: UserStatus) -> Result<(), AuthError> {
        if !user.status.can_transition_to(target) {
            return Err(AuthError::NotPending);
        }

        self.store
            .update_user(
                user.id,
                UserUpdate {
                    status: Some(target),
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, status = target.as_str(), "User status updated");
        Ok(())
    }

    /// Lists users the current user may assign tasks to
    ///
    /// Only active users other than the current user are assignable.
    pub async fn assignable_users(&self, current: &User) -> Result<Vec<User>, AuthError> {
        let users = self.store.read_users().await?;
        Ok(users
            .into_iter()
            .filter(|u| u.status.is_active() && u.id != current.id)
            .collect())
    }
}

/// Flattens validator output into one inline-form message
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                match &error.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value", field),
                }
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
