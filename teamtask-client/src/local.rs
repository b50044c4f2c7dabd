//! Durable local state slots
//!
//! The client persists exactly two things between runs: the endpoint URL
//! set by the setup flow, and the serialized authenticated user. Both
//! live in one small JSON state file with an explicit lifecycle: load
//! on startup, mutate-and-save on change, clear on logout/reset. No
//! ambient global state.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use teamtask_shared::models::User;

/// Local state error types
#[derive(Debug, thiserror::Error)]
pub enum LocalStateError {
    /// State file exists but could not be read
    #[error("failed to read state file {path}: {source}")]
    Read {
        /// Offending path
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// State file or its directory could not be written
    #[error("failed to write state file {path}: {source}")]
    Write {
        /// Offending path
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// State file contents are not valid JSON for the expected shape
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        /// Offending path
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape of the state file
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    /// Endpoint URL stored by the setup flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoint_url: Option<String>,

    /// Authenticated user persisted across restarts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_user: Option<User>,
}

/// Handle over the local state file
#[derive(Debug)]
pub struct LocalState {
    path: PathBuf,
    state: StateFile,
}

impl LocalState {
    /// Opens the state file at `path`, or starts empty if it does not
    /// exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: PathBuf) -> Result<Self, LocalStateError> {
        let state = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                LocalStateError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateFile::default(),
            Err(source) => {
                return Err(LocalStateError::Read {
                    path,
                    source,
                })
            }
        };

        Ok(LocalState { path, state })
    }

    /// Endpoint URL stored by the setup flow, if any
    pub fn endpoint_override(&self) -> Option<&str> {
        self.state.endpoint_url.as_deref()
    }

    /// Stores the endpoint URL
    pub fn set_endpoint(&mut self, url: String) -> Result<(), LocalStateError> {
        self.state.endpoint_url = Some(url);
        self.save()
    }

    /// Clears the stored endpoint URL
    pub fn clear_endpoint(&mut self) -> Result<(), LocalStateError> {
        self.state.endpoint_url = None;
        self.save()
    }

    /// The persisted authenticated user, if any
    pub fn current_user(&self) -> Option<&User> {
        self.state.current_user.as_ref()
    }

    /// Persists the authenticated user across restarts
    pub fn set_current_user(&mut self, user: User) -> Result<(), LocalStateError> {
        self.state.current_user = Some(user);
        self.save()
    }

    /// Clears the persisted session (logout)
    pub fn clear_current_user(&mut self) -> Result<(), LocalStateError> {
        self.state.current_user = None;
        self.save()
    }

    fn save(&self) -> Result<(), LocalStateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LocalStateError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&self.state)
            .expect("state file shape is always serializable");
        fs::write(&self.path, contents).map_err(|source| LocalStateError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamtask_shared::models::{UserRole, UserStatus};

    fn sample_user() -> User {
        User::new(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "digest".to_string(),
            UserRole::Admin,
            UserStatus::Active,
        )
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalState::open(dir.path().join("state.json")).unwrap();
        assert!(local.endpoint_override().is_none());
        assert!(local.current_user().is_none());
    }

    #[test]
    fn test_slots_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut local = LocalState::open(path.clone()).unwrap();
        local.set_endpoint("https://example/exec".to_string()).unwrap();
        let user = sample_user();
        local.set_current_user(user.clone()).unwrap();

        let reopened = LocalState::open(path).unwrap();
        assert_eq!(reopened.endpoint_override(), Some("https://example/exec"));
        assert_eq!(reopened.current_user().unwrap().id, user.id);
    }

    #[test]
    fn test_clear_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut local = LocalState::open(path.clone()).unwrap();
        local.set_endpoint("https://example/exec".to_string()).unwrap();
        local.set_current_user(sample_user()).unwrap();

        local.clear_current_user().unwrap();
        local.clear_endpoint().unwrap();

        let reopened = LocalState::open(path).unwrap();
        assert!(reopened.endpoint_override().is_none());
        assert!(reopened.current_user().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = LocalState::open(path).unwrap_err();
        assert!(matches!(err, LocalStateError::Corrupt { .. }));
    }
}
