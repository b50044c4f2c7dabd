//! Configuration management for the client
//!
//! Loads configuration from environment variables (with `.env` support
//! for development) and provides a type-safe configuration struct.
//!
//! # Environment Variables
//!
//! - `TEAMTASK_ENDPOINT`: default endpoint URL, used when no override
//!   has been stored by the setup flow (optional)
//! - `TEAMTASK_POLL_INTERVAL_MS`: synchronizer poll cadence
//!   (default: 10000)
//! - `TEAMTASK_STATE_PATH`: where the local state file lives
//!   (default: `<data dir>/teamtask/state.json`)
//! - `RUST_LOG`: log level filter
//!
//! # Example
//!
//! ```no_run
//! use teamtask_client::config::ClientConfig;
//!
//! # fn example() -> Result<(), teamtask_client::config::ConfigError> {
//! let config = ClientConfig::from_env()?;
//! println!("polling every {:?}", config.poll_interval());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::local::LocalState;

/// Default poll cadence in milliseconds
const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `TEAMTASK_POLL_INTERVAL_MS` is not a positive integer
    #[error("TEAMTASK_POLL_INTERVAL_MS must be a positive integer: {0}")]
    InvalidPollInterval(String),

    /// No platform data directory and no explicit state path
    #[error("no data directory available; set TEAMTASK_STATE_PATH")]
    NoStateDir,
}

/// Complete client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Default endpoint URL (compiled-in-default analog)
    ///
    /// A stored override from the setup flow takes precedence.
    pub default_endpoint: Option<String>,

    /// Synchronizer poll cadence in milliseconds
    pub poll_interval_ms: u64,

    /// Path of the local state file
    pub state_path: PathBuf,
}

impl ClientConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable has an invalid value,
    /// or no state-file location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let default_endpoint = env::var("TEAMTASK_ENDPOINT").ok().filter(|s| !s.is_empty());

        let poll_interval_ms = match env::var("TEAMTASK_POLL_INTERVAL_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidPollInterval(raw))?,
            Err(_) => DEFAULT_POLL_INTERVAL_MS,
        };

        let state_path = match env::var("TEAMTASK_STATE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::data_dir()
                .map(|dir| dir.join("teamtask").join("state.json"))
                .ok_or(ConfigError::NoStateDir)?,
        };

        Ok(ClientConfig {
            default_endpoint,
            poll_interval_ms,
            state_path,
        })
    }

    /// Poll cadence as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolves the effective endpoint URL
    ///
    /// Priority: stored override from the setup flow, then the
    /// environment default. `None` means setup is required before any
    /// remote call.
    pub fn resolve_endpoint(&self, local: &LocalState) -> Option<String> {
        local
            .endpoint_override()
            .map(str::to_string)
            .or_else(|| self.default_endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(default_endpoint: Option<&str>) -> ClientConfig {
        ClientConfig {
            default_endpoint: default_endpoint.map(str::to_string),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            state_path: PathBuf::from("/tmp/teamtask-test/state.json"),
        }
    }

    #[test]
    fn test_poll_interval() {
        assert_eq!(config(None).poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_resolve_endpoint_priority() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = LocalState::open(dir.path().join("state.json")).unwrap();

        // Nothing stored, no default.
        assert_eq!(config(None).resolve_endpoint(&local), None);

        // Environment default only.
        assert_eq!(
            config(Some("https://default/exec")).resolve_endpoint(&local),
            Some("https://default/exec".to_string())
        );

        // Stored override wins.
        local
            .set_endpoint("https://override/exec".to_string())
            .unwrap();
        assert_eq!(
            config(Some("https://default/exec")).resolve_endpoint(&local),
            Some("https://override/exec".to_string())
        );
    }
}
