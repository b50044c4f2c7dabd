//! Application wiring
//!
//! Resolves configuration and the persisted local state once, then hands
//! the command handlers a ready store, auth gate, and session identity.
//! The setup precondition lives here: no remote call happens without an
//! endpoint URL.

use std::sync::Arc;

use anyhow::{bail, Context};
use teamtask_client::config::ClientConfig;
use teamtask_client::local::LocalState;
use teamtask_client::session::AuthGate;
use teamtask_client::store::{SheetStore, StoreError};
use teamtask_shared::models::{User, UserRole};

/// Shared state for every command handler
pub struct App {
    /// Environment configuration
    pub config: ClientConfig,

    /// Durable local slots (endpoint override, session user)
    pub local: LocalState,
}

impl App {
    /// Loads configuration and the local state file
    pub fn load() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        let local = LocalState::open(config.state_path.clone())
            .context("could not open the local state file")?;
        Ok(App { config, local })
    }

    /// Builds the remote store, enforcing the setup precondition
    ///
    /// # Errors
    ///
    /// Fails when neither a stored override nor an environment default
    /// endpoint is present.
    pub fn store(&self) -> anyhow::Result<Arc<SheetStore>> {
        match self.config.resolve_endpoint(&self.local) {
            Some(endpoint) => Ok(Arc::new(SheetStore::new(endpoint))),
            None => Err(StoreError::NotConfigured)
                .context("run `teamtask setup <url>` or set TEAMTASK_ENDPOINT"),
        }
    }

    /// Builds the auth gate over the remote store
    pub fn gate(&self) -> anyhow::Result<AuthGate> {
        Ok(AuthGate::new(self.store()?))
    }

    /// The authenticated user from the persisted session
    pub fn current_user(&self) -> anyhow::Result<User> {
        match self.local.current_user() {
            Some(user) => Ok(user.clone()),
            None => bail!("not logged in; run `teamtask login`"),
        }
    }

    /// The authenticated user, required to be an admin
    pub fn current_admin(&self) -> anyhow::Result<User> {
        let user = self.current_user()?;
        if user.role != UserRole::Admin {
            bail!("this command requires an admin account");
        }
        Ok(user)
    }
}
