//! helpdesk-client - Client core for the helpdesk ticketing service
//!
//! This crate provides everything a front end needs to talk to the service:
//! - Auth session manager with observable state and durable persistence
//! - Generic API client normalizing every call into data/error/status
//! - Role-gated view controllers for the ticket dashboard and admin panel
//! - redb embedded database for the persisted session

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod views;

use std::sync::Arc;

use thiserror::Error;

use api::ApiClient;
use config::Config;
use session::AuthSession;
use storage::{Database, DatabaseError};
use views::{AdminController, DashboardController};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open session store: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub auth: Arc<AuthSession>,
}

impl AppState {
    /// Open the session store, build the API client and restore the
    /// persisted session.
    pub fn open(config: Config) -> Result<Self, StartupError> {
        let db = Database::open(&config.storage.data_dir)?;
        let client = ApiClient::new(&config.api)?;
        let auth = Arc::new(AuthSession::new(client, Arc::new(db.clone())));
        auth.restore();

        Ok(Self { config, db, auth })
    }

    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(Arc::clone(&self.auth))
    }

    pub fn admin(&self) -> AdminController {
        AdminController::new(Arc::clone(&self.auth), self.config.views.audit_page_size)
    }
}
