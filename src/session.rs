//! Auth session manager.
//!
//! Owns "who is logged in" for the whole client. State is published through a
//! `watch` channel so views can subscribe to changes instead of polling, and
//! every transition is mirrored to the [`PersistedSession`] so a restart picks
//! up where the last run left off.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::auth::{self, SignupRequest};
use crate::api::{ApiClient, ApiError};
use crate::models::User;
use crate::storage::{KeyValueStore, PersistError, PersistedSession};

/// An authenticated identity and its bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Observable auth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    /// Loading until the persisted session has been restored.
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            error: None,
        }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Failed to persist session: {0}")]
    Persist(#[from] PersistError),
}

pub struct AuthSession {
    client: ApiClient,
    persisted: PersistedSession,
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    pub fn new(client: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            client,
            persisted: PersistedSession::new(store),
            state,
        }
    }

    /// The API client sessions are established through
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ========================================================================
    // State access
    // ========================================================================

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().session.as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().session.as_ref().map(|s| s.token.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Load the persisted session, self-healing anything unusable.
    pub fn restore(&self) {
        let restored = match self.persisted.read() {
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Discarding unusable persisted session");
                None
            }
        };

        if restored.is_none() {
            if let Err(e) = self.persisted.clear() {
                warn!(error = %e, "Failed to clear persisted session");
            }
        } else {
            debug!("Restored persisted session");
        }

        self.state.send_modify(|s| {
            s.session = restored;
            s.loading = false;
        });
    }

    /// Authenticate and persist the resulting session.
    ///
    /// On failure the error is recorded in the state and returned; the current
    /// session is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.begin();
        let result = self.authenticate(email, password).await;
        self.finish(result.as_ref().err().map(ToString::to_string));
        result
    }

    /// Register, then log in with the same credentials.
    pub async fn signup(&self, request: &SignupRequest) -> Result<Session, AuthError> {
        self.begin();

        if let Err(e) = auth::sign_up(&self.client, request).await.into_result() {
            warn!(email = %request.email, status = e.status(), error = %e, "Signup failed");
            self.finish(Some(e.to_string()));
            return Err(e.into());
        }

        debug!(email = %request.email, "Signed up, logging in");
        self.login(&request.email, &request.password).await
    }

    /// Forget the session locally and on disk. Never fails.
    pub fn logout(&self) {
        if let Err(e) = self.persisted.clear() {
            warn!(error = %e, "Failed to clear persisted session on logout");
        }
        self.state.send_modify(|s| {
            s.session = None;
            s.error = None;
        });
        info!("Logged out");
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = auth::sign_in(&self.client, email, password)
            .await
            .into_result()
            .inspect_err(|e| warn!(email = %email, status = e.status(), error = %e, "Login failed"))?;

        let session = Session {
            user: response.user,
            token: response.access_token,
        };
        self.persisted.write(&session)?;

        self.state
            .send_modify(|s| s.session = Some(session.clone()));
        info!(user_id = %session.user.id, role = %session.user.role, "Logged in");
        Ok(session)
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(&self, error: Option<String>) {
        self.state.send_modify(|s| {
            s.loading = false;
            if error.is_some() {
                s.error = error;
            }
        });
    }
}
