//! Role-gated view controllers.
//!
//! Controllers hold the state a screen renders from and run the requests
//! behind it. The server stays the authority on permissions; the role checks
//! here only spare the user a request that is bound to fail.

pub mod admin;
pub mod dashboard;
pub mod optimistic;
pub mod pagination;

pub use admin::AdminController;
pub use dashboard::DashboardController;
pub use optimistic::Optimistic;
pub use pagination::{Page, Paginator, DEFAULT_PAGE_SIZE};

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::session::{AuthSession, AuthState, Session};

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    Dashboard,
    Admin,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::SignIn => "/sign-in",
            Route::Dashboard => "/dashboard",
            Route::Admin => "/admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where the entry point should send the user; `None` while auth is loading.
pub fn landing_route(state: &AuthState) -> Option<Route> {
    if state.loading {
        None
    } else if state.is_authenticated() {
        Some(Route::Dashboard)
    } else {
        Some(Route::SignIn)
    }
}

/// Result of mounting a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Auth has not been restored yet; mount again once it has
    Loading,
    Redirect(Route),
    Ready,
}

/// Resolve the session a controller should mount with, or where to go instead.
pub(crate) fn mount_session(
    auth: &AuthSession,
    admin_only: bool,
) -> Result<Session, MountOutcome> {
    let state = auth.state();
    if state.loading {
        return Err(MountOutcome::Loading);
    }
    match state.session {
        None => Err(MountOutcome::Redirect(Route::SignIn)),
        Some(session) if admin_only && !session.is_admin() => {
            Err(MountOutcome::Redirect(Route::Dashboard))
        }
        Some(session) => Ok(session),
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Only admins can update ticket status")]
    AdminOnly,
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("{0}")]
    Invalid(String),
    #[error("Database status has not been loaded")]
    StatusUnavailable,
    #[error("Request cancelled")]
    Cancelled,
}

/// The one error a view shows. A later error replaces an earlier one; errors
/// stay until dismissed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSlot {
    message: Option<String>,
}

impl ErrorSlot {
    pub fn set(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.message.is_some()
    }

    pub fn dismiss(&mut self) {
        self.message = None;
    }

    /// Record a failed outcome and pass it through. Cancellations are not
    /// shown.
    pub fn record<T>(&mut self, result: Result<T, ViewError>) -> Result<T, ViewError> {
        if let Err(e) = &result {
            if !matches!(e, ViewError::Cancelled) {
                self.set(e.to_string());
            }
        }
        result
    }
}

// ============================================================================
// Lifetime
// ============================================================================

/// Cancellation scope of a controller.
///
/// Once torn down (explicitly or by drop), every guarded request resolves to
/// [`ViewError::Cancelled`] and its response is discarded.
#[derive(Debug, Default)]
pub struct Lifetime {
    token: CancellationToken,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that tears this lifetime down from elsewhere
    pub fn handle(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the lifetime ends first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, ViewError> {
        if self.token.is_cancelled() {
            return Err(ViewError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ViewError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
