use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use super::{mount_session, ErrorSlot, Lifetime, MountOutcome, Optimistic, Page, Paginator, ViewError};
use crate::api::{audit, ApiResponse};
use crate::models::{AuditLogEntry, DatabaseStatus};
use crate::session::AuthSession;

enum Fetched {
    Logs(ApiResponse<Vec<AuditLogEntry>>),
    Status(ApiResponse<DatabaseStatus>),
}

/// Admin panel: the audit trail and the primary database switch.
pub struct AdminController {
    auth: Arc<AuthSession>,
    logs: Vec<AuditLogEntry>,
    logs_loaded: bool,
    paginator: Paginator,
    status: Option<Optimistic<DatabaseStatus>>,
    loading: bool,
    error: ErrorSlot,
    lifetime: Lifetime,
}

impl AdminController {
    pub fn new(auth: Arc<AuthSession>, page_size: usize) -> Self {
        Self {
            auth,
            logs: Vec::new(),
            logs_loaded: false,
            paginator: Paginator::new(page_size),
            status: None,
            loading: true,
            error: ErrorSlot::default(),
            lifetime: Lifetime::new(),
        }
    }

    /// Gate on an admin session, then fetch logs and database status
    /// concurrently.
    ///
    /// Each result is applied as it arrives, so when both fail the slot ends
    /// up holding whichever error came last. That error is also returned.
    pub async fn mount(&mut self) -> Result<MountOutcome, ViewError> {
        let session = match mount_session(&self.auth, true) {
            Ok(session) => session,
            Err(outcome) => return Ok(outcome),
        };

        self.loading = true;
        let client = self.auth.client().clone();
        let token = session.token;

        let mut pending: FuturesUnordered<BoxFuture<'_, Fetched>> = FuturesUnordered::new();
        pending.push(audit::logs(&client, &token).map(Fetched::Logs).boxed());
        pending.push(
            audit::database_status(&client, &token)
                .map(Fetched::Status)
                .boxed(),
        );

        let mut last_error = None;
        loop {
            let next = match self.lifetime.guard(pending.next()).await {
                Ok(next) => next,
                Err(e) => {
                    self.loading = false;
                    return Err(e);
                }
            };
            let Some(fetched) = next else { break };
            if let Err(e) = self.apply(fetched) {
                last_error = Some(e);
            }
        }
        self.loading = false;

        match last_error {
            Some(e) => Err(e),
            None => Ok(MountOutcome::Ready),
        }
    }

    fn apply(&mut self, fetched: Fetched) -> Result<(), ViewError> {
        match fetched {
            Fetched::Logs(response) => {
                let logs = self
                    .error
                    .record(response.into_result().map_err(ViewError::from))?;
                debug!(count = logs.len(), "Loaded audit logs");
                self.logs = logs;
                self.logs_loaded = true;
                self.paginator.reset();
            }
            Fetched::Status(response) => {
                let status = self
                    .error
                    .record(response.into_result().map_err(ViewError::from))?;
                debug!(primary_down = status.primary_down, "Loaded database status");
                self.status = Some(Optimistic::new(status));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Database switch
    // ========================================================================

    /// Flip the primary database flag.
    ///
    /// The flipped value is shown immediately and confirmed or rolled back
    /// once the server answers.
    pub async fn toggle_database(&mut self) -> Result<DatabaseStatus, ViewError> {
        let result = self.submit_toggle().await;
        self.error.record(result)
    }

    async fn submit_toggle(&mut self) -> Result<DatabaseStatus, ViewError> {
        let session = self.auth.session().ok_or(ViewError::NotAuthenticated)?;
        let status = self.status.as_mut().ok_or(ViewError::StatusUnavailable)?;

        let target = DatabaseStatus {
            primary_down: !status.current().primary_down,
        };
        status.apply(target);

        let outcome = self
            .lifetime
            .guard(audit::toggle_database(
                self.auth.client(),
                target.primary_down,
                &session.token,
            ))
            .await
            .and_then(|response| response.into_result().map_err(ViewError::from));

        let Some(status) = self.status.as_mut() else {
            return Err(ViewError::StatusUnavailable);
        };
        match outcome {
            Ok(body) => {
                let confirmed = serde_json::from_value(body).unwrap_or(target);
                status.commit(confirmed);
                info!(primary_down = confirmed.primary_down, "Toggled primary database");
                Ok(confirmed)
            }
            Err(e) => {
                status.revert();
                warn!(error = %e, "Database toggle failed, reverted");
                Err(e)
            }
        }
    }

    /// Displayed status, including an unconfirmed toggle
    pub fn database_status(&self) -> Option<DatabaseStatus> {
        self.status.as_ref().map(|s| *s.current())
    }

    pub fn toggle_pending(&self) -> bool {
        self.status.as_ref().is_some_and(Optimistic::is_pending)
    }

    // ========================================================================
    // Audit log paging
    // ========================================================================

    pub fn logs(&self) -> &[AuditLogEntry] {
        &self.logs
    }

    /// Whether the audit trail has been fetched at least once
    pub fn logs_loaded(&self) -> bool {
        self.logs_loaded
    }

    pub fn page(&self) -> Page<'_, AuditLogEntry> {
        self.paginator.page(&self.logs)
    }

    pub fn current_page(&self) -> usize {
        self.page().number
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.logs.len())
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.paginator.go_to_page(page, self.logs.len())
    }

    pub fn next_page(&mut self) -> usize {
        self.paginator.next_page(self.logs.len())
    }

    pub fn previous_page(&mut self) -> usize {
        self.paginator.previous_page(self.logs.len())
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.get()
    }

    pub fn dismiss_error(&mut self) {
        self.error.dismiss();
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub fn teardown(&self) {
        self.lifetime.teardown();
    }
}
