use std::sync::Arc;

use tracing::{debug, info};

use super::{mount_session, ErrorSlot, Lifetime, MountOutcome, ViewError};
use crate::api::tickets;
use crate::models::{NewTicket, Ticket, TicketStatus};
use crate::session::{AuthSession, Session};

/// Question put to the user before a ticket is deleted
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this ticket?";

/// Ticket list for the signed-in user.
///
/// Admins see and manage every ticket; regular users see their own.
pub struct DashboardController {
    auth: Arc<AuthSession>,
    tickets: Vec<Ticket>,
    tickets_loaded: bool,
    loading: bool,
    form_open: bool,
    error: ErrorSlot,
    lifetime: Lifetime,
}

impl DashboardController {
    pub fn new(auth: Arc<AuthSession>) -> Self {
        Self {
            auth,
            tickets: Vec::new(),
            tickets_loaded: false,
            loading: true,
            form_open: false,
            error: ErrorSlot::default(),
            lifetime: Lifetime::new(),
        }
    }

    /// Gate on the session, then load the ticket list.
    pub async fn mount(&mut self) -> Result<MountOutcome, ViewError> {
        let session = match mount_session(&self.auth, false) {
            Ok(session) => session,
            Err(outcome) => return Ok(outcome),
        };

        self.loading = true;
        let response = self
            .lifetime
            .guard(tickets::list(self.auth.client(), &session.token))
            .await;
        self.loading = false;

        let tickets = self.error.record(
            response.and_then(|r| r.into_result().map_err(ViewError::from)),
        )?;
        debug!(count = tickets.len(), "Loaded tickets");
        self.tickets = tickets;
        self.tickets_loaded = true;
        Ok(MountOutcome::Ready)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a ticket and show it first. Closes the creation form.
    pub async fn create_ticket(&mut self, input: NewTicket) -> Result<&Ticket, ViewError> {
        let result = self.submit_ticket(&input).await;
        let ticket = self.error.record(result)?;

        info!(ticket_id = %ticket.id, "Created ticket");
        self.tickets.insert(0, ticket);
        self.form_open = false;
        Ok(&self.tickets[0])
    }

    /// Change a ticket's status. Admin only; checked before any request.
    pub async fn update_ticket_status(
        &mut self,
        id: &str,
        status: TicketStatus,
    ) -> Result<(), ViewError> {
        let result = self.submit_status(id, status).await;
        let updated = self.error.record(result)?;

        if let Some(slot) = self.tickets.iter_mut().find(|t| t.id == id) {
            *slot = updated;
        }
        Ok(())
    }

    /// Delete a ticket if `confirm` agrees. Returns whether it was deleted.
    pub async fn delete_ticket(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<bool, ViewError> {
        if !confirm(DELETE_PROMPT) {
            return Ok(false);
        }

        let result = self.submit_delete(id).await;
        self.error.record(result)?;

        self.tickets.retain(|t| t.id != id);
        info!(ticket_id = %id, "Deleted ticket");
        Ok(true)
    }

    async fn submit_ticket(&self, input: &NewTicket) -> Result<Ticket, ViewError> {
        input.validate().map_err(ViewError::Invalid)?;
        let session = self.require_session()?;
        let response = self
            .lifetime
            .guard(tickets::create(self.auth.client(), input, &session.token))
            .await?;
        Ok(response.into_result()?)
    }

    async fn submit_status(&self, id: &str, status: TicketStatus) -> Result<Ticket, ViewError> {
        let session = self.require_session()?;
        if !session.is_admin() {
            return Err(ViewError::AdminOnly);
        }
        let response = self
            .lifetime
            .guard(tickets::update_status(
                self.auth.client(),
                id,
                status,
                &session.token,
            ))
            .await?;
        Ok(response.into_result()?)
    }

    async fn submit_delete(&self, id: &str) -> Result<(), ViewError> {
        let session = self.require_session()?;
        let response = self
            .lifetime
            .guard(tickets::delete(self.auth.client(), id, &session.token))
            .await?;
        Ok(response.into_result()?)
    }

    fn require_session(&self) -> Result<Session, ViewError> {
        self.auth.session().ok_or(ViewError::NotAuthenticated)
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Whether the list has been fetched at least once
    pub fn tickets_loaded(&self) -> bool {
        self.tickets_loaded
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn heading(&self) -> &'static str {
        if self.auth.is_admin() {
            "All Tickets"
        } else {
            "My Tickets"
        }
    }

    pub fn can_update_status(&self) -> bool {
        self.auth.is_admin()
    }

    /// Admins may delete any ticket, users only their own.
    pub fn can_delete(&self, ticket: &Ticket) -> bool {
        match self.auth.user() {
            Some(user) => user.is_admin() || ticket.created_by.refers_to(&user),
            None => false,
        }
    }

    pub fn can_open_admin_panel(&self) -> bool {
        self.auth.is_admin()
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn open_form(&mut self) {
        self.form_open = true;
    }

    pub fn close_form(&mut self) {
        self.form_open = false;
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

    /// Stop applying responses; anything in flight resolves as cancelled.
    pub fn teardown(&self) {
        self.lifetime.teardown();
    }
}
