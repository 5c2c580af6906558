use reqwest::Url;
use serde::Serialize;

use super::{ApiClient, ApiResponse};
use crate::models::{NewTicket, Ticket, TicketStatus};

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: TicketStatus,
}

/// `/tickets/{id}` with `id` escaped as a single path segment
fn ticket_path(id: &str) -> String {
    let Ok(mut url) = Url::parse("http://helpdesk.invalid/tickets") else {
        return format!("/tickets/{id}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(id);
    }
    url.path().to_string()
}

/// Tickets visible to the caller (all tickets for admins, own tickets otherwise)
pub async fn list(client: &ApiClient, token: &str) -> ApiResponse<Vec<Ticket>> {
    client.get("/tickets", Some(token)).await
}

pub async fn create(client: &ApiClient, ticket: &NewTicket, token: &str) -> ApiResponse<Ticket> {
    client.post("/tickets", ticket, Some(token)).await
}

pub async fn update_status(
    client: &ApiClient,
    id: &str,
    status: TicketStatus,
    token: &str,
) -> ApiResponse<Ticket> {
    client
        .patch(&ticket_path(id), &StatusUpdate { status }, Some(token))
        .await
}

/// Delete a ticket; the response body, if any, is ignored.
pub async fn delete(client: &ApiClient, id: &str, token: &str) -> ApiResponse<()> {
    client
        .delete::<serde_json::Value>(&ticket_path(id), Some(token))
        .await
        .map(|_| ())
}
