use serde::Serialize;

use super::{ApiClient, ApiResponse};
use crate::models::{AuditLogEntry, DatabaseStatus};

#[derive(Debug, Serialize)]
struct ToggleRequest {
    down: bool,
}

pub async fn logs(client: &ApiClient, token: &str) -> ApiResponse<Vec<AuditLogEntry>> {
    client.get("/audit/logs", Some(token)).await
}

pub async fn database_status(client: &ApiClient, token: &str) -> ApiResponse<DatabaseStatus> {
    client.get("/audit/database/status", Some(token)).await
}

/// Ask the service to mark the primary database down (`true`) or up.
///
/// The body is returned raw; older servers answer with a bare acknowledgement
/// instead of the new status.
pub async fn toggle_database(
    client: &ApiClient,
    down: bool,
    token: &str,
) -> ApiResponse<serde_json::Value> {
    client
        .post("/audit/database/toggle", &ToggleRequest { down }, Some(token))
        .await
}
