use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiResponse};
use crate::models::{Role, User};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

// ============================================================================
// Calls
// ============================================================================

pub async fn sign_in(client: &ApiClient, email: &str, password: &str) -> ApiResponse<AuthResponse> {
    client
        .post("/auth/signin", &SignInRequest { email, password }, None)
        .await
}

/// Register a user; the created user document is not needed by callers.
pub async fn sign_up(client: &ApiClient, request: &SignupRequest) -> ApiResponse<serde_json::Value> {
    client.post("/auth/signup", request, None).await
}
