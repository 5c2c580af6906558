pub mod audit;
pub mod auth;
pub mod client;
pub mod response;
pub mod tickets;

pub use client::{ApiClient, RequestOptions};
pub use response::{ApiError, ApiResponse};
