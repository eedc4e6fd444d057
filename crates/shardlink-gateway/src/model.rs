mod alias;
mod health;

pub use alias::{CreateAliasRequest, CreateAliasResponse};
pub use health::HealthResponse;

use serde::Serialize;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}
