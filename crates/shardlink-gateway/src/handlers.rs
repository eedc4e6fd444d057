mod alias;
mod health;

pub use alias::{create_alias_handler, resolve_alias_handler};
pub use health::health_handler;

use crate::error::AppError;

pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed
}
