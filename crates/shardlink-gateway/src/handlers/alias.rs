use crate::error::{AppError, Result};
use crate::model::{CreateAliasRequest, CreateAliasResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

/// Returns the alias for the posted URL, creating one if needed.
pub async fn create_alias_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateAliasRequest>, JsonRejection>,
) -> Result<Json<CreateAliasResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let outcome = state.shortener().shorten(&request.original_url).await?;
    if outcome.created {
        info!(alias = %outcome.record.alias, "alias created");
    }

    Ok(Json(CreateAliasResponse {
        url_alias: outcome.record.alias.to_string(),
    }))
}

/// Redirects to the URL behind `alias` with `302 Found`.
pub async fn resolve_alias_handler(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Response> {
    match state.shortener().resolve(&alias).await? {
        Some(url) => Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response()),
        None => Err(AppError::NotFound),
    }
}
