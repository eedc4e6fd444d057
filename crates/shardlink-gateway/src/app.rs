use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_alias_handler, health_handler, method_not_allowed_handler, not_found_handler,
    resolve_alias_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .nest(
                "/api",
                Router::new()
                    .route("/health", get(health_handler))
                    .route("/create", post(create_alias_handler))
                    .route("/{alias}", get(resolve_alias_handler))
                    .method_not_allowed_fallback(method_not_allowed_handler),
            )
            .fallback(not_found_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
