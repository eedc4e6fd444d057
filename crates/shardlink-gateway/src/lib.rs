//! HTTP front end: create aliases and redirect through them.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
