//! Axum HTTP server handlers for the token endpoint, discovery, and account registration.

pub mod context;
mod handler_account_create;
mod handler_index;
mod handler_token;
mod handler_well_known;
pub mod server;

pub use context::{AppEngine, AppState};
pub use server::build_router;
