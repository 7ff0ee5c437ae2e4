//! Main router configuration assembling the provider endpoints.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{
    context::AppState,
    handler_account_create::{handle_account_create, handle_account_create_submit},
    handler_index::handle_index,
    handler_token::handle_token,
    handler_well_known::openid_configuration_handler,
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let connect_routes = Router::new().route("/token", post(handle_token));

    let account_routes = Router::new().route(
        "/create",
        get(handle_account_create).post(handle_account_create_submit),
    );

    // Create well-known discovery routes
    let well_known_routes =
        Router::new().route("/openid-configuration", get(openid_configuration_handler));

    // Build the main router
    Router::new()
        .route("/", get(handle_index))
        .nest("/connect", connect_routes)
        .nest("/account", account_routes)
        .nest("/.well-known", well_known_routes)
        .nest_service("/static", ServeDir::new(&ctx.config.http_static_path))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
