//! Handles GET / - Renders the provider landing page

use axum::{extract::State, response::IntoResponse};
use axum_template::RenderHtml;
use minijinja::context;

use super::context::AppState;

/// Handle requests to the index page
pub async fn handle_index(State(state): State<AppState>) -> impl IntoResponse {
    RenderHtml(
        "index.html",
        state.template_env.clone(),
        context! {
            title => "Identity Provider",
            version => state.config.version.clone(),
            scopes => state.catalog.list_scopes(),
            create_account_path => "/account/create",
        },
    )
}
