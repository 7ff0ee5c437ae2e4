//! Handles GET /.well-known/openid-configuration - OpenID Provider discovery metadata

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use super::context::AppState;
use crate::oauth::GrantType;

/// OpenID Connect Configuration handler
/// GET /.well-known/openid-configuration
///
/// Returns OpenID Provider metadata as specified by OpenID Connect Discovery 1.0.
pub async fn openid_configuration_handler(State(state): State<AppState>) -> Json<Value> {
    let issuer = state.token_issuer.issuer();
    let metadata = json!({
        "issuer": issuer,
        "token_endpoint": format!("{}/connect/token", issuer),
        "grant_types_supported": [GrantType::ClientCredentials.as_str()],
        "scopes_supported": state.catalog.supported_scopes(),
        "token_endpoint_auth_methods_supported": ["client_secret_basic", "client_secret_post"],
        "access_token_signing_alg_values_supported": [state.token_issuer.signing_algorithm()],
        "subject_types_supported": ["public"],
    });

    Json(metadata)
}
