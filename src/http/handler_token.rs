//! Handles POST /connect/token - Issues client credentials access tokens

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::errors::OAuthError;
use crate::oauth::{OAuthErrorResponse, TokenForm, TokenIssuer, TokenRequest, extract_client_auth};

/// Token endpoint
/// POST /connect/token
pub async fn handle_token(
    State(issuer): State<Arc<TokenIssuer>>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    // Extract client authentication from Authorization header or form
    let client_auth = extract_client_auth(&headers, &form);

    let result = TokenRequest::try_from(form).and_then(|request| issuer.token(request, client_auth));

    let mut response = match result {
        Ok(token) => Json(token).into_response(),
        Err(e) => oauth_error_response(&e),
    };

    let response_headers = response.headers_mut();
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn oauth_error_response(error: &OAuthError) -> Response {
    match error {
        OAuthError::ServerError(_) => tracing::error!(error = ?error, "token request failed"),
        _ => tracing::debug!(error = ?error, "token request rejected"),
    }

    let mut response = (error.status_code(), Json(OAuthErrorResponse::from(error))).into_response();
    if matches!(error, OAuthError::InvalidClient(_)) {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"token\""),
        );
    }
    response
}
