//! Standardized error types following the `error-idp-<domain>-<number>` format.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-idp-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-idp-config-2 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-idp-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-idp-config-4 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when a numeric setting cannot be parsed
    #[error("error-idp-config-5 Failed to parse number '{0}': {1}")]
    NumberParsingFailed(String, std::num::ParseIntError),

    /// Error when the client and scope catalog cannot be read or decoded
    #[error("error-idp-config-6 Failed to load catalog: {0}")]
    CatalogLoadFailed(String),

    /// Error when a client allows a scope that the scope registry does not define
    #[error("error-idp-config-7 Client '{client_id}' allows undefined scope '{scope}'")]
    UndefinedClientScope { client_id: String, scope: String },

    /// Error when two clients share an identifier
    #[error("error-idp-config-8 Duplicate client identifier: {0}")]
    DuplicateClient(String),

    /// Error when token signing key material is unusable
    #[error("error-idp-config-9 Invalid token signing key: {0}")]
    SigningKeyInvalid(String),

    /// Error when password hashing parameters are rejected
    #[error("error-idp-config-10 Invalid password hashing parameters: {0}")]
    PasswordHashingParamsInvalid(String),
}

/// OAuth token endpoint errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Unknown client or wrong secret; the two cases are never distinguished
    #[error("error-idp-oauth-1 Invalid client credentials: {0}")]
    InvalidClient(String),

    /// Client is not allowed to use the requested grant
    #[error("error-idp-oauth-2 Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Invalid scope
    #[error("error-idp-oauth-3 Invalid scope: {0}")]
    InvalidScope(String),

    /// Invalid request
    #[error("error-idp-oauth-4 Invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported grant type
    #[error("error-idp-oauth-5 Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Server error
    #[error("error-idp-oauth-6 Server error: {0}")]
    ServerError(String),
}

impl OAuthError {
    /// RFC 6749 section 5.2 error code
    pub fn error_code(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient(_) => "invalid_client",
            OAuthError::UnauthorizedClient(_) => "unauthorized_client",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::ServerError(_) => "server_error",
        }
    }

    /// Client-facing `error_description`, without the internal error prefix
    pub fn description(&self) -> &str {
        match self {
            OAuthError::InvalidClient(message)
            | OAuthError::UnauthorizedClient(message)
            | OAuthError::InvalidScope(message)
            | OAuthError::InvalidRequest(message)
            | OAuthError::UnsupportedGrantType(message)
            | OAuthError::ServerError(message) => message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OAuthError::InvalidClient(_) => StatusCode::UNAUTHORIZED,
            OAuthError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Client and scope registry errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Client not found
    #[error("error-idp-catalog-1 Client not found: {0}")]
    ClientNotFound(String),
}

/// Access token signing and verification errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Error when a token cannot be signed
    #[error("error-idp-token-1 Token signing failed: {0}")]
    SigningFailed(String),

    /// Error when a token signature, issuer, or shape is rejected
    #[error("error-idp-token-2 Invalid token: {0}")]
    InvalidToken(String),

    /// Error when a token is past its expiry
    #[error("error-idp-token-3 Token expired")]
    Expired,
}

/// User store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-idp-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when query execution fails
    #[error("error-idp-storage-2 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when the username is already taken
    #[error("error-idp-storage-3 Username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Error when requested resource is not found
    #[error("error-idp-storage-4 Not found: {0}")]
    NotFound(String),

    /// Error when the backing store cannot serve requests
    #[error("error-idp-storage-5 Store unavailable: {0}")]
    Unavailable(String),

    /// Error when a password cannot be hashed
    #[error("error-idp-storage-6 Password hashing failed: {0}")]
    HashingFailed(String),

    /// Error when a stored row cannot be decoded
    #[error("error-idp-storage-7 Invalid data: {0}")]
    InvalidData(String),
}

/// Account registration errors that abort the flow instead of re-rendering the form
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Return URL is neither empty nor local
    #[error("error-idp-registration-1 Invalid return URL: {0}")]
    InvalidReturnUrl(String),

    /// Cancel was submitted for a pending authorization without a return URL
    #[error("error-idp-registration-2 Return URL is required to cancel a pending authorization")]
    MissingReturnUrl,

    /// User store failure that is not a validation problem
    #[error("error-idp-registration-3 User store unavailable: {0}")]
    StoreUnavailable(String),

    /// Pending authorization could not be resolved or denied
    #[error("error-idp-registration-4 Authorization interaction failed: {0}")]
    InteractionFailed(String),
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        let status = match self {
            RegistrationError::InvalidReturnUrl(_) | RegistrationError::MissingReturnUrl => {
                StatusCode::BAD_REQUEST
            }
            RegistrationError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RegistrationError::InteractionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = ?self, "account registration failed");
        (status, self.to_string()).into_response()
    }
}
