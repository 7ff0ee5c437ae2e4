//! OAuth 2.0 token endpoint types and scope helpers.

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::OAuthError;

/// OAuth 2.0 Grant Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

/// OAuth 2.0 Token Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Bearer,
}

/// Form data for token endpoint
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

/// Token Exchange Request
///
/// Client credentials are read separately, see `extract_client_auth`.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    /// Grant type
    pub grant_type: GrantType,
    /// Requested scope
    pub scope: Option<String>,
}

impl TryFrom<TokenForm> for TokenRequest {
    type Error = OAuthError;

    fn try_from(form: TokenForm) -> Result<Self, Self::Error> {
        let grant_type = match form.grant_type.as_deref() {
            Some("client_credentials") => GrantType::ClientCredentials,
            Some("authorization_code") => GrantType::AuthorizationCode,
            Some(other) if !other.is_empty() => {
                return Err(OAuthError::UnsupportedGrantType(other.to_string()));
            }
            _ => {
                return Err(OAuthError::InvalidRequest(
                    "Missing grant_type".to_string(),
                ));
            }
        };

        Ok(Self {
            grant_type,
            scope: form.scope,
        })
    }
}

/// Token Response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,
    /// Token type
    pub token_type: TokenType,
    /// Expires in seconds
    pub expires_in: u64,
    /// Granted scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// OAuth Error Response
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// Error code
    pub error: String,
    /// Error description
    pub error_description: Option<String>,
}

impl From<&OAuthError> for OAuthErrorResponse {
    fn from(error: &OAuthError) -> Self {
        Self {
            error: error.error_code().to_string(),
            error_description: Some(error.description().to_string()),
        }
    }
}

/// Generate a secure random token
pub fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Parse scope string into a set
pub fn parse_scope(scope: &str) -> HashSet<String> {
    scope.split_whitespace().map(|s| s.to_string()).collect()
}

/// Join scopes into a space-separated string
pub fn join_scopes(scopes: &HashSet<String>) -> String {
    let mut scopes: Vec<_> = scopes.iter().collect();
    scopes.sort();
    scopes.into_iter().cloned().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_form_conversion() {
        let form = TokenForm {
            grant_type: Some("client_credentials".to_string()),
            client_id: Some("recipebook".to_string()),
            client_secret: Some("secret".to_string()),
            scope: Some("recipebookapi".to_string()),
        };
        let request = TokenRequest::try_from(form).unwrap();
        assert_eq!(request.grant_type, GrantType::ClientCredentials);
        assert_eq!(request.scope.as_deref(), Some("recipebookapi"));

        let form = TokenForm {
            grant_type: Some("authorization_code".to_string()),
            ..Default::default()
        };
        assert_eq!(
            TokenRequest::try_from(form).unwrap().grant_type,
            GrantType::AuthorizationCode
        );

        let form = TokenForm {
            grant_type: Some("password".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            TokenRequest::try_from(form),
            Err(OAuthError::UnsupportedGrantType(_))
        ));

        assert!(matches!(
            TokenRequest::try_from(TokenForm::default()),
            Err(OAuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_error_response_omits_internal_prefix() {
        let response =
            OAuthErrorResponse::from(&OAuthError::InvalidClient("Invalid client credentials".to_string()));
        assert_eq!(response.error, "invalid_client");
        assert_eq!(
            response.error_description.as_deref(),
            Some("Invalid client credentials")
        );
    }

    #[test]
    fn test_scope_helpers() {
        let scopes = parse_scope("  write read  read ");
        assert_eq!(scopes.len(), 2);
        assert_eq!(join_scopes(&scopes), "read write");
        assert!(parse_scope("").is_empty());
    }

    #[test]
    fn test_generate_token() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
    }
}
