//! Client credentials token issuer (RFC 6749 Section 4.4).

use base64::prelude::*;
use chrono::{Duration, Utc};
use http::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;
use ulid::Ulid;

use crate::errors::{OAuthError, TokenError};
use crate::oauth::catalog::{Catalog, SecretHash};
use crate::oauth::signing::{AccessTokenClaims, TokenSigner};
use crate::oauth::types::*;

/// Compared against when the client id is unknown, so both failure paths do the same work
static UNKNOWN_CLIENT_SECRET: SecretHash = SecretHash::unmatchable();

/// A freshly minted, signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: AccessTokenClaims,
}

impl IssuedToken {
    pub fn scopes(&self) -> HashSet<String> {
        self.claims.scopes()
    }

    pub fn expires_in(&self) -> u64 {
        (self.claims.exp - self.claims.iat).max(0) as u64
    }
}

/// Client Authentication extracted from request
#[derive(Clone)]
pub struct ClientAuthentication {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Stateless access token issuer
pub struct TokenIssuer {
    catalog: Arc<Catalog>,
    signer: Arc<dyn TokenSigner>,
    /// Server issuer URL (external base)
    issuer: String,
    token_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(
        catalog: Arc<Catalog>,
        signer: Arc<dyn TokenSigner>,
        issuer: String,
        token_lifetime: Duration,
    ) -> Self {
        Self {
            catalog,
            signer,
            issuer,
            token_lifetime,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn signing_algorithm(&self) -> &'static str {
        self.signer.algorithm()
    }

    /// Handle token endpoint requests
    pub fn token(
        &self,
        request: TokenRequest,
        client_auth: Option<ClientAuthentication>,
    ) -> Result<TokenResponse, OAuthError> {
        match request.grant_type {
            GrantType::ClientCredentials => {
                self.handle_client_credentials_grant(request, client_auth)
            }
            GrantType::AuthorizationCode => Err(OAuthError::UnsupportedGrantType(
                GrantType::AuthorizationCode.as_str().to_string(),
            )),
        }
    }

    /// Handle client credentials grant
    fn handle_client_credentials_grant(
        &self,
        request: TokenRequest,
        client_auth: Option<ClientAuthentication>,
    ) -> Result<TokenResponse, OAuthError> {
        let (client_id, client_secret) = match client_auth {
            Some(ClientAuthentication {
                client_id,
                client_secret: Some(client_secret),
            }) => (client_id, client_secret),
            _ => {
                return Err(OAuthError::InvalidClient(
                    "Missing client credentials".to_string(),
                ));
            }
        };

        let requested_scopes = request
            .scope
            .as_deref()
            .map(parse_scope)
            .unwrap_or_default();

        let issued = self.issue(&client_id, &client_secret, &requested_scopes)?;
        let scopes = issued.scopes();

        Ok(TokenResponse {
            expires_in: issued.expires_in(),
            access_token: issued.token,
            token_type: TokenType::Bearer,
            scope: (!scopes.is_empty()).then(|| join_scopes(&scopes)),
        })
    }

    /// Authenticate a client and mint an access token for the granted scopes.
    ///
    /// An empty `requested_scopes` grants every scope the client is allowed.
    /// Otherwise the grant is the intersection of the request with the
    /// client's allowed scopes, and an empty intersection is `InvalidScope`.
    pub fn issue(
        &self,
        client_id: &str,
        client_secret: &str,
        requested_scopes: &HashSet<String>,
    ) -> Result<IssuedToken, OAuthError> {
        let client = self.catalog.find_client(client_id).ok();
        let expected = client
            .map(|client| &client.secret_hash)
            .unwrap_or(&UNKNOWN_CLIENT_SECRET);
        let secret_matches = expected.matches(client_secret);

        let client = match client {
            Some(client) if secret_matches => client,
            _ => {
                tracing::debug!(client_id, "client authentication failed");
                return Err(OAuthError::InvalidClient(
                    "Invalid client credentials".to_string(),
                ));
            }
        };

        if !client.allows_grant(GrantType::ClientCredentials) {
            return Err(OAuthError::UnauthorizedClient(
                "Client not authorized for client credentials grant".to_string(),
            ));
        }

        let granted_scopes: HashSet<String> = if requested_scopes.is_empty() {
            client.allowed_scopes.clone()
        } else {
            requested_scopes
                .intersection(&client.allowed_scopes)
                .cloned()
                .collect()
        };

        if !requested_scopes.is_empty() && granted_scopes.is_empty() {
            return Err(OAuthError::InvalidScope(
                "Requested scope exceeds allowed scope".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.token_lifetime).ok_or_else(|| {
            OAuthError::ServerError("Token lifetime exceeds the supported time range".to_string())
        })?;
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: client.client_id.clone(),
            client_id: client.client_id.clone(),
            scope: join_scopes(&granted_scopes),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Ulid::new().to_string(),
        };

        let token = self
            .signer
            .sign(&claims)
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        tracing::info!(
            client_id = %claims.client_id,
            scope = %claims.scope,
            jti = %claims.jti,
            "issued access token"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token previously minted by this issuer
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        self.signer.verify(token, &self.issuer)
    }
}

/// Extract client authentication from headers and form
pub fn extract_client_auth(headers: &HeaderMap, form: &TokenForm) -> Option<ClientAuthentication> {
    // Try Authorization header (HTTP Basic)
    if let Some(auth_header) = headers.get(http::header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(encoded) = auth_str.strip_prefix("Basic ") {
                if let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) {
                    if let Ok(credentials) = String::from_utf8(decoded) {
                        if let Some((client_id, client_secret)) = credentials.split_once(':') {
                            return Some(ClientAuthentication {
                                client_id: client_id.to_string(),
                                client_secret: Some(client_secret.to_string()),
                            });
                        }
                    }
                }
            }
        }
    }

    // Fall back to form parameters
    form.client_id
        .as_ref()
        .map(|client_id| ClientAuthentication {
            client_id: client_id.clone(),
            client_secret: form.client_secret.clone(),
        })
}
