//! Pending authorization contexts carried through interactive pages.
//!
//! An interactive page (such as account creation) receives a return URL that
//! leads back to the authorize callback. The interaction service recognises
//! that URL, resolves the client it belongs to, and records the user's
//! decision when the interaction is cancelled.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::errors::RegistrationError;
use crate::oauth::catalog::Catalog;
use crate::oauth::types::GrantType;

/// Path the authorize endpoint resumes at after an interactive page
pub const AUTHORIZE_CALLBACK_PATH: &str = "/connect/authorize/callback";

/// Base used to resolve relative return URLs; only its path and query are read.
const RELATIVE_BASE: &str = "http://localhost";

/// In-flight authorization request resolved from a return URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl AuthorizationContext {
    /// Native clients redirect to a custom scheme rather than an http(s) URL
    pub fn is_native_client(&self) -> bool {
        match Url::parse(&self.redirect_uri) {
            Ok(uri) => !matches!(uri.scheme(), "http" | "https"),
            Err(_) => true,
        }
    }
}

/// Outcome recorded against a pending authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    AccessDenied,
}

impl AuthorizationError {
    /// OAuth 2.0 / OpenID Connect error code
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationError::AccessDenied => "access_denied",
        }
    }
}

/// True for application-relative URLs: `/path` or `~/path`, but never
/// protocol-relative forms such as `//host` or `/\host`.
pub fn is_local_url(url: &str) -> bool {
    if url.is_empty() || url.chars().any(|c| c.is_control()) {
        return false;
    }

    let bytes = url.as_bytes();
    match bytes {
        [b'/'] => true,
        [b'/', second, ..] => *second != b'/' && *second != b'\\',
        [b'~', b'/'] => true,
        [b'~', b'/', third, ..] => *third != b'/' && *third != b'\\',
        _ => false,
    }
}

#[async_trait]
pub trait InteractionService: Send + Sync {
    /// Resolve the pending authorization request a return URL leads back to.
    ///
    /// Returns `None` for absent URLs, URLs that do not target the authorize
    /// callback, and requests that do not match a registered client.
    async fn authorization_context(&self, return_url: Option<&str>) -> Option<AuthorizationContext>;

    /// Record a denial for the pending request so the callback answers with an error
    async fn deny_authorization(
        &self,
        context: &AuthorizationContext,
        error: AuthorizationError,
    ) -> Result<(), RegistrationError>;
}

/// Interaction service backed by the client catalog
pub struct CatalogInteractionService {
    catalog: Arc<Catalog>,
    denials: RwLock<HashMap<(String, Option<String>), AuthorizationError>>,
}

impl CatalogInteractionService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            denials: RwLock::new(HashMap::new()),
        }
    }

    /// The denial recorded for a pending request, if any
    pub async fn denial_for(&self, context: &AuthorizationContext) -> Option<AuthorizationError> {
        let denials = self.denials.read().await;
        denials
            .get(&(context.client_id.clone(), context.state.clone()))
            .copied()
    }
}

#[async_trait]
impl InteractionService for CatalogInteractionService {
    async fn authorization_context(&self, return_url: Option<&str>) -> Option<AuthorizationContext> {
        let return_url = return_url.filter(|value| is_local_url(value))?;

        let base = Url::parse(RELATIVE_BASE).ok()?;
        let parsed = base.join(return_url).ok()?;
        if parsed.host() != base.host() || parsed.path() != AUTHORIZE_CALLBACK_PATH {
            return None;
        }

        let mut client_id = None;
        let mut redirect_uri = None;
        let mut scope = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "client_id" => client_id = Some(value.into_owned()),
                "redirect_uri" => redirect_uri = Some(value.into_owned()),
                "scope" => scope = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        let client_id = client_id?;
        let redirect_uri = redirect_uri?;

        let client = self.catalog.find_client(&client_id).ok()?;
        if !client.allows_grant(GrantType::AuthorizationCode)
            || !client.redirect_uris.iter().any(|uri| uri == &redirect_uri)
        {
            tracing::debug!(%client_id, %redirect_uri, "return URL does not match a registered client");
            return None;
        }

        Some(AuthorizationContext {
            client_id,
            redirect_uri,
            scope,
            state,
        })
    }

    async fn deny_authorization(
        &self,
        context: &AuthorizationContext,
        error: AuthorizationError,
    ) -> Result<(), RegistrationError> {
        self.catalog
            .find_client(&context.client_id)
            .map_err(|e| RegistrationError::InteractionFailed(e.to_string()))?;

        let mut denials = self.denials.write().await;
        denials.insert((context.client_id.clone(), context.state.clone()), error);

        tracing::info!(
            client_id = %context.client_id,
            error = error.as_str(),
            "authorization request denied"
        );
        Ok(())
    }
}
