//! Application state shared by every request handler.

use axum::extract::FromRef;
use axum_template::engine::Engine;
use std::sync::Arc;

use crate::accounts::RegistrationFlow;
use crate::config::Config;
use crate::oauth::{Catalog, TokenIssuer};

#[cfg(feature = "reload")]
use minijinja_autoreload::AutoReloader;

#[cfg(feature = "reload")]
/// Template engine with auto-reloading support for development.
pub type AppEngine = Engine<AutoReloader>;

#[cfg(feature = "embed")]
use minijinja::Environment;

#[cfg(feature = "embed")]
pub type AppEngine = Engine<Environment<'static>>;

#[cfg(not(any(feature = "reload", feature = "embed")))]
pub type AppEngine = Engine<minijinja::Environment<'static>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Template engine for rendering HTML responses.
    pub template_env: AppEngine,
    /// Registered clients, API scopes, and identity resources
    pub catalog: Arc<Catalog>,
    /// Client credentials token issuer
    pub token_issuer: Arc<TokenIssuer>,
    /// Self-service account registration
    pub registration: Arc<RegistrationFlow>,
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_issuer.clone()
    }
}
