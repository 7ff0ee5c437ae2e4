//! Shared fixtures for HTTP integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use idp::{
    accounts::{Argon2PasswordHasher, PasswordPolicy, RegistrationFlow, UserManager},
    config::{Config, PasswordHashingParams},
    http::{AppState, build_router},
    oauth::{Catalog, CatalogInteractionService, JwtSigner, SecretHash, TokenIssuer},
    storage::MemoryUserStore,
    templates::build_engine,
};
use serde_json::json;
use std::sync::Arc;

pub const ISSUER: &str = "https://idp.example";

pub const WEB_RETURN_URL: &str = "/connect/authorize/callback?client_id=web&redirect_uri=https%3A%2F%2Fweb.example%2Fcallback&scope=openid&state=af0ifjsldkj";

pub const NATIVE_RETURN_URL: &str = "/connect/authorize/callback?client_id=mobile&redirect_uri=com.example.app%3A%2Fcallback&scope=openid";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub interaction: Arc<CatalogInteractionService>,
}

pub fn test_config() -> Config {
    Config {
        version: "test".to_string(),
        http_port: "3000".to_string().try_into().unwrap(),
        http_static_path: format!("{}/static", env!("CARGO_MANIFEST_DIR")),
        http_templates_path: format!("{}/templates", env!("CARGO_MANIFEST_DIR")),
        external_base: ISSUER.to_string(),
        catalog_path: None,
        token_signing_secret: "0123456789abcdef0123456789abcdef"
            .to_string()
            .try_into()
            .unwrap(),
        token_signing_key_pem: None,
        token_verifying_key_pem: None,
        access_token_lifetime: "1h".to_string().try_into().unwrap(),
        password_min_length: "8".to_string().try_into().unwrap(),
        password_hashing_params: PasswordHashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        storage_backend: "memory".to_string(),
        database_url: None,
    }
}

/// The built-in machine client plus a reporting client and two interactive clients
pub fn test_catalog() -> Catalog {
    let document = json!({
        "identity_resources": [{ "name": "openid" }],
        "api_scopes": [
            { "name": "recipebookapi", "display_name": "RecipeBookApi" },
            { "name": "reports.read", "display_name": "Read reports" },
            { "name": "reports.write", "display_name": "Write reports" }
        ],
        "clients": [
            {
                "client_id": "recipebook",
                "secret_hash": SecretHash::of("secret"),
                "allowed_grant_types": ["client_credentials"],
                "allowed_scopes": ["recipebookapi"]
            },
            {
                "client_id": "reporting",
                "client_name": "Reporting service",
                "secret_hash": SecretHash::of("reporting-secret"),
                "allowed_grant_types": ["client_credentials"],
                "allowed_scopes": ["reports.read", "reports.write"]
            },
            {
                "client_id": "web",
                "secret_hash": SecretHash::of("web-secret"),
                "allowed_grant_types": ["authorization_code"],
                "allowed_scopes": ["openid"],
                "redirect_uris": ["https://web.example/callback"]
            },
            {
                "client_id": "mobile",
                "secret_hash": SecretHash::of("mobile-secret"),
                "allowed_grant_types": ["authorization_code"],
                "allowed_scopes": ["openid"],
                "redirect_uris": ["com.example.app:/callback"]
            }
        ]
    });
    Catalog::from_json(&document.to_string()).unwrap()
}

pub fn create_test_app() -> TestApp {
    let config = test_config();
    let catalog = Arc::new(test_catalog());

    let token_issuer = Arc::new(TokenIssuer::new(
        catalog.clone(),
        Arc::new(JwtSigner::hs256(config.token_signing_secret.as_ref())),
        config.external_base.clone(),
        *config.access_token_lifetime.as_ref(),
    ));

    let interaction = Arc::new(CatalogInteractionService::new(catalog.clone()));
    let users = UserManager::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(Argon2PasswordHasher::new(&config.password_hashing_params).unwrap()),
    );
    let registration = Arc::new(RegistrationFlow::new(
        users,
        interaction.clone(),
        PasswordPolicy::new(*config.password_min_length.as_ref()),
    ));

    let state = AppState {
        template_env: build_engine(&config),
        config: Arc::new(config),
        catalog,
        token_issuer,
        registration,
    };

    let server = TestServer::new(build_router(state.clone())).unwrap();
    TestApp {
        server,
        state,
        interaction,
    }
}
