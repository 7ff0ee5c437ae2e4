//! Identity provider server binary.
//!
//! Loads configuration and the client catalog, wires the token issuer and
//! registration flow, and serves HTTP until interrupted.

use anyhow::Result;
use idp::{
    accounts::{Argon2PasswordHasher, PasswordPolicy, RegistrationFlow, UserManager},
    config::Config,
    http::{AppState, build_router},
    oauth::{Catalog, CatalogInteractionService, JwtSigner, TokenIssuer},
    storage::{create_user_store, parse_storage_backend},
    templates::build_engine,
};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "idp=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = idp::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting identity provider");

    let config = Config::new()?;
    let issuer = config.external_base.trim_end_matches('/').to_string();

    // Static client and scope registries
    let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref())?);
    tracing::info!(
        clients = catalog.client_count(),
        scopes = ?catalog.supported_scopes(),
        "catalog loaded"
    );

    let signer = Arc::new(JwtSigner::from_config(&config)?);
    let token_issuer = Arc::new(TokenIssuer::new(
        catalog.clone(),
        signer,
        issuer,
        *config.access_token_lifetime.as_ref(),
    ));

    // Parse storage backend configuration
    let storage_backend =
        parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    tracing::info!(?storage_backend, "creating user store");
    let user_store = create_user_store(storage_backend).await?;

    let hasher = Arc::new(Argon2PasswordHasher::new(&config.password_hashing_params)?);
    let registration = Arc::new(RegistrationFlow::new(
        UserManager::new(user_store, hasher),
        Arc::new(CatalogInteractionService::new(catalog.clone())),
        PasswordPolicy::new(*config.password_min_length.as_ref()),
    ));

    // Create application context
    let app_context = AppState {
        template_env: build_engine(&config),
        config: Arc::new(config.clone()),
        catalog,
        token_issuer,
        registration,
    };

    // Build the router
    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    tracing::error!("failed to install signal handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start HTTP server
    {
        let http_port = *config.http_port.as_ref();
        let bind_address = format!("0.0.0.0:{http_port}");
        tracing::info!("Starting server on {bind_address}");
        let listener = TcpListener::bind(&bind_address).await?;

        let inner_token = token.clone();
        tracker.spawn(async move {
            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        () = shutdown_token.cancelled() => { }
                    }
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
