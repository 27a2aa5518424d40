//! Caption battle server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use captionbattle_api::{AppState, auth_middleware, router as api_router};
use captionbattle_common::Config;
use captionbattle_core::{CatalogService, ProfileIdentityProvider, TallyCache, VoteLedgerService};
use captionbattle_db::repositories::{
    CaptionRepository, CaptionVoteRepository, ImageRepository, ProfileRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "captionbattle=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting caption battle server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(captionbattle_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    captionbattle_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let image_repo = ImageRepository::new(Arc::clone(&db));
    let caption_repo = CaptionRepository::new(Arc::clone(&db));
    let vote_repo = CaptionVoteRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));

    // Ledger writes drop the catalog's cached tallies
    let tallies = TallyCache::new();
    let vote_ledger =
        VoteLedgerService::with_invalidator(vote_repo.clone(), Arc::new(tallies.clone()));
    let catalog = CatalogService::new(image_repo, caption_repo, vote_repo, tallies);
    let identity = Arc::new(ProfileIdentityProvider::new(profile_repo));

    let state = AppState {
        vote_ledger,
        catalog,
        identity,
        battle: config.battle.clone(),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
