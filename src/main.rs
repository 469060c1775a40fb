//! Checkout Server: time-bounded resource reservations over HTTP.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use checkout_api::{AppState, build_app};
use checkout_cache::StoreManager;
use checkout_core::config::AppConfig;
use checkout_core::error::AppError;
use checkout_core::traits::store::ReservationStore;
use checkout_service::{ExpiryNotifier, ReservationService};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CHECKOUT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting checkout server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store ────────────────────────────────────────────
    tracing::info!(
        "Initializing store (provider: {})...",
        config.store.provider
    );
    let manager = StoreManager::new(&config.store).await?;
    let database = manager.database();
    let store: Arc<dyn ReservationStore> = Arc::new(manager);

    // ── Step 2: Services ─────────────────────────────────────────
    let reservations = Arc::new(ReservationService::new(
        Arc::clone(&store),
        config.reservation.clone(),
    ));

    // ── Step 3: Expiry notifier ──────────────────────────────────
    let notifier = if config.notifier.enabled {
        let notifier = ExpiryNotifier::new(
            Arc::clone(&store),
            database,
            config.reservation.namespace.clone(),
            &config.notifier,
        );
        match notifier.start().await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(
                    "Expiry notifier not started, continuing without notifications: {}",
                    e
                );
                None
            }
        }
    } else {
        tracing::info!("Expiry notifier disabled");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let app = build_app(AppState::new(reservations, Arc::clone(&store)));
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Checkout server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 5: Stop the notifier ────────────────────────────────
    if let Some(handle) = notifier {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        match tokio::time::timeout(grace, handle.shutdown()).await {
            Ok(exit) => tracing::info!("Expiry notifier stopped: {:?}", exit),
            Err(_) => tracing::warn!("Expiry notifier did not stop within {:?}", grace),
        }
    }

    tracing::info!("Checkout server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
