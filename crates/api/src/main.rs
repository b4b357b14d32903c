use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_api::cache::{self, ViewCache};
use portfolio_api::config::{LogFormat, ServerConfig, StoreBackend};
use portfolio_api::router::build_app_router;
use portfolio_api::services::{self, audit::AuditRecorder};
use portfolio_api::state::AppState;
use portfolio_db::{InMemoryStore, PgStore, PoolSettings, SharedStore};
use portfolio_events::{EventBus, EventLog};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = %config.store_backend,
        "Loaded server configuration"
    );

    // --- Store ---
    let store: SharedStore = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");
            let settings = PoolSettings {
                max_connections: config.db_max_connections,
                acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
            };
            let pool = portfolio_db::create_pool(database_url, settings)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            portfolio_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            portfolio_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
    };

    if let Some(email) = &config.bootstrap_admin_email {
        services::users::bootstrap_admin(store.as_ref(), email)
            .await
            .expect("Failed to bootstrap administrator");
    }

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let event_log_handle = tokio::spawn(EventLog::run(event_bus.subscribe()));

    // --- Audit writer ---
    let (audit, audit_handle) = AuditRecorder::spawn(Arc::clone(&store));

    // --- View cache ---
    let ttl = Duration::from_secs(config.view_cache_ttl_secs);
    let view_cache = Arc::new(ViewCache::new(ttl));
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(cache::run_sweeper(
        Arc::clone(&view_cache),
        ttl.max(Duration::from_secs(1)),
        sweeper_cancel.clone(),
    ));

    tracing::info!("Background services started (event log, audit writer, cache sweeper)");

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        audit: audit.clone(),
        view_cache,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;

    // Write whatever audit entries are still queued, then close the queue.
    if tokio::time::timeout(drain, audit.flush()).await.is_err() {
        tracing::warn!("Timed out flushing audit entries");
    }
    drop(audit);
    let _ = tokio::time::timeout(drain, audit_handle).await;
    tracing::info!("Audit writer stopped");

    // Dropping the last bus handle closes the channel and stops the event log.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), event_log_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
