use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mercuria_api::auth::provider::verifiers_from_config;
use mercuria_api::auth::session::SessionManager;
use mercuria_api::config::{LogFormat, ServerConfig};
use mercuria_api::router::build_app_router;
use mercuria_api::state::AppState;
use mercuria_cache::RedisTokenStore;
use mercuria_db::directory::PgUserDirectory;
use mercuria_storage::S3ObjectStorage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mercuria_api=debug,mercuria_db=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = mercuria_db::create_pool(
        &config.database.url,
        config.database.max_connections,
        config.call_timeout(),
    )
    .await
    .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    mercuria_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Token store ---
    let redis = mercuria_cache::connect(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let store = Arc::new(RedisTokenStore::new(redis, &config.redis.key_prefix));
    tracing::info!(prefix = %config.redis.key_prefix, "Token store connected");

    // --- Sessions ---
    let http = reqwest::Client::builder()
        .timeout(config.call_timeout())
        .build()
        .expect("Failed to build HTTP client");
    let mut sessions = SessionManager::new(
        store,
        Arc::new(PgUserDirectory::new(pool.clone())),
        config.jwt.clone(),
        config.call_timeout(),
    );
    for (provider, verifier) in verifiers_from_config(&config.providers, http) {
        tracing::info!(%provider, "Identity provider enabled");
        sessions = sessions.with_verifier(provider, verifier);
    }

    // --- Object storage ---
    let storage = S3ObjectStorage::from_config(&config.s3).await;
    tracing::info!(bucket = %config.s3.bucket, "Object storage configured");

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        sessions: Arc::new(sessions),
        storage: Arc::new(storage),
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

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let _ = tokio::time::timeout(Duration::from_secs(5), pool.close()).await;
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
