use library_author_api::{
    AppState, PostgresAuthorService, ServiceState,
    config::{AppConfig, AuthMode, Env},
    create_router, repository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, database pool, use case layer and the HTTP
/// server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup: RUST_LOG wins, otherwise development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "library_author_api=debug,tower_http=info,axum=trace".into());

    // 3. Log format follows the environment: pretty locally, JSON for aggregators.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    match &config.auth_mode {
        AuthMode::Local => tracing::info!("Verifying bearer tokens locally (HS256)"),
        AuthMode::Remote { identity_url } => {
            tracing::info!("Delegating bearer tokens to identity service at {}", identity_url)
        }
    }
    tracing::info!("Access policy: {:?}", config.auth_policy);

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // LOCAL-ONLY: create the authors table if this is a fresh development database.
    if config.env == Env::Local {
        repository::ensure_schema(&pool)
            .await
            .expect("FATAL: Failed to bootstrap the authors table.");
    }

    // 5. Use case layer, shared behind an Arc.
    let authors = Arc::new(PostgresAuthorService::new(pool)) as ServiceState;

    // 6. Unified State Assembly
    let port = config.server_port;
    let app_state = AppState::from_config(authors, config);

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("REST API server running on {}", addr);
    tracing::info!("OpenAPI document available at: http://localhost:{}/api-docs/openapi.json", port);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
