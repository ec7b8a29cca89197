use campus_portal::{
    AppState, AppwriteIdentityClient, AppwriteRowStore, AppwriteStorageClient, FieldUpdateBus,
    IdentityState, RepositoryState, StorageState,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: initializes configuration, logging, the BaaS
/// collaborator clients, the field-update bus, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes RUST_LOG, with sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for centralized log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Collaborator HTTP Client
    // One reqwest client shared across all three collaborators, carrying the
    // bounded per-call timeout. Identity, row-store, and storage calls all go
    // through it, so no collaborator call can hang a request indefinitely.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.collaborator_timeout_secs))
        .build()
        .expect("FATAL: failed to build the collaborator HTTP client");

    let repo = Arc::new(AppwriteRowStore::new(http.clone(), &config)) as RepositoryState;
    let identity = Arc::new(AppwriteIdentityClient::new(http.clone(), &config)) as IdentityState;
    let storage = Arc::new(AppwriteStorageClient::new(http, &config)) as StorageState;

    // 5. Unified State Assembly
    let app_state = AppState {
        repo,
        identity,
        storage,
        updates: FieldUpdateBus::default(),
        config,
    };

    // 6. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: failed to bind 0.0.0.0:3000");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
