use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;
pub mod storage;
pub mod translation;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{CurrentUser, has_admin_access};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use config::AppConfig;
pub use events::FieldUpdateBus;
pub use identity::{AppwriteIdentityClient, IdentityState, MockIdentityService};
pub use repository::{AppwriteRowStore, RepositoryState};
pub use storage::{AppwriteStorageClient, MockStorageService, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the service, aggregating every
/// handler decorated with `#[utoipa::path]` and the schemas they reference.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::oauth_callback, handlers::logout, handlers::get_me,
        handlers::get_news, handlers::get_events, handlers::get_jobs,
        handlers::get_feed, handlers::get_membership_campus,
        handlers::record_analytics_beacon, handlers::upload_file,
        handlers::get_file_preview, handlers::get_admin_content,
        handlers::update_content_status, handlers::get_collection_schema
    ),
    components(
        schemas(
            models::Account, models::UserProfile, models::ContentStatus,
            models::BadgeStyle, models::ContentTranslation, models::ContentEntry,
            models::ContentView, models::Campus, models::Feed,
            models::AnalyticsBeacon, models::UpdateStatusRequest,
            models::UploadResponse, models::SchemaAttribute,
            models::CollectionSchema, events::FieldUpdate,
        )
    ),
    tags(
        (name = "campus-portal", description = "Campus Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all in-flight requests.
#[derive(Clone)]
pub struct AppState {
    /// Row-store collaborator: content, campuses, roles, analytics.
    pub repo: RepositoryState,
    /// Identity/session collaborator: session exchange and account lookup.
    pub identity: IdentityState,
    /// File-storage collaborator: the media bucket.
    pub storage: StorageState,
    /// Injectable field-update broadcast channel for live admin sessions.
    pub updates: FieldUpdateBus,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors pull individual services out of the shared
// state instead of depending on the whole of it.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for FieldUpdateBus {
    fn from_ref(app_state: &AppState) -> FieldUpdateBus {
        app_state.updates.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_gate
///
/// Middleware enforcing the session check on the authenticated routes. The
/// `CurrentUser` extractor does the work: if the session cookie is absent or
/// the identity lookup fails, the extractor rejects the request with a login
/// redirect before the handler runs. The resolved user is cached in the
/// request extensions, so handlers naming `CurrentUser` reuse it without a
/// second identity call.
async fn session_gate(_user: CurrentUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_gate
///
/// Middleware enforcing the role check on the admin routes, applied on top of
/// the session gate. The caller's role set is fetched from the row store and
/// intersected with the configured allow-list; an empty intersection (which
/// includes the role-lookup-failure case) redirects to the unauthorized page,
/// distinct from the login redirect, and the handler never runs.
async fn admin_gate(
    user: CurrentUser,
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let roles = state.repo.get_user_roles(&user.id).await;
    if !has_admin_access(&roles, &state.config.admin_roles) {
        tracing::info!("admin gate rejected user {}", user.id);
        return Redirect::to(&state.config.unauthorized_path).into_response();
    }
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies the gates and the global
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no gate applied.
        .merge(public::public_routes())
        // Authenticated routes: behind the session gate.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), session_gate)),
        )
        // Admin routes: nested under /admin, behind both gates. Layers run
        // outside-in, so the session gate resolves the user first and the
        // role gate reuses it from the request extensions.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_gate))
                .route_layer(middleware::from_fn_with_state(state.clone(), session_gate)),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in
                // a span correlated by the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer, outermost.
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the tracing span created per request so every log line for a
/// single request is correlated by its x-request-id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
