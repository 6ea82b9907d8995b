use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// Routers grouped by the capability tier they require.
pub mod routes;
use auth::{AccessPolicy, AuthUser, CapabilityTier};
use routes::{public, read, write};

// --- Public Re-exports ---

pub use auth::{JwtVerifier, RemoteVerifier, VerifierState};
pub use config::AppConfig;
pub use error::AppError;
pub use service::{AuthorService, PostgresAuthorService, ServiceState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and the
/// `ToSchema` models. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::banner, handlers::get_all_authors, handlers::get_detail_author,
        handlers::create_author, handlers::update_author, handlers::delete_author
    ),
    components(
        schemas(
            models::AuthorRequest, models::AuthorResponse, models::AuthorPage,
            models::PageMeta, error::ErrorBody, error::Classification
        )
    ),
    tags(
        (name = "library-author", description = "Library Author API")
    )
)]
struct ApiDoc;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// AppState
///
/// The single, cloneable container shared by every request. Nothing in it is
/// mutable; the only shared resource behind it is the database pool inside the
/// service.
#[derive(Clone)]
pub struct AppState {
    /// Use case layer (transaction per call).
    pub authors: ServiceState,
    /// Credential verifier (local JWT or remote identity service).
    pub verifier: VerifierState,
    /// Capability tier → admitted roles.
    pub policy: AccessPolicy,
    pub config: AppConfig,
}

impl AppState {
    /// from_config
    ///
    /// Wires the verifier and policy the configuration selects around `authors`.
    pub fn from_config(authors: ServiceState, config: AppConfig) -> Self {
        Self {
            authors,
            verifier: auth::verifier_from_config(&config),
            policy: AccessPolicy::from_kind(config.auth_policy),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for VerifierState {
    fn from_ref(app_state: &AppState) -> VerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AccessPolicy {
    fn from_ref(app_state: &AppState) -> AccessPolicy {
        app_state.policy.clone()
    }
}

// --- Authorization Middleware ---

/// read_tier_middleware / write_tier_middleware
///
/// Resolve `AuthUser` (401 on a missing, malformed or rejected credential), check
/// the role against the tier (403), then hand the identity to the rest of the
/// pipeline through the request extensions. Rejections happen before any handler
/// or database work.
async fn read_tier_middleware(
    user: AuthUser,
    State(policy): State<AccessPolicy>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(CapabilityTier::Read, user, &policy, request, next).await
}

async fn write_tier_middleware(
    user: AuthUser,
    State(policy): State<AccessPolicy>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(CapabilityTier::Write, user, &policy, request, next).await
}

async fn authorize(
    tier: CapabilityTier,
    user: AuthUser,
    policy: &AccessPolicy,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    policy.authorize(tier, &user)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// --- CORS ---

/// cors_middleware
///
/// Fixed, permissive policy on every response. `OPTIONS` never reaches routing or
/// authorization and is answered with 204.
async fn cors_middleware(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS, POST, PUT, DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(
            "Authorization, Content-Type, accept, access-control-allow-origin, access-control-allow-headers",
        ),
    );
}

/// create_router
///
/// Assembles the routing table, the tier checks, CORS and the observability layers,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Author API: read and write routes share paths, each keeps its own check.
    let api = read::read_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            read_tier_middleware,
        ))
        .merge(write::write_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            write_tier_middleware,
        )));

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(public::public_routes())
        .nest("/api/v1", api)
        .with_state(state);

    // 3. CORS sits inside the observability stack so preflights are traced too.
    base_router.layer(middleware::from_fn(cors_middleware)).layer(
        ServiceBuilder::new()
            // 3a. Request ID Generation: a UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 3b. Request Tracing: one span per request, tagged with the request ID.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 3c. Request ID Propagation: echo x-request-id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` set above, so
/// every log line of one request can be correlated.
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
