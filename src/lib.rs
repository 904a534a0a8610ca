use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
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
pub mod gate;
pub mod handlers;
pub mod models;
pub mod provisioning;
pub mod repository;
pub mod session;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::{SessionRegistry, SessionState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application
/// by aggregating all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::gate_decision, handlers::get_me,
        handlers::complete_profile, handlers::list_members, handlers::create_member,
        handlers::update_member, handlers::delete_member, handlers::list_my_dues,
        handlers::list_announcements, handlers::list_classifieds, handlers::create_classified,
        handlers::update_classified, handlers::delete_classified, handlers::create_guest_entry,
        handlers::list_guest_entries, handlers::list_checkpoints, handlers::create_patrol_log,
        handlers::list_patrol_logs_today, handlers::create_patrol_report,
        handlers::list_patrol_reports, handlers::create_handover, handlers::list_handovers,
        handlers::get_presigned_url, handlers::register_account,
        handlers::request_password_reset, handlers::get_admin_stats, handlers::list_accounts,
        handlers::review_account, handlers::create_account_admin,
        handlers::delete_account_admin, handlers::list_dues_admin, handlers::issue_dues,
        handlers::mark_dues_paid, handlers::finance_report, handlers::list_checkpoints_admin,
        handlers::create_checkpoint, handlers::set_checkpoint_active,
        handlers::create_announcement, handlers::delete_announcement
    ),
    components(
        schemas(
            models::Role, models::Account, models::HouseholdMember, models::DuesStatus,
            models::DuesEntry, models::FinanceSummary, models::PatrolCheckpoint,
            models::PatrolLogEntry, models::PatrolReport, models::GuestEntry,
            models::HandoverReport, models::Announcement, models::Classified,
            models::RegisterRequest, models::PasswordResetRequest, models::CreateAccountRequest,
            models::AccountReviewRequest, models::CompleteProfileRequest,
            models::CreateMemberRequest, models::UpdateMemberRequest, models::IssueDuesRequest,
            models::CreateCheckpointRequest, models::CreatePatrolLogRequest,
            models::CreatePatrolReportRequest, models::CreateGuestEntryRequest,
            models::CreateHandoverRequest, models::CreateAnnouncementRequest,
            models::CreateClassifiedRequest, models::UpdateClassifiedRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse, models::DashboardStats,
            session::Principal, session::Profile, session::ResolutionPhase,
            session::SessionSnapshot, session::SessionView,
            gate::GateDecision, gate::PlaceholderKind,
        )
    ),
    tags(
        (name = "community-portal", description = "Residential community management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, thread-safe container
/// holding all essential application services and configuration, shared across
/// all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Storage Layer: Abstracts S3/MinIO access and presigned URL generation.
    pub storage: StorageState,
    /// Session Layer: live per-principal session stores with push-based
    /// invalidation, feeding the access gate.
    pub sessions: SessionState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, a failed authentication (JWT
/// validation, DB lookup) rejects the request with 401 Unauthorized before the
/// handler runs; on success the request proceeds unchanged.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied. The session/gate endpoints live
        // here because they answer anonymous callers with the signed-out state.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: Nested under '/admin'. The 'admin' role check is performed
        // *inside* the handlers after the AuthUser extractor authenticates.
        .nest("/admin", admin::admin_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span carrying the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client and into
                // subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: includes the
/// `x-request-id` header (if present) alongside the HTTP method and URI so every
/// log line of a single request is correlated by a unique id.
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
