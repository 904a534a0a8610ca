use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a validated session. Two kinds live here:
/// the entry flows (registration, password recovery), and the session/gate
/// endpoints, which use optional authentication — an anonymous caller must get
/// the signed-out snapshot and gate decision back, never a 401, because the
/// gate has redirect rules for exactly that case.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Resident self-registration: provider identity plus the mirrored,
        // unverified local account record.
        .route("/register", post(handlers::register_account))
        // POST /password-reset
        // Proxies the auth provider's recovery email.
        .route("/password-reset", post(handlers::request_password_reset))
        // GET /session
        // The caller's session snapshot (anonymous callers get the signed-out one).
        .route("/session", get(handlers::get_session))
        // GET /session/gate?route=...
        // The access-gate decision for the given client route.
        .route("/session/gate", get(handlers::gate_decision))
}
