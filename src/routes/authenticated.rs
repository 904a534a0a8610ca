use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes accessible to any account that has passed the authentication layer.
/// Every handler here relies on the `AuthUser` extractor middleware on the
/// router layer above this module; role-scoped behavior (resident household
/// scoping, the guard-only security desk) is enforced inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The caller's fully resolved profile (waits for the household merge).
        .route("/me", get(handlers::get_me))
        // PUT /me/profile
        // Resident profile completion: upserts the head-of-household registry
        // record, syncs the household link onto the account and refreshes the
        // live session.
        .route("/me/profile", put(handlers::complete_profile))
        // --- Resident Registry ---
        // GET /members — scoped listing (residents see only their household).
        // POST /members — admins add heads of household, residents add family.
        .route(
            "/members",
            get(handlers::list_members).post(handlers::create_member),
        )
        // PUT/DELETE /members/{id}
        // Edits and removals, household-scoped for residents; heads of
        // household are protected from deletion.
        .route(
            "/members/{id}",
            put(handlers::update_member).delete(handlers::delete_member),
        )
        // GET /dues/mine
        // The caller's household dues history.
        .route("/dues/mine", get(handlers::list_my_dues))
        // --- Announcements & Classifieds ---
        .route("/announcements", get(handlers::list_announcements))
        .route(
            "/classifieds",
            get(handlers::list_classifieds).post(handlers::create_classified),
        )
        // PUT/DELETE /classifieds/{id}
        // Owner-only edits; admins may moderate any ad.
        .route(
            "/classifieds/{id}",
            put(handlers::update_classified).delete(handlers::delete_classified),
        )
        // --- Security Desk (guard|admin, enforced in handlers) ---
        // POST/GET /guests — the gate's guest book.
        .route(
            "/guests",
            post(handlers::create_guest_entry).get(handlers::list_guest_entries),
        )
        // GET /patrol/checkpoints — active checkpoints in walk order.
        .route("/patrol/checkpoints", get(handlers::list_checkpoints))
        // POST /patrol/logs — mark a checkpoint as passed.
        .route("/patrol/logs", post(handlers::create_patrol_log))
        // GET /patrol/logs/today — today's passes for the guard screen.
        .route("/patrol/logs/today", get(handlers::list_patrol_logs_today))
        // POST/GET /patrol/reports — free-text shift reports. Reading is open
        // to all signed-in roles; filing is security-desk only.
        .route(
            "/patrol/reports",
            post(handlers::create_patrol_report).get(handlers::list_patrol_reports),
        )
        // POST/GET /handovers — end-of-shift handover reports.
        .route(
            "/handovers",
            post(handlers::create_handover).get(handlers::list_handovers),
        )
        // POST /upload/presigned
        // Short-lived direct-to-storage upload URLs for guest ID photos and
        // patrol photos, bypassing the application server.
        .route("/upload/presigned", post(handlers::get_presigned_url))
}
