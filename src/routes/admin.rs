use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Routes exclusively for accounts with the 'admin' role: verification review,
/// account provisioning, dues billing, patrol configuration and announcement
/// moderation.
///
/// Access Control:
/// The surrounding router authenticates every request (via the `AuthUser`
/// extractor middleware); each handler here additionally checks `role == admin`
/// before touching the repository, so a non-admin session can never reach the
/// moderation surface.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters: residents, households, pending verifications,
        // outstanding dues for the current period, guests today.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/accounts — the verification review queue (unverified first).
        // POST /admin/accounts — privileged provisioning with orphan-identity
        // recovery against the auth provider.
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account_admin),
        )
        // PUT /admin/accounts/{id}/review
        // Assigns role + verified flag and pushes the change into the affected
        // live session.
        .route("/accounts/{id}/review", put(handlers::review_account))
        // DELETE /admin/accounts/{id}
        // Provider identity first, then the local record, then the session.
        .route("/accounts/{id}", delete(handlers::delete_account_admin))
        // --- Dues ---
        // GET /admin/dues?month=&year= — a period's ledger.
        .route("/dues", get(handlers::list_dues_admin))
        // POST /admin/dues/issue — the billing sweep (idempotent per period).
        .route("/dues/issue", post(handlers::issue_dues))
        // PUT /admin/dues/{id}/paid — record a payment.
        .route("/dues/{id}/paid", put(handlers::mark_dues_paid))
        // GET /admin/finance-report?month=&year= — collected vs outstanding.
        .route("/finance-report", get(handlers::finance_report))
        // --- Patrol configuration ---
        .route(
            "/checkpoints",
            get(handlers::list_checkpoints_admin).post(handlers::create_checkpoint),
        )
        .route(
            "/checkpoints/{id}/active",
            put(handlers::set_checkpoint_active),
        )
        // --- Announcements ---
        .route("/announcements", post(handlers::create_announcement))
        .route(
            "/announcements/{id}",
            delete(handlers::delete_announcement),
        )
}
