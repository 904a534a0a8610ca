use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    models::Role,
    session::SessionSnapshot,
};

// --- Well-Known Client Routes ---

// The fixed route vocabulary the gate reasons about. These are the client-side
// navigation targets; the gate compares and emits them as plain strings.

/// Default public-entry route (the sign-in page).
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const PASSWORD_RESET: &str = "/password-reset";
/// Holding page for accounts awaiting verification review.
pub const VERIFICATION_PENDING: &str = "/verification-pending";
/// Where residents without a household link are sent to complete their profile.
pub const PROFILE_COMPLETION: &str = "/profile";
/// Default authenticated-landing route.
pub const DASHBOARD: &str = "/dashboard";

/// RouteClass
///
/// Static classification of every navigable path. Not stored data: purely
/// configuration, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login, registration and password-reset: reachable signed out.
    PublicEntry,
    /// The verification holding page.
    VerificationPending,
    /// Everything else.
    Protected,
}

pub fn classify(route: &str) -> RouteClass {
    match route {
        LOGIN | REGISTER | PASSWORD_RESET => RouteClass::PublicEntry,
        VERIFICATION_PENDING => RouteClass::VerificationPending,
        _ => RouteClass::Protected,
    }
}

// --- Per-View Allow-Lists ---

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const GUARD_DESK: &[Role] = &[Role::Guard, Role::Admin];
const RESIDENT_DUES: &[Role] = &[Role::Resident, Role::Admin];
const REGISTRY_INTAKE: &[Role] = &[Role::Admin, Role::Resident];
const UNRESTRICTED: &[Role] = &[];

/// allowed_roles
///
/// The allow-list each protected view declares at composition time. An empty
/// list means the view itself scopes what it shows (e.g. the resident registry
/// narrows residents to their own household) and the gate imposes no role rule.
pub fn allowed_roles(route: &str) -> &'static [Role] {
    match route {
        "/admin/dues"
        | "/admin/patrol-config"
        | "/admin/finance-report"
        | "/admin/security-report"
        | "/admin/monitoring"
        | "/admin/maintenance" => ADMIN_ONLY,
        "/dues/mine" => RESIDENT_DUES,
        "/residents/new" => REGISTRY_INTAKE,
        "/security/patrol" | "/security/guest-book" | "/security/handover" => GUARD_DESK,
        _ => UNRESTRICTED,
    }
}

// --- Decisions ---

/// PlaceholderKind
///
/// The interim states a view renders instead of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaceholderKind {
    /// Session resolution still in flight; render nothing decisive.
    Loading,
    /// Signed out on a public-entry route: the page's own anonymous content shows.
    Hidden,
    /// The backing account record is missing or unreadable. Shown with a manual
    /// return-to-login action; deliberately not auto-redirected.
    ProfileUnavailable,
}

/// GateDecision
///
/// The tagged outcome of one gate evaluation. Policy lives here; executing the
/// decision (rendering, navigating, showing the interim) is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum GateDecision {
    /// Render the wrapped view.
    Render,
    /// Navigate to `to`. Callers render their "redirecting" interim while the
    /// navigation is in flight; the redirect itself is the only side effect the
    /// gate ever requests, and it is fire-and-forget.
    Redirect { to: String },
    /// Hold the view back and render the named interim state.
    Placeholder { kind: PlaceholderKind },
}

impl GateDecision {
    fn redirect(to: &str) -> Self {
        GateDecision::Redirect { to: to.to_string() }
    }

    fn placeholder(kind: PlaceholderKind) -> Self {
        GateDecision::Placeholder { kind }
    }
}

/// evaluate
///
/// The access-gate decision procedure: a pure function of the session snapshot,
/// the current route and the view's allow-list. Rules are evaluated in strict
/// order and the first match wins:
///
/// 1. Resolution in flight: loading placeholder, never a redirect.
/// 2. Signed out: redirect to login unless already on a public-entry route.
/// 3. Signed in but no profile: the profile-unavailable placeholder. Manual
///    recovery only; the failure is ambiguous, so no auto-redirect.
/// 4. Unverified: held at the verification-pending page.
/// 5. Role outside the allow-list: redirect to the dashboard.
/// 6. Resident without a household link: redirect to profile completion, even
///    when the route is otherwise allowed.
/// 7. Verified user on an entry or verification page: redirect to the dashboard.
/// 8. Otherwise render.
///
/// Every redirect's guard excludes its own target route, so re-evaluating after
/// the navigation cannot loop. The gate never fails: abnormal inputs all
/// degrade to one of the placeholder states.
pub fn evaluate(snapshot: &SessionSnapshot, route: &str, allow_list: &[Role]) -> GateDecision {
    // Rule 1: suspend everything while resolution is in flight.
    if snapshot.resolving() {
        return GateDecision::placeholder(PlaceholderKind::Loading);
    }

    // Rule 2: signed out.
    if snapshot.principal.is_none() {
        return if classify(route) == RouteClass::PublicEntry {
            GateDecision::placeholder(PlaceholderKind::Hidden)
        } else {
            GateDecision::redirect(LOGIN)
        };
    }

    // Rule 3: signed in, but the backing record never materialized.
    let Some(profile) = &snapshot.profile else {
        return GateDecision::placeholder(PlaceholderKind::ProfileUnavailable);
    };

    // Rule 4: unverified accounts are held at the verification page.
    if !profile.verified {
        return if route == VERIFICATION_PENDING {
            GateDecision::Render
        } else {
            GateDecision::redirect(VERIFICATION_PENDING)
        };
    }

    // Rule 5: role not in the view's allow-list.
    if !allow_list.is_empty() && !allow_list.contains(&profile.role) {
        return GateDecision::redirect(DASHBOARD);
    }

    // Rule 6: residents must have a household link before using the portal.
    if profile.role == Role::Resident
        && !profile.has_household_link()
        && route != PROFILE_COMPLETION
    {
        return GateDecision::redirect(PROFILE_COMPLETION);
    }

    // Rule 7: nothing to do on entry pages once signed in and verified.
    if matches!(
        classify(route),
        RouteClass::PublicEntry | RouteClass::VerificationPending
    ) {
        return GateDecision::redirect(DASHBOARD);
    }

    // Rule 8.
    GateDecision::Render
}

/// decide
///
/// Convenience wrapper joining the static allow-list table to `evaluate`; this
/// is what the HTTP gate endpoint calls.
pub fn decide(snapshot: &SessionSnapshot, route: &str) -> GateDecision {
    evaluate(snapshot, route, allowed_roles(route))
}
