use community_portal::{
    gate::{
        self, DASHBOARD, GateDecision, LOGIN, PASSWORD_RESET, PROFILE_COMPLETION,
        PlaceholderKind, REGISTER, RouteClass, VERIFICATION_PENDING, classify, evaluate,
    },
    models::Role,
    session::{Principal, Profile, ResolutionPhase, SessionSnapshot},
};
use uuid::Uuid;

// --- Builders ---

fn profile(role: Role, verified: bool, kinship: Option<&str>) -> Profile {
    Profile {
        id: Uuid::from_u128(5),
        email: "someone@example.com".to_string(),
        role,
        verified,
        display_name: None,
        kinship_number: kinship.map(str::to_string),
        address_block: None,
    }
}

fn signed_in(profile: Option<Profile>, phase: ResolutionPhase) -> SessionSnapshot {
    SessionSnapshot {
        principal: Some(Principal {
            id: Uuid::from_u128(5),
            email: "someone@example.com".to_string(),
        }),
        profile,
        phase,
    }
}

fn redirect_to(to: &str) -> GateDecision {
    GateDecision::Redirect { to: to.to_string() }
}

fn placeholder(kind: PlaceholderKind) -> GateDecision {
    GateDecision::Placeholder { kind }
}

// --- Route classification ---

#[test]
fn test_route_classification() {
    assert_eq!(classify(LOGIN), RouteClass::PublicEntry);
    assert_eq!(classify(REGISTER), RouteClass::PublicEntry);
    assert_eq!(classify(PASSWORD_RESET), RouteClass::PublicEntry);
    assert_eq!(classify(VERIFICATION_PENDING), RouteClass::VerificationPending);
    assert_eq!(classify(DASHBOARD), RouteClass::Protected);
    assert_eq!(classify("/members"), RouteClass::Protected);
    assert_eq!(classify("/anything/else"), RouteClass::Protected);
}

// --- Rule 1: resolution in flight suppresses everything ---

#[test]
fn test_resolving_renders_loading_regardless_of_other_fields() {
    // Even a complete admin profile must not render while the phase machine is
    // not terminal; field presence is explicitly not the signal.
    let cases = [
        signed_in(None, ResolutionPhase::Unresolved),
        signed_in(
            Some(profile(Role::Admin, true, Some("KK-1"))),
            ResolutionPhase::Unresolved,
        ),
        signed_in(
            Some(profile(Role::Resident, true, None)),
            ResolutionPhase::AccountResolved,
        ),
    ];

    for snapshot in &cases {
        for route in [LOGIN, DASHBOARD, "/admin/x", VERIFICATION_PENDING] {
            assert_eq!(
                evaluate(snapshot, route, &[Role::Admin]),
                placeholder(PlaceholderKind::Loading),
                "route {route} must stay on the loading placeholder"
            );
        }
    }
}

#[test]
fn test_mid_resolution_partial_profile_is_not_trusted() {
    // A resident snapshot between phase 1 and phase 2 carries an account-only
    // profile with no kinship number. Gating on fields would bounce the user to
    // profile completion; gating on the phase holds them at loading.
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, None)),
        ResolutionPhase::AccountResolved,
    );
    assert_eq!(
        evaluate(&snapshot, "/members", &[]),
        placeholder(PlaceholderKind::Loading)
    );
}

// --- Rule 2: signed out ---

#[test]
fn test_anonymous_on_public_entry_renders_nothing() {
    // Scenario D.
    for route in [LOGIN, REGISTER, PASSWORD_RESET] {
        assert_eq!(
            evaluate(&SessionSnapshot::anonymous(), route, &[]),
            placeholder(PlaceholderKind::Hidden)
        );
    }
}

#[test]
fn test_anonymous_on_protected_redirects_to_login() {
    for route in [DASHBOARD, "/members", "/admin/dues", VERIFICATION_PENDING] {
        assert_eq!(
            evaluate(&SessionSnapshot::anonymous(), route, &[]),
            redirect_to(LOGIN)
        );
    }
}

// --- Rule 3: profile unavailable ---

#[test]
fn test_missing_profile_shows_error_placeholder_without_redirect() {
    // Scenario E: the failure is ambiguous, so the user gets a manual
    // return-to-login action instead of an automatic redirect.
    let snapshot = signed_in(None, ResolutionPhase::Failed);
    for route in [DASHBOARD, "/members", LOGIN] {
        assert_eq!(
            evaluate(&snapshot, route, &[Role::Admin]),
            placeholder(PlaceholderKind::ProfileUnavailable)
        );
    }
}

// --- Rule 4: verification hold ---

#[test]
fn test_unverified_redirects_to_verification_pending() {
    // Holds regardless of role or allow-list; rule 4 precedes the role rule.
    for role in [Role::Admin, Role::Guard, Role::Resident] {
        let snapshot = signed_in(
            Some(profile(role, false, Some("KK-1"))),
            ResolutionPhase::FullyResolved,
        );
        assert_eq!(
            evaluate(&snapshot, DASHBOARD, &[Role::Admin]),
            redirect_to(VERIFICATION_PENDING)
        );
    }
}

#[test]
fn test_unverified_renders_the_verification_page_itself() {
    let snapshot = signed_in(
        Some(profile(Role::Resident, false, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, VERIFICATION_PENDING, &[]),
        GateDecision::Render
    );
}

// --- Rule 5: role allow-list ---

#[test]
fn test_role_outside_allow_list_redirects_to_dashboard() {
    // Scenario C.
    let snapshot = signed_in(
        Some(profile(Role::Guard, true, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, "/admin/x", &[Role::Admin]),
        redirect_to(DASHBOARD)
    );
}

#[test]
fn test_empty_allow_list_imposes_no_role_rule() {
    let snapshot = signed_in(
        Some(profile(Role::Guard, true, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(evaluate(&snapshot, "/members", &[]), GateDecision::Render);
}

// --- Rule 6: resident household link ---

#[test]
fn test_resident_without_link_redirects_to_profile_completion() {
    // Scenario B: the allow-list admits the resident, the missing link still wins.
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, "/data", &[Role::Admin, Role::Resident]),
        redirect_to(PROFILE_COMPLETION)
    );
}

#[test]
fn test_empty_kinship_number_counts_as_absent() {
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, Some(""))),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, DASHBOARD, &[]),
        redirect_to(PROFILE_COMPLETION)
    );
}

#[test]
fn test_resident_without_link_renders_profile_completion_page() {
    // The redirect's guard excludes its own target: no loop.
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, PROFILE_COMPLETION, &[]),
        GateDecision::Render
    );
}

#[test]
fn test_linked_resident_passes() {
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, Some("KK-1"))),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(evaluate(&snapshot, "/members", &[]), GateDecision::Render);
}

// --- Rule 7: entry pages once authenticated ---

#[test]
fn test_verified_user_is_bounced_off_entry_pages() {
    let snapshot = signed_in(
        Some(profile(Role::Admin, true, None)),
        ResolutionPhase::FullyResolved,
    );
    for route in [LOGIN, REGISTER, PASSWORD_RESET, VERIFICATION_PENDING] {
        assert_eq!(evaluate(&snapshot, route, &[]), redirect_to(DASHBOARD));
    }
}

// --- Rule 8 ---

#[test]
fn test_admin_renders_allowed_view() {
    // Scenario A.
    let snapshot = signed_in(
        Some(profile(Role::Admin, true, None)),
        ResolutionPhase::FullyResolved,
    );
    assert_eq!(
        evaluate(&snapshot, "/admin/x", &[Role::Admin]),
        GateDecision::Render
    );
}

// --- Idempotence / loop freedom ---

#[test]
fn test_identical_inputs_produce_identical_decisions() {
    let snapshot = signed_in(
        Some(profile(Role::Resident, true, None)),
        ResolutionPhase::FullyResolved,
    );
    let first = evaluate(&snapshot, "/members", &[]);
    let second = evaluate(&snapshot, "/members", &[]);
    assert_eq!(first, second);
}

#[test]
fn test_every_redirect_settles_at_its_target() {
    // Following any redirect decision with an unchanged session must land on a
    // non-redirect decision at the target route.
    let cases: [(SessionSnapshot, &str, &[Role]); 4] = [
        (SessionSnapshot::anonymous(), "/members", &[]),
        (
            signed_in(
                Some(profile(Role::Resident, false, None)),
                ResolutionPhase::FullyResolved,
            ),
            DASHBOARD,
            &[],
        ),
        (
            signed_in(
                Some(profile(Role::Resident, true, None)),
                ResolutionPhase::FullyResolved,
            ),
            "/members",
            &[],
        ),
        (
            signed_in(
                Some(profile(Role::Admin, true, None)),
                ResolutionPhase::FullyResolved,
            ),
            LOGIN,
            &[],
        ),
    ];

    for (snapshot, route, allow) in &cases {
        if let GateDecision::Redirect { to } = evaluate(snapshot, route, allow) {
            let settled = gate::decide(snapshot, &to);
            assert!(
                !matches!(settled, GateDecision::Redirect { .. }),
                "redirect from {route} to {to} must not chain into another redirect, got {settled:?}"
            );
        } else {
            panic!("case ({route}) was expected to redirect");
        }
    }
}

// --- Static allow-list table (decide) ---

#[test]
fn test_decide_applies_the_allow_list_table() {
    let admin = signed_in(
        Some(profile(Role::Admin, true, None)),
        ResolutionPhase::FullyResolved,
    );
    let guard = signed_in(
        Some(profile(Role::Guard, true, None)),
        ResolutionPhase::FullyResolved,
    );
    let resident = signed_in(
        Some(profile(Role::Resident, true, Some("KK-1"))),
        ResolutionPhase::FullyResolved,
    );

    // Admin-only surfaces.
    assert_eq!(gate::decide(&admin, "/admin/dues"), GateDecision::Render);
    assert_eq!(gate::decide(&guard, "/admin/dues"), redirect_to(DASHBOARD));

    // The security desk admits guards and admins.
    assert_eq!(gate::decide(&guard, "/security/patrol"), GateDecision::Render);
    assert_eq!(
        gate::decide(&resident, "/security/patrol"),
        redirect_to(DASHBOARD)
    );

    // Dues are for residents (and admins checking on them).
    assert_eq!(gate::decide(&resident, "/dues/mine"), GateDecision::Render);
    assert_eq!(gate::decide(&admin, "/dues/mine"), GateDecision::Render);
    assert_eq!(gate::decide(&guard, "/dues/mine"), redirect_to(DASHBOARD));

    // Unlisted protected routes carry no role rule.
    assert_eq!(gate::decide(&guard, "/members"), GateDecision::Render);
}
