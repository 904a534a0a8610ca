use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    gate::{self, GateDecision},
    models::{
        Account, AccountReviewRequest, Announcement, Classified, CompleteProfileRequest,
        CreateAccountRequest, CreateAnnouncementRequest, CreateCheckpointRequest,
        CreateClassifiedRequest, CreateGuestEntryRequest, CreateHandoverRequest,
        CreateMemberRequest, CreatePatrolLogRequest, CreatePatrolReportRequest, DashboardStats,
        DuesEntry, FinanceSummary, GuestEntry, HandoverReport, HouseholdMember, IssueDuesRequest,
        NewHouseholdMember, PasswordResetRequest, PatrolCheckpoint, PatrolLogEntry, PatrolReport,
        PresignedUrlRequest, PresignedUrlResponse, RegisterRequest, Role, UpdateClassifiedRequest,
        UpdateMemberRequest,
    },
    provisioning::{AuthProviderClient, ProvisioningError},
    session::{Profile, SessionSnapshot, SessionView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// GateQuery
///
/// Query parameters of GET /session/gate: the client-side route about to render.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct GateQuery {
    pub route: String,
}

/// PeriodFilter
///
/// Month/year selector shared by the dues and finance endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PeriodFilter {
    pub month: i32,
    pub year: i32,
}

/// LimitFilter
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LimitFilter {
    /// Maximum number of rows to return (default 100).
    pub limit: Option<i64>,
}

const DEFAULT_LIST_LIMIT: i64 = 100;

/// The community's standard monthly dues when the billing sweep does not override it.
const DEFAULT_DUES_AMOUNT: i64 = 100_000;

// --- Session & Gate ---

/// get_session
///
/// [Optional-Auth Route] Returns the caller's session snapshot: principal,
/// merged profile, resolution phase and the derived `resolving` flag. Anonymous
/// callers receive the signed-out snapshot rather than a 401, because the gate
/// has rules for them too.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session state", body = SessionView))
)]
pub async fn get_session(
    MaybeAuthUser(auth): MaybeAuthUser,
    State(state): State<AppState>,
) -> Json<SessionView> {
    let snapshot = match auth {
        Some(auth) => state.sessions.session(auth.principal()).snapshot(),
        None => SessionSnapshot::anonymous(),
    };
    Json(SessionView::from(snapshot))
}

/// gate_decision
///
/// [Optional-Auth Route] Evaluates the access gate for the caller's session and
/// the given client route, returning the tagged decision the thin client
/// executes (render / redirect / placeholder). Policy stays server-side; the
/// client owns only the execution of the decision.
#[utoipa::path(
    get,
    path = "/session/gate",
    params(GateQuery),
    responses((status = 200, description = "Gate decision for the route", body = GateDecision))
)]
pub async fn gate_decision(
    MaybeAuthUser(auth): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<GateQuery>,
) -> Json<GateDecision> {
    let snapshot = match auth {
        Some(auth) => state.sessions.session(auth.principal()).snapshot(),
        None => SessionSnapshot::anonymous(),
    };
    Json(gate::decide(&snapshot, &query.route))
}

/// get_me
///
/// [Authenticated Route] The caller's fully resolved profile. Unlike
/// GET /session this waits for resolution to settle, so the resident household
/// merge is reflected in the response.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Resolved profile", body = Profile),
        (status = 404, description = "Account record missing")
    )
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, StatusCode> {
    let store = state.sessions.session(auth.principal());
    let mut rx = store.subscribe();
    let snapshot = rx
        .wait_for(|s| !s.resolving())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();
    snapshot.profile.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// complete_profile
///
/// [Authenticated Route, resident] Upserts the caller's head-of-household
/// registry record and syncs the kinship number + address back onto the account,
/// then refreshes the session so the gate stops routing them to `/profile`.
#[utoipa::path(
    put,
    path = "/me/profile",
    request_body = CompleteProfileRequest,
    responses(
        (status = 200, description = "Registry record saved", body = HouseholdMember),
        (status = 409, description = "National id already registered")
    )
)]
pub async fn complete_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CompleteProfileRequest>,
) -> Result<Json<HouseholdMember>, StatusCode> {
    if auth.role != Role::Resident {
        return Err(StatusCode::FORBIDDEN);
    }
    if payload.name.is_empty() || payload.national_id.is_empty() || payload.kinship_number.is_empty()
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let existing = state.repo.find_member_by_email(&auth.email).await;

    if state
        .repo
        .is_national_id_taken(&payload.national_id, existing.as_ref().map(|m| m.id))
        .await
    {
        return Err(StatusCode::CONFLICT);
    }

    let saved = match existing {
        Some(member) => state.repo.update_member_profile(member.id, &payload).await,
        None => {
            state
                .repo
                .create_member(NewHouseholdMember {
                    name: payload.name.clone(),
                    national_id: payload.national_id.clone(),
                    kinship_number: payload.kinship_number.clone(),
                    relationship: "Head of Household".to_string(),
                    gender: payload.gender.clone(),
                    occupation: payload.occupation.clone(),
                    marital_status: payload.marital_status.clone(),
                    address_block: payload.address_block.clone(),
                    house_number: payload.house_number.clone(),
                    email: Some(auth.email.clone()),
                    date_of_birth: payload.date_of_birth,
                })
                .await
        }
    }
    .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    // Sync the household link onto the account record, then push the change to
    // the live session so the next gate evaluation sees it.
    state
        .repo
        .update_account_household_link(auth.id, &payload.kinship_number, &payload.address_block)
        .await;
    state.sessions.invalidate(auth.id);

    Ok(Json(saved))
}

// --- Resident Registry ---

/// list_members
///
/// [Authenticated Route] The resident registry, scoped by role: admins and
/// guards see every household, residents only their own (matching on the
/// kinship number synced to their account).
#[utoipa::path(
    get,
    path = "/members",
    responses((status = 200, description = "Registry rows", body = [HouseholdMember]))
)]
pub async fn list_members(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<HouseholdMember>> {
    if auth.role != Role::Resident {
        return Json(state.repo.list_members().await);
    }

    let kinship = state
        .repo
        .get_account(auth.id)
        .await
        .and_then(|a| a.kinship_number);
    match kinship {
        Some(k) if !k.is_empty() => Json(state.repo.list_household(&k).await),
        // Residents without a household link have nothing to see yet; the gate
        // is already steering them to profile completion.
        _ => Json(vec![]),
    }
}

/// create_member
///
/// [Authenticated Route, admin|resident] Adds a registry row. Residents add
/// family members under their own household link (no login email of their own);
/// admins register new heads of household with an explicit link and email.
#[utoipa::path(
    post,
    path = "/members",
    request_body = CreateMemberRequest,
    responses(
        (status = 200, description = "Created", body = HouseholdMember),
        (status = 409, description = "National id already registered or profile incomplete")
    )
)]
pub async fn create_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<Json<HouseholdMember>, StatusCode> {
    if payload.name.is_empty() || payload.national_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if state
        .repo
        .is_national_id_taken(&payload.national_id, None)
        .await
    {
        return Err(StatusCode::CONFLICT);
    }

    let member = match auth.role {
        Role::Admin => NewHouseholdMember {
            name: payload.name,
            national_id: payload.national_id,
            kinship_number: payload.kinship_number.ok_or(StatusCode::BAD_REQUEST)?,
            relationship: "Head of Household".to_string(),
            gender: payload.gender,
            occupation: payload.occupation,
            marital_status: payload.marital_status,
            address_block: payload.address_block.ok_or(StatusCode::BAD_REQUEST)?,
            house_number: None,
            email: payload.email,
            date_of_birth: payload.date_of_birth,
        },
        Role::Resident => {
            // Family members inherit the caller's household link; an incomplete
            // head-of-household profile cannot anchor them.
            let account = state
                .repo
                .get_account(auth.id)
                .await
                .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
            let (kinship, address) = match (account.kinship_number, account.address_block) {
                (Some(k), Some(a)) if !k.is_empty() => (k, a),
                _ => return Err(StatusCode::CONFLICT),
            };
            NewHouseholdMember {
                name: payload.name,
                national_id: payload.national_id,
                kinship_number: kinship,
                relationship: payload
                    .relationship
                    .unwrap_or_else(|| "Family Member".to_string()),
                gender: payload.gender,
                occupation: payload.occupation,
                marital_status: payload.marital_status,
                address_block: address,
                house_number: None,
                // Family members do not get a login of their own.
                email: None,
                date_of_birth: payload.date_of_birth,
            }
        }
        Role::Guard => return Err(StatusCode::FORBIDDEN),
    };

    let notify_email = member.email.clone();
    let created = state
        .repo
        .create_member(member)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    // A new head-of-household row may complete a signed-in resident's profile.
    if let Some(email) = notify_email {
        state.sessions.invalidate_email(&email);
    }

    Ok(Json(created))
}

/// update_member
///
/// [Authenticated Route, admin|resident] Edits a registry row. Residents may
/// only touch rows of their own household; national-id uniqueness is enforced
/// against every other row.
#[utoipa::path(
    put,
    path = "/members/{id}",
    params(("id" = Uuid, Path, description = "Registry row ID")),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Updated", body = HouseholdMember),
        (status = 404, description = "Not found"),
        (status = 409, description = "National id already registered")
    )
)]
pub async fn update_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<Json<HouseholdMember>, StatusCode> {
    let member = state.repo.get_member(id).await.ok_or(StatusCode::NOT_FOUND)?;

    match auth.role {
        Role::Admin => {}
        Role::Resident => {
            let own_kinship = state
                .repo
                .get_account(auth.id)
                .await
                .and_then(|a| a.kinship_number);
            if own_kinship.as_deref() != Some(member.kinship_number.as_str()) {
                return Err(StatusCode::FORBIDDEN);
            }
        }
        Role::Guard => return Err(StatusCode::FORBIDDEN),
    }

    if let Some(national_id) = &payload.national_id {
        if state
            .repo
            .is_national_id_taken(national_id, Some(id))
            .await
        {
            return Err(StatusCode::CONFLICT);
        }
    }

    let updated = state
        .repo
        .update_member(id, payload)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    // Registry rows are merged into live resident sessions by email.
    if let Some(email) = &updated.email {
        state.sessions.invalidate_email(email);
    }

    Ok(Json(updated))
}

/// delete_member
///
/// [Authenticated Route, admin|resident] Removes a registry row. Heads of
/// household cannot be deleted while they still anchor their household; their
/// relationship must be reassigned first.
#[utoipa::path(
    delete,
    path = "/members/{id}",
    params(("id" = Uuid, Path, description = "Registry row ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Cannot delete a head of household")
    )
)]
pub async fn delete_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let Some(member) = state.repo.get_member(id).await else {
        return StatusCode::NOT_FOUND;
    };
    if member.relationship == "Head of Household" {
        return StatusCode::CONFLICT;
    }

    match auth.role {
        Role::Admin => {}
        Role::Resident => {
            let own_kinship = state
                .repo
                .get_account(auth.id)
                .await
                .and_then(|a| a.kinship_number);
            if own_kinship.as_deref() != Some(member.kinship_number.as_str()) {
                return StatusCode::FORBIDDEN;
            }
        }
        Role::Guard => return StatusCode::FORBIDDEN,
    }

    if state.repo.delete_member(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Dues ---

/// list_my_dues
///
/// [Authenticated Route, resident] The caller's household dues history, keyed by
/// the kinship number on their account.
#[utoipa::path(
    get,
    path = "/dues/mine",
    responses((status = 200, description = "Dues entries", body = [DuesEntry]))
)]
pub async fn list_my_dues(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DuesEntry>>, StatusCode> {
    if auth.role == Role::Guard {
        return Err(StatusCode::FORBIDDEN);
    }
    let kinship = state
        .repo
        .get_account(auth.id)
        .await
        .and_then(|a| a.kinship_number);
    match kinship {
        Some(k) if !k.is_empty() => Ok(Json(state.repo.list_dues_for_kinship(&k).await)),
        _ => Ok(Json(vec![])),
    }
}

// --- Announcements & Classifieds ---

/// list_announcements
///
/// [Authenticated Route] Community announcements, newest first.
#[utoipa::path(
    get,
    path = "/announcements",
    responses((status = 200, description = "Announcements", body = [Announcement]))
)]
pub async fn list_announcements(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Announcement>> {
    Json(state.repo.list_announcements().await)
}

/// list_classifieds
#[utoipa::path(
    get,
    path = "/classifieds",
    responses((status = 200, description = "Classified ads", body = [Classified]))
)]
pub async fn list_classifieds(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Classified>> {
    Json(state.repo.list_classifieds().await)
}

/// create_classified
///
/// [Authenticated Route] Posts a classified ad under the caller's email and
/// display name.
#[utoipa::path(
    post,
    path = "/classifieds",
    request_body = CreateClassifiedRequest,
    responses((status = 200, description = "Created", body = Classified))
)]
pub async fn create_classified(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateClassifiedRequest>,
) -> Result<Json<Classified>, StatusCode> {
    if payload.title.is_empty() || payload.description.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let name = auth.actor_name();
    state
        .repo
        .create_classified(payload, &auth.email, &name)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// update_classified
///
/// [Authenticated Route] Edits an ad, implementing two tiers of authorization:
/// admins edit any ad, everyone else only their own.
#[utoipa::path(
    put,
    path = "/classifieds/{id}",
    params(("id" = Uuid, Path, description = "Classified ID")),
    request_body = UpdateClassifiedRequest,
    responses(
        (status = 200, description = "Updated", body = Classified),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn update_classified(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClassifiedRequest>,
) -> Result<Json<Classified>, StatusCode> {
    let updated = if auth.role == Role::Admin {
        state.repo.update_classified_admin(id, payload).await
    } else {
        state.repo.update_classified(id, &auth.email, payload).await
    };
    updated.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// delete_classified
///
/// [Authenticated Route] Deletes an ad; admin force-delete, otherwise owner-only.
#[utoipa::path(
    delete,
    path = "/classifieds/{id}",
    params(("id" = Uuid, Path, description = "Classified ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn delete_classified(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let deleted = if auth.role == Role::Admin {
        state.repo.delete_classified_admin(id).await
    } else {
        state.repo.delete_classified(id, &auth.email).await
    };
    if deleted {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Security Desk: Guest Book, Patrol, Handover ---

fn require_security_desk(role: Role) -> Result<(), StatusCode> {
    match role {
        Role::Guard | Role::Admin => Ok(()),
        Role::Resident => Err(StatusCode::FORBIDDEN),
    }
}

/// create_guest_entry
///
/// [Guard Route] Logs a visitor at the gate. The ID-card photo must already be
/// uploaded via the presigned flow; its key is recorded here.
#[utoipa::path(
    post,
    path = "/guests",
    request_body = CreateGuestEntryRequest,
    responses((status = 200, description = "Logged", body = GuestEntry))
)]
pub async fn create_guest_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateGuestEntryRequest>,
) -> Result<Json<GuestEntry>, StatusCode> {
    require_security_desk(auth.role)?;
    if payload.guest_name.is_empty()
        || payload.id_card_number.is_empty()
        || payload.destination.is_empty()
        || payload.purpose.is_empty()
        || payload.id_photo_key.is_empty()
    {
        return Err(StatusCode::BAD_REQUEST);
    }
    let name = auth.actor_name();
    state
        .repo
        .create_guest_entry(payload, auth.id, &name)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// list_guest_entries
///
/// [Guard Route] Recent guest-book entries, newest first.
#[utoipa::path(
    get,
    path = "/guests",
    params(LimitFilter),
    responses((status = 200, description = "Guest entries", body = [GuestEntry]))
)]
pub async fn list_guest_entries(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<LimitFilter>,
) -> Result<Json<Vec<GuestEntry>>, StatusCode> {
    require_security_desk(auth.role)?;
    let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.repo.list_guest_entries(limit).await))
}

/// list_checkpoints
///
/// [Guard Route] The active patrol checkpoints in walk order.
#[utoipa::path(
    get,
    path = "/patrol/checkpoints",
    responses((status = 200, description = "Active checkpoints", body = [PatrolCheckpoint]))
)]
pub async fn list_checkpoints(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PatrolCheckpoint>>, StatusCode> {
    require_security_desk(auth.role)?;
    Ok(Json(state.repo.list_checkpoints(true).await))
}

/// create_patrol_log
///
/// [Guard Route] Marks one checkpoint as passed, with condition, optional note
/// and optional photo key.
#[utoipa::path(
    post,
    path = "/patrol/logs",
    request_body = CreatePatrolLogRequest,
    responses((status = 200, description = "Logged", body = PatrolLogEntry))
)]
pub async fn create_patrol_log(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePatrolLogRequest>,
) -> Result<Json<PatrolLogEntry>, StatusCode> {
    require_security_desk(auth.role)?;
    let name = auth.actor_name();
    state
        .repo
        .create_patrol_log(payload, auth.id, &name)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// list_patrol_logs_today
///
/// [Guard Route] Today's checkpoint passes, so the guard screen can show which
/// checkpoints are still open.
#[utoipa::path(
    get,
    path = "/patrol/logs/today",
    responses((status = 200, description = "Today's logs", body = [PatrolLogEntry]))
)]
pub async fn list_patrol_logs_today(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PatrolLogEntry>>, StatusCode> {
    require_security_desk(auth.role)?;
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    Ok(Json(state.repo.list_patrol_logs_since(midnight).await))
}

/// create_patrol_report
///
/// [Guard Route] Files a free-text patrol shift report.
#[utoipa::path(
    post,
    path = "/patrol/reports",
    request_body = CreatePatrolReportRequest,
    responses((status = 200, description = "Filed", body = PatrolReport))
)]
pub async fn create_patrol_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePatrolReportRequest>,
) -> Result<Json<PatrolReport>, StatusCode> {
    require_security_desk(auth.role)?;
    if payload.body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let name = auth.actor_name();
    state
        .repo
        .create_patrol_report(payload, &name)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// list_patrol_reports
///
/// [Authenticated Route] Patrol report history. Readable by every signed-in
/// role; only the security desk can file new ones.
#[utoipa::path(
    get,
    path = "/patrol/reports",
    params(LimitFilter),
    responses((status = 200, description = "Reports", body = [PatrolReport]))
)]
pub async fn list_patrol_reports(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<LimitFilter>,
) -> Json<Vec<PatrolReport>> {
    let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Json(state.repo.list_patrol_reports(limit).await)
}

/// create_handover
///
/// [Guard Route] Files the end-of-shift handover report.
#[utoipa::path(
    post,
    path = "/handovers",
    request_body = CreateHandoverRequest,
    responses((status = 200, description = "Filed", body = HandoverReport))
)]
pub async fn create_handover(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateHandoverRequest>,
) -> Result<Json<HandoverReport>, StatusCode> {
    require_security_desk(auth.role)?;
    let name = auth.actor_name();
    state
        .repo
        .create_handover(payload, &name)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// list_handovers
///
/// [Guard Route] Handover report history, newest first.
#[utoipa::path(
    get,
    path = "/handovers",
    params(LimitFilter),
    responses((status = 200, description = "Handover reports", body = [HandoverReport]))
)]
pub async fn list_handovers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<LimitFilter>,
) -> Result<Json<Vec<HandoverReport>>, StatusCode> {
    require_security_desk(auth.role)?;
    let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.repo.list_handovers(limit).await))
}

// --- Uploads ---

/// get_presigned_url
///
/// [Authenticated Route] Generates a temporary, secure URL for direct
/// client-to-cloud upload of guest ID photos and patrol photos.
///
/// The URL is short-lived (10 minutes), constrained to the specified
/// `file_type`, and uses a unique object key, offloading media traffic from the
/// application server entirely.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    // Unique, structured object key (e.g. 'uploads/UUID.jpg').
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let unique_id = Uuid::new_v4();
    let object_key = format!("uploads/{}.{}", unique_id, extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => {
            let response = PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            // Log the underlying storage error but return a generic internal error.
            tracing::error!("storage error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

// --- Public: Registration & Password Reset ---

/// register_account
///
/// [Public Route] Resident self-registration. Creates the identity at the
/// external auth provider, then mirrors it as an **unverified** resident
/// account record; the access gate holds the new sign-in at the
/// verification-pending page until an admin reviews it.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = Account),
        (status = 400, description = "Provider rejected the registration")
    )
)]
pub async fn register_account(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Account>, StatusCode> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let provider = AuthProviderClient::new(&state.config);
    let provider_id = match provider.sign_up(&payload.email, &payload.password).await {
        Ok(id) => id,
        Err(ProvisioningError::Rejected(_)) | Err(ProvisioningError::EmailTaken) => {
            // Duplicate email or weak password.
            return Err(StatusCode::BAD_REQUEST);
        }
        Err(e) => {
            tracing::error!("registration against auth provider failed: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Mirror the provider identity locally; primary keys stay synchronized.
    let account = Account {
        id: provider_id,
        email: payload.email,
        role: Role::Resident,
        verified: false,
        display_name: payload.display_name,
        kinship_number: None,
        address_block: None,
    };

    state
        .repo
        .create_account(account)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// request_password_reset
///
/// [Public Route] Proxies the auth provider's password-recovery email. Always
/// answers 200 for well-formed requests so the endpoint does not leak which
/// emails exist.
#[utoipa::path(
    post,
    path = "/password-reset",
    request_body = PasswordResetRequest,
    responses((status = 200, description = "Recovery mail requested"))
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> StatusCode {
    if payload.email.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    let provider = AuthProviderClient::new(&state.config);
    if let Err(e) = provider.send_recovery(&payload.email).await {
        tracing::warn!("password recovery request failed: {}", e);
    }
    StatusCode::OK
}

// --- Admin ---

fn require_admin(role: Role) -> Result<(), StatusCode> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// get_admin_stats
///
/// [Admin Route] Dashboard counters for the current billing period.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, StatusCode> {
    require_admin(auth.role)?;
    let now = Utc::now();
    Ok(Json(
        state.repo.get_stats(now.month() as i32, now.year()).await,
    ))
}

/// list_accounts
///
/// [Admin Route] All account records, unverified first, for the verification
/// review screen.
#[utoipa::path(
    get,
    path = "/admin/accounts",
    responses((status = 200, description = "Accounts", body = [Account]))
)]
pub async fn list_accounts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Account>>, StatusCode> {
    require_admin(auth.role)?;
    Ok(Json(state.repo.list_accounts().await))
}

/// review_account
///
/// [Admin Route] Verification review: assigns the role and verified flag in one
/// step, then refreshes the affected live session so the change reaches the
/// user's gate before their next navigation.
#[utoipa::path(
    put,
    path = "/admin/accounts/{id}/review",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = AccountReviewRequest,
    responses(
        (status = 200, description = "Updated", body = Account),
        (status = 404, description = "Not Found")
    )
)]
pub async fn review_account(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountReviewRequest>,
) -> Result<Json<Account>, StatusCode> {
    require_admin(auth.role)?;
    let account = state
        .repo
        .update_account_review(id, payload.role, payload.verified)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    state.sessions.invalidate(id);
    Ok(Json(account))
}

/// create_account_admin
///
/// [Admin Route] Privileged account provisioning: creates the provider identity,
/// then mirrors the local record. When the provider reports the email as taken,
/// the handler attempts **orphan recovery**: an identity that exists at the
/// provider but has no local account record is linked instead of rejected.
#[utoipa::path(
    post,
    path = "/admin/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Provisioned", body = Account),
        (status = 409, description = "Email already has an active profile"),
        (status = 502, description = "Auth provider unreachable")
    )
)]
pub async fn create_account_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<Account>, StatusCode> {
    require_admin(auth.role)?;
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let provider = AuthProviderClient::new(&state.config);

    let provider_id = match provider.create_user(&payload.email, &payload.password).await {
        Ok(id) => id,
        Err(ProvisioningError::EmailTaken) => {
            // Orphan recovery: link an existing provider identity that is
            // missing its local account record.
            match provider.find_user_by_email(&payload.email).await {
                Ok(Some(id)) => {
                    if state.repo.get_account(id).await.is_some() {
                        return Err(StatusCode::CONFLICT);
                    }
                    tracing::info!(email = %payload.email, "linking orphan provider identity");
                    id
                }
                Ok(None) => return Err(StatusCode::CONFLICT),
                Err(e) => {
                    tracing::error!("orphan lookup failed: {}", e);
                    return Err(StatusCode::BAD_GATEWAY);
                }
            }
        }
        Err(e) => {
            tracing::error!("provider account creation failed: {}", e);
            return Err(StatusCode::BAD_GATEWAY);
        }
    };

    let account = Account {
        id: provider_id,
        email: payload.email,
        role: payload.role.unwrap_or(Role::Resident),
        verified: false,
        display_name: payload.display_name,
        kinship_number: payload.kinship_number,
        address_block: payload.address_block,
    };

    state
        .repo
        .create_account(account)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// delete_account_admin
///
/// [Admin Route] Removes a login entirely: provider identity first (tolerant of
/// already-deleted), then the local record, then the live session.
#[utoipa::path(
    delete,
    path = "/admin/accounts/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Auth provider unreachable")
    )
)]
pub async fn delete_account_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if require_admin(auth.role).is_err() {
        return StatusCode::FORBIDDEN;
    }

    let provider = AuthProviderClient::new(&state.config);
    if let Err(e) = provider.delete_user(id).await {
        tracing::error!("provider account deletion failed: {}", e);
        return StatusCode::BAD_GATEWAY;
    }

    let existed = state.repo.delete_account(id).await;
    state.sessions.terminate(id);

    if existed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// list_dues_admin
///
/// [Admin Route] All dues entries for one billing period.
#[utoipa::path(
    get,
    path = "/admin/dues",
    params(PeriodFilter),
    responses((status = 200, description = "Dues entries", body = [DuesEntry]))
)]
pub async fn list_dues_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(period): Query<PeriodFilter>,
) -> Result<Json<Vec<DuesEntry>>, StatusCode> {
    require_admin(auth.role)?;
    Ok(Json(
        state
            .repo
            .list_dues_for_period(period.month, period.year)
            .await,
    ))
}

/// issue_dues
///
/// [Admin Route] Billing sweep: creates the period's dues entry for every head
/// of household not yet billed. Safe to re-run; already billed households are
/// skipped. Returns the number of entries created.
#[utoipa::path(
    post,
    path = "/admin/dues/issue",
    request_body = IssueDuesRequest,
    responses((status = 200, description = "Entries created", body = i64))
)]
pub async fn issue_dues(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<IssueDuesRequest>,
) -> Result<Json<i64>, StatusCode> {
    require_admin(auth.role)?;
    if !(1..=12).contains(&payload.month) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let amount = payload.amount.unwrap_or(DEFAULT_DUES_AMOUNT);
    let created = state
        .repo
        .issue_dues(payload.month, payload.year, amount)
        .await;
    Ok(Json(created))
}

/// mark_dues_paid
///
/// [Admin Route] Marks one dues entry as paid, stamping the payment time.
#[utoipa::path(
    put,
    path = "/admin/dues/{id}/paid",
    params(("id" = Uuid, Path, description = "Dues entry ID")),
    responses(
        (status = 200, description = "Updated", body = DuesEntry),
        (status = 404, description = "Not Found")
    )
)]
pub async fn mark_dues_paid(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DuesEntry>, StatusCode> {
    require_admin(auth.role)?;
    state
        .repo
        .mark_dues_paid(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// finance_report
///
/// [Admin Route] Aggregated dues figures for one billing period.
#[utoipa::path(
    get,
    path = "/admin/finance-report",
    params(PeriodFilter),
    responses((status = 200, description = "Summary", body = FinanceSummary))
)]
pub async fn finance_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(period): Query<PeriodFilter>,
) -> Result<Json<FinanceSummary>, StatusCode> {
    require_admin(auth.role)?;
    Ok(Json(
        state.repo.finance_summary(period.month, period.year).await,
    ))
}

/// list_checkpoints_admin
///
/// [Admin Route] Every configured checkpoint, active or not.
#[utoipa::path(
    get,
    path = "/admin/checkpoints",
    responses((status = 200, description = "Checkpoints", body = [PatrolCheckpoint]))
)]
pub async fn list_checkpoints_admin(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PatrolCheckpoint>>, StatusCode> {
    require_admin(auth.role)?;
    Ok(Json(state.repo.list_checkpoints(false).await))
}

/// create_checkpoint
///
/// [Admin Route] Adds a patrol checkpoint, active by default.
#[utoipa::path(
    post,
    path = "/admin/checkpoints",
    request_body = CreateCheckpointRequest,
    responses((status = 200, description = "Created", body = PatrolCheckpoint))
)]
pub async fn create_checkpoint(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCheckpointRequest>,
) -> Result<Json<PatrolCheckpoint>, StatusCode> {
    require_admin(auth.role)?;
    if payload.name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state
        .repo
        .create_checkpoint(payload)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// set_checkpoint_active
///
/// [Admin Route] Activates or retires a checkpoint without losing its history.
#[utoipa::path(
    put,
    path = "/admin/checkpoints/{id}/active",
    params(("id" = Uuid, Path, description = "Checkpoint ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn set_checkpoint_active(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(active): Json<bool>,
) -> StatusCode {
    if require_admin(auth.role).is_err() {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.set_checkpoint_active(id, active).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// create_announcement
///
/// [Admin Route] Posts a community announcement under the admin's display name.
#[utoipa::path(
    post,
    path = "/admin/announcements",
    request_body = CreateAnnouncementRequest,
    responses((status = 200, description = "Created", body = Announcement))
)]
pub async fn create_announcement(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<Json<Announcement>, StatusCode> {
    require_admin(auth.role)?;
    if payload.title.is_empty() || payload.body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let author = auth.actor_name();
    state
        .repo
        .create_announcement(payload, &author)
        .await
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// delete_announcement
///
/// [Admin Route] Removes an announcement.
#[utoipa::path(
    delete,
    path = "/admin/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_announcement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if require_admin(auth.role).is_err() {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_announcement(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
