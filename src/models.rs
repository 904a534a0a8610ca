use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Role-Based Access Control ---

/// Role
///
/// The three access roles recognized by the portal. Stored as lowercase text in
/// the `accounts` table and carried through every authorization decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    /// Community administrator: verification review, dues management, moderation.
    Admin,
    /// Security guard: patrols, guest book, shift handover.
    Guard,
    /// Household member. The only role whose profile is enriched from the
    /// household registry after sign-in.
    #[default]
    Resident,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guard => "guard",
            Role::Resident => "resident",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion used by the `#[sqlx(try_from = "String")]` field attribute so the
/// role column can live in a plain TEXT column.
impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "guard" => Ok(Role::Guard),
            "resident" => Ok(Role::Resident),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// Account
///
/// The canonical sign-in identity record stored in the `accounts` table, mirroring
/// the external auth provider's user by primary key. This is the first of the two
/// records merged into the session profile; `kinship_number` and `address_block`
/// are synced here from the household registry when a resident completes their profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Account {
    // Primary Key, also the Foreign Key to the external auth provider's user id.
    pub id: Uuid,
    pub email: String,
    // The RBAC field: 'admin', 'guard' or 'resident'.
    #[sqlx(try_from = "String")]
    pub role: Role,
    // Administrative approval flag. Unverified accounts are held at the
    // verification-pending page by the access gate.
    pub verified: bool,
    pub display_name: Option<String>,
    // Family-registry number linking this account to a household record.
    pub kinship_number: Option<String>,
    pub address_block: Option<String>,
}

/// HouseholdMember
///
/// A row of the resident registry (`household_members` table). Heads of household
/// carry the sign-in email; family members added under the same kinship number
/// have no login of their own.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HouseholdMember {
    pub id: Uuid,
    pub name: String,
    // National identity number; unique across the registry.
    pub national_id: String,
    // Family registry number shared by everyone in the household.
    pub kinship_number: String,
    // 'Head of Household', 'Spouse', 'Child', ...
    pub relationship: String,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub marital_status: Option<String>,
    pub address_block: String,
    pub house_number: Option<String>,
    // Present only for heads of household (their sign-in email).
    pub email: Option<String>,
    #[ts(type = "string")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Dues ---

/// DuesStatus
///
/// Payment state of one monthly dues entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DuesStatus {
    Paid,
    #[default]
    Outstanding,
}

impl DuesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuesStatus::Paid => "paid",
            DuesStatus::Outstanding => "outstanding",
        }
    }
}

impl TryFrom<String> for DuesStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "paid" => Ok(DuesStatus::Paid),
            "outstanding" => Ok(DuesStatus::Outstanding),
            other => Err(format!("unknown dues status: {other}")),
        }
    }
}

/// DuesEntry
///
/// One household's dues for one month (`dues` table). Issued per head of household
/// by the admin billing sweep; `amount` is in whole rupiah.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct DuesEntry {
    pub id: Uuid,
    pub kinship_number: String,
    // Display name of the billed head of household.
    pub household_head: String,
    // 1-12.
    pub month: i32,
    pub year: i32,
    pub amount: i64,
    #[sqlx(try_from = "String")]
    pub status: DuesStatus,
    #[ts(type = "string")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// FinanceSummary
///
/// Aggregated dues figures for one billing period (GET /admin/finance-report).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FinanceSummary {
    pub month: i32,
    pub year: i32,
    pub billed: i64,
    pub collected: i64,
    pub outstanding: i64,
    pub paid_entries: i64,
    pub unpaid_entries: i64,
}

// --- Security: Patrols, Guest Book, Handover ---

/// PatrolCheckpoint
///
/// A configured patrol checkpoint (`patrol_checkpoints` table). Guards walk the
/// active checkpoints in `position` order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PatrolCheckpoint {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Walk order; stored as `sort_order` ("position" is reserved in SQL).
    #[sqlx(rename = "sort_order")]
    pub position: i32,
    pub active: bool,
}

/// PatrolLogEntry
///
/// A single checkpoint pass recorded by a guard (`patrol_logs` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PatrolLogEntry {
    pub id: Uuid,
    pub checkpoint_id: Uuid,
    pub guard_id: Uuid,
    pub guard_name: String,
    // 'All Clear' or 'Findings' (free text, mirrored by the client UI).
    pub condition: String,
    pub note: Option<String>,
    // S3 key of the photo taken at the checkpoint.
    pub photo_key: Option<String>,
    #[ts(type = "string")]
    pub logged_at: DateTime<Utc>,
}

/// PatrolReport
///
/// Free-text patrol shift report (`patrol_reports` table), distinct from the
/// per-checkpoint log above.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PatrolReport {
    pub id: Uuid,
    pub shift: String,
    pub body: String,
    pub officer: String,
    #[ts(type = "string")]
    pub reported_at: DateTime<Utc>,
}

/// GuestEntry
///
/// A visitor logged at the gate (`guest_entries` table). The ID-card photo is
/// uploaded through the presigned-URL flow and referenced here by key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GuestEntry {
    pub id: Uuid,
    pub guest_name: String,
    pub id_card_number: String,
    pub vehicle_plate: Option<String>,
    // Which house/block the guest is visiting.
    pub destination: String,
    pub purpose: String,
    pub id_photo_key: String,
    pub guard_id: Uuid,
    pub guard_name: String,
    #[ts(type = "string")]
    pub entered_at: DateTime<Utc>,
}

/// HandoverReport
///
/// End-of-shift handover filed by the outgoing guard (`handover_reports` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HandoverReport {
    pub id: Uuid,
    pub shift: String,
    pub condition: String,
    pub incidents: String,
    pub inventory: String,
    pub officer: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Announcements & Classifieds ---

/// Announcement
///
/// Community-wide notice posted by an administrator (`announcements` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Classified
///
/// Resident-posted classified ad (`classifieds` table). Ownership is tracked by
/// the creator's email; admins may moderate any ad.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Classified {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub creator_email: String,
    pub creator_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public self-registration endpoint (POST /register).
/// Note: The password is only passed through to the external auth provider and never
/// persisted or logged internally by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// PasswordResetRequest
///
/// Input payload for POST /password-reset; proxied to the provider's recovery flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// CreateAccountRequest
///
/// Admin payload for provisioning a login (POST /admin/accounts): creates the
/// provider identity first, then mirrors the unverified account record locally.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub kinship_number: Option<String>,
    pub address_block: Option<String>,
}

/// AccountReviewRequest
///
/// Admin payload for the verification review screen (PUT /admin/accounts/{id}/review):
/// assigns the role and flips the verified flag in one step.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AccountReviewRequest {
    pub role: Role,
    pub verified: bool,
}

/// CompleteProfileRequest
///
/// Payload for PUT /me/profile. A resident submits their head-of-household data;
/// the registry record is upserted and the kinship number + address are synced
/// back onto the account so the gate stops routing them to profile completion.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CompleteProfileRequest {
    pub name: String,
    pub national_id: String,
    pub kinship_number: String,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub marital_status: Option<String>,
    pub address_block: String,
    pub house_number: Option<String>,
    #[ts(type = "string")]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// CreateMemberRequest
///
/// Payload for POST /members. Residents add family members under their own
/// household link; admins register new heads of household with an explicit
/// kinship number, address and login email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMemberRequest {
    pub name: String,
    pub national_id: String,
    pub relationship: Option<String>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub marital_status: Option<String>,
    // Admin-only fields; ignored for resident callers, who inherit their own link.
    pub kinship_number: Option<String>,
    pub address_block: Option<String>,
    pub email: Option<String>,
    #[ts(type = "string")]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// UpdateMemberRequest
///
/// Partial update payload for a registry row (PUT /members/{id}).
///
/// *Optimization*: Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates, ensuring only provided fields are included in the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateMemberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinship_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_block: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// NewHouseholdMember
///
/// Fully resolved insert payload for the registry, assembled by the handlers
/// after the role-dependent defaulting (residents inherit their own household
/// link and may not set a login email; admins provide everything).
#[derive(Debug, Clone, Default)]
pub struct NewHouseholdMember {
    pub name: String,
    pub national_id: String,
    pub kinship_number: String,
    pub relationship: String,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub marital_status: Option<String>,
    pub address_block: String,
    pub house_number: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// IssueDuesRequest
///
/// Admin payload for the billing sweep (POST /admin/dues/issue): creates the
/// period's dues for every head of household not yet billed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct IssueDuesRequest {
    pub month: i32,
    pub year: i32,
    // Falls back to the community's standard monthly amount when omitted.
    pub amount: Option<i64>,
}

/// CreateCheckpointRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCheckpointRequest {
    pub name: String,
    pub description: Option<String>,
    pub position: i32,
}

/// CreatePatrolLogRequest
///
/// A guard marking one checkpoint as passed, optionally with a finding note and
/// the S3 key of the photo taken on the spot.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePatrolLogRequest {
    pub checkpoint_id: Uuid,
    pub condition: String,
    pub note: Option<String>,
    pub photo_key: Option<String>,
}

/// CreatePatrolReportRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePatrolReportRequest {
    pub shift: String,
    pub body: String,
}

/// CreateGuestEntryRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateGuestEntryRequest {
    pub guest_name: String,
    pub id_card_number: String,
    pub vehicle_plate: Option<String>,
    pub destination: String,
    pub purpose: String,
    // Key returned by the presigned upload flow; the ID photo is mandatory.
    pub id_photo_key: String,
}

/// CreateHandoverRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateHandoverRequest {
    pub shift: String,
    pub condition: String,
    pub incidents: Option<String>,
    pub inventory: Option<String>,
}

/// CreateAnnouncementRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
}

/// CreateClassifiedRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateClassifiedRequest {
    pub title: String,
    pub description: String,
}

/// UpdateClassifiedRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateClassifiedRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL (POST /upload/presigned).
/// The server uses these fields to set security constraints on the generated URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "guest_id.jpg")]
    pub filename: String,
    /// The MIME type, used to constrain the S3 upload to the allowed type (security).
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// Output schema containing the secure, temporary URL for client-to-cloud file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The S3 object key where the file will be stored (referenced by guest/patrol records).
    pub resource_key: String,
}

// --- Dashboard Schemas (Output) ---

/// DashboardStats
///
/// Output schema for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_residents: i64,
    pub total_households: i64,
    /// Accounts still waiting for verification review.
    pub pending_verifications: i64,
    /// Unpaid dues entries for the current billing period.
    pub outstanding_dues: i64,
    pub guests_today: i64,
}
