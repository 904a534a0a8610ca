use crate::models::{
    Account, Announcement, Classified, CompleteProfileRequest, CreateAnnouncementRequest,
    CreateCheckpointRequest, CreateClassifiedRequest, CreateGuestEntryRequest,
    CreateHandoverRequest, CreatePatrolLogRequest, CreatePatrolReportRequest, DashboardStats,
    DuesEntry, FinanceSummary, GuestEntry, HandoverReport, HouseholdMember, NewHouseholdMember,
    PatrolCheckpoint, PatrolLogEntry, PatrolReport, Role, UpdateClassifiedRequest,
    UpdateMemberRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers and the session layer to interact with the data without knowing the
/// concrete implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts (session phase 1 + administration) ---
    // Read path used by both the auth extractor and session resolution; a read
    // error degrades to None, which the session layer reports as Failed.
    async fn get_account(&self, id: Uuid) -> Option<Account>;
    // Orphan-identity recovery during provisioning.
    async fn get_account_by_email(&self, email: &str) -> Option<Account>;
    async fn list_accounts(&self) -> Vec<Account>;
    async fn create_account(&self, account: Account) -> Option<Account>;
    // Verification review: assigns role + verified in one step.
    async fn update_account_review(&self, id: Uuid, role: Role, verified: bool)
    -> Option<Account>;
    // Profile completion syncs the household link onto the account record.
    async fn update_account_household_link(
        &self,
        id: Uuid,
        kinship_number: &str,
        address_block: &str,
    ) -> bool;
    async fn delete_account(&self, id: Uuid) -> bool;

    // --- Household registry (session phase 2 + resident CRUD) ---
    // Session phase 2: the resident-enrichment record, keyed by normalized email.
    async fn find_member_by_email(&self, email: &str) -> Option<HouseholdMember>;
    async fn get_member(&self, id: Uuid) -> Option<HouseholdMember>;
    async fn list_members(&self) -> Vec<HouseholdMember>;
    // A resident's scoped view: only their own household.
    async fn list_household(&self, kinship_number: &str) -> Vec<HouseholdMember>;
    async fn create_member(&self, member: NewHouseholdMember) -> Option<HouseholdMember>;
    // Partial update using COALESCE; only provided fields change.
    async fn update_member(&self, id: Uuid, req: UpdateMemberRequest) -> Option<HouseholdMember>;
    // Head-of-household update driven by the profile-completion flow.
    async fn update_member_profile(
        &self,
        id: Uuid,
        req: &CompleteProfileRequest,
    ) -> Option<HouseholdMember>;
    async fn delete_member(&self, id: Uuid) -> bool;
    // National-id uniqueness check, optionally excluding the row being edited.
    async fn is_national_id_taken(&self, national_id: &str, exclude: Option<Uuid>) -> bool;

    // --- Dues ---
    async fn list_dues_for_period(&self, month: i32, year: i32) -> Vec<DuesEntry>;
    async fn list_dues_for_kinship(&self, kinship_number: &str) -> Vec<DuesEntry>;
    // Billing sweep: one entry per head of household not yet billed this period.
    // Returns the number of entries created.
    async fn issue_dues(&self, month: i32, year: i32, amount: i64) -> i64;
    async fn mark_dues_paid(&self, id: Uuid) -> Option<DuesEntry>;
    async fn finance_summary(&self, month: i32, year: i32) -> FinanceSummary;

    // --- Security: patrol ---
    async fn list_checkpoints(&self, only_active: bool) -> Vec<PatrolCheckpoint>;
    async fn create_checkpoint(&self, req: CreateCheckpointRequest) -> Option<PatrolCheckpoint>;
    async fn set_checkpoint_active(&self, id: Uuid, active: bool) -> bool;
    async fn create_patrol_log(
        &self,
        req: CreatePatrolLogRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<PatrolLogEntry>;
    async fn list_patrol_logs_since(&self, since: DateTime<Utc>) -> Vec<PatrolLogEntry>;
    async fn create_patrol_report(
        &self,
        req: CreatePatrolReportRequest,
        officer: &str,
    ) -> Option<PatrolReport>;
    async fn list_patrol_reports(&self, limit: i64) -> Vec<PatrolReport>;

    // --- Security: guest book ---
    async fn create_guest_entry(
        &self,
        req: CreateGuestEntryRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<GuestEntry>;
    async fn list_guest_entries(&self, limit: i64) -> Vec<GuestEntry>;

    // --- Security: shift handover ---
    async fn create_handover(
        &self,
        req: CreateHandoverRequest,
        officer: &str,
    ) -> Option<HandoverReport>;
    async fn list_handovers(&self, limit: i64) -> Vec<HandoverReport>;

    // --- Announcements ---
    async fn create_announcement(
        &self,
        req: CreateAnnouncementRequest,
        author: &str,
    ) -> Option<Announcement>;
    async fn list_announcements(&self) -> Vec<Announcement>;
    async fn delete_announcement(&self, id: Uuid) -> bool;

    // --- Classifieds ---
    async fn create_classified(
        &self,
        req: CreateClassifiedRequest,
        creator_email: &str,
        creator_name: &str,
    ) -> Option<Classified>;
    async fn list_classifieds(&self) -> Vec<Classified>;
    /// Owner edit: updates only when `creator_email` matches.
    async fn update_classified(
        &self,
        id: Uuid,
        creator_email: &str,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified>;
    /// Admin override: edit ANY classified (no ownership check).
    async fn update_classified_admin(
        &self,
        id: Uuid,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified>;
    /// Owner delete: removes only when `creator_email` matches.
    async fn delete_classified(&self, id: Uuid, creator_email: &str) -> bool;
    /// Admin override: delete ANY classified (no ownership check).
    async fn delete_classified_admin(&self, id: Uuid) -> bool;

    // --- Dashboard ---
    async fn get_stats(&self, month: i32, year: i32) -> DashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, role, verified, display_name, kinship_number, address_block";

const MEMBER_COLUMNS: &str = "id, name, national_id, kinship_number, relationship, gender, \
     occupation, marital_status, address_block, house_number, email, date_of_birth, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- Accounts ---

    async fn get_account(&self, id: Uuid) -> Option<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_account error: {:?}", e);
            None
        })
    }

    async fn get_account_by_email(&self, email: &str) -> Option<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_account_by_email error: {:?}", e);
            None
        })
    }

    async fn list_accounts(&self) -> Vec<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY verified ASC, email ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_accounts error: {:?}", e);
            vec![]
        })
    }

    async fn create_account(&self, account: Account) -> Option<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, email, role, verified, display_name, kinship_number, address_block) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account.id)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(account.verified)
        .bind(&account.display_name)
        .bind(&account.kinship_number)
        .bind(&account.address_block)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_account error: {:?}", e);
            None
        })
    }

    async fn update_account_review(
        &self,
        id: Uuid,
        role: Role,
        verified: bool,
    ) -> Option<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET role = $2, verified = $3 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .bind(verified)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_account_review error: {:?}", e);
            None
        })
    }

    async fn update_account_household_link(
        &self,
        id: Uuid,
        kinship_number: &str,
        address_block: &str,
    ) -> bool {
        match sqlx::query(
            "UPDATE accounts SET kinship_number = $2, address_block = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(kinship_number)
        .bind(address_block)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("update_account_household_link error: {:?}", e);
                false
            }
        }
    }

    async fn delete_account(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_account error: {:?}", e);
                false
            }
        }
    }

    // --- Household registry ---

    async fn find_member_by_email(&self, email: &str) -> Option<HouseholdMember> {
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM household_members WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_member_by_email error: {:?}", e);
            None
        })
    }

    async fn get_member(&self, id: Uuid) -> Option<HouseholdMember> {
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM household_members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_member error: {:?}", e);
            None
        })
    }

    async fn list_members(&self) -> Vec<HouseholdMember> {
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM household_members ORDER BY kinship_number ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_members error: {:?}", e);
            vec![]
        })
    }

    async fn list_household(&self, kinship_number: &str) -> Vec<HouseholdMember> {
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM household_members WHERE kinship_number = $1 ORDER BY name ASC"
        ))
        .bind(kinship_number)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_household error: {:?}", e);
            vec![]
        })
    }

    async fn create_member(&self, member: NewHouseholdMember) -> Option<HouseholdMember> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "INSERT INTO household_members \
             (id, name, national_id, kinship_number, relationship, gender, occupation, \
              marital_status, address_block, house_number, email, date_of_birth, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW()) \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(new_id)
        .bind(&member.name)
        .bind(&member.national_id)
        .bind(&member.kinship_number)
        .bind(&member.relationship)
        .bind(&member.gender)
        .bind(&member.occupation)
        .bind(&member.marital_status)
        .bind(&member.address_block)
        .bind(&member.house_number)
        .bind(&member.email)
        .bind(member.date_of_birth)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_member error: {:?}", e);
            None
        })
    }

    async fn update_member(&self, id: Uuid, req: UpdateMemberRequest) -> Option<HouseholdMember> {
        // COALESCE keeps the stored value wherever the request omitted the field.
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "UPDATE household_members \
             SET name = COALESCE($2, name), \
                 national_id = COALESCE($3, national_id), \
                 relationship = COALESCE($4, relationship), \
                 kinship_number = COALESCE($5, kinship_number), \
                 gender = COALESCE($6, gender), \
                 occupation = COALESCE($7, occupation), \
                 marital_status = COALESCE($8, marital_status), \
                 address_block = COALESCE($9, address_block), \
                 house_number = COALESCE($10, house_number), \
                 date_of_birth = COALESCE($11, date_of_birth) \
             WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.national_id)
        .bind(&req.relationship)
        .bind(&req.kinship_number)
        .bind(&req.gender)
        .bind(&req.occupation)
        .bind(&req.marital_status)
        .bind(&req.address_block)
        .bind(&req.house_number)
        .bind(req.date_of_birth)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_member error: {:?}", e);
            None
        })
    }

    async fn update_member_profile(
        &self,
        id: Uuid,
        req: &CompleteProfileRequest,
    ) -> Option<HouseholdMember> {
        sqlx::query_as::<_, HouseholdMember>(&format!(
            "UPDATE household_members \
             SET name = $2, national_id = $3, kinship_number = $4, gender = $5, \
                 occupation = $6, marital_status = $7, address_block = $8, \
                 house_number = $9, date_of_birth = $10 \
             WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.national_id)
        .bind(&req.kinship_number)
        .bind(&req.gender)
        .bind(&req.occupation)
        .bind(&req.marital_status)
        .bind(&req.address_block)
        .bind(&req.house_number)
        .bind(req.date_of_birth)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_member_profile error: {:?}", e);
            None
        })
    }

    async fn delete_member(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM household_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_member error: {:?}", e);
                false
            }
        }
    }

    async fn is_national_id_taken(&self, national_id: &str, exclude: Option<Uuid>) -> bool {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM household_members WHERE national_id = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(national_id)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("is_national_id_taken error: {:?}", e);
            0
        });
        count > 0
    }

    // --- Dues ---

    async fn list_dues_for_period(&self, month: i32, year: i32) -> Vec<DuesEntry> {
        sqlx::query_as::<_, DuesEntry>(
            "SELECT id, kinship_number, household_head, month, year, amount, status, paid_at \
             FROM dues WHERE month = $1 AND year = $2 ORDER BY household_head ASC",
        )
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_dues_for_period error: {:?}", e);
            vec![]
        })
    }

    async fn list_dues_for_kinship(&self, kinship_number: &str) -> Vec<DuesEntry> {
        sqlx::query_as::<_, DuesEntry>(
            "SELECT id, kinship_number, household_head, month, year, amount, status, paid_at \
             FROM dues WHERE kinship_number = $1 ORDER BY year DESC, month DESC",
        )
        .bind(kinship_number)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_dues_for_kinship error: {:?}", e);
            vec![]
        })
    }

    async fn issue_dues(&self, month: i32, year: i32, amount: i64) -> i64 {
        // One statement bills every head of household not yet billed for the
        // period, so re-running the sweep is harmless.
        match sqlx::query(
            "INSERT INTO dues (id, kinship_number, household_head, month, year, amount, status) \
             SELECT gen_random_uuid(), m.kinship_number, m.name, $1, $2, $3, 'outstanding' \
             FROM household_members m \
             WHERE m.relationship = 'Head of Household' \
               AND NOT EXISTS (SELECT 1 FROM dues d \
                               WHERE d.kinship_number = m.kinship_number \
                                 AND d.month = $1 AND d.year = $2)",
        )
        .bind(month)
        .bind(year)
        .bind(amount)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() as i64,
            Err(e) => {
                tracing::error!("issue_dues error: {:?}", e);
                0
            }
        }
    }

    async fn mark_dues_paid(&self, id: Uuid) -> Option<DuesEntry> {
        sqlx::query_as::<_, DuesEntry>(
            "UPDATE dues SET status = 'paid', paid_at = NOW() WHERE id = $1 \
             RETURNING id, kinship_number, household_head, month, year, amount, status, paid_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("mark_dues_paid error: {:?}", e);
            None
        })
    }

    async fn finance_summary(&self, month: i32, year: i32) -> FinanceSummary {
        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT, \
                    COALESCE(SUM(amount) FILTER (WHERE status = 'paid'), 0)::BIGINT, \
                    COUNT(*) FILTER (WHERE status = 'paid'), \
                    COUNT(*) FILTER (WHERE status = 'outstanding') \
             FROM dues WHERE month = $1 AND year = $2",
        )
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("finance_summary error: {:?}", e);
            None
        });

        let (billed, collected, paid_entries, unpaid_entries) = row.unwrap_or((0, 0, 0, 0));
        FinanceSummary {
            month,
            year,
            billed,
            collected,
            outstanding: billed - collected,
            paid_entries,
            unpaid_entries,
        }
    }

    // --- Security: patrol ---

    async fn list_checkpoints(&self, only_active: bool) -> Vec<PatrolCheckpoint> {
        sqlx::query_as::<_, PatrolCheckpoint>(
            "SELECT id, name, description, sort_order, active FROM patrol_checkpoints \
             WHERE active = true OR $1 = false ORDER BY sort_order ASC",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_checkpoints error: {:?}", e);
            vec![]
        })
    }

    async fn create_checkpoint(&self, req: CreateCheckpointRequest) -> Option<PatrolCheckpoint> {
        sqlx::query_as::<_, PatrolCheckpoint>(
            "INSERT INTO patrol_checkpoints (id, name, description, sort_order, active) \
             VALUES ($1, $2, $3, $4, true) RETURNING id, name, description, sort_order, active",
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.position)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_checkpoint error: {:?}", e);
            None
        })
    }

    async fn set_checkpoint_active(&self, id: Uuid, active: bool) -> bool {
        match sqlx::query("UPDATE patrol_checkpoints SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_checkpoint_active error: {:?}", e);
                false
            }
        }
    }

    async fn create_patrol_log(
        &self,
        req: CreatePatrolLogRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<PatrolLogEntry> {
        sqlx::query_as::<_, PatrolLogEntry>(
            "INSERT INTO patrol_logs (id, checkpoint_id, guard_id, guard_name, condition, note, photo_key, logged_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             RETURNING id, checkpoint_id, guard_id, guard_name, condition, note, photo_key, logged_at",
        )
        .bind(Uuid::new_v4())
        .bind(req.checkpoint_id)
        .bind(guard_id)
        .bind(guard_name)
        .bind(&req.condition)
        .bind(&req.note)
        .bind(&req.photo_key)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_patrol_log error: {:?}", e);
            None
        })
    }

    async fn list_patrol_logs_since(&self, since: DateTime<Utc>) -> Vec<PatrolLogEntry> {
        sqlx::query_as::<_, PatrolLogEntry>(
            "SELECT id, checkpoint_id, guard_id, guard_name, condition, note, photo_key, logged_at \
             FROM patrol_logs WHERE logged_at >= $1 ORDER BY logged_at ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_patrol_logs_since error: {:?}", e);
            vec![]
        })
    }

    async fn create_patrol_report(
        &self,
        req: CreatePatrolReportRequest,
        officer: &str,
    ) -> Option<PatrolReport> {
        sqlx::query_as::<_, PatrolReport>(
            "INSERT INTO patrol_reports (id, shift, body, officer, reported_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING id, shift, body, officer, reported_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.shift)
        .bind(&req.body)
        .bind(officer)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_patrol_report error: {:?}", e);
            None
        })
    }

    async fn list_patrol_reports(&self, limit: i64) -> Vec<PatrolReport> {
        sqlx::query_as::<_, PatrolReport>(
            "SELECT id, shift, body, officer, reported_at FROM patrol_reports \
             ORDER BY reported_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_patrol_reports error: {:?}", e);
            vec![]
        })
    }

    // --- Security: guest book ---

    async fn create_guest_entry(
        &self,
        req: CreateGuestEntryRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<GuestEntry> {
        sqlx::query_as::<_, GuestEntry>(
            "INSERT INTO guest_entries \
             (id, guest_name, id_card_number, vehicle_plate, destination, purpose, id_photo_key, guard_id, guard_name, entered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             RETURNING id, guest_name, id_card_number, vehicle_plate, destination, purpose, id_photo_key, guard_id, guard_name, entered_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.guest_name)
        .bind(&req.id_card_number)
        .bind(&req.vehicle_plate)
        .bind(&req.destination)
        .bind(&req.purpose)
        .bind(&req.id_photo_key)
        .bind(guard_id)
        .bind(guard_name)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_guest_entry error: {:?}", e);
            None
        })
    }

    async fn list_guest_entries(&self, limit: i64) -> Vec<GuestEntry> {
        sqlx::query_as::<_, GuestEntry>(
            "SELECT id, guest_name, id_card_number, vehicle_plate, destination, purpose, \
                    id_photo_key, guard_id, guard_name, entered_at \
             FROM guest_entries ORDER BY entered_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_guest_entries error: {:?}", e);
            vec![]
        })
    }

    // --- Security: shift handover ---

    async fn create_handover(
        &self,
        req: CreateHandoverRequest,
        officer: &str,
    ) -> Option<HandoverReport> {
        sqlx::query_as::<_, HandoverReport>(
            "INSERT INTO handover_reports (id, shift, condition, incidents, inventory, officer, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING id, shift, condition, incidents, inventory, officer, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.shift)
        .bind(&req.condition)
        .bind(req.incidents.as_deref().unwrap_or("No notable incidents"))
        .bind(req.inventory.as_deref().unwrap_or("Complete per checklist"))
        .bind(officer)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_handover error: {:?}", e);
            None
        })
    }

    async fn list_handovers(&self, limit: i64) -> Vec<HandoverReport> {
        sqlx::query_as::<_, HandoverReport>(
            "SELECT id, shift, condition, incidents, inventory, officer, created_at \
             FROM handover_reports ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_handovers error: {:?}", e);
            vec![]
        })
    }

    // --- Announcements ---

    async fn create_announcement(
        &self,
        req: CreateAnnouncementRequest,
        author: &str,
    ) -> Option<Announcement> {
        sqlx::query_as::<_, Announcement>(
            "INSERT INTO announcements (id, title, body, author, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING id, title, body, author, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.body)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_announcement error: {:?}", e);
            None
        })
    }

    async fn list_announcements(&self) -> Vec<Announcement> {
        sqlx::query_as::<_, Announcement>(
            "SELECT id, title, body, author, created_at FROM announcements ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_announcements error: {:?}", e);
            vec![]
        })
    }

    async fn delete_announcement(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_announcement error: {:?}", e);
                false
            }
        }
    }

    // --- Classifieds ---

    async fn create_classified(
        &self,
        req: CreateClassifiedRequest,
        creator_email: &str,
        creator_name: &str,
    ) -> Option<Classified> {
        sqlx::query_as::<_, Classified>(
            "INSERT INTO classifieds (id, title, description, creator_email, creator_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             RETURNING id, title, description, creator_email, creator_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.description)
        .bind(creator_email)
        .bind(creator_name)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_classified error: {:?}", e);
            None
        })
    }

    async fn list_classifieds(&self) -> Vec<Classified> {
        sqlx::query_as::<_, Classified>(
            "SELECT id, title, description, creator_email, creator_name, created_at \
             FROM classifieds ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_classifieds error: {:?}", e);
            vec![]
        })
    }

    async fn update_classified(
        &self,
        id: Uuid,
        creator_email: &str,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified> {
        sqlx::query_as::<_, Classified>(
            "UPDATE classifieds SET title = COALESCE($3, title), description = COALESCE($4, description) \
             WHERE id = $1 AND lower(creator_email) = lower($2) \
             RETURNING id, title, description, creator_email, creator_name, created_at",
        )
        .bind(id)
        .bind(creator_email)
        .bind(&req.title)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_classified error: {:?}", e);
            None
        })
    }

    async fn update_classified_admin(
        &self,
        id: Uuid,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified> {
        sqlx::query_as::<_, Classified>(
            "UPDATE classifieds SET title = COALESCE($2, title), description = COALESCE($3, description) \
             WHERE id = $1 \
             RETURNING id, title, description, creator_email, creator_name, created_at",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_classified_admin error: {:?}", e);
            None
        })
    }

    async fn delete_classified(&self, id: Uuid, creator_email: &str) -> bool {
        match sqlx::query(
            "DELETE FROM classifieds WHERE id = $1 AND lower(creator_email) = lower($2)",
        )
        .bind(id)
        .bind(creator_email)
        .execute(&self.pool)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_classified error: {:?}", e);
                false
            }
        }
    }

    async fn delete_classified_admin(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM classifieds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_classified_admin error: {:?}", e);
                false
            }
        }
    }

    // --- Dashboard ---

    async fn get_stats(&self, month: i32, year: i32) -> DashboardStats {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!("get_stats error: {:?}", e);
                        0
                    })
            }
        };

        let total_residents = count("SELECT COUNT(*) FROM household_members").await;
        let total_households =
            count("SELECT COUNT(DISTINCT kinship_number) FROM household_members").await;
        let pending_verifications =
            count("SELECT COUNT(*) FROM accounts WHERE verified = false").await;
        let outstanding_dues = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM dues WHERE status = 'outstanding' AND month = $1 AND year = $2",
        )
        .bind(month)
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_stats error: {:?}", e);
            0
        });
        let guests_today = count(
            "SELECT COUNT(*) FROM guest_entries WHERE entered_at >= date_trunc('day', NOW())",
        )
        .await;

        DashboardStats {
            total_residents,
            total_households,
            pending_verifications,
            outstanding_dues,
            guests_today,
        }
    }
}
