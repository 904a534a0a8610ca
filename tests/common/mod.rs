#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use community_portal::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    models::{
        Account, Announcement, Classified, CompleteProfileRequest, CreateAnnouncementRequest,
        CreateCheckpointRequest, CreateClassifiedRequest, CreateGuestEntryRequest,
        CreateHandoverRequest, CreatePatrolLogRequest, CreatePatrolReportRequest, DashboardStats,
        DuesEntry, FinanceSummary, GuestEntry, HandoverReport, HouseholdMember,
        NewHouseholdMember, PatrolCheckpoint, PatrolLogEntry, PatrolReport, Role,
        UpdateClassifiedRequest, UpdateMemberRequest,
    },
    repository::Repository,
    session::SessionRegistry,
    storage::MockStorageService,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

pub const TEST_ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const TEST_GUARD_ID: Uuid = Uuid::from_u128(2);
pub const TEST_RESIDENT_ID: Uuid = Uuid::from_u128(3);

/// MockRepo
///
/// Central control point for testing the session layer and the handlers: canned
/// outputs behind mutexes so tests can change the backing records mid-test and
/// observe the session registry re-resolve.
pub struct MockRepo {
    /// The single account returned by `get_account` / `get_account_by_email`.
    pub account: Mutex<Option<Account>>,
    pub accounts_list: Vec<Account>,
    /// The household record returned by `find_member_by_email`.
    pub member_by_email: Mutex<Option<HouseholdMember>>,
    pub member_by_id: Mutex<Option<HouseholdMember>>,
    pub members: Vec<HouseholdMember>,
    pub national_id_taken: bool,
    /// Optional gate holding `find_member_by_email` open until notified, so
    /// tests can deterministically observe the intermediate resolution phase.
    pub member_gate: Mutex<Option<Arc<Notify>>>,
    /// Emails the household lookup was queried with, for normalization checks.
    pub member_email_queries: Mutex<Vec<String>>,
    pub dues: Vec<DuesEntry>,
    pub issue_dues_created: i64,
    pub checkpoints: Vec<PatrolCheckpoint>,
    /// Generic success toggle for delete/update bool paths.
    pub bool_result: bool,
    /// Records of mutating calls, for verification.
    pub household_link_updates: Mutex<Vec<(Uuid, String, String)>>,
    pub deleted_accounts: Mutex<Vec<Uuid>>,
}

impl Default for MockRepo {
    fn default() -> Self {
        MockRepo {
            account: Mutex::new(None),
            accounts_list: vec![],
            member_by_email: Mutex::new(None),
            member_by_id: Mutex::new(None),
            members: vec![],
            national_id_taken: false,
            member_gate: Mutex::new(None),
            member_email_queries: Mutex::new(vec![]),
            dues: vec![],
            issue_dues_created: 0,
            checkpoints: vec![],
            bool_result: true,
            household_link_updates: Mutex::new(vec![]),
            deleted_accounts: Mutex::new(vec![]),
        }
    }
}

impl MockRepo {
    pub fn with_account(account: Account) -> Self {
        MockRepo {
            account: Mutex::new(Some(account)),
            ..MockRepo::default()
        }
    }

    pub fn set_account(&self, account: Option<Account>) {
        *self.account.lock().unwrap() = account;
    }

    pub fn set_member_by_email(&self, member: Option<HouseholdMember>) {
        *self.member_by_email.lock().unwrap() = member;
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_account(&self, _id: Uuid) -> Option<Account> {
        self.account.lock().unwrap().clone()
    }
    async fn get_account_by_email(&self, _email: &str) -> Option<Account> {
        self.account.lock().unwrap().clone()
    }
    async fn list_accounts(&self) -> Vec<Account> {
        self.accounts_list.clone()
    }
    async fn create_account(&self, account: Account) -> Option<Account> {
        Some(account)
    }
    async fn update_account_review(&self, id: Uuid, role: Role, verified: bool) -> Option<Account> {
        let mut slot = self.account.lock().unwrap();
        match slot.as_mut() {
            Some(account) if account.id == id => {
                account.role = role;
                account.verified = verified;
                Some(account.clone())
            }
            _ => None,
        }
    }
    async fn update_account_household_link(
        &self,
        id: Uuid,
        kinship_number: &str,
        address_block: &str,
    ) -> bool {
        self.household_link_updates.lock().unwrap().push((
            id,
            kinship_number.to_string(),
            address_block.to_string(),
        ));
        let mut slot = self.account.lock().unwrap();
        if let Some(account) = slot.as_mut() {
            account.kinship_number = Some(kinship_number.to_string());
            account.address_block = Some(address_block.to_string());
        }
        self.bool_result
    }
    async fn delete_account(&self, id: Uuid) -> bool {
        self.deleted_accounts.lock().unwrap().push(id);
        self.bool_result
    }

    async fn find_member_by_email(&self, email: &str) -> Option<HouseholdMember> {
        self.member_email_queries
            .lock()
            .unwrap()
            .push(email.to_string());
        let gate = self.member_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.member_by_email.lock().unwrap().clone()
    }
    async fn get_member(&self, _id: Uuid) -> Option<HouseholdMember> {
        self.member_by_id.lock().unwrap().clone()
    }
    async fn list_members(&self) -> Vec<HouseholdMember> {
        self.members.clone()
    }
    async fn list_household(&self, kinship_number: &str) -> Vec<HouseholdMember> {
        self.members
            .clone()
            .into_iter()
            .filter(|m| m.kinship_number == kinship_number)
            .collect()
    }
    async fn create_member(&self, member: NewHouseholdMember) -> Option<HouseholdMember> {
        Some(HouseholdMember {
            id: Uuid::from_u128(99),
            name: member.name,
            national_id: member.national_id,
            kinship_number: member.kinship_number,
            relationship: member.relationship,
            gender: member.gender,
            occupation: member.occupation,
            marital_status: member.marital_status,
            address_block: member.address_block,
            house_number: member.house_number,
            email: member.email,
            date_of_birth: member.date_of_birth,
            created_at: Utc::now(),
        })
    }
    async fn update_member(&self, _id: Uuid, req: UpdateMemberRequest) -> Option<HouseholdMember> {
        let mut member = self.member_by_id.lock().unwrap().clone()?;
        if let Some(name) = req.name {
            member.name = name;
        }
        if let Some(national_id) = req.national_id {
            member.national_id = national_id;
        }
        Some(member)
    }
    async fn update_member_profile(
        &self,
        id: Uuid,
        req: &CompleteProfileRequest,
    ) -> Option<HouseholdMember> {
        Some(HouseholdMember {
            id,
            name: req.name.clone(),
            national_id: req.national_id.clone(),
            kinship_number: req.kinship_number.clone(),
            relationship: "Head of Household".to_string(),
            gender: req.gender.clone(),
            occupation: req.occupation.clone(),
            marital_status: req.marital_status.clone(),
            address_block: req.address_block.clone(),
            house_number: req.house_number.clone(),
            email: None,
            date_of_birth: req.date_of_birth,
            created_at: Utc::now(),
        })
    }
    async fn delete_member(&self, _id: Uuid) -> bool {
        self.bool_result
    }
    async fn is_national_id_taken(&self, _national_id: &str, _exclude: Option<Uuid>) -> bool {
        self.national_id_taken
    }

    async fn list_dues_for_period(&self, _month: i32, _year: i32) -> Vec<DuesEntry> {
        self.dues.clone()
    }
    async fn list_dues_for_kinship(&self, kinship_number: &str) -> Vec<DuesEntry> {
        self.dues
            .clone()
            .into_iter()
            .filter(|d| d.kinship_number == kinship_number)
            .collect()
    }
    async fn issue_dues(&self, _month: i32, _year: i32, _amount: i64) -> i64 {
        self.issue_dues_created
    }
    async fn mark_dues_paid(&self, _id: Uuid) -> Option<DuesEntry> {
        self.dues.first().cloned()
    }
    async fn finance_summary(&self, month: i32, year: i32) -> FinanceSummary {
        FinanceSummary {
            month,
            year,
            ..FinanceSummary::default()
        }
    }

    async fn list_checkpoints(&self, only_active: bool) -> Vec<PatrolCheckpoint> {
        self.checkpoints
            .clone()
            .into_iter()
            .filter(|c| c.active || !only_active)
            .collect()
    }
    async fn create_checkpoint(&self, req: CreateCheckpointRequest) -> Option<PatrolCheckpoint> {
        Some(PatrolCheckpoint {
            id: Uuid::from_u128(7),
            name: req.name,
            description: req.description,
            position: req.position,
            active: true,
        })
    }
    async fn set_checkpoint_active(&self, _id: Uuid, _active: bool) -> bool {
        self.bool_result
    }
    async fn create_patrol_log(
        &self,
        req: CreatePatrolLogRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<PatrolLogEntry> {
        Some(PatrolLogEntry {
            id: Uuid::from_u128(8),
            checkpoint_id: req.checkpoint_id,
            guard_id,
            guard_name: guard_name.to_string(),
            condition: req.condition,
            note: req.note,
            photo_key: req.photo_key,
            logged_at: Utc::now(),
        })
    }
    async fn list_patrol_logs_since(&self, _since: DateTime<Utc>) -> Vec<PatrolLogEntry> {
        vec![]
    }
    async fn create_patrol_report(
        &self,
        req: CreatePatrolReportRequest,
        officer: &str,
    ) -> Option<PatrolReport> {
        Some(PatrolReport {
            id: Uuid::from_u128(9),
            shift: req.shift,
            body: req.body,
            officer: officer.to_string(),
            reported_at: Utc::now(),
        })
    }
    async fn list_patrol_reports(&self, _limit: i64) -> Vec<PatrolReport> {
        vec![]
    }

    async fn create_guest_entry(
        &self,
        req: CreateGuestEntryRequest,
        guard_id: Uuid,
        guard_name: &str,
    ) -> Option<GuestEntry> {
        Some(GuestEntry {
            id: Uuid::from_u128(10),
            guest_name: req.guest_name,
            id_card_number: req.id_card_number,
            vehicle_plate: req.vehicle_plate,
            destination: req.destination,
            purpose: req.purpose,
            id_photo_key: req.id_photo_key,
            guard_id,
            guard_name: guard_name.to_string(),
            entered_at: Utc::now(),
        })
    }
    async fn list_guest_entries(&self, _limit: i64) -> Vec<GuestEntry> {
        vec![]
    }

    async fn create_handover(
        &self,
        req: CreateHandoverRequest,
        officer: &str,
    ) -> Option<HandoverReport> {
        Some(HandoverReport {
            id: Uuid::from_u128(11),
            shift: req.shift,
            condition: req.condition,
            incidents: req.incidents.unwrap_or_else(|| "No notable incidents".to_string()),
            inventory: req.inventory.unwrap_or_else(|| "Complete per checklist".to_string()),
            officer: officer.to_string(),
            created_at: Utc::now(),
        })
    }
    async fn list_handovers(&self, _limit: i64) -> Vec<HandoverReport> {
        vec![]
    }

    async fn create_announcement(
        &self,
        req: CreateAnnouncementRequest,
        author: &str,
    ) -> Option<Announcement> {
        Some(Announcement {
            id: Uuid::from_u128(12),
            title: req.title,
            body: req.body,
            author: author.to_string(),
            created_at: Utc::now(),
        })
    }
    async fn list_announcements(&self) -> Vec<Announcement> {
        vec![]
    }
    async fn delete_announcement(&self, _id: Uuid) -> bool {
        self.bool_result
    }

    async fn create_classified(
        &self,
        req: CreateClassifiedRequest,
        creator_email: &str,
        creator_name: &str,
    ) -> Option<Classified> {
        Some(Classified {
            id: Uuid::from_u128(13),
            title: req.title,
            description: req.description,
            creator_email: creator_email.to_string(),
            creator_name: creator_name.to_string(),
            created_at: Utc::now(),
        })
    }
    async fn list_classifieds(&self) -> Vec<Classified> {
        vec![]
    }
    async fn update_classified(
        &self,
        id: Uuid,
        creator_email: &str,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified> {
        // The mock honors the ownership contract: only "their own" ad updates.
        if creator_email != "owner@example.com" {
            return None;
        }
        Some(Classified {
            id,
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            creator_email: creator_email.to_string(),
            creator_name: "Owner".to_string(),
            created_at: Utc::now(),
        })
    }
    async fn update_classified_admin(
        &self,
        id: Uuid,
        req: UpdateClassifiedRequest,
    ) -> Option<Classified> {
        Some(Classified {
            id,
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            creator_email: "someone@example.com".to_string(),
            creator_name: "Someone".to_string(),
            created_at: Utc::now(),
        })
    }
    async fn delete_classified(&self, _id: Uuid, creator_email: &str) -> bool {
        creator_email == "owner@example.com" && self.bool_result
    }
    async fn delete_classified_admin(&self, _id: Uuid) -> bool {
        self.bool_result
    }

    async fn get_stats(&self, _month: i32, _year: i32) -> DashboardStats {
        DashboardStats {
            total_residents: 42,
            ..DashboardStats::default()
        }
    }
}

// --- Builders ---

pub fn account(id: Uuid, role: Role, verified: bool) -> Account {
    Account {
        id,
        email: format!("user-{id}@example.com"),
        role,
        verified,
        display_name: Some("Test User".to_string()),
        kinship_number: None,
        address_block: None,
    }
}

pub fn member(kinship_number: &str, email: Option<&str>) -> HouseholdMember {
    HouseholdMember {
        id: Uuid::from_u128(77),
        name: "Head Example".to_string(),
        national_id: "3201010101010001".to_string(),
        kinship_number: kinship_number.to_string(),
        relationship: "Head of Household".to_string(),
        gender: Some("F".to_string()),
        occupation: None,
        marital_status: None,
        address_block: "B".to_string(),
        house_number: Some("12".to_string()),
        email: email.map(str::to_string),
        date_of_birth: None,
        created_at: Utc::now(),
    }
}

/// Creates an AppState over a shared mock repo so tests can mutate the backing
/// records mid-test.
pub fn create_test_state(repo: Arc<MockRepo>, storage: MockStorageService) -> AppState {
    let repo_state: Arc<dyn Repository> = repo;
    AppState {
        repo: repo_state.clone(),
        storage: Arc::new(storage),
        sessions: Arc::new(SessionRegistry::new(repo_state)),
        config: AppConfig::default(),
    }
}

// Pre-built identities for handler calls.

pub fn admin_user() -> AuthUser {
    AuthUser {
        id: TEST_ADMIN_ID,
        email: "admin@example.com".to_string(),
        role: Role::Admin,
        display_name: Some("Admin".to_string()),
    }
}

pub fn guard_user() -> AuthUser {
    AuthUser {
        id: TEST_GUARD_ID,
        email: "guard@example.com".to_string(),
        role: Role::Guard,
        display_name: Some("Guard".to_string()),
    }
}

pub fn resident_user() -> AuthUser {
    AuthUser {
        id: TEST_RESIDENT_ID,
        email: "owner@example.com".to_string(),
        role: Role::Resident,
        display_name: Some("Resident".to_string()),
    }
}
