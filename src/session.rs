use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Account, HouseholdMember, Role},
    repository::RepositoryState,
};

/// Principal
///
/// The identity handle issued by the external auth provider: a stable id plus the
/// sign-in email. Created at sign-in, destroyed at sign-out, never mutated. The
/// email doubles as the key of the resident-enrichment lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

/// Profile
///
/// The merged account + household view consumed by the access gate. Populated
/// from the account record first; for residents, enriched by the household
/// registry record found under the principal's email, which also takes over the
/// profile id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    pub display_name: Option<String>,
    pub kinship_number: Option<String>,
    pub address_block: Option<String>,
}

impl Profile {
    /// Phase-1 view of a profile, carrying account fields only.
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
            verified: account.verified,
            display_name: account.display_name.clone(),
            kinship_number: account.kinship_number.clone(),
            address_block: account.address_block.clone(),
        }
    }

    /// Phase-2 merge: household fields overwrite their account counterparts and
    /// the registry row id replaces the account id.
    pub fn merge_household(&mut self, member: &HouseholdMember) {
        self.id = member.id;
        self.display_name = Some(member.name.clone());
        self.kinship_number = Some(member.kinship_number.clone());
        self.address_block = Some(member.address_block.clone());
    }

    /// Whether this profile is linked to a household record. An empty kinship
    /// number counts as absent; the gate routes such residents to profile completion.
    pub fn has_household_link(&self) -> bool {
        self.kinship_number.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// ResolutionPhase
///
/// Explicit state of the two-phase profile resolution. Field presence is never
/// used to infer progress; the gate and all other callers branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ResolutionPhase {
    /// No lookup has completed yet.
    #[default]
    Unresolved,
    /// The account record is in; the resident household lookup is still pending.
    AccountResolved,
    /// Resolution finished. Non-resident roles reach this straight from phase 1.
    FullyResolved,
    /// The account record was missing or unreadable; the profile stays absent.
    Failed,
}

/// SessionSnapshot
///
/// The value pushed to gate evaluations and session subscribers: who is signed
/// in, what their merged profile currently looks like, and how far resolution
/// has progressed. A snapshot observed mid-resolution may carry a partial,
/// non-resident-complete profile; `resolving()` is the only correct guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSnapshot {
    pub principal: Option<Principal>,
    pub profile: Option<Profile>,
    pub phase: ResolutionPhase,
}

impl SessionSnapshot {
    /// The signed-out snapshot handed to gate evaluations for anonymous callers.
    pub fn anonymous() -> Self {
        Self {
            principal: None,
            profile: None,
            phase: ResolutionPhase::Unresolved,
        }
    }

    fn resolving_for(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            profile: None,
            phase: ResolutionPhase::Unresolved,
        }
    }

    /// True from the moment a principal is known until resolution reaches a
    /// terminal phase. Anonymous snapshots are never resolving.
    pub fn resolving(&self) -> bool {
        self.principal.is_some()
            && !matches!(
                self.phase,
                ResolutionPhase::FullyResolved | ResolutionPhase::Failed
            )
    }
}

/// SessionView
///
/// Wire shape of GET /session: the snapshot plus the derived `resolving` flag so
/// thin clients don't re-implement the phase arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub principal: Option<Principal>,
    pub profile: Option<Profile>,
    pub phase: ResolutionPhase,
    pub resolving: bool,
}

impl From<SessionSnapshot> for SessionView {
    fn from(snapshot: SessionSnapshot) -> Self {
        let resolving = snapshot.resolving();
        Self {
            principal: snapshot.principal,
            profile: snapshot.profile,
            phase: snapshot.phase,
            resolving,
        }
    }
}

/// SessionStore
///
/// One live session: a watch channel of snapshots plus the background task that
/// runs the two-phase resolution against the repository. Exactly one resolution
/// task is alive per store; `refresh` tears the previous one down before
/// spawning the next, which is the only resource-lifetime discipline the
/// session layer needs. No timeout wraps the lookups: a hung repository leaves
/// the snapshot resolving until the store is refreshed or torn down.
pub struct SessionStore {
    principal: Principal,
    repo: RepositoryState,
    tx: watch::Sender<SessionSnapshot>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    fn spawn(principal: Principal, repo: RepositoryState) -> Arc<Self> {
        let (tx, _rx) = watch::channel(SessionSnapshot::resolving_for(principal.clone()));
        let store = Arc::new(Self {
            principal,
            repo,
            tx,
            task: Mutex::new(None),
        });
        store.refresh();
        store
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Current snapshot without waiting for resolution to settle.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Push-based subscription used by tests and long-lived watchers.
    /// `Receiver::wait_for` pairs well with `SessionSnapshot::resolving`.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// refresh
    ///
    /// Re-runs the two-phase resolution from scratch. Called on session creation
    /// and whenever a backing account or household record changes, so the change
    /// reaches subscribers before their next navigation decision.
    pub fn refresh(&self) {
        let mut slot = self.task.lock().expect("session task lock poisoned");
        // Stale resolution from a previous principal state is torn down before a
        // new one is established.
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        self.tx
            .send_replace(SessionSnapshot::resolving_for(self.principal.clone()));

        let principal = self.principal.clone();
        let repo = self.repo.clone();
        let tx = self.tx.clone();
        *slot = Some(tokio::spawn(async move {
            resolve(principal, repo, tx).await;
        }));
    }

    fn shutdown(&self) {
        // Tolerates a poisoned lock: shutdown also runs from Drop.
        if let Ok(mut slot) = self.task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// resolve
///
/// The two-phase read-then-merge. Phase 1 reads the account record by principal
/// id; a missing or unreadable record terminates in `Failed` with no profile
/// (surfaced by the gate as the profile-unavailable placeholder, never an
/// auto-redirect). Phase 2 runs only for residents: the household registry is
/// queried by the normalized sign-in email and merged in. An absent or
/// unreadable household record still terminates in `FullyResolved` with the
/// account-only profile; the missing kinship number then drives the
/// profile-completion redirect.
async fn resolve(
    principal: Principal,
    repo: RepositoryState,
    tx: watch::Sender<SessionSnapshot>,
) {
    let Some(account) = repo.get_account(principal.id).await else {
        tracing::warn!(account_id = %principal.id, "account record missing or unreadable");
        tx.send_replace(SessionSnapshot {
            principal: Some(principal),
            profile: None,
            phase: ResolutionPhase::Failed,
        });
        return;
    };

    let mut profile = Profile::from_account(&account);

    if profile.role != Role::Resident {
        // Non-resident roles are fully resolved after the first lookup.
        tx.send_replace(SessionSnapshot {
            principal: Some(principal),
            profile: Some(profile),
            phase: ResolutionPhase::FullyResolved,
        });
        return;
    }

    tx.send_replace(SessionSnapshot {
        principal: Some(principal.clone()),
        profile: Some(profile.clone()),
        phase: ResolutionPhase::AccountResolved,
    });

    let email = principal.email.trim().to_lowercase();
    match repo.find_member_by_email(&email).await {
        Some(member) => profile.merge_household(&member),
        None => {
            tracing::debug!(%email, "no household registry record for resident");
        }
    }

    tx.send_replace(SessionSnapshot {
        principal: Some(principal),
        profile: Some(profile),
        phase: ResolutionPhase::FullyResolved,
    });
}

/// SessionRegistry
///
/// The injectable session-state object shared through AppState: one live
/// SessionStore per signed-in principal, created on first use. Administrative
/// record edits call the `invalidate_*` methods so affected sessions re-resolve
/// and push the fresh snapshot without a client reload.
pub struct SessionRegistry {
    repo: RepositoryState,
    sessions: Mutex<HashMap<Uuid, Arc<SessionStore>>>,
}

impl SessionRegistry {
    pub fn new(repo: RepositoryState) -> Self {
        Self {
            repo,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get-or-create the live session for a principal.
    pub fn session(&self, principal: Principal) -> Arc<SessionStore> {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        sessions
            .entry(principal.id)
            .or_insert_with(|| SessionStore::spawn(principal, self.repo.clone()))
            .clone()
    }

    /// Re-resolve the session backed by this account id, if one is live.
    pub fn invalidate(&self, account_id: Uuid) {
        let store = {
            let sessions = self.sessions.lock().expect("session registry lock poisoned");
            sessions.get(&account_id).cloned()
        };
        if let Some(store) = store {
            store.refresh();
        }
    }

    /// Re-resolve every live session signed in under this email. Household
    /// registry rows are keyed by email, not account id, so registry edits
    /// propagate through here.
    pub fn invalidate_email(&self, email: &str) {
        let needle = email.trim().to_lowercase();
        let stores: Vec<Arc<SessionStore>> = {
            let sessions = self.sessions.lock().expect("session registry lock poisoned");
            sessions
                .values()
                .filter(|s| s.principal().email.trim().to_lowercase() == needle)
                .cloned()
                .collect()
        };
        for store in stores {
            store.refresh();
        }
    }

    /// Tear down a session entirely (sign-out, account deletion).
    pub fn terminate(&self, account_id: Uuid) {
        let removed = {
            let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
            sessions.remove(&account_id)
        };
        if let Some(store) = removed {
            store.shutdown();
        }
    }
}

/// Shared handle stored in AppState.
pub type SessionState = Arc<SessionRegistry>;
