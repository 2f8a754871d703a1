//! Domain models for directory reconciliation
//!
//! Remote records (`DirectoryUser`, `RemoteUser`) are transient snapshots
//! re-read on every pass. Local records (`LocalAccount`) belong to the
//! identity store; the engine only reads them and requests mutations.

use crate::{error::ErrorKind, ids::AccountId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Lockout Sentinels
// =============================================================================

/// 9999-12-31T23:59:59Z
const FAR_FUTURE_SECS: i64 = 253_402_300_799;

/// 0001-01-01T00:00:00Z
const FAR_PAST_SECS: i64 = -62_135_596_800;

/// Lockout expiry written for blocked users ("locked forever")
pub fn lockout_far_future() -> DateTime<Utc> {
    DateTime::from_timestamp(FAR_FUTURE_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Lockout expiry written when a previously blocked user is unblocked
pub fn lockout_far_past() -> DateTime<Utc> {
    DateTime::from_timestamp(FAR_PAST_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// =============================================================================
// Remote Directory Models
// =============================================================================

/// Account state as reported by the directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteUserState {
    Active,
    Blocked,
    /// Any other provider state, kept verbatim for logging
    Other(String),
}

impl RemoteUserState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Other(s) => s,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

impl From<&str> for RemoteUserState {
    fn from(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "blocked" => Self::Blocked,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for RemoteUserState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<RemoteUserState> for String {
    fn from(value: RemoteUserState) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for RemoteUserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user record exactly as listed by the directory source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Directory-assigned numeric ID
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub state: RemoteUserState,
    /// External/guest flag, when the source reports it inline
    #[serde(default)]
    pub external: bool,
}

/// A directory user prepared for reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub primary_email: String,
    pub state: RemoteUserState,
    /// Display name follows the bot-naming convention
    pub is_bot: bool,
    /// External collaborator or guest account
    pub is_external: bool,
}

impl RemoteUser {
    pub fn is_blocked(&self) -> bool {
        self.state.is_blocked()
    }

    /// Whether this user takes part in reconciliation at all
    pub fn is_reconcilable(&self) -> bool {
        !self.is_bot && !self.is_external
    }
}

// =============================================================================
// Local Identity Store Models
// =============================================================================

/// An account in the local identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAccount {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    /// Account is locked while this lies in the future
    pub lockout_until: Option<DateTime<Utc>>,
}

impl LocalAccount {
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_until.is_some_and(|until| until > now)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }
}

/// Record handed to the identity store when provisioning an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub lockout_until: Option<DateTime<Utc>>,
    /// Host-specific fields filled in by an `AccountExtension`
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl NewAccount {
    /// Seed a new local account from a directory user
    pub fn from_remote(remote: &RemoteUser) -> Self {
        Self {
            username: remote.username.clone(),
            email: remote.primary_email.clone(),
            // Directory-verified addresses are trusted
            email_confirmed: true,
            lockout_until: remote.is_blocked().then(lockout_far_future),
            attributes: HashMap::new(),
        }
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Which step of the matching chain produced the hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "email", rename_all = "snake_case")]
pub enum MatchedBy {
    Username,
    PrimaryEmail,
    HistoricalEmail(String),
}

/// Result of resolving a remote user against the identity store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Found {
        account: LocalAccount,
        matched_by: MatchedBy,
    },
    NotFound,
}

impl MatchResult {
    pub fn account(&self) -> Option<&LocalAccount> {
        match self {
            Self::Found { account, .. } => Some(account),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

// =============================================================================
// Outcomes and Reports
// =============================================================================

/// The single field changed by an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum AccountChange {
    Locked,
    Unlocked,
    Email { from: String, to: String },
    Username { from: String, to: String },
}

impl std::fmt::Display for AccountChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
            Self::Email { from, to } => write!(f, "email {} -> {}", from, to),
            Self::Username { from, to } => write!(f, "username {} -> {}", from, to),
        }
    }
}

/// Terminal state of one user's reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UserOutcome {
    Created {
        username: String,
        /// `None` in dry-run mode
        account_id: Option<AccountId>,
    },
    Updated {
        username: String,
        account_id: AccountId,
        change: AccountChange,
    },
    Unchanged {
        username: String,
        account_id: AccountId,
    },
    Failed {
        username: String,
        kind: ErrorKind,
        message: String,
    },
}

impl UserOutcome {
    pub fn username(&self) -> &str {
        match self {
            Self::Created { username, .. }
            | Self::Updated { username, .. }
            | Self::Unchanged { username, .. }
            | Self::Failed { username, .. } => username,
        }
    }
}

/// A failed user, as listed in the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFailure {
    pub username: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub failed: u32,
    /// Per-user outcomes in directory order
    pub outcomes: Vec<UserOutcome>,
    pub failures: Vec<UserFailure>,
    /// The pass was stopped before every user was dispatched
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ReconcileReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            created: 0,
            updated: 0,
            unchanged: 0,
            failed: 0,
            outcomes: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
            started_at,
            completed_at: started_at,
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, outcome: UserOutcome) {
        match &outcome {
            UserOutcome::Created { .. } => self.created += 1,
            UserOutcome::Updated { .. } => self.updated += 1,
            UserOutcome::Unchanged { .. } => self.unchanged += 1,
            UserOutcome::Failed {
                username,
                kind,
                message,
            } => {
                self.failed += 1;
                self.failures.push(UserFailure {
                    username: username.clone(),
                    kind: *kind,
                    message: message.clone(),
                });
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = completed_at;
        self.duration_ms = (completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
    }

    pub fn total(&self) -> u32 {
        self.created + self.updated + self.unchanged + self.failed
    }

    pub fn status(&self) -> ReconcileStatus {
        if self.failed == 0 {
            ReconcileStatus::Success
        } else if self.failed == self.total() {
            ReconcileStatus::Failed
        } else {
            ReconcileStatus::PartialSuccess
        }
    }
}
