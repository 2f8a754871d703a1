//! Unit tests for dirsync-core

use super::*;
use chrono::{Duration, Utc};

fn remote(username: &str, state: RemoteUserState) -> RemoteUser {
    RemoteUser {
        id: 7,
        username: username.to_string(),
        display_name: format!("{} Example", username),
        primary_email: format!("{}@co.com", username),
        state,
        is_bot: false,
        is_external: false,
    }
}

fn account(lockout_until: Option<chrono::DateTime<Utc>>) -> LocalAccount {
    LocalAccount {
        id: AccountId::new(),
        username: "bob".to_string(),
        email: "bob@co.com".to_string(),
        email_confirmed: true,
        lockout_until,
    }
}

// =============================================================================
// Lockout Tests
// =============================================================================

#[cfg(test)]
mod lockout_tests {
    use super::*;

    #[test]
    fn test_unset_lockout_is_unlocked() {
        assert!(!account(None).is_locked());
    }

    #[test]
    fn test_far_future_lockout_is_locked() {
        assert!(account(Some(lockout_far_future())).is_locked());
    }

    #[test]
    fn test_far_past_lockout_is_unlocked() {
        assert!(!account(Some(lockout_far_past())).is_locked());
    }

    #[test]
    fn test_expired_lockout_is_unlocked() {
        let now = Utc::now();
        let acc = account(Some(now - Duration::minutes(5)));
        assert!(!acc.is_locked_at(now));
        assert!(acc.is_locked_at(now - Duration::minutes(10)));
    }

    #[test]
    fn test_sentinels_are_calendar_extremes() {
        assert_eq!(lockout_far_future().to_rfc3339(), "9999-12-31T23:59:59+00:00");
        assert_eq!(lockout_far_past().to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }
}

// =============================================================================
// Model Tests
// =============================================================================

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_remote_state_parsing() {
        assert_eq!(RemoteUserState::from("active"), RemoteUserState::Active);
        assert_eq!(RemoteUserState::from("blocked"), RemoteUserState::Blocked);
        assert_eq!(
            RemoteUserState::from("deactivated"),
            RemoteUserState::Other("deactivated".to_string())
        );
        assert!(!RemoteUserState::from("ldap_blocked").is_blocked());
    }

    #[test]
    fn test_remote_state_serializes_as_string() {
        let json = serde_json::to_string(&RemoteUserState::Blocked).unwrap();
        assert_eq!(json, "\"blocked\"");
        let other: RemoteUserState = serde_json::from_str("\"banned\"").unwrap();
        assert_eq!(other.as_str(), "banned");
    }

    #[test]
    fn test_new_account_from_active_remote() {
        let new = NewAccount::from_remote(&remote("alice", RemoteUserState::Active));
        assert_eq!(new.username, "alice");
        assert_eq!(new.email, "alice@co.com");
        assert!(new.email_confirmed);
        assert_eq!(new.lockout_until, None);
        assert!(new.attributes.is_empty());
    }

    #[test]
    fn test_new_account_from_blocked_remote() {
        let new = NewAccount::from_remote(&remote("bob", RemoteUserState::Blocked));
        assert_eq!(new.lockout_until, Some(lockout_far_future()));
    }

    #[test]
    fn test_reconcilable_flags() {
        let mut user = remote("carol", RemoteUserState::Active);
        assert!(user.is_reconcilable());
        user.is_bot = true;
        assert!(!user.is_reconcilable());
        user.is_bot = false;
        user.is_external = true;
        assert!(!user.is_reconcilable());
    }

    #[test]
    fn test_display_name_extension() {
        let remote = remote("dave", RemoteUserState::Active);
        let mut new = NewAccount::from_remote(&remote);
        DisplayNameExtension.extend(&remote, &mut new);
        assert_eq!(
            new.attributes.get(DisplayNameExtension::ATTRIBUTE),
            Some(&serde_json::json!("dave Example"))
        );
    }
}

// =============================================================================
// Report Tests
// =============================================================================

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_report_counts_and_failures() {
        let mut report = ReconcileReport::new(Utc::now());
        report.record(UserOutcome::Created {
            username: "a".to_string(),
            account_id: Some(AccountId::new()),
        });
        report.record(UserOutcome::Unchanged {
            username: "b".to_string(),
            account_id: AccountId::new(),
        });
        report.record(UserOutcome::Failed {
            username: "c".to_string(),
            kind: ErrorKind::AccountCreation,
            message: "duplicate".to_string(),
        });

        assert_eq!(report.created, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.failures[0].username, "c");
        assert_eq!(report.failures[0].kind, ErrorKind::AccountCreation);
        assert_eq!(report.status(), ReconcileStatus::PartialSuccess);
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = ReconcileReport::new(Utc::now());
        assert_eq!(report.status(), ReconcileStatus::Success);
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let outcome = UserOutcome::Failed {
            username: "eve".to_string(),
            kind: ErrorKind::AccountUpdate,
            message: "gone".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "account_update");
        assert_eq!(outcome.username(), "eve");
    }

    #[test]
    fn test_finish_sets_duration() {
        let started = Utc::now();
        let mut report = ReconcileReport::new(started);
        report.finish(started + Duration::milliseconds(250));
        assert_eq!(report.duration_ms, 250);
    }
}

// =============================================================================
// Error Tests
// =============================================================================

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DirsyncError::account_creation("a", "x").kind(),
            ErrorKind::AccountCreation
        );
        assert_eq!(
            DirsyncError::directory_unavailable("down").kind(),
            ErrorKind::DirectorySourceUnavailable
        );
        assert_eq!(ErrorKind::IdentityStore.to_string(), "identity_store");
    }

    #[test]
    fn test_error_display() {
        let err = DirsyncError::account_update("bob", "row vanished");
        assert_eq!(err.to_string(), "Failed to update account bob: row vanished");
    }
}
