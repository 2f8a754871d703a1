//! Account Mutator - provisions new accounts and corrects drift on existing ones
//!
//! Updates change at most one field per pass, checked in this order:
//! lockout state, email, username. Repeated passes converge.
//! An undisclosed (empty) directory email is treated as unknown.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use dirsync_core::{
    lockout_far_future, lockout_far_past, AccountChange, AccountExtension, DirsyncError,
    IdentityStore, LocalAccount, NewAccount, RemoteUser, Result,
};

/// What the mutator did for one user
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// `None` when running dry
    Created(Option<LocalAccount>),
    Updated {
        account: LocalAccount,
        change: AccountChange,
    },
    Unchanged(LocalAccount),
}

pub struct AccountMutator<S: IdentityStore> {
    store: Arc<S>,
    extension: Option<Arc<dyn AccountExtension>>,
    dry_run: bool,
}

impl<S: IdentityStore> AccountMutator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            extension: None,
            dry_run: false,
        }
    }

    /// Apply `extension` to every account created from now on
    pub fn with_extension(mut self, extension: Arc<dyn AccountExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Decide outcomes without writing to the store
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Provision a local account seeded from `remote`
    #[instrument(skip(self, remote), fields(username = %remote.username))]
    pub async fn create(&self, remote: &RemoteUser) -> Result<Mutation> {
        let mut account = NewAccount::from_remote(remote);
        if let Some(extension) = &self.extension {
            extension.extend(remote, &mut account);
        }

        if self.dry_run {
            info!("[dry run] Would create account {}", account.username);
            return Ok(Mutation::Created(None));
        }

        let created = self.store.create(&account).await.map_err(|e| match e {
            e @ DirsyncError::AccountCreation { .. } => e,
            other => DirsyncError::account_creation(&remote.username, other.to_string()),
        })?;

        info!(account_id = %created.id, "Created account {}", created.username);
        Ok(Mutation::Created(Some(created)))
    }

    /// Correct at most one drifted field on `local`
    #[instrument(
        skip(self, remote, local),
        fields(username = %remote.username, account_id = %local.id)
    )]
    pub async fn update(&self, remote: &RemoteUser, local: &LocalAccount) -> Result<Mutation> {
        let Some((updated, change)) = plan_update(remote, local) else {
            debug!("Account already in sync");
            return Ok(Mutation::Unchanged(local.clone()));
        };

        if self.dry_run {
            info!("[dry run] Would apply {} to {}", change, local.username);
            return Ok(Mutation::Updated {
                account: updated,
                change,
            });
        }

        let account = self.store.update(&updated).await.map_err(|e| match e {
            e @ DirsyncError::AccountUpdate { .. } => e,
            other => DirsyncError::account_update(&local.username, other.to_string()),
        })?;

        info!("Applied {} to {}", change, account.username);
        Ok(Mutation::Updated { account, change })
    }
}

/// The single change to apply to `local`, if any
///
/// An empty remote email means the directory did not disclose one, so it
/// never overwrites the local address.
pub fn plan_update(
    remote: &RemoteUser,
    local: &LocalAccount,
) -> Option<(LocalAccount, AccountChange)> {
    let mut updated = local.clone();

    let should_lock = remote.is_blocked();
    if should_lock != local.is_locked_at(Utc::now()) {
        return if should_lock {
            updated.lockout_until = Some(lockout_far_future());
            Some((updated, AccountChange::Locked))
        } else {
            updated.lockout_until = Some(lockout_far_past());
            Some((updated, AccountChange::Unlocked))
        };
    }

    if !remote.primary_email.is_empty() && remote.primary_email != local.email {
        updated.email = remote.primary_email.clone();
        let change = AccountChange::Email {
            from: local.email.clone(),
            to: remote.primary_email.clone(),
        };
        return Some((updated, change));
    }

    if remote.username != local.username {
        updated.username = remote.username.clone();
        let change = AccountChange::Username {
            from: local.username.clone(),
            to: remote.username.clone(),
        };
        return Some((updated, change));
    }

    None
}
