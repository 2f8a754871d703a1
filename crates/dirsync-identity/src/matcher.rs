//! Account Matcher - resolves the local account for a directory user
//!
//! Precedence, first hit wins:
//! 1. username
//! 2. primary email
//! 3. each historical email, in the order the directory returns them

use std::sync::Arc;
use tracing::{debug, instrument};

use dirsync_core::{
    DirectorySource, IdentityStore, LocalAccount, MatchResult, MatchedBy, RemoteUser, Result,
};

use crate::reader::DirectoryReader;

pub struct AccountMatcher<D, S>
where
    D: DirectorySource,
    S: IdentityStore,
{
    reader: Arc<DirectoryReader<D>>,
    store: Arc<S>,
}

impl<D, S> AccountMatcher<D, S>
where
    D: DirectorySource,
    S: IdentityStore,
{
    pub fn new(reader: Arc<DirectoryReader<D>>, store: Arc<S>) -> Self {
        Self { reader, store }
    }

    /// Resolve zero or one local account for `remote`
    ///
    /// Identity store failures are returned as errors; email-history failures
    /// have already been degraded to an empty history by the reader.
    #[instrument(skip(self, remote), fields(username = %remote.username))]
    pub async fn find(&self, remote: &RemoteUser) -> Result<MatchResult> {
        if let Some(account) = self.store.find_by_username(&remote.username).await? {
            return Ok(found(account, MatchedBy::Username));
        }

        if !remote.primary_email.is_empty() {
            if let Some(account) = self.store.find_by_email(&remote.primary_email).await? {
                return Ok(found(account, MatchedBy::PrimaryEmail));
            }
        }

        for email in self.reader.email_history(&remote.username).await {
            if email.is_empty() {
                continue;
            }
            if let Some(account) = self.store.find_by_email(&email).await? {
                return Ok(found(account, MatchedBy::HistoricalEmail(email)));
            }
        }

        debug!("No local account matches");
        Ok(MatchResult::NotFound)
    }
}

fn found(account: LocalAccount, matched_by: MatchedBy) -> MatchResult {
    debug!(account_id = %account.id, ?matched_by, "Matched local account");
    MatchResult::Found {
        account,
        matched_by,
    }
}
