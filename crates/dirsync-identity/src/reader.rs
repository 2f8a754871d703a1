//! Directory Snapshot Reader - filtered, failure-tolerant view over a directory source
//!
//! The reader:
//! - Drops bot accounts (display name ends with the bot suffix)
//! - Drops external/guest accounts
//! - Degrades email-history failures to an empty history

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use dirsync_core::{DirectorySource, DirectoryUser, DirsyncError, RemoteUser, Result};

/// Reader tuning
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Display-name suffix marking bot accounts
    pub bot_name_suffix: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            bot_name_suffix: " Bot".to_string(),
        }
    }
}

pub struct DirectoryReader<D: DirectorySource> {
    source: Arc<D>,
    options: ReaderOptions,
}

impl<D: DirectorySource> DirectoryReader<D> {
    pub fn new(source: Arc<D>) -> Self {
        Self::with_options(source, ReaderOptions::default())
    }

    pub fn with_options(source: Arc<D>, options: ReaderOptions) -> Self {
        Self { source, options }
    }

    /// All reconcilable users, in directory order
    #[instrument(skip(self))]
    pub async fn active_users(&self) -> Result<Vec<RemoteUser>> {
        let users = self
            .source
            .list_users()
            .await
            .map_err(|e| DirsyncError::directory_unavailable(e.to_string()))?;

        let external: HashSet<String> = self
            .source
            .list_external_users()
            .await
            .map_err(|e| DirsyncError::directory_unavailable(e.to_string()))?
            .into_iter()
            .map(|u| u.username)
            .collect();

        let total = users.len();
        let active: Vec<RemoteUser> = users
            .into_iter()
            .map(|u| self.to_remote(u, &external))
            .filter(|u| {
                if !u.is_reconcilable() {
                    debug!(
                        "Skipping {} (bot: {}, external: {})",
                        u.username, u.is_bot, u.is_external
                    );
                }
                u.is_reconcilable()
            })
            .collect();

        info!(
            "Directory lists {} users, {} eligible for reconciliation",
            total,
            active.len()
        );

        Ok(active)
    }

    /// Every email ever bound to `username`; empty when the lookup fails
    #[instrument(skip(self))]
    pub async fn email_history(&self, username: &str) -> Vec<String> {
        match self.source.list_emails(username).await {
            Ok(emails) => emails,
            Err(e) => {
                let degraded = DirsyncError::lookup_degraded(username, e.to_string());
                info!(kind = %degraded.kind(), "{}", degraded);
                Vec::new()
            }
        }
    }

    fn to_remote(&self, user: DirectoryUser, external: &HashSet<String>) -> RemoteUser {
        let suffix = &self.options.bot_name_suffix;
        let is_bot = !suffix.is_empty() && user.display_name.ends_with(suffix.as_str());
        let is_external = user.external || external.contains(&user.username);

        RemoteUser {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            primary_email: user.email,
            state: user.state,
            is_bot,
            is_external,
        }
    }
}
