//! Reconciler - drives a full pass over the directory
//!
//! For each eligible directory user, in directory order:
//! - match against the identity store
//! - create when nothing matched, otherwise correct one drifted field
//! - record the outcome and move on, whatever happened
//!
//! Only failing to list the directory aborts a pass.

use chrono::Utc;
use futures_util::{stream, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use dirsync_core::{
    AccountExtension, DirectorySource, IdentityStore, MatchResult, ReconcileReport, RemoteUser,
    Result, UserOutcome,
};

use crate::matcher::AccountMatcher;
use crate::mutator::{AccountMutator, Mutation};
use crate::reader::{DirectoryReader, ReaderOptions};

/// Pass-level settings
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Users reconciled at the same time; 1 means strictly sequential
    pub concurrency: usize,
    pub dry_run: bool,
    pub reader: ReaderOptions,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            dry_run: false,
            reader: ReaderOptions::default(),
        }
    }
}

pub struct Reconciler<D, S>
where
    D: DirectorySource,
    S: IdentityStore,
{
    reader: Arc<DirectoryReader<D>>,
    matcher: AccountMatcher<D, S>,
    mutator: AccountMutator<S>,
    concurrency: usize,
    last_report: RwLock<Option<ReconcileReport>>,
}

impl<D, S> Reconciler<D, S>
where
    D: DirectorySource,
    S: IdentityStore,
{
    pub fn new(source: Arc<D>, store: Arc<S>) -> Self {
        Self::with_options(source, store, ReconcilerOptions::default())
    }

    pub fn with_options(source: Arc<D>, store: Arc<S>, options: ReconcilerOptions) -> Self {
        let reader = Arc::new(DirectoryReader::with_options(source, options.reader));
        Self {
            matcher: AccountMatcher::new(reader.clone(), store.clone()),
            mutator: AccountMutator::new(store).dry_run(options.dry_run),
            reader,
            concurrency: options.concurrency.max(1),
            last_report: RwLock::new(None),
        }
    }

    /// Apply `extension` to accounts created by this reconciler
    pub fn with_extension(mut self, extension: Arc<dyn AccountExtension>) -> Self {
        self.mutator = self.mutator.with_extension(extension);
        self
    }

    /// Run one full pass
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        self.reconcile_until(CancellationToken::new()).await
    }

    /// Run one pass, dispatching no new users once `shutdown` is cancelled
    #[instrument(skip(self, shutdown))]
    pub async fn reconcile_until(&self, shutdown: CancellationToken) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::new(Utc::now());
        info!("Starting reconciliation pass");

        let users = self.reader.active_users().await?;
        let eligible = users.len();

        let outcomes: Vec<UserOutcome> = stream::iter(users)
            .take_until(shutdown.cancelled())
            .map(|user| self.reconcile_user(user))
            .buffered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            if let UserOutcome::Failed {
                username,
                kind,
                message,
            } = &outcome
            {
                warn!(%kind, "Reconciliation failed for {}: {}", username, message);
            }
            report.record(outcome);
        }

        report.cancelled = (report.total() as usize) < eligible;
        report.finish(Utc::now());

        if report.cancelled {
            warn!(
                "Reconciliation cancelled after {} of {} users",
                report.total(),
                eligible
            );
        }
        info!(
            "Reconciliation completed: {} created, {} updated, {} unchanged, {} failed in {}ms",
            report.created, report.updated, report.unchanged, report.failed, report.duration_ms
        );

        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }

    /// Match then mutate a single user; never fails the pass
    pub async fn reconcile_user(&self, remote: RemoteUser) -> UserOutcome {
        let username = remote.username.clone();

        let result = match self.matcher.find(&remote).await {
            Ok(MatchResult::NotFound) => self.mutator.create(&remote).await,
            Ok(MatchResult::Found { account, .. }) => self.mutator.update(&remote, &account).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Mutation::Created(account)) => UserOutcome::Created {
                username,
                account_id: account.map(|a| a.id),
            },
            Ok(Mutation::Updated { account, change }) => UserOutcome::Updated {
                username,
                account_id: account.id,
                change,
            },
            Ok(Mutation::Unchanged(account)) => UserOutcome::Unchanged {
                username,
                account_id: account.id,
            },
            Err(e) => UserOutcome::Failed {
                username,
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    /// Report of the most recent completed pass
    pub async fn last_report(&self) -> Option<ReconcileReport> {
        self.last_report.read().await.clone()
    }
}
