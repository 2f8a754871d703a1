//! Collaborator traits consumed by the reconciliation engine

use crate::{error::Result, models::*};
use async_trait::async_trait;

// =============================================================================
// Directory Source
// =============================================================================

/// Read-only query service over the external user directory
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// List every directory user, in the directory's native order
    async fn list_users(&self) -> Result<Vec<DirectoryUser>>;

    /// List users flagged as external collaborators or guests
    async fn list_external_users(&self) -> Result<Vec<DirectoryUser>>;

    /// Every email address ever bound to `username`
    async fn list_emails(&self, username: &str) -> Result<Vec<String>>;
}

// =============================================================================
// Identity Store
// =============================================================================

/// Local account persistence
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<LocalAccount>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<LocalAccount>>;
    async fn create(&self, account: &NewAccount) -> Result<LocalAccount>;
    async fn update(&self, account: &LocalAccount) -> Result<LocalAccount>;
}

// =============================================================================
// Provisioning Extension
// =============================================================================

/// Host-supplied mapping of extra fields onto newly created accounts
pub trait AccountExtension: Send + Sync {
    fn extend(&self, remote: &RemoteUser, account: &mut NewAccount);
}

/// Copies the directory display name into the `name` attribute
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayNameExtension;

impl DisplayNameExtension {
    pub const ATTRIBUTE: &'static str = "name";
}

impl AccountExtension for DisplayNameExtension {
    fn extend(&self, remote: &RemoteUser, account: &mut NewAccount) {
        account.attributes.insert(
            Self::ATTRIBUTE.to_string(),
            serde_json::Value::String(remote.display_name.clone()),
        );
    }
}
