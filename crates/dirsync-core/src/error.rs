//! Error types for directory reconciliation

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirsyncError {
    #[error("Directory source unavailable: {message}")]
    DirectorySourceUnavailable { message: String },

    #[error("Directory error: {message}")]
    Directory { message: String },

    #[error("Email history lookup degraded for {username}: {message}")]
    LookupDegraded { username: String, message: String },

    #[error("Identity store error: {message}")]
    IdentityStore { message: String },

    #[error("Failed to create account {username}: {message}")]
    AccountCreation { username: String, message: String },

    #[error("Failed to update account {username}: {message}")]
    AccountUpdate { username: String, message: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Stable, serializable classification of a [`DirsyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DirectorySourceUnavailable,
    Directory,
    LookupDegraded,
    IdentityStore,
    AccountCreation,
    AccountUpdate,
    NotFound,
    Database,
    Configuration,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectorySourceUnavailable => write!(f, "directory_source_unavailable"),
            Self::Directory => write!(f, "directory"),
            Self::LookupDegraded => write!(f, "lookup_degraded"),
            Self::IdentityStore => write!(f, "identity_store"),
            Self::AccountCreation => write!(f, "account_creation"),
            Self::AccountUpdate => write!(f, "account_update"),
            Self::NotFound => write!(f, "not_found"),
            Self::Database => write!(f, "database"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl DirsyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DirectorySourceUnavailable { .. } => ErrorKind::DirectorySourceUnavailable,
            Self::Directory { .. } => ErrorKind::Directory,
            Self::LookupDegraded { .. } => ErrorKind::LookupDegraded,
            Self::IdentityStore { .. } => ErrorKind::IdentityStore,
            Self::AccountCreation { .. } => ErrorKind::AccountCreation,
            Self::AccountUpdate { .. } => ErrorKind::AccountUpdate,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Database { .. } => ErrorKind::Database,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::DirectorySourceUnavailable {
            message: message.into(),
        }
    }

    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
        }
    }

    pub fn lookup_degraded(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LookupDegraded {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn identity_store(message: impl Into<String>) -> Self {
        Self::IdentityStore {
            message: message.into(),
        }
    }

    pub fn account_creation(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccountCreation {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn account_update(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccountUpdate {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DirsyncError>;
