//! Dirsync Identity - reconciliation of an external user directory into a local identity store
//!
//! # Architecture
//!
//! A pass flows one user at a time through three components:
//! - `DirectoryReader`: filtered snapshot of the directory (no bots, no externals)
//! - `AccountMatcher`: username, then email, then historical emails
//! - `AccountMutator`: create, or correct a single drifted field
//!
//! `Reconciler` drives the pass and produces a `ReconcileReport`.
//! Directory providers live under `providers` behind cargo features.

pub mod matcher;
pub mod mutator;
pub mod providers;
pub mod reader;
pub mod reconciler;


#[cfg(feature = "gitlab")]
pub use providers::gitlab::{GitLabConfig, GitLabDirectory};

// Re-export core types
pub use dirsync_core::*;

pub use matcher::AccountMatcher;
pub use mutator::{plan_update, AccountMutator, Mutation};
pub use reader::{DirectoryReader, ReaderOptions};
pub use reconciler::{Reconciler, ReconcilerOptions};
