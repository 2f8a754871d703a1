//! Dirsync Core - Domain types and collaborator traits for directory reconciliation

pub mod error;
pub mod ids;
pub mod models;
pub mod traits;

#[cfg(test)]
mod tests;

pub use error::*;
pub use ids::*;
pub use models::*;
pub use traits::*;
