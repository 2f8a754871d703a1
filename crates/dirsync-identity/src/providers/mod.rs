//! Directory provider implementations

#[cfg(feature = "gitlab")]
pub mod gitlab;

#[cfg(feature = "gitlab")]
mod common;

#[cfg(feature = "gitlab")]
pub use common::*;
