//! Repository implementations for PostgreSQL

pub mod account;

pub use account::*;
