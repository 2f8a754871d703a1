//! PostgreSQL identity store for dirsync

pub mod pool;
pub mod repositories;
pub mod schema;

pub use pool::{connect_identity_store, create_pool, DatabaseConfig};
pub use repositories::*;
pub use schema::ensure_schema;
