//! Table definitions for the account store

use sqlx::PgPool;
use tracing::info;

use dirsync_core::{DirsyncError, Result};

const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    lockout_until TIMESTAMPTZ NULL,
    attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_EMAIL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS accounts_email_idx ON accounts (email)";

/// Create the accounts table and its indexes if they are missing
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in [CREATE_ACCOUNTS, CREATE_EMAIL_INDEX] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DirsyncError::database_error(format!("Failed to apply schema: {}", e)))?;
    }

    info!("Account schema ready");
    Ok(())
}
