//! Account repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::instrument;

use dirsync_core::{AccountId, DirsyncError, IdentityStore, LocalAccount, NewAccount, Result};

const ACCOUNT_COLUMNS: &str = "id, username, email, email_confirmed, lockout_until";

/// PostgreSQL implementation of IdentityStore
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> LocalAccount {
    LocalAccount {
        id: AccountId::from_uuid(row.get("id")),
        username: row.get("username"),
        email: row.get("email"),
        email_confirmed: row.get("email_confirmed"),
        lockout_until: row.get("lockout_until"),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl IdentityStore for PgAccountRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<LocalAccount>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirsyncError::identity_store(e.to_string()))?;

        Ok(row.as_ref().map(account_from_row))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<LocalAccount>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE email = $1 ORDER BY created_at, id LIMIT 1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirsyncError::identity_store(e.to_string()))?;

        Ok(row.as_ref().map(account_from_row))
    }

    #[instrument(skip(self, account), fields(username = %account.username))]
    async fn create(&self, account: &NewAccount) -> Result<LocalAccount> {
        let attributes = serde_json::to_value(&account.attributes)
            .map_err(|e| DirsyncError::account_creation(&account.username, e.to_string()))?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts (id, username, email, email_confirmed, lockout_until, attributes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(AccountId::new().as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.email_confirmed)
        .bind(account.lockout_until)
        .bind(&attributes)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DirsyncError::account_creation(&account.username, "username already taken")
            } else {
                DirsyncError::account_creation(&account.username, e.to_string())
            }
        })?;

        Ok(account_from_row(&row))
    }

    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn update(&self, account: &LocalAccount) -> Result<LocalAccount> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts
            SET username = $2, email = $3, email_confirmed = $4, lockout_until = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(account.email_confirmed)
        .bind(account.lockout_until)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirsyncError::account_update(&account.username, e.to_string()))?;

        row.as_ref().map(account_from_row).ok_or_else(|| {
            DirsyncError::account_update(&account.username, "account no longer exists")
        })
    }
}
