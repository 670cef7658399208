//! Postgres-backed implementation of the account and loan stores
use super::{AccountStore, LoanStore, StoreError, StoreResult};
use crate::context::RequestContext;
use crate::models::{self, Account, LoanApplication, LoanStatus, RefreshTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Loan row as stored; `status` is TEXT
#[derive(Debug, sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    account_id: Uuid,
    amount: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LoanRow> for LoanApplication {
    type Error = StoreError;

    fn try_from(row: LoanRow) -> StoreResult<Self> {
        let status = LoanStatus::from_str(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown loan status '{}'", row.status)))?;

        Ok(LoanApplication {
            id: row.id,
            account_id: row.account_id,
            amount: row.amount,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool against `database_url` and verify it answers
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        debug!(
            "Creating database pool: max={}, acquire_timeout={}s",
            max_connections,
            acquire_timeout.as_secs()
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Database pool created and verified successfully");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(&self, ctx: &RequestContext, account: &Account) -> StoreResult<Uuid> {
        ctx.run(async {
            sqlx::query(
                r#"
                INSERT INTO accounts (id, name, username, email, password_hash,
                                      is_active, is_admin, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.is_active)
            .bind(account.is_admin)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&self.pool)
            .await?;

            Ok(account.id)
        })
        .await
    }

    async fn update_account(
        &self,
        ctx: &RequestContext,
        account: &Account,
    ) -> StoreResult<Account> {
        ctx.run(async {
            let updated = sqlx::query_as::<_, Account>(
                r#"
                UPDATE accounts
                SET name = $2, username = $3, email = $4, password_hash = $5,
                    is_active = $6, is_admin = $7, updated_at = $8
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.is_active)
            .bind(account.is_admin)
            .bind(account.updated_at)
            .fetch_optional(&self.pool)
            .await?;

            updated.ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn find_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let account =
                sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = $1")
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?;

            Ok(account)
        })
        .await
    }

    async fn find_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

            Ok(account)
        })
        .await
    }

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

            Ok(account)
        })
        .await
    }

    async fn list_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Account>> {
        ctx.run(async {
            let accounts =
                sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at ASC")
                    .fetch_all(&self.pool)
                    .await?;

            Ok(accounts)
        })
        .await
    }

    async fn delete_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()> {
        ctx.run(async {
            // refresh_tokens rows go with it (ON DELETE CASCADE)
            let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn record_refresh_token(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        token: &str,
    ) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (id, account_id, token, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(token)
            .bind(models::now())
            .execute(&self.pool)
            .await?;

            Ok(())
        })
        .await
    }

    async fn find_refresh_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        ctx.run(async {
            let record = sqlx::query_as::<_, RefreshTokenRecord>(
                "SELECT id, account_id, token, created_at FROM refresh_tokens WHERE token = $1",
            )
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

            Ok(record)
        })
        .await
    }

    async fn count(&self, ctx: &RequestContext) -> StoreResult<i64> {
        ctx.run(async {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
                .fetch_one(&self.pool)
                .await?;

            Ok(count)
        })
        .await
    }
}

#[async_trait]
impl LoanStore for PgStore {
    async fn create_loan(&self, ctx: &RequestContext, loan: &LoanApplication) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query(
                r#"
                INSERT INTO loans (id, account_id, amount, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(loan.id)
            .bind(loan.account_id)
            .bind(loan.amount)
            .bind(loan.status.as_str())
            .bind(loan.created_at)
            .bind(loan.updated_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
        .await
    }

    async fn find_loan_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> StoreResult<Option<LoanApplication>> {
        ctx.run(async {
            let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

            row.map(LoanApplication::try_from).transpose()
        })
        .await
    }

    async fn find_loans_by_account(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> StoreResult<Vec<LoanApplication>> {
        ctx.run(async {
            let rows = sqlx::query_as::<_, LoanRow>(
                "SELECT * FROM loans WHERE account_id = $1 ORDER BY created_at ASC",
            )
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(LoanApplication::try_from).collect()
        })
        .await
    }

    async fn update_loan_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: LoanStatus,
    ) -> StoreResult<()> {
        ctx.run(async {
            let result = sqlx::query("UPDATE loans SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .bind(models::now())
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn delete_loan(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query("DELETE FROM loans WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            Ok(())
        })
        .await
    }
}
