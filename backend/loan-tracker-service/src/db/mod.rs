//! Store contracts for accounts, refresh tokens and loans
//!
//! The workflow engines only see these traits. Two implementations ship with
//! the crate: [`MemoryStore`] (tests, local runs) and [`PgStore`] (Postgres).
//!
//! Every method takes the caller's [`RequestContext`] and must give up with
//! `Cancelled`/`DeadlineExceeded` when it fires. Finders report absence as
//! `Ok(None)`; mutations of a missing record report `StoreError::NotFound`.
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::context::RequestContext;
use crate::models::{Account, LoanApplication, LoanStatus, RefreshTokenRecord};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated; carries the offending field
    #[error("duplicate {0}")]
    Conflict(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("username") => "username",
                    _ => "record",
                };
                StoreError::Conflict(field.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Durable account and refresh-token records
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; `Conflict` if username or email is taken
    async fn create_account(&self, ctx: &RequestContext, account: &Account) -> StoreResult<Uuid>;

    /// Replace the stored account with the same id
    async fn update_account(&self, ctx: &RequestContext, account: &Account)
        -> StoreResult<Account>;

    async fn find_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> StoreResult<Option<Account>>;

    /// Lookup by (already lowercased) email
    async fn find_by_email(&self, ctx: &RequestContext, email: &str)
        -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<Option<Account>>;

    async fn list_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Account>>;

    async fn delete_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()>;

    async fn record_refresh_token(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        token: &str,
    ) -> StoreResult<()>;

    async fn find_refresh_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Number of accounts ever stored and not deleted
    async fn count(&self, ctx: &RequestContext) -> StoreResult<i64>;
}

/// Durable loan application records
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn create_loan(&self, ctx: &RequestContext, loan: &LoanApplication) -> StoreResult<()>;

    async fn find_loan_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> StoreResult<Option<LoanApplication>>;

    async fn find_loans_by_account(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> StoreResult<Vec<LoanApplication>>;

    /// Overwrite the status and bump `updated_at`; last writer wins
    async fn update_loan_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: LoanStatus,
    ) -> StoreResult<()>;

    async fn delete_loan(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()>;
}
