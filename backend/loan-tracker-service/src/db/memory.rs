use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{AccountStore, LoanStore, StoreError, StoreResult};
use crate::context::RequestContext;
use crate::models::{self, Account, LoanApplication, LoanStatus, RefreshTokenRecord};

// In-memory storage data structure
#[derive(Default)]
struct StoreData {
    accounts: HashMap<Uuid, Account>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>, // token -> record
    loans: HashMap<Uuid, LoanApplication>,
}

impl StoreData {
    fn check_unique(&self, account: &Account) -> StoreResult<()> {
        for existing in self.accounts.values().filter(|a| a.id != account.id) {
            if existing.email == account.email {
                return Err(StoreError::Conflict("email".to_string()));
            }
            if existing.username == account.username {
                return Err(StoreError::Conflict("username".to_string()));
            }
        }
        Ok(())
    }
}

/// In-memory implementation of both store contracts (useful for testing)
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<StoreData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, ctx: &RequestContext, account: &Account) -> StoreResult<Uuid> {
        ctx.run(async {
            let mut data = self.data.write().await;
            data.check_unique(account)?;
            data.accounts.insert(account.id, account.clone());
            debug!(account_id = %account.id, "account created in memory store");
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
            let mut data = self.data.write().await;
            if !data.accounts.contains_key(&account.id) {
                return Err(StoreError::NotFound);
            }
            data.check_unique(account)?;
            data.accounts.insert(account.id, account.clone());
            Ok(account.clone())
        })
        .await
    }

    async fn find_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let data = self.data.read().await;
            Ok(data
                .accounts
                .values()
                .find(|a| a.username == username)
                .cloned())
        })
        .await
    }

    async fn find_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let data = self.data.read().await;
            Ok(data.accounts.values().find(|a| a.email == email).cloned())
        })
        .await
    }

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<Option<Account>> {
        ctx.run(async {
            let data = self.data.read().await;
            Ok(data.accounts.get(&id).cloned())
        })
        .await
    }

    async fn list_all(&self, ctx: &RequestContext) -> StoreResult<Vec<Account>> {
        ctx.run(async {
            let data = self.data.read().await;
            let mut accounts: Vec<Account> = data.accounts.values().cloned().collect();
            accounts.sort_by_key(|a| a.created_at);
            Ok(accounts)
        })
        .await
    }

    async fn delete_by_id(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()> {
        ctx.run(async {
            let mut data = self.data.write().await;
            if data.accounts.remove(&id).is_none() {
                return Err(StoreError::NotFound);
            }
            data.refresh_tokens.retain(|_, record| record.account_id != id);
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
            let mut data = self.data.write().await;
            let record = RefreshTokenRecord {
                id: Uuid::new_v4(),
                account_id,
                token: token.to_string(),
                created_at: models::now(),
            };
            data.refresh_tokens.insert(token.to_string(), record);
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
            let data = self.data.read().await;
            Ok(data.refresh_tokens.get(token).cloned())
        })
        .await
    }

    async fn count(&self, ctx: &RequestContext) -> StoreResult<i64> {
        ctx.run(async {
            let data = self.data.read().await;
            Ok(data.accounts.len() as i64)
        })
        .await
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn create_loan(&self, ctx: &RequestContext, loan: &LoanApplication) -> StoreResult<()> {
        ctx.run(async {
            let mut data = self.data.write().await;
            data.loans.insert(loan.id, loan.clone());
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
            let data = self.data.read().await;
            Ok(data.loans.get(&id).cloned())
        })
        .await
    }

    async fn find_loans_by_account(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> StoreResult<Vec<LoanApplication>> {
        ctx.run(async {
            let data = self.data.read().await;
            let mut loans: Vec<LoanApplication> = data
                .loans
                .values()
                .filter(|l| l.account_id == account_id)
                .cloned()
                .collect();
            loans.sort_by_key(|l| l.created_at);
            Ok(loans)
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
            let mut data = self.data.write().await;
            let loan = data.loans.get_mut(&id).ok_or(StoreError::NotFound)?;
            loan.status = status;
            loan.updated_at = models::now();
            Ok(())
        })
        .await
    }

    async fn delete_loan(&self, ctx: &RequestContext, id: Uuid) -> StoreResult<()> {
        ctx.run(async {
            let mut data = self.data.write().await;
            data.loans.remove(&id);
            Ok(())
        })
        .await
    }
}
