/// Loan application workflow
///
/// `pending` -> `approved` | `rejected`. Decisions are not guarded against
/// a second transition: the last write wins.
use crate::context::RequestContext;
use crate::db::{LoanStore, StoreError};
use crate::error::{LoanTrackerError, Result};
use crate::models::{self, LoanApplication, LoanStatus};
use crate::security::Principal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanStore>,
}

impl LoanService {
    pub fn new(loans: Arc<dyn LoanStore>) -> Self {
        Self { loans }
    }

    /// File a new `pending` application for `account_id`
    pub async fn apply(&self, ctx: &RequestContext, account_id: Uuid, amount: i64) -> Result<Uuid> {
        let now = models::now();
        let loan = LoanApplication {
            id: Uuid::new_v4(),
            account_id,
            amount,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.loans.create_loan(ctx, &loan).await?;

        info!(loan_id = %loan.id, account_id = %account_id, amount, "Loan application filed");
        Ok(loan.id)
    }

    pub async fn view_status(&self, ctx: &RequestContext, loan_id: Uuid) -> Result<LoanStatus> {
        let loan = self.find(ctx, loan_id).await?;
        Ok(loan.status)
    }

    /// Loans owned by `account_id`; none is an empty list
    pub async fn view_all(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> Result<Vec<LoanApplication>> {
        Ok(self.loans.find_loans_by_account(ctx, account_id).await?)
    }

    /// Mark a loan approved (admin only)
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        loan_id: Uuid,
    ) -> Result<()> {
        self.decide(ctx, principal, loan_id, LoanStatus::Approved)
            .await
    }

    /// Mark a loan rejected (admin only)
    pub async fn reject(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        loan_id: Uuid,
    ) -> Result<()> {
        self.decide(ctx, principal, loan_id, LoanStatus::Rejected)
            .await
    }

    /// Remove a loan (admin only); a missing loan is not an error
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        loan_id: Uuid,
    ) -> Result<()> {
        principal.require_admin()?;

        self.loans.delete_loan(ctx, loan_id).await?;

        info!(loan_id = %loan_id, deleted_by = %principal.account_id, "Loan deleted");
        Ok(())
    }

    async fn decide(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        loan_id: Uuid,
        status: LoanStatus,
    ) -> Result<()> {
        principal.require_admin()?;

        let loan = self.find(ctx, loan_id).await?;
        if loan.status.is_decided() && loan.status != status {
            warn!(
                loan_id = %loan_id,
                from = %loan.status,
                to = %status,
                "Overwriting an earlier loan decision"
            );
        }

        self.loans
            .update_loan_status(ctx, loan_id, status)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LoanTrackerError::LoanNotFound,
                other => other.into(),
            })?;

        info!(loan_id = %loan_id, status = %status, decided_by = %principal.account_id, "Loan decided");
        Ok(())
    }

    async fn find(&self, ctx: &RequestContext, loan_id: Uuid) -> Result<LoanApplication> {
        self.loans
            .find_loan_by_id(ctx, loan_id)
            .await?
            .ok_or(LoanTrackerError::LoanNotFound)
    }
}
