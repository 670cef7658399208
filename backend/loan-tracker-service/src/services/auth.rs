/// Account lifecycle and session issuance
///
/// Handles registration, activation, login, token refresh and password reset.
///
/// Security features:
/// - Argon2id password hashing
/// - Activation and reset tokens derived from account state (no token table)
/// - Reset links expire after a configurable window
/// - Refresh tokens are only honoured while a server-side record exists
use crate::context::RequestContext;
use crate::db::{AccountStore, StoreError};
use crate::error::{LoanTrackerError, Result};
use crate::models::{
    self, Account, AccountSummary, LoginRequest, Profile, RegisterRequest, ResetPasswordRequest,
};
use crate::security::one_time::{
    decode_timestamp, derive_activation_token, derive_reset_token, encode_timestamp, tokens_match,
};
use crate::security::{PasswordHasher, Principal};
use crate::services::email::{mask_email, Mailer};
use chrono::Duration;
use crypto_core::{TokenIssuer, TokenKind};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Default reset link lifetime in seconds (1 hour)
pub const RESET_TOKEN_TTL_SECS: i64 = 3600;

/// How far in the future a reset anchor may lie before it is refused
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub refresh_token: String,
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Auth workflow engine
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    mailer: Mailer,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        issuer: Arc<TokenIssuer>,
        mailer: Mailer,
    ) -> Self {
        Self {
            accounts,
            hasher,
            issuer,
            mailer,
            reset_ttl: Duration::seconds(RESET_TOKEN_TTL_SECS),
        }
    }

    /// Override the reset link lifetime
    pub fn with_reset_ttl(mut self, reset_ttl: Duration) -> Self {
        self.reset_ttl = reset_ttl;
        self.mailer = self.mailer.with_reset_ttl(reset_ttl);
        self
    }

    /// Exchange username and password for a refresh/access token pair
    ///
    /// Checks run in order: the username must exist, the account must be
    /// activated, then the password must verify. An unknown username still
    /// pays for one Argon2 verify.
    pub async fn login(&self, ctx: &RequestContext, request: &LoginRequest) -> Result<TokenPair> {
        let Some(account) = self
            .accounts
            .find_by_username(ctx, &request.username)
            .await?
        else {
            self.hasher.verify_dummy(&request.password);
            warn!(username = %request.username, "Login attempt for unknown username");
            return Err(LoanTrackerError::NoSuchUser);
        };

        if !account.is_active {
            warn!(account_id = %account.id, "Login attempt before activation");
            return Err(LoanTrackerError::NotActivated);
        }

        if !self
            .hasher
            .verify(&request.password, &account.password_hash)?
        {
            warn!(account_id = %account.id, "Login attempt with incorrect password");
            return Err(LoanTrackerError::IncorrectPassword);
        }

        let claims = account.claims();
        let refresh_token = self.issuer.issue(&claims, TokenKind::Refresh)?;
        let access_token = self.issuer.issue(&claims, TokenKind::Access)?;

        self.accounts
            .record_refresh_token(ctx, account.id, &refresh_token)
            .await?;

        info!(account_id = %account.id, "User logged in");

        Ok(TokenPair {
            refresh_token,
            access_token,
            expires_in: self.issuer.ttl(TokenKind::Access).num_seconds(),
        })
    }

    /// Create an inactive account and email its activation link
    ///
    /// The first account ever stored becomes the administrator.
    pub async fn register(&self, ctx: &RequestContext, request: RegisterRequest) -> Result<Uuid> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();

        if self.accounts.find_by_email(ctx, &email).await?.is_some() {
            return Err(LoanTrackerError::EmailTaken);
        }

        if self
            .accounts
            .find_by_username(ctx, &request.username)
            .await?
            .is_some()
        {
            return Err(LoanTrackerError::UsernameTaken);
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let is_admin = self.accounts.count(ctx).await? == 0;

        let now = models::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: request.name,
            username: request.username,
            email,
            password_hash,
            is_active: false,
            is_admin,
            created_at: now,
            updated_at: now,
        };

        let account_id = self
            .accounts
            .create_account(ctx, &account)
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent registration
                StoreError::Conflict(field) if field == "email" => LoanTrackerError::EmailTaken,
                StoreError::Conflict(field) if field == "username" => {
                    LoanTrackerError::UsernameTaken
                }
                other => other.into(),
            })?;

        let token = derive_activation_token(&account.password_hash, account.updated_at);
        let link = self.mailer.activation_link(account_id, &token);
        self.mailer.send_activation(&account.email, &link);

        info!(
            account_id = %account_id,
            username = %account.username,
            email = %mask_email(&account.email),
            is_admin,
            "Account registered"
        );

        Ok(account_id)
    }

    /// Activate an account with the token from its activation link
    pub async fn activate(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        token: &str,
    ) -> Result<()> {
        let mut account = self
            .accounts
            .find_by_id(ctx, account_id)
            .await?
            .ok_or(LoanTrackerError::AccountNotFound)?;

        let expected = derive_activation_token(&account.password_hash, account.updated_at);
        if !tokens_match(token, &expected) {
            warn!(account_id = %account_id, "Activation with invalid token");
            return Err(LoanTrackerError::InvalidToken);
        }

        account.is_active = true;
        account.updated_at = models::now();
        self.save(ctx, &account).await?;

        info!(account_id = %account_id, "Account activated");
        Ok(())
    }

    /// Email a password reset link anchored to the current moment
    pub async fn forgot_password(&self, ctx: &RequestContext, email: &str) -> Result<()> {
        let email = email.trim().to_lowercase();

        let account = self
            .accounts
            .find_by_email(ctx, &email)
            .await?
            .ok_or(LoanTrackerError::UnknownEmail)?;

        let anchor = models::now();
        let token = derive_reset_token(&account.password_hash, account.updated_at, anchor);
        let link = self
            .mailer
            .reset_link(account.id, &encode_timestamp(anchor), &token);
        self.mailer.send_password_reset(&account.email, &link);

        info!(
            account_id = %account.id,
            email = %mask_email(&account.email),
            "Password reset requested"
        );
        Ok(())
    }

    /// Replace the password using a reset link
    ///
    /// Every way the link can be wrong (unknown account, undecodable or stale
    /// timestamp, digest mismatch) reports `InvalidOrExpiredToken`.
    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        request: &ResetPasswordRequest,
    ) -> Result<()> {
        let mut account = self
            .accounts
            .find_by_id(ctx, request.account_id)
            .await?
            .ok_or(LoanTrackerError::InvalidOrExpiredToken)?;

        let anchor = decode_timestamp(&request.token_timestamp)
            .ok_or(LoanTrackerError::InvalidOrExpiredToken)?;

        let now = models::now();
        if now - anchor > self.reset_ttl || anchor - now > Duration::seconds(MAX_CLOCK_SKEW_SECS)
        {
            warn!(account_id = %account.id, "Reset link outside its validity window");
            return Err(LoanTrackerError::InvalidOrExpiredToken);
        }

        let expected = derive_reset_token(&account.password_hash, account.updated_at, anchor);
        if !tokens_match(&request.token, &expected) {
            warn!(account_id = %account.id, "Password reset with invalid token");
            return Err(LoanTrackerError::InvalidOrExpiredToken);
        }

        if !self
            .hasher
            .verify(&request.old_password, &account.password_hash)?
        {
            warn!(account_id = %account.id, "Password reset with incorrect old password");
            return Err(LoanTrackerError::IncorrectPassword);
        }

        if request.new_password.is_empty() || request.new_password.len() > 128 {
            return Err(LoanTrackerError::Validation(
                "new password must be 1-128 characters".to_string(),
            ));
        }

        account.password_hash = self.hasher.hash(&request.new_password)?;
        account.updated_at = models::now();
        self.save(ctx, &account).await?;

        info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }

    /// Name, username and email of an account
    pub async fn get_profile(&self, ctx: &RequestContext, account_id: Uuid) -> Result<Profile> {
        let account = self
            .accounts
            .find_by_id(ctx, account_id)
            .await?
            .ok_or(LoanTrackerError::AccountNotFound)?;

        Ok(account.profile())
    }

    /// Issue a new access token for a refresh token handed out at login
    ///
    /// Claims are rebuilt from the stored account, so role or activation
    /// changes since login take effect.
    pub async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<String> {
        let claims = self
            .issuer
            .verify_kind(refresh_token, TokenKind::Refresh)?;

        let record = self
            .accounts
            .find_refresh_token(ctx, refresh_token)
            .await?
            .ok_or_else(|| {
                LoanTrackerError::Unauthenticated("Unknown refresh token".to_string())
            })?;

        if record.account_id.to_string() != claims.sub {
            warn!(account_id = %record.account_id, "Refresh token subject mismatch");
            return Err(LoanTrackerError::Unauthenticated(
                "Refresh token subject mismatch".to_string(),
            ));
        }

        let account = self
            .accounts
            .find_by_id(ctx, record.account_id)
            .await?
            .ok_or_else(|| LoanTrackerError::Unauthenticated("Account no longer exists".to_string()))?;

        if !account.is_active {
            return Err(LoanTrackerError::NotActivated);
        }

        let access_token = self.issuer.issue(&account.claims(), TokenKind::Access)?;
        info!(account_id = %account.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Every account, without password hashes (admin only)
    pub async fn list_accounts(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
    ) -> Result<Vec<AccountSummary>> {
        principal.require_admin()?;

        let accounts = self.accounts.list_all(ctx).await?;
        Ok(accounts.iter().map(Account::summary).collect())
    }

    /// Remove an account (admin only)
    pub async fn delete_account(
        &self,
        ctx: &RequestContext,
        principal: &Principal,
        account_id: Uuid,
    ) -> Result<()> {
        principal.require_admin()?;

        self.accounts
            .delete_by_id(ctx, account_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LoanTrackerError::AccountNotFound,
                other => other.into(),
            })?;

        info!(
            account_id = %account_id,
            deleted_by = %principal.account_id,
            "Account deleted"
        );
        Ok(())
    }

    async fn save(&self, ctx: &RequestContext, account: &Account) -> Result<Account> {
        self.accounts
            .update_account(ctx, account)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => LoanTrackerError::AccountNotFound,
                other => other.into(),
            })
    }
}
