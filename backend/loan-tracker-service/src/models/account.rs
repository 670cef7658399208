use chrono::{DateTime, Utc};
use crypto_core::AccountClaims;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Account model - core identity entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    /// Always stored lowercase
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Claim set embedded in bearer tokens issued for this account
    pub fn claims(&self) -> AccountClaims {
        AccountClaims {
            account_id: self.id.to_string(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            is_active: self.is_active,
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only profile projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Admin listing projection, never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Username/password login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Password reset completion request
///
/// `token_timestamp` and `token` are the two trailing path segments of the
/// emailed reset link, passed back verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub account_id: Uuid,
    pub token_timestamp: String,
    pub token: String,
    pub old_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            username: "alice".to_string(),
            email: email.to_string(),
            password: "pw1".to_string(),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request("alice@x.com").validate().is_ok());
        assert!(register_request("not-an-email").validate().is_err());

        let mut empty_username = register_request("alice@x.com");
        empty_username.username = String::new();
        assert!(empty_username.validate().is_err());
    }

    #[test]
    fn test_account_serialization_skips_password_hash() {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert_eq!(account.claims().account_id, account.id.to_string());
    }
}
