/// Bearer-token identity guard
use crate::error::{LoanTrackerError, Result};
use crypto_core::{TokenIssuer, TokenKind};
use std::sync::Arc;
use uuid::Uuid;

/// Identity established from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl Principal {
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            tracing::warn!(account_id = %self.account_id, "Admin operation refused");
            Err(LoanTrackerError::Forbidden)
        }
    }
}

/// Turns an `Authorization` header value into a [`Principal`]
#[derive(Debug, Clone)]
pub struct Authenticator {
    issuer: Arc<TokenIssuer>,
}

impl Authenticator {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }

    /// Validate `Bearer <access token>`
    ///
    /// The scheme is matched case-insensitively and the header must hold
    /// exactly two whitespace-separated parts. Refresh tokens are refused.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal> {
        let header = authorization.ok_or_else(|| {
            LoanTrackerError::Unauthenticated("Missing Authorization header".to_string())
        })?;

        let parts: Vec<&str> = header.split_whitespace().collect();
        let token = match parts.as_slice() {
            [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => *token,
            _ => {
                return Err(LoanTrackerError::Unauthenticated(
                    "Invalid Authorization header format".to_string(),
                ))
            }
        };

        let claims = self
            .issuer
            .verify_kind(token, TokenKind::Access)
            .map_err(|e| {
                tracing::warn!("JWT validation failed: {}", e);
                LoanTrackerError::from(e)
            })?;

        let account_id = Uuid::parse_str(&claims.sub).map_err(|e| {
            tracing::error!("Invalid account id in token: {}", e);
            LoanTrackerError::Unauthenticated("Invalid token: malformed subject".to_string())
        })?;

        Ok(Principal {
            account_id,
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crypto_core::AccountClaims;

    const SECRET: &[u8] = b"guard-test-secret-0123456789abcdef";

    fn claims(is_admin: bool) -> AccountClaims {
        AccountClaims {
            account_id: Uuid::new_v4().to_string(),
            name: "Alice".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            is_admin,
            is_active: true,
        }
    }

    fn setup() -> (Arc<TokenIssuer>, Authenticator) {
        let issuer = Arc::new(TokenIssuer::new(SECRET).unwrap());
        (issuer.clone(), Authenticator::new(issuer))
    }

    #[test]
    fn test_accepts_access_token_any_case_scheme() {
        let (issuer, guard) = setup();
        let claims = claims(true);
        let token = issuer.issue(&claims, TokenKind::Access).unwrap();

        for scheme in ["Bearer", "bearer", "BEARER"] {
            let principal = guard
                .authenticate(Some(&format!("{} {}", scheme, token)))
                .unwrap();
            assert_eq!(principal.account_id.to_string(), claims.account_id);
            assert_eq!(principal.username, "alice");
            assert!(principal.require_admin().is_ok());
        }
    }

    #[test]
    fn test_rejects_refresh_token() {
        let (issuer, guard) = setup();
        let token = issuer.issue(&claims(false), TokenKind::Refresh).unwrap();

        let err = guard
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_rejects_bad_header_shapes() {
        let (issuer, guard) = setup();
        let token = issuer.issue(&claims(false), TokenKind::Access).unwrap();

        let bad = [
            None,
            Some(String::new()),
            Some(token.clone()),
            Some(format!("Basic {}", token)),
            Some(format!("Bearer {} extra", token)),
            Some("Bearer not.a.jwt".to_string()),
        ];
        for header in bad {
            let err = guard.authenticate(header.as_deref()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        }
    }

    #[test]
    fn test_non_admin_is_forbidden() {
        let (issuer, guard) = setup();
        let token = issuer.issue(&claims(false), TokenKind::Access).unwrap();

        let principal = guard
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert!(matches!(
            principal.require_admin(),
            Err(LoanTrackerError::Forbidden)
        ));
    }
}
