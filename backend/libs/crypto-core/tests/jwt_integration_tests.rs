/// Integration tests for crypto-core JWT functionality
///
/// This test module covers:
/// - Token issuance and validation through the public API
/// - Token expiration handling at the expiry boundary
/// - Algorithm and kind enforcement
/// - Error handling for invalid tokens
use chrono::{Duration, Utc};
use crypto_core::jwt::{AccountClaims, TokenError, TokenIssuer, TokenKind};
use uuid::Uuid;

// FOR TESTING ONLY
const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

fn issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET).expect("Failed to build issuer")
}

fn claims(is_admin: bool) -> AccountClaims {
    AccountClaims {
        account_id: Uuid::new_v4().to_string(),
        name: "Test User".to_string(),
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        is_admin,
        is_active: true,
    }
}

// ============================================================================
// Token Issuance Tests
// ============================================================================

#[test]
fn test_issue_both_kinds_are_distinct() {
    let issuer = issuer();
    let account = claims(false);

    let access = issuer
        .issue(&account, TokenKind::Access)
        .expect("Should issue access token");
    let refresh = issuer
        .issue(&account, TokenKind::Refresh)
        .expect("Should issue refresh token");

    assert!(!access.is_empty(), "Access token should not be empty");
    assert!(!refresh.is_empty(), "Refresh token should not be empty");
    assert_ne!(access, refresh, "Token kinds must not collide");
}

#[test]
fn test_same_account_same_second_tokens_differ() {
    let issuer = issuer();
    let account = claims(false);
    let now = Utc::now();

    let first = issuer.issue_at(&account, TokenKind::Refresh, now).unwrap();
    let second = issuer.issue_at(&account, TokenKind::Refresh, now).unwrap();

    assert_ne!(first, second, "jti should make every token unique");
}

// ============================================================================
// Token Validation Tests
// ============================================================================

#[test]
fn test_verify_round_trips_claim_set() {
    let issuer = issuer();

    for is_admin in [true, false] {
        let account = claims(is_admin);
        let token = issuer.issue(&account, TokenKind::Access).unwrap();

        let verified = issuer.verify(&token).expect("Should verify fresh token");
        assert_eq!(verified.account(), account);
        assert_eq!(verified.token_type, TokenKind::Access);
    }
}

#[test]
fn test_verify_malformed_tokens() {
    let issuer = issuer();

    let malformed_tokens = vec!["invalid", "two.parts", "", "...", "invalid!@#$.token"];

    for malformed in malformed_tokens {
        let result = issuer.verify(malformed);
        assert!(
            result.is_err(),
            "Should reject malformed token: {}",
            malformed
        );
    }
}

// ============================================================================
// Token Expiration Tests
// ============================================================================

#[test]
fn test_access_token_expires_after_one_hour() {
    let issuer = issuer();
    let account = claims(false);

    let still_valid = issuer
        .issue_at(&account, TokenKind::Access, Utc::now() - Duration::minutes(59))
        .unwrap();
    assert!(issuer.verify(&still_valid).is_ok());

    let expired = issuer
        .issue_at(&account, TokenKind::Access, Utc::now() - Duration::minutes(61))
        .unwrap();
    assert_eq!(issuer.verify(&expired), Err(TokenError::Expired));
}

#[test]
fn test_refresh_token_survives_six_days() {
    let issuer = issuer();
    let account = claims(false);

    let token = issuer
        .issue_at(&account, TokenKind::Refresh, Utc::now() - Duration::days(6))
        .unwrap();
    assert!(issuer.verify_kind(&token, TokenKind::Refresh).is_ok());

    let expired = issuer
        .issue_at(&account, TokenKind::Refresh, Utc::now() - Duration::days(8))
        .unwrap();
    assert_eq!(issuer.verify(&expired), Err(TokenError::Expired));
}

#[test]
fn test_custom_ttls() {
    let issuer =
        TokenIssuer::with_ttls(TEST_SECRET, Duration::seconds(30), Duration::minutes(5)).unwrap();
    let account = claims(false);

    let token = issuer
        .issue_at(&account, TokenKind::Access, Utc::now() - Duration::seconds(31))
        .unwrap();
    assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    assert_eq!(issuer.ttl(TokenKind::Refresh), Duration::minutes(5));
}
