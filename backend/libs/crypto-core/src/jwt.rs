/// Bearer token issuance and validation for the loan tracker services
///
/// Tokens are HS256-signed JWTs carrying the full account claim set. The
/// signing secret is injected once at construction and never re-read from the
/// environment, so the issuer can be built with fixed keys in tests.
///
/// ## Security Design
///
/// - **HS256 ONLY**: any other algorithm in the token header is rejected
/// - **No leeway**: a token is invalid from the second its `exp` passes
/// - **Kind-checked**: access and refresh tokens are not interchangeable
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::{AccountClaims, TokenIssuer, TokenKind};
///
/// let issuer = TokenIssuer::new(b"0123456789abcdef0123456789abcdef").unwrap();
/// let claims = AccountClaims {
///     account_id: "b7d0c9a2-5a8e-4f43-9a4e-2f0f3f6d1c11".to_string(),
///     name: "Alice".to_string(),
///     username: "alice".to_string(),
///     email: "alice@x.com".to_string(),
///     is_admin: false,
///     is_active: true,
/// };
///
/// let token = issuer.issue(&claims, TokenKind::Access).unwrap();
/// let verified = issuer.verify_kind(&token, TokenKind::Access).unwrap();
/// assert_eq!(verified.account(), claims);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

/// Minimum accepted secret length (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// JWT algorithm - the only one accepted on verification
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Token kind, serialized into the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity claims copied from the account at issuance time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountClaims {
    pub account_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

/// JWT Claims structure - standard claims plus account fields
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
    pub token_type: TokenKind,
    pub name: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl Claims {
    /// Project the identity part of the claim set
    pub fn account(&self) -> AccountClaims {
        AccountClaims {
            account_id: self.sub.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            is_active: self.is_active,
        }
    }
}

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("expected {expected} token, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("signing secret must be at least 32 bytes")]
    WeakSecret,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

// ============================================================================
// Issuer
// ============================================================================

/// Signs and validates bearer tokens with a process-wide secret
///
/// Built once at startup and shared read-only; the keys are never mutated.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &JWT_ALGORITHM)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer with the default lifetimes (1 hour / 7 days)
    ///
    /// ## Errors
    ///
    /// Returns `TokenError::WeakSecret` if the secret is shorter than
    /// `MIN_SECRET_LENGTH` bytes.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        Self::with_ttls(
            secret,
            Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        )
    }

    /// Create an issuer with explicit token lifetimes
    pub fn with_ttls(
        secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::WeakSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue a token of `kind` for the account, valid from now
    pub fn issue(&self, account: &AccountClaims, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(account, kind, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        account: &AccountClaims,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expiry = now + self.ttl(kind);

        let claims = Claims {
            sub: account.account_id.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: kind,
            name: account.name.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            is_active: account.is_active,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate signature, algorithm and expiry and return the claims
    ///
    /// ## Errors
    ///
    /// - `InvalidSignature`: signature mismatch or a header algorithm other than HS256
    /// - `Expired`: current time is past `exp`
    /// - `Malformed`: the token cannot be parsed
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            TokenError::from(e)
        })?;
        Ok(data.claims)
    }

    /// Validate the token and require it to be of `expected` kind
    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
