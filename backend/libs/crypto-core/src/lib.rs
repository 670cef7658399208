//! Shared cryptographic primitives for the loan tracker services
//!
//! - `jwt`: HS256 bearer token issuance and validation
//! - `hash`: SHA-256 digests and constant-time comparison
pub mod hash;
pub mod jwt;

pub use hash::{constant_time_eq, sha256, sha256_concat, sha256_hex};
pub use jwt::{AccountClaims, Claims, TokenError, TokenIssuer, TokenKind};
