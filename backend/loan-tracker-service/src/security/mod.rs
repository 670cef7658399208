/// Security primitives for the loan tracker service
///
/// - **password**: Argon2id password hashing
/// - **one_time**: stateless activation and reset tokens
/// - **guard**: bearer-token identity guard
///
/// Bearer token issuance itself lives in the shared `crypto-core` crate.
pub use crypto_core::jwt;
pub use crypto_core::{Claims, TokenIssuer, TokenKind};

pub mod guard;
pub mod one_time;
pub mod password;

pub use guard::{Authenticator, Principal};
pub use password::PasswordHasher;
