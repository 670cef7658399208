//! Stateless activation and password-reset tokens
//!
//! Both tokens are digests over the account's current password hash and
//! `updated_at`. Nothing is persisted: any write to the account changes
//! `updated_at` and every token derived before it stops matching.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use crypto_core::{constant_time_eq, sha256_concat, sha256_hex};

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Activation token: base64url(SHA-256(password_hash ‖ updated_at))
pub fn derive_activation_token(password_hash: &str, updated_at: DateTime<Utc>) -> String {
    let updated_at = format_timestamp(updated_at);
    let digest = sha256_concat(&[password_hash.as_bytes(), updated_at.as_bytes()]);
    URL_SAFE_NO_PAD.encode(digest)
}

/// Reset token: hex(SHA-256(password_hash ‖ updated_at ‖ anchor))
///
/// `anchor` is the moment the reset was requested; it travels in the link
/// next to the token (see [`encode_timestamp`]).
pub fn derive_reset_token(
    password_hash: &str,
    updated_at: DateTime<Utc>,
    anchor: DateTime<Utc>,
) -> String {
    let updated_at = format_timestamp(updated_at);
    let anchor = format_timestamp(anchor);
    sha256_hex(&[
        password_hash.as_bytes(),
        updated_at.as_bytes(),
        anchor.as_bytes(),
    ])
}

/// URL-safe form of a reset anchor
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    URL_SAFE_NO_PAD.encode(format_timestamp(ts))
}

/// Inverse of [`encode_timestamp`]; `None` for anything that does not decode
pub fn decode_timestamp(encoded: &str) -> Option<DateTime<Utc>> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    DateTime::parse_from_rfc3339(&text)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Constant-time comparison of a supplied token against the expected one
pub fn tokens_match(supplied: &str, expected: &str) -> bool {
    constant_time_eq(supplied.as_bytes(), expected.as_bytes())
}
