//! Data models for accounts, sessions and loans
pub mod account;
pub mod loan;
pub mod refresh_token;

pub use account::{
    Account, AccountSummary, LoginRequest, Profile, RegisterRequest, ResetPasswordRequest,
};
pub use loan::{LoanApplication, LoanStatus};
pub use refresh_token::RefreshTokenRecord;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds
///
/// Postgres `timestamptz` keeps microseconds, so a timestamp stamped with this
/// reads back bit-for-bit equal. One-time tokens are derived from `updated_at`
/// and depend on that.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
