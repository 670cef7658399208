use crate::db::StoreError;
use crate::services::email::NotifierError;
use crypto_core::TokenError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoanTrackerError>;

/// Coarse error taxonomy exposed to the transport collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthenticated,
    NotActivated,
    Forbidden,
    ValidationFailed,
    Upstream,
    Internal,
}

#[derive(Debug, Error)]
pub enum LoanTrackerError {
    #[error("No user with this username")]
    NoSuchUser,

    #[error("Account not activated")]
    NotActivated,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("User exists with this email")]
    EmailTaken,

    #[error("User exists with this username")]
    UsernameTaken,

    #[error("Invalid activation token")]
    InvalidToken,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("Unregistered email")]
    UnknownEmail,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Loan not found")]
    LoanNotFound,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Admin privilege required")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl LoanTrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanTrackerError::AccountNotFound
            | LoanTrackerError::LoanNotFound
            | LoanTrackerError::UnknownEmail => ErrorKind::NotFound,
            LoanTrackerError::EmailTaken | LoanTrackerError::UsernameTaken => ErrorKind::Conflict,
            LoanTrackerError::NoSuchUser
            | LoanTrackerError::IncorrectPassword
            | LoanTrackerError::InvalidToken
            | LoanTrackerError::InvalidOrExpiredToken
            | LoanTrackerError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            LoanTrackerError::NotActivated => ErrorKind::NotActivated,
            LoanTrackerError::Forbidden => ErrorKind::Forbidden,
            LoanTrackerError::Validation(_) => ErrorKind::ValidationFailed,
            LoanTrackerError::Store(_) | LoanTrackerError::Notifier(_) => ErrorKind::Upstream,
            LoanTrackerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to return to a client
    ///
    /// Credential and token failures collapse into one message so a caller
    /// cannot tell a wrong password from an unknown user, or a tampered token
    /// from an expired one.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Unauthenticated => "Invalid credentials or token".to_string(),
            // Don't leak internal details in production
            ErrorKind::Upstream | ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

// Conversions from component error types
impl From<StoreError> for LoanTrackerError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store error: {}", err);
        LoanTrackerError::Store(err.to_string())
    }
}

impl From<NotifierError> for LoanTrackerError {
    fn from(err: NotifierError) -> Self {
        tracing::error!("Notifier error: {}", err);
        LoanTrackerError::Notifier(err.to_string())
    }
}

impl From<TokenError> for LoanTrackerError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::WeakSecret | TokenError::Signing(_) => {
                tracing::error!("JWT error: {}", err);
                LoanTrackerError::Internal(err.to_string())
            }
            other => LoanTrackerError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for LoanTrackerError {
    fn from(err: validator::ValidationErrors) -> Self {
        LoanTrackerError::Validation(err.to_string())
    }
}
