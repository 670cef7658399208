/// Service layer for loan-tracker-service
///
/// - Auth workflow (registration, activation, login, refresh, password reset)
/// - Loan workflow (apply, view, approve/reject, delete)
/// - Email delivery (SMTP for activation/password reset links)
pub mod auth;
pub mod email;
pub mod loans;

pub use auth::{AuthService, TokenPair};
pub use email::{EmailNotifier, Mailer, NotifierError, SmtpNotifier};
pub use loans::LoanService;
