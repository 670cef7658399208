/// Loan Tracker Service Library
///
/// User accounts and loan applications: registration with emailed activation,
/// JWT sessions, password reset by emailed link, and a small loan approval
/// workflow.
///
/// ## Modules
///
/// - `app`: Wiring from configuration
/// - `config`: Service configuration
/// - `context`: Per-request cancellation and deadlines
/// - `db`: Store contracts with in-memory and Postgres implementations
/// - `error`: Error types
/// - `models`: Data models
/// - `security`: Password hashing, one-time tokens, identity guard
/// - `services`: Auth and loan workflows, email delivery
/// - `telemetry`: Tracing setup
pub mod app;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use app::App;
pub use context::RequestContext;
pub use error::{ErrorKind, LoanTrackerError, Result};
