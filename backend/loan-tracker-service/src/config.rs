//! Configuration management for loan-tracker-service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use loan_tracker_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     println!("Links point at: {}", settings.server.public_base_url);
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub password: PasswordSettings,
    pub server: ServerSettings,
    pub email: EmailSettings,
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// A `.env` file is honoured in debug builds.
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) {
            report_dotenv(dotenvy::dotenv());
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            password: PasswordSettings::from_env()?,
            server: ServerSettings::from_env()?,
            email: EmailSettings::from_env()?,
        })
    }
}

/// Log the outcome of a `.env` load; a missing file is silent
fn report_dotenv(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            info!(path = %path.display(), "Loaded .env file for development");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!(error = %e, "Failed to load .env file");
            None
        }
    }
}

/// Reject lifetimes that would make tokens or links dead on arrival
fn positive_seconds(name: &str, value: i64) -> Result<i64> {
    if value <= 0 {
        bail!("{} must be greater than zero, got {}", name, value);
    }
    Ok(value)
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Postgres URL; the in-memory store is used when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// JWT signing settings
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.len() < crypto_core::jwt::MIN_SECRET_LENGTH {
            bail!(
                "JWT_SECRET must be at least {} bytes",
                crypto_core::jwt::MIN_SECRET_LENGTH
            );
        }

        let access_ttl_seconds = env::var("JWT_ACCESS_TTL_SECONDS")
            .unwrap_or_else(|_| crypto_core::jwt::ACCESS_TOKEN_TTL_SECS.to_string())
            .parse()
            .context("Invalid JWT_ACCESS_TTL_SECONDS")?;
        let refresh_ttl_seconds = env::var("JWT_REFRESH_TTL_SECONDS")
            .unwrap_or_else(|_| crypto_core::jwt::REFRESH_TOKEN_TTL_SECS.to_string())
            .parse()
            .context("Invalid JWT_REFRESH_TTL_SECONDS")?;

        Ok(Self {
            secret,
            access_ttl_seconds: positive_seconds("JWT_ACCESS_TTL_SECONDS", access_ttl_seconds)?,
            refresh_ttl_seconds: positive_seconds("JWT_REFRESH_TTL_SECONDS", refresh_ttl_seconds)?,
        })
    }
}

/// Argon2id cost and reset link lifetime
#[derive(Debug, Clone)]
pub struct PasswordSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub reset_token_ttl_seconds: i64,
}

impl PasswordSettings {
    fn from_env() -> Result<Self> {
        let reset_token_ttl_seconds = env::var("RESET_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| crate::services::auth::RESET_TOKEN_TTL_SECS.to_string())
            .parse()
            .context("Invalid RESET_TOKEN_TTL_SECONDS")?;

        Ok(Self {
            memory_kib: env::var("PASSWORD_MEMORY_KIB")
                .unwrap_or_else(|_| "19456".to_string())
                .parse()
                .context("Invalid PASSWORD_MEMORY_KIB")?,
            iterations: env::var("PASSWORD_ITERATIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid PASSWORD_ITERATIONS")?,
            parallelism: env::var("PASSWORD_PARALLELISM")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid PASSWORD_PARALLELISM")?,
            reset_token_ttl_seconds: positive_seconds(
                "RESET_TOKEN_TTL_SECONDS",
                reset_token_ttl_seconds,
            )?,
        })
    }
}

/// Public addressing for emailed links
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_base_url: String,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/v1/auth".to_string()),
        })
    }
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@loan-tracker.local".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid SMTP_USE_STARTTLS")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "config-test-secret-0123456789abcdef";

    #[test]
    #[serial]
    fn test_jwt_settings_from_env() {
        env::set_var("JWT_SECRET", SECRET);
        env::set_var("JWT_ACCESS_TTL_SECONDS", "600");
        env::remove_var("JWT_REFRESH_TTL_SECONDS");

        let settings = JwtSettings::from_env().unwrap();

        assert_eq!(settings.secret, SECRET);
        assert_eq!(settings.access_ttl_seconds, 600);
        assert_eq!(settings.refresh_ttl_seconds, 604_800); // Default
        assert!(!format!("{:?}", settings).contains(SECRET));

        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_ACCESS_TTL_SECONDS");
    }

    #[test]
    #[serial]
    fn test_short_jwt_secret_rejected() {
        env::set_var("JWT_SECRET", "too-short");
        assert!(JwtSettings::from_env().is_err());

        env::remove_var("JWT_SECRET");
        assert!(JwtSettings::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_non_positive_ttls_rejected() {
        env::set_var("JWT_SECRET", SECRET);

        for (name, value) in [("JWT_ACCESS_TTL_SECONDS", "0"), ("JWT_REFRESH_TTL_SECONDS", "-60")] {
            env::set_var(name, value);
            let err = JwtSettings::from_env().unwrap_err();
            assert!(err.to_string().contains(name));
            env::remove_var(name);
        }
        assert!(JwtSettings::from_env().is_ok());

        env::set_var("RESET_TOKEN_TTL_SECONDS", "0");
        let err = PasswordSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("RESET_TOKEN_TTL_SECONDS"));

        env::set_var("RESET_TOKEN_TTL_SECONDS", "1800");
        assert_eq!(PasswordSettings::from_env().unwrap().reset_token_ttl_seconds, 1800);

        env::remove_var("RESET_TOKEN_TTL_SECONDS");
        env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_database_settings_from_env() {
        env::remove_var("DATABASE_URL");
        env::set_var("DATABASE_MAX_CONNECTIONS", "25");

        let settings = DatabaseSettings::from_env().unwrap();
        assert!(settings.url.is_none());
        assert_eq!(settings.max_connections, 25);
        assert_eq!(settings.acquire_timeout, 5); // Default

        env::set_var("DATABASE_URL", "postgres://localhost/loans");
        let settings = DatabaseSettings::from_env().unwrap();
        assert_eq!(settings.url.as_deref(), Some("postgres://localhost/loans"));

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_reported() {
        env::set_var("PASSWORD_ITERATIONS", "many");

        let err = PasswordSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("PASSWORD_ITERATIONS"));

        env::remove_var("PASSWORD_ITERATIONS");
    }

    #[test]
    #[serial]
    fn test_email_defaults_to_noop() {
        env::remove_var("SMTP_HOST");
        env::remove_var("SMTP_FROM");
        env::remove_var("SMTP_USE_STARTTLS");

        let settings = EmailSettings::from_env().unwrap();
        assert!(settings.smtp_host.is_empty());
        assert_eq!(settings.smtp_port, 1025);
        assert_eq!(settings.smtp_from, "noreply@loan-tracker.local");
        assert!(!settings.use_starttls);
    }

    #[test]
    #[serial]
    fn test_invalid_starttls_flag_is_reported() {
        env::set_var("SMTP_USE_STARTTLS", "maybe");
        let err = EmailSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("SMTP_USE_STARTTLS"));

        env::set_var("SMTP_USE_STARTTLS", "true");
        assert!(EmailSettings::from_env().unwrap().use_starttls);

        env::remove_var("SMTP_USE_STARTTLS");
    }

    #[test]
    fn test_dotenv_outcome_reporting() {
        let found = report_dotenv(Ok(PathBuf::from("/srv/loan-tracker/.env")));
        assert_eq!(found, Some(PathBuf::from("/srv/loan-tracker/.env")));

        let missing = dotenvy::Error::Io(std::io::ErrorKind::NotFound.into());
        assert_eq!(report_dotenv(Err(missing)), None);

        let malformed = dotenvy::Error::LineParse("KEY 'value".to_string(), 4);
        assert_eq!(report_dotenv(Err(malformed)), None);
    }

    #[test]
    #[serial]
    fn test_password_defaults() {
        env::remove_var("PASSWORD_MEMORY_KIB");
        env::remove_var("PASSWORD_ITERATIONS");
        env::remove_var("PASSWORD_PARALLELISM");
        env::remove_var("RESET_TOKEN_TTL_SECONDS");

        let settings = PasswordSettings::from_env().unwrap();
        assert_eq!(settings.memory_kib, 19456);
        assert_eq!(settings.iterations, 2);
        assert_eq!(settings.parallelism, 1);
        assert_eq!(settings.reset_token_ttl_seconds, 3600);
    }
}
