//! Wiring of stores, security primitives and workflow engines
use crate::config::Settings;
use crate::db::{AccountStore, LoanStore, MemoryStore, PgStore};
use crate::security::{Authenticator, PasswordHasher};
use crate::services::{AuthService, EmailNotifier, LoanService, Mailer, SmtpNotifier};
use anyhow::{Context, Result};
use crypto_core::TokenIssuer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fully wired service, cheap to clone into request handlers
#[derive(Clone)]
pub struct App {
    pub auth: AuthService,
    pub loans: LoanService,
    pub authenticator: Authenticator,
}

impl App {
    /// Build everything from configuration
    ///
    /// Connects to Postgres and runs migrations when `DATABASE_URL` is set,
    /// otherwise keeps all records in memory.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let notifier: Arc<dyn EmailNotifier> =
            Arc::new(SmtpNotifier::new(&settings.email).context("Failed to build email notifier")?);

        match &settings.database.url {
            Some(url) => {
                let store = PgStore::connect(
                    url,
                    settings.database.max_connections,
                    Duration::from_secs(settings.database.acquire_timeout),
                )
                .await
                .context("Failed to connect to database")?;
                store.migrate().await.context("Failed to run migrations")?;

                info!("Using Postgres store");
                let store = Arc::new(store);
                Self::with_components(settings, store.clone(), store, notifier)
            }
            None => {
                warn!("DATABASE_URL not set; records are kept in memory only");
                let store = Arc::new(MemoryStore::new());
                Self::with_components(settings, store.clone(), store, notifier)
            }
        }
    }

    /// Build with caller-supplied stores and notifier
    pub fn with_components(
        settings: &Settings,
        accounts: Arc<dyn AccountStore>,
        loans: Arc<dyn LoanStore>,
        notifier: Arc<dyn EmailNotifier>,
    ) -> Result<Self> {
        let issuer = Arc::new(
            TokenIssuer::with_ttls(
                settings.jwt.secret.as_bytes(),
                chrono::Duration::seconds(settings.jwt.access_ttl_seconds),
                chrono::Duration::seconds(settings.jwt.refresh_ttl_seconds),
            )
            .context("Invalid JWT configuration")?,
        );

        let hasher = PasswordHasher::new(
            settings.password.memory_kib,
            settings.password.iterations,
            settings.password.parallelism,
        )
        .context("Invalid password hashing configuration")?;

        let mailer = Mailer::new(
            notifier,
            settings.email.smtp_from.clone(),
            &settings.server.public_base_url,
        );

        let auth = AuthService::new(accounts, hasher, issuer.clone(), mailer).with_reset_ttl(
            chrono::Duration::seconds(settings.password.reset_token_ttl_seconds),
        );

        Ok(Self {
            auth,
            loans: LoanService::new(loans),
            authenticator: Authenticator::new(issuer),
        })
    }
}
