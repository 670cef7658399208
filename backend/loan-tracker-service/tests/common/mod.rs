#![allow(dead_code)]

use async_trait::async_trait;
use loan_tracker_service::config::{
    DatabaseSettings, EmailSettings, JwtSettings, PasswordSettings, ServerSettings, Settings,
};
use loan_tracker_service::db::MemoryStore;
use loan_tracker_service::models::RegisterRequest;
use loan_tracker_service::services::{EmailNotifier, NotifierError};
use loan_tracker_service::{App, RequestContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const BASE_URL: &str = "http://localhost:8000/v1/auth";
pub const FROM: &str = "noreply@loan-tracker.local";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub from: String,
    pub to: String,
    pub body: String,
    pub subject: String,
}

impl SentEmail {
    /// Path segments after `/{kind}/` in the link embedded in the body
    pub fn link_segments(&self, kind: &str) -> Vec<String> {
        let link = self
            .body
            .split_whitespace()
            .find(|word| word.starts_with("http"))
            .expect("email body carries a link");
        let marker = format!("/{}/", kind);
        let start = link.find(&marker).expect("link has expected kind") + marker.len();
        link[start..].split('/').map(str::to_string).collect()
    }
}

/// Notifier that hands every email to a channel
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<SentEmail>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SentEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EmailNotifier for RecordingNotifier {
    async fn send(
        &self,
        from: &str,
        to: &str,
        body: &str,
        subject: &str,
    ) -> Result<(), NotifierError> {
        let _ = self.tx.send(SentEmail {
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

/// Notifier whose every send fails
pub struct FailingNotifier;

#[async_trait]
impl EmailNotifier for FailingNotifier {
    async fn send(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), NotifierError> {
        Err(NotifierError::Transport("connection refused".to_string()))
    }
}

pub fn settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            url: None,
            max_connections: 1,
            acquire_timeout: 1,
        },
        jwt: JwtSettings {
            secret: JWT_SECRET.to_string(),
            access_ttl_seconds: 3600,
            refresh_ttl_seconds: 604_800,
        },
        // Minimum Argon2 cost keeps the tests fast
        password: PasswordSettings {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
            reset_token_ttl_seconds: 3600,
        },
        server: ServerSettings {
            public_base_url: BASE_URL.to_string(),
        },
        email: EmailSettings {
            smtp_host: String::new(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_from: FROM.to_string(),
            use_starttls: false,
        },
    }
}

pub struct Harness {
    pub app: App,
    pub store: Arc<MemoryStore>,
    pub emails: mpsc::UnboundedReceiver<SentEmail>,
    pub ctx: RequestContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(&settings())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        let (notifier, emails) = RecordingNotifier::new();
        let store = Arc::new(MemoryStore::new());
        let app = App::with_components(
            settings,
            store.clone(),
            store.clone(),
            Arc::new(notifier),
        )
        .expect("app builds");

        Self {
            app,
            store,
            emails,
            ctx: RequestContext::background(),
        }
    }

    /// Wait for the next dispatched email
    pub async fn next_email(&mut self) -> SentEmail {
        tokio::time::timeout(Duration::from_secs(5), self.emails.recv())
            .await
            .expect("email dispatched in time")
            .expect("notifier channel open")
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Uuid {
        self.app
            .auth
            .register(&self.ctx, register_request(username, email, password))
            .await
            .expect("registration succeeds")
    }

    /// Register and activate through the emailed link
    pub async fn register_active(&mut self, username: &str, email: &str, password: &str) -> Uuid {
        let id = self.register(username, email, password).await;
        let email = self.next_email().await;
        let segments = email.link_segments("activate");
        self.app
            .auth
            .activate(&self.ctx, id, &segments[1])
            .await
            .expect("activation succeeds");
        id
    }
}

pub fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: format!("{} Example", username),
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}
