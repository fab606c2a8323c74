// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and handed to each component's
//! constructor. Nothing reads the environment after that.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Redirect URI registered for the authorization-code exchange
    pub google_redirect_uri: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore + KMS)
    pub gcp_project_id: String,
    /// GCP region of the KMS key ring
    pub gcp_region: String,
    /// Server port
    pub port: u16,
    /// Session token issuer claim
    pub jwt_issuer: String,
    /// Session token audience claim
    pub jwt_audience: String,
    /// Session token lifetime in days
    pub jwt_expiry_days: i64,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port (465 = implicit TLS, anything else = STARTTLS)
    pub smtp_port: u16,
    /// Display name on outgoing notifications
    pub mail_from_name: String,
    /// Sender address on outgoing notifications
    pub mail_from_address: String,
    /// Bound on every calendar / notifier call
    pub external_call_timeout: Duration,
    /// Bound on every store call
    pub persistence_timeout: Duration,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// SMTP login
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: String,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_redirect_uri: "postmessage".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            gcp_region: "us-west1".to_string(),
            port: 8080,
            jwt_issuer: "interview-scheduler".to_string(),
            jwt_audience: "interview-scheduler".to_string(),
            jwt_expiry_days: 7,
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            mail_from_name: "Interview Scheduler".to_string(),
            mail_from_address: "scheduler@example.com".to_string(),
            external_call_timeout: Duration::from_secs(10),
            persistence_timeout: Duration::from_secs(10),
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            smtp_username: "scheduler@example.com".to_string(),
            smtp_password: "test_password".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local
    /// development. In Cloud Run the secrets arrive as env vars through
    /// secret bindings.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let smtp_username = required("SMTP_USERNAME")?;

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_redirect_uri: optional("GOOGLE_REDIRECT_URI", "postmessage"),
            frontend_url: optional("FRONTEND_URL", "http://localhost:5173"),
            gcp_project_id: optional("GCP_PROJECT_ID", "local-dev"),
            gcp_region: optional("GCP_REGION", "us-west1"),
            port: parsed("PORT", 8080)?,
            jwt_issuer: optional("JWT_ISSUER", "interview-scheduler"),
            jwt_audience: optional("JWT_AUDIENCE", "interview-scheduler"),
            jwt_expiry_days: parsed("JWT_EXPIRY_DAYS", 7)?,
            smtp_host: required("SMTP_HOST")?,
            smtp_port: parsed("SMTP_PORT", 465)?,
            mail_from_name: optional("MAIL_FROM_NAME", "Interview Scheduler"),
            mail_from_address: optional("MAIL_FROM_ADDRESS", &smtp_username),
            external_call_timeout: Duration::from_secs(parsed("EXTERNAL_CALL_TIMEOUT_SECS", 10)?),
            persistence_timeout: Duration::from_secs(parsed("PERSISTENCE_TIMEOUT_SECS", 10)?),

            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            smtp_username,
            smtp_password: required("SMTP_PASSWORD")?,
        })
    }
}

/// A set but blank variable counts as missing.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
