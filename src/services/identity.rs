// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in with Google: code exchange, profile lookup and user upsert.
//!
//! The resolver is the only writer of stored credentials.

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;
use crate::db::{StoreError, UserStore};
use crate::middleware::SessionKeys;
use crate::models::{Credential, ResolvedIdentity, User};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Identity resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(anyhow::Error),
}

/// Token response from Google's OAuth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Thin client for Google's token and userinfo endpoints.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoints(config, TOKEN_URL, USERINFO_URL)
    }

    /// Use alternate endpoints (for tests against a mock server).
    pub fn with_endpoints(
        config: &Config,
        token_url: &str,
        userinfo_url: &str,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.external_call_timeout)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http_client,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            token_url: token_url.to_string(),
            userinfo_url: userinfo_url.to_string(),
        })
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, IdentityError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Provider(format!("token request failed: {}", e)))?;

        Self::check_response_json(response, "token exchange").await
    }

    /// Fetch the signed-in user's profile.
    pub async fn userinfo(&self, access_token: &str) -> Result<GoogleProfile, IdentityError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Provider(format!("userinfo request failed: {}", e)))?;

        Self::check_response_json(response, "userinfo").await
    }

    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, IdentityError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!(
                "{} failed: HTTP {}: {}",
                what, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(format!("{} JSON parse error: {}", what, e)))
    }
}

/// Turns an authorization code into a stored user and a session token.
#[derive(Clone)]
pub struct IdentityResolver<U> {
    oauth: GoogleOAuthClient,
    users: U,
    session: SessionKeys,
}

impl<U: UserStore> IdentityResolver<U> {
    pub fn new(oauth: GoogleOAuthClient, users: U, session: SessionKeys) -> Self {
        Self {
            oauth,
            users,
            session,
        }
    }

    pub async fn resolve(&self, code: &str) -> Result<(User, String), IdentityError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(IdentityError::InvalidInput(
                "Authorization code is required".to_string(),
            ));
        }

        let grant = self.oauth.exchange_code(code).await?;
        let profile = self.oauth.userinfo(&grant.access_token).await?;

        let display_name = profile
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| profile.email.clone());

        let identity = ResolvedIdentity {
            provider_id: profile.id,
            email: profile.email,
            display_name,
            avatar_url: profile.picture,
            credential: Credential {
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
            },
        };

        let user = self.users.upsert_user(&identity).await?;
        let token = self.session.issue(&user).map_err(IdentityError::Session)?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolver(server: &MockServer, db: MemoryDb) -> IdentityResolver<MemoryDb> {
        let config = Config::test_default();
        let oauth = GoogleOAuthClient::with_endpoints(
            &config,
            &format!("{}/token", server.uri()),
            &format!("{}/userinfo", server.uri()),
        )
        .unwrap();
        IdentityResolver::new(oauth, db, SessionKeys::from_config(&config))
    }

    async fn mount_google(server: &MockServer, refresh_token: Option<&str>) {
        let mut grant = serde_json::json!({
            "access_token": "ya29.access",
            "expires_in": 3599,
            "scope": "openid email profile",
        });
        if let Some(token) = refresh_token {
            grant["refresh_token"] = serde_json::Value::String(token.to_string());
        }

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grant))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("Authorization", "Bearer ya29.access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "10987",
                "email": "owner@example.com",
                "name": "Owner Person",
                "picture": "https://example.com/p.png"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_resolve_creates_user_and_session() {
        let server = MockServer::start().await;
        mount_google(&server, Some("1//refresh")).await;
        let db = MemoryDb::new();

        let (user, token) = resolver(&server, db.clone())
            .await
            .resolve("auth-code")
            .await
            .unwrap();

        assert_eq!(user.id, "10987");
        assert_eq!(user.display_name, "Owner Person");
        let claims = SessionKeys::from_config(&Config::test_default())
            .verify(&token)
            .unwrap();
        assert_eq!(claims.sub, "10987");

        let stored = db.get_user("10987").await.unwrap().unwrap();
        assert_eq!(
            stored.credential.unwrap().refresh_token.as_deref(),
            Some("1//refresh")
        );
    }

    #[tokio::test]
    async fn test_resolve_keeps_refresh_token_when_absent() {
        let first = MockServer::start().await;
        mount_google(&first, Some("1//refresh")).await;
        let db = MemoryDb::new();
        resolver(&first, db.clone())
            .await
            .resolve("auth-code")
            .await
            .unwrap();

        let second = MockServer::start().await;
        mount_google(&second, None).await;
        let (user, _) = resolver(&second, db)
            .await
            .resolve("auth-code")
            .await
            .unwrap();

        assert_eq!(
            user.credential.unwrap().refresh_token.as_deref(),
            Some("1//refresh")
        );
    }

    #[tokio::test]
    async fn test_empty_code_rejected_without_network() {
        let server = MockServer::start().await;
        let result = resolver(&server, MemoryDb::new()).await.resolve("  ").await;
        assert!(matches!(result, Err(IdentityError::InvalidInput(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_exchange_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let db = MemoryDb::new();
        let result = resolver(&server, db.clone()).await.resolve("auth-code").await;
        assert!(matches!(result, Err(IdentityError::Provider(_))));
        assert!(db.get_user("10987").await.unwrap().is_none());
    }
}
