// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Users are keyed by the identity provider's stable subject id.
pub type UserId = String;

/// OAuth credential usable against the calendar provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl Credential {
    /// A credential with a blank access token cannot authorize anything.
    pub fn is_usable(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// User profile stored in Firestore.
///
/// The credential never lands in the profile document; it is stored
/// separately (encrypted) as [`UserTokens`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Provider subject id (also used as document ID)
    pub id: UserId,
    /// Email address (unique across users)
    pub email: String,
    /// Display name
    pub display_name: String,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    /// Decrypted credential, populated by the store on read
    #[serde(skip)]
    pub credential: Option<Credential>,
    /// When the user first signed in
    pub created_at: DateTime<Utc>,
    /// Last identity resolution
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The owner's credential, if it can be used for calendar calls.
    pub fn usable_credential(&self) -> Option<&Credential> {
        self.credential.as_ref().filter(|c| c.is_usable())
    }
}

/// Identity resolved from the provider, ready to be upserted.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub provider_id: UserId,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub credential: Credential,
}

/// User's OAuth tokens (encrypted in Firestore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokens {
    /// Encrypted access token (base64)
    pub access_token_encrypted: String,
    /// Encrypted refresh token (base64)
    pub refresh_token_encrypted: Option<String>,
    /// Granted OAuth scopes
    pub scopes: Vec<String>,
    /// When the tokens were last replaced
    pub updated_at: DateTime<Utc>,
}
