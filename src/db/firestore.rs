// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Tokens (KMS-encrypted OAuth credentials)
//! - Interviews (owner-scoped interview records)

use chrono::Utc;
use firestore::errors::FirestoreError;
use firestore::{paths, FirestoreWritePrecondition};
use uuid::Uuid;

use crate::db::{collections, InterviewStore, StoreError, UserStore};
use crate::models::{
    CalendarEvent, Credential, Interview, InterviewDraft, ResolvedIdentity, User, UserTokens,
};
use crate::services::KmsService;

/// OAuth scopes requested at sign-in; recorded next to the stored tokens.
const GRANTED_SCOPES: [&str; 4] = [
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/calendar.events",
];

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Writes guarded by `Exists(true)` fail with NOT_FOUND once the document is gone.
fn write_err(e: FirestoreError) -> StoreError {
    match e {
        FirestoreError::DataNotFoundError(_) => StoreError::NotFound,
        other => db_err(other),
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    kms: KmsService,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, kms: KmsService) -> anyhow::Result<Self> {
        // The emulator needs no credentials; skip ADC lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, kms).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Firestore: {}", e))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            kms,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str, kms: KmsService) -> anyhow::Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Firestore Emulator: {}", e))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            kms,
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return `Unavailable` if called.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            client: None,
            kms: KmsService::new_mock(),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("Database not connected (offline mode)".into()))
    }

    // ─── Token Operations ────────────────────────────────────────

    async fn encrypt_credential(
        &self,
        user_id: &str,
        credential: &Credential,
        previous: Option<UserTokens>,
    ) -> Result<UserTokens, StoreError> {
        let aad = Some(user_id.as_bytes());

        let access_token_encrypted = self
            .kms
            .encrypt(&credential.access_token, aad)
            .await
            .map_err(db_err)?;

        let refresh_token_encrypted = match &credential.refresh_token {
            Some(token) => Some(self.kms.encrypt(token, aad).await.map_err(db_err)?),
            None => previous.and_then(|t| t.refresh_token_encrypted),
        };

        Ok(UserTokens {
            access_token_encrypted,
            refresh_token_encrypted,
            scopes: GRANTED_SCOPES.iter().map(|s| s.to_string()).collect(),
            updated_at: Utc::now(),
        })
    }

    async fn decrypt_credential(
        &self,
        user_id: &str,
        tokens: &UserTokens,
    ) -> Result<Credential, StoreError> {
        let aad = Some(user_id.as_bytes());

        let access_token = self
            .kms
            .decrypt(&tokens.access_token_encrypted, aad)
            .await
            .map_err(db_err)?;

        let refresh_token = match &tokens.refresh_token_encrypted {
            Some(token) => Some(self.kms.decrypt(token, aad).await.map_err(db_err)?),
            None => None,
        };

        Ok(Credential {
            access_token,
            refresh_token,
        })
    }

    async fn get_tokens(&self, user_id: &str) -> Result<Option<UserTokens>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TOKENS)
            .obj()
            .one(user_id)
            .await
            .map_err(db_err)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(db_err)
    }

    async fn email_taken_by_other(&self, email: &str, user_id: &str) -> Result<bool, StoreError> {
        let email = email.to_string();
        let holders: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        Ok(holders.iter().any(|u| u.id != user_id))
    }

    // ─── Interview Helpers ───────────────────────────────────────

    async fn write_interview(&self, record: &Interview) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::INTERVIEWS)
            .document_id(record.id.to_string())
            .object(record)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Overwrite an interview only if its document still exists, so a
    /// concurrent delete is never undone by a late write.
    async fn rewrite_interview(&self, record: &Interview) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::INTERVIEWS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(record.id.to_string())
            .object(record)
            .execute()
            .await
            .map_err(write_err)?;
        Ok(())
    }
}

impl InterviewStore for FirestoreDb {
    async fn create_interview(
        &self,
        draft: InterviewDraft,
        owner: &str,
    ) -> Result<Interview, StoreError> {
        let record = Interview::from_draft(Uuid::new_v4(), draft, owner, Utc::now());
        self.write_interview(&record).await?;

        tracing::debug!(interview_id = %record.id, owner, "Interview stored");
        Ok(record)
    }

    async fn get_interview(&self, id: Uuid, owner: &str) -> Result<Option<Interview>, StoreError> {
        let record: Option<Interview> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::INTERVIEWS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(db_err)?;

        Ok(record.filter(|r| r.owner_user_id == owner))
    }

    async fn list_interviews(&self, owner: &str) -> Result<Vec<Interview>, StoreError> {
        let owner = owner.to_string();
        let mut records: Vec<Interview> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::INTERVIEWS)
            .filter(move |q| q.for_all([q.field("owner_user_id").eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        // Sorted here rather than in the query so no composite index is needed.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update_interview(&self, interview: &Interview) -> Result<Interview, StoreError> {
        if self
            .get_interview(interview.id, &interview.owner_user_id)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound);
        }

        self.rewrite_interview(interview).await?;
        Ok(interview.clone())
    }

    async fn attach_calendar_event(
        &self,
        id: Uuid,
        owner: &str,
        event: &CalendarEvent,
    ) -> Result<Interview, StoreError> {
        let mut record = self
            .get_interview(id, owner)
            .await?
            .ok_or(StoreError::NotFound)?;
        record.attach_event(event);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(Interview::{meeting_link, external_event_id}))
            .in_col(collections::INTERVIEWS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id.to_string())
            .object(&record)
            .execute()
            .await
            .map_err(write_err)?;

        Ok(record)
    }

    async fn delete_interview(&self, id: Uuid, owner: &str) -> Result<(), StoreError> {
        // The read enforces ownership; the precondition catches a delete that
        // raced in after it.
        if self.get_interview(id, owner).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::INTERVIEWS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(write_err)?;

        tracing::debug!(interview_id = %id, owner, "Interview deleted");
        Ok(())
    }
}

impl UserStore for FirestoreDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let Some(mut user) = self.get_profile(user_id).await? else {
            return Ok(None);
        };

        if let Some(tokens) = self.get_tokens(user_id).await? {
            user.credential = Some(self.decrypt_credential(user_id, &tokens).await?);
        }
        Ok(Some(user))
    }

    async fn upsert_user(&self, identity: &ResolvedIdentity) -> Result<User, StoreError> {
        let user_id = identity.provider_id.as_str();

        if self.email_taken_by_other(&identity.email, user_id).await? {
            return Err(StoreError::Conflict(format!(
                "email {} belongs to another user",
                identity.email
            )));
        }

        let now = Utc::now();
        let created_at = self
            .get_profile(user_id)
            .await?
            .map(|u| u.created_at)
            .unwrap_or(now);

        let previous_tokens = self.get_tokens(user_id).await?;
        let had_refresh = previous_tokens
            .as_ref()
            .is_some_and(|t| t.refresh_token_encrypted.is_some());
        let tokens = self
            .encrypt_credential(user_id, &identity.credential, previous_tokens)
            .await?;

        let user = User {
            id: identity.provider_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            credential: None,
            created_at,
            updated_at: now,
        };

        // Profile and tokens are written together or not at all.
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| db_err(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(db_err)?;

        client
            .fluent()
            .update()
            .in_col(collections::TOKENS)
            .document_id(user_id)
            .object(&tokens)
            .add_to_transaction(&mut transaction)
            .map_err(db_err)?;

        transaction
            .commit()
            .await
            .map_err(|e| db_err(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            kept_refresh_token = identity.credential.refresh_token.is_none() && had_refresh,
            "User upserted"
        );

        let refresh_token = match identity.credential.refresh_token.clone() {
            Some(token) => Some(token),
            None => match &tokens.refresh_token_encrypted {
                Some(encrypted) => Some(
                    self.kms
                        .decrypt(encrypted, Some(user_id.as_bytes()))
                        .await
                        .map_err(db_err)?,
                ),
                None => None,
            },
        };

        Ok(User {
            credential: Some(Credential {
                access_token: identity.credential.access_token.clone(),
                refresh_token,
            }),
            ..user
        })
    }
}
