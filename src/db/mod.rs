// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: store contracts plus Firestore and in-memory backends.
//!
//! Every interview operation is scoped by owner. A record owned by someone
//! else is reported exactly like a missing one.

use std::future::Future;

use uuid::Uuid;

use crate::models::{CalendarEvent, Interview, InterviewDraft, ResolvedIdentity, User};

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TOKENS: &str = "tokens";
    pub const INTERVIEWS: &str = "interviews";
}

/// Failures reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out")]
    Timeout,
}

/// Owner-scoped CRUD over interview records.
pub trait InterviewStore: Send + Sync {
    /// Persist a new record with a fresh id and no calendar fields.
    fn create_interview(
        &self,
        draft: InterviewDraft,
        owner: &str,
    ) -> impl Future<Output = Result<Interview, StoreError>> + Send;

    fn get_interview(
        &self,
        id: Uuid,
        owner: &str,
    ) -> impl Future<Output = Result<Option<Interview>, StoreError>> + Send;

    /// All of an owner's interviews, newest first.
    fn list_interviews(
        &self,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<Interview>, StoreError>> + Send;

    /// Overwrite an existing record (matched on id and owner).
    fn update_interview(
        &self,
        interview: &Interview,
    ) -> impl Future<Output = Result<Interview, StoreError>> + Send;

    /// Write back calendar-derived fields only. `updated_at` is untouched.
    fn attach_calendar_event(
        &self,
        id: Uuid,
        owner: &str,
        event: &CalendarEvent,
    ) -> impl Future<Output = Result<Interview, StoreError>> + Send;

    fn delete_interview(
        &self,
        id: Uuid,
        owner: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// User records and their provider credentials.
pub trait UserStore: Send + Sync {
    /// Load a user with the credential decrypted.
    fn get_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Create or refresh a user from a resolved identity.
    ///
    /// A missing refresh token keeps the previously stored one. Another
    /// user already holding the email yields [`StoreError::Conflict`].
    fn upsert_user(
        &self,
        identity: &ResolvedIdentity,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;
}

/// Everything the HTTP layer needs from a backend, as one bound.
pub trait Store: InterviewStore + UserStore + Clone + 'static {}

impl<T: InterviewStore + UserStore + Clone + 'static> Store for T {}
