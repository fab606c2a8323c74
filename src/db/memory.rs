// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for tests and offline development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{InterviewStore, StoreError, UserStore};
use crate::models::{
    CalendarEvent, Credential, Interview, InterviewDraft, ResolvedIdentity, User, UserId,
};

#[derive(Default)]
struct Inner {
    users: DashMap<UserId, User>,
    interviews: DashMap<Uuid, Interview>,
    offline: AtomicBool,
}

/// `DashMap`-backed store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored interviews across all owners.
    pub fn interview_count(&self) -> usize {
        self.inner.interviews.len()
    }

    /// Insert a user directly, bypassing identity resolution.
    pub fn insert_user(&self, user: User) {
        self.inner.users.insert(user.id.clone(), user);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

impl InterviewStore for MemoryDb {
    async fn create_interview(
        &self,
        draft: InterviewDraft,
        owner: &str,
    ) -> Result<Interview, StoreError> {
        self.check_online()?;

        let record = Interview::from_draft(Uuid::new_v4(), draft, owner, Utc::now());
        self.inner.interviews.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_interview(&self, id: Uuid, owner: &str) -> Result<Option<Interview>, StoreError> {
        self.check_online()?;

        Ok(self
            .inner
            .interviews
            .get(&id)
            .filter(|r| r.owner_user_id == owner)
            .map(|r| r.clone()))
    }

    async fn list_interviews(&self, owner: &str) -> Result<Vec<Interview>, StoreError> {
        self.check_online()?;

        let mut records: Vec<Interview> = self
            .inner
            .interviews
            .iter()
            .filter(|r| r.owner_user_id == owner)
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update_interview(&self, interview: &Interview) -> Result<Interview, StoreError> {
        self.check_online()?;

        let mut entry = self
            .inner
            .interviews
            .get_mut(&interview.id)
            .filter(|r| r.owner_user_id == interview.owner_user_id)
            .ok_or(StoreError::NotFound)?;
        *entry = interview.clone();
        Ok(entry.clone())
    }

    async fn attach_calendar_event(
        &self,
        id: Uuid,
        owner: &str,
        event: &CalendarEvent,
    ) -> Result<Interview, StoreError> {
        self.check_online()?;

        let mut entry = self
            .inner
            .interviews
            .get_mut(&id)
            .filter(|r| r.owner_user_id == owner)
            .ok_or(StoreError::NotFound)?;
        entry.attach_event(event);
        Ok(entry.clone())
    }

    async fn delete_interview(&self, id: Uuid, owner: &str) -> Result<(), StoreError> {
        self.check_online()?;

        self.inner
            .interviews
            .remove_if(&id, |_, r| r.owner_user_id == owner)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

impl UserStore for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        self.check_online()?;

        Ok(self.inner.users.get(user_id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, identity: &ResolvedIdentity) -> Result<User, StoreError> {
        self.check_online()?;

        let taken = self
            .inner
            .users
            .iter()
            .any(|u| u.email == identity.email && u.id != identity.provider_id);
        if taken {
            return Err(StoreError::Conflict(format!(
                "email {} belongs to another user",
                identity.email
            )));
        }

        let now = Utc::now();
        let mut entry = self
            .inner
            .users
            .entry(identity.provider_id.clone())
            .or_insert_with(|| User {
                id: identity.provider_id.clone(),
                email: identity.email.clone(),
                display_name: identity.display_name.clone(),
                avatar_url: None,
                credential: None,
                created_at: now,
                updated_at: now,
            });

        let previous_refresh = entry
            .credential
            .as_ref()
            .and_then(|c| c.refresh_token.clone());

        entry.email = identity.email.clone();
        entry.display_name = identity.display_name.clone();
        entry.avatar_url = identity.avatar_url.clone();
        entry.credential = Some(Credential {
            access_token: identity.credential.access_token.clone(),
            refresh_token: identity.credential.refresh_token.clone().or(previous_refresh),
        });
        entry.updated_at = now;

        Ok(entry.clone())
    }
}
