// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interview lifecycle orchestration.
//!
//! Every create/update/delete walks a fixed phase sequence. The store write
//! is authoritative and its failure aborts the operation. Calendar sync and
//! notification are best-effort: each is bounded by a timeout, and its
//! failure is logged and recorded in the [`SyncReport`] but never turned
//! into an [`InterviewError`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{InterviewStore, StoreError, UserStore};
use crate::models::{Credential, Interview, InterviewDraft, User};
use crate::services::calendar::CalendarClient;
use crate::services::notifier::Notifier;
use crate::services::templates::NotificationKind;

/// Outcomes that change the caller-visible result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterviewError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Interview not found")]
    NotFound,

    #[error("Owner no longer exists")]
    UnknownOwner,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl From<StoreError> for InterviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => InterviewError::NotFound,
            other => InterviewError::PersistenceFailure(other.to_string()),
        }
    }
}

/// A swallowed calendar or notification failure.
///
/// Only ever stored in a [`SyncReport`]; there is no conversion into
/// [`InterviewError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncFailure {
    #[error("{step} timed out after {after:?}")]
    Timeout { step: &'static str, after: Duration },

    #[error("{step} failed: {reason}")]
    Adapter { step: &'static str, reason: String },

    #[error("calendar write-back failed: {0}")]
    WriteBack(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The owner holds no credential the calendar will accept.
    NoUsableCredential,
    /// Nothing to tear down: no event was ever created.
    NoExternalEvent,
}

/// Result of one best-effort side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    Skipped(SkipReason),
    Completed,
    Failed(SyncFailure),
}

impl SyncStep {
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncStep::Completed)
    }

    fn label(&self) -> &'static str {
        match self {
            SyncStep::Skipped(_) => "skipped",
            SyncStep::Completed => "completed",
            SyncStep::Failed(_) => "failed",
        }
    }
}

impl From<Result<(), SyncFailure>> for SyncStep {
    fn from(result: Result<(), SyncFailure>) -> Self {
        match result {
            Ok(()) => SyncStep::Completed,
            Err(failure) => SyncStep::Failed(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub calendar: SyncStep,
    pub notification: SyncStep,
}

/// The authoritative record plus what happened to its side effects.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub record: Interview,
    pub sync: SyncReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Phase order for this operation, ending in `Done`.
    pub fn sequence(self) -> &'static [Phase] {
        use Phase::*;
        match self {
            Operation::Create | Operation::Update => {
                &[Validating, Persisting, SyncingCalendar, Notifying, Done]
            }
            // Side effects need the record, so it is removed last.
            Operation::Delete => &[Validating, SyncingCalendar, Notifying, Persisting, Done],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Persisting,
    SyncingCalendar,
    Notifying,
    Done,
    Aborted,
}

/// Per-request state machine. Not persisted.
#[derive(Debug)]
pub struct Lifecycle {
    operation: Operation,
    interview_id: Option<Uuid>,
    position: usize,
    phase: Phase,
}

impl Lifecycle {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            interview_id: None,
            position: 0,
            phase: Phase::Validating,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Attach the record id once it is known, for log context.
    pub fn bind(&mut self, id: Uuid) {
        self.interview_id = Some(id);
    }

    /// Step to the next phase in the operation's sequence.
    pub fn advance(&mut self) -> Phase {
        let sequence = self.operation.sequence();
        if self.phase == Phase::Aborted || self.position + 1 >= sequence.len() {
            return self.phase;
        }

        let from = self.phase;
        self.position += 1;
        self.phase = sequence[self.position];

        tracing::debug!(
            operation = self.operation.name(),
            interview_id = ?self.interview_id,
            ?from,
            to = ?self.phase,
            "Lifecycle transition"
        );
        self.phase
    }

    /// Only validation and persistence may end an operation early.
    pub fn can_abort(&self) -> bool {
        matches!(self.phase, Phase::Validating | Phase::Persisting)
    }

    /// Move to `Aborted` and hand the error back to the caller.
    pub fn abort(&mut self, err: InterviewError) -> InterviewError {
        debug_assert!(self.can_abort(), "abort from {:?}", self.phase);

        match &err {
            InterviewError::PersistenceFailure(_) => tracing::error!(
                operation = self.operation.name(),
                interview_id = ?self.interview_id,
                phase = ?self.phase,
                error = %err,
                "Interview operation aborted"
            ),
            _ => tracing::warn!(
                operation = self.operation.name(),
                interview_id = ?self.interview_id,
                phase = ?self.phase,
                error = %err,
                "Interview operation aborted"
            ),
        }

        self.phase = Phase::Aborted;
        err
    }

    fn finish(mut self, record: Interview, sync: SyncReport) -> Outcome {
        self.advance();
        debug_assert_eq!(self.phase, Phase::Done);

        tracing::info!(
            operation = self.operation.name(),
            interview_id = %record.id,
            calendar = sync.calendar.label(),
            notification = sync.notification.label(),
            "Interview operation completed"
        );
        Outcome { record, sync }
    }
}

/// Timeouts applied by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub external_call_timeout: Duration,
    pub persistence_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            external_call_timeout: config.external_call_timeout,
            persistence_timeout: config.persistence_timeout,
        }
    }
}

/// Composes store, calendar and notifier into the interview lifecycle.
#[derive(Clone)]
pub struct Orchestrator<S, C, N> {
    store: S,
    calendar: C,
    notifier: N,
    settings: OrchestratorSettings,
}

impl<S, C, N> Orchestrator<S, C, N>
where
    S: InterviewStore + UserStore,
    C: CalendarClient,
    N: Notifier,
{
    pub fn new(store: S, calendar: C, notifier: N, settings: OrchestratorSettings) -> Self {
        Self {
            store,
            calendar,
            notifier,
            settings,
        }
    }

    pub async fn create(
        &self,
        draft: InterviewDraft,
        owner_id: &str,
    ) -> Result<Outcome, InterviewError> {
        let mut lifecycle = Lifecycle::new(Operation::Create);

        draft
            .check_for_create(Utc::now())
            .map_err(|msg| lifecycle.abort(InterviewError::InvalidInput(msg)))?;
        let owner = self
            .load_owner(owner_id)
            .await
            .map_err(|e| lifecycle.abort(e))?;

        lifecycle.advance();
        let record = self
            .persist(self.store.create_interview(draft, owner_id))
            .await
            .map_err(|e| lifecycle.abort(e.into()))?;
        lifecycle.bind(record.id);

        lifecycle.advance();
        let (record, calendar) = self.sync_calendar(record, &owner).await;

        lifecycle.advance();
        let notification = self.notify(NotificationKind::Created, &record).await;

        Ok(lifecycle.finish(
            record,
            SyncReport {
                calendar,
                notification,
            },
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        draft: InterviewDraft,
        owner_id: &str,
    ) -> Result<Outcome, InterviewError> {
        let mut lifecycle = Lifecycle::new(Operation::Update);
        lifecycle.bind(id);

        let owner = self
            .load_owner(owner_id)
            .await
            .map_err(|e| lifecycle.abort(e))?;
        let mut record = self
            .load_scoped(id, owner_id)
            .await
            .map_err(|e| lifecycle.abort(e))?;
        // Only the window is re-checked; a past start is tolerated on edit.
        draft
            .check_fields()
            .map_err(|msg| lifecycle.abort(InterviewError::InvalidInput(msg)))?;

        lifecycle.advance();
        record.apply_draft(draft, Utc::now());
        let record = self
            .persist(self.store.update_interview(&record))
            .await
            .map_err(|e| lifecycle.abort(e.into()))?;

        lifecycle.advance();
        let (record, calendar) = self.sync_calendar(record, &owner).await;

        lifecycle.advance();
        let notification = self.notify(NotificationKind::Updated, &record).await;

        Ok(lifecycle.finish(
            record,
            SyncReport {
                calendar,
                notification,
            },
        ))
    }

    pub async fn delete(&self, id: Uuid, owner_id: &str) -> Result<Outcome, InterviewError> {
        let mut lifecycle = Lifecycle::new(Operation::Delete);
        lifecycle.bind(id);

        let owner = self
            .load_owner(owner_id)
            .await
            .map_err(|e| lifecycle.abort(e))?;
        let record = self
            .load_scoped(id, owner_id)
            .await
            .map_err(|e| lifecycle.abort(e))?;

        lifecycle.advance();
        let calendar = self.teardown_calendar(&record, &owner).await;

        lifecycle.advance();
        let notification = self.notify(NotificationKind::Cancelled, &record).await;

        lifecycle.advance();
        self.persist(self.store.delete_interview(id, owner_id))
            .await
            .map_err(|e| lifecycle.abort(e.into()))?;

        Ok(lifecycle.finish(
            record,
            SyncReport {
                calendar,
                notification,
            },
        ))
    }

    /// Fetch one interview visible to `owner_id`.
    pub async fn get(&self, id: Uuid, owner_id: &str) -> Result<Interview, InterviewError> {
        self.load_scoped(id, owner_id).await
    }

    /// All of the owner's interviews, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Interview>, InterviewError> {
        Ok(self.persist(self.store.list_interviews(owner_id)).await?)
    }

    // ─── Helpers ────────────────────────────────────────────────

    async fn load_owner(&self, owner_id: &str) -> Result<User, InterviewError> {
        self.persist(self.store.get_user(owner_id))
            .await
            .map_err(|e| InterviewError::PersistenceFailure(e.to_string()))?
            .ok_or(InterviewError::UnknownOwner)
    }

    async fn load_scoped(&self, id: Uuid, owner_id: &str) -> Result<Interview, InterviewError> {
        self.persist(self.store.get_interview(id, owner_id))
            .await?
            .ok_or(InterviewError::NotFound)
    }

    /// Create or update the calendar event, writing back a new event's id.
    ///
    /// On any failure the record is returned exactly as persisted.
    async fn sync_calendar(&self, record: Interview, owner: &User) -> (Interview, SyncStep) {
        let Some(credential) = owner.usable_credential() else {
            tracing::debug!(interview_id = %record.id, "No usable credential; calendar sync skipped");
            return (record, SyncStep::Skipped(SkipReason::NoUsableCredential));
        };

        if let Some(event_id) = record.external_event_id.as_deref() {
            let result = self
                .external(
                    "calendar.update",
                    record.id,
                    self.calendar.update_event(event_id, &record, credential),
                )
                .await;
            return (record, result.into());
        }

        self.create_and_attach(record, credential).await
    }

    async fn create_and_attach(&self, record: Interview, credential: &Credential) -> (Interview, SyncStep) {
        let event = match self
            .external(
                "calendar.create",
                record.id,
                self.calendar.create_event(&record, credential),
            )
            .await
        {
            Ok(event) => event,
            Err(failure) => return (record, SyncStep::Failed(failure)),
        };

        match self
            .persist(
                self.store
                    .attach_calendar_event(record.id, &record.owner_user_id, &event),
            )
            .await
        {
            Ok(updated) => (updated, SyncStep::Completed),
            Err(e) => {
                tracing::warn!(
                    interview_id = %record.id,
                    step = "calendar.write_back",
                    event_id = %event.event_id,
                    error = %e,
                    "Calendar event created but not recorded; event is orphaned"
                );
                (record, SyncStep::Failed(SyncFailure::WriteBack(e.to_string())))
            }
        }
    }

    async fn teardown_calendar(&self, record: &Interview, owner: &User) -> SyncStep {
        let Some(event_id) = record.external_event_id.as_deref() else {
            return SyncStep::Skipped(SkipReason::NoExternalEvent);
        };

        let Some(credential) = owner.usable_credential() else {
            tracing::warn!(
                interview_id = %record.id,
                event_id,
                "No usable credential; calendar event will be orphaned"
            );
            return SyncStep::Skipped(SkipReason::NoUsableCredential);
        };

        let result = self
            .external(
                "calendar.delete",
                record.id,
                self.calendar.delete_event(event_id, credential),
            )
            .await;

        if result.is_err() {
            tracing::warn!(
                interview_id = %record.id,
                event_id,
                "Calendar event left orphaned after failed delete"
            );
        }
        result.into()
    }

    async fn notify(&self, kind: NotificationKind, record: &Interview) -> SyncStep {
        let step = kind.step();
        let result = match kind {
            NotificationKind::Created => {
                self.external(step, record.id, self.notifier.notify_created(record))
                    .await
            }
            NotificationKind::Updated => {
                self.external(step, record.id, self.notifier.notify_updated(record))
                    .await
            }
            NotificationKind::Cancelled => {
                self.external(step, record.id, self.notifier.notify_cancelled(record))
                    .await
            }
        };
        result.into()
    }

    /// Bound a store call. A timeout is fatal to the caller.
    async fn persist<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.settings.persistence_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }

    /// Bound an adapter call and classify its failure.
    async fn external<T, E: Display>(
        &self,
        step: &'static str,
        interview_id: Uuid,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, SyncFailure> {
        let after = self.settings.external_call_timeout;

        let failure = match tokio::time::timeout(after, call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => SyncFailure::Adapter {
                step,
                reason: e.to_string(),
            },
            Err(_) => SyncFailure::Timeout { step, after },
        };

        tracing::warn!(interview_id = %interview_id, step, error = %failure, "External sync failed");
        Err(failure)
    }
}
