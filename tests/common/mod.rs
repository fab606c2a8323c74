// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use interview_scheduler::config::Config;
use interview_scheduler::db::{FirestoreDb, InterviewStore, MemoryDb, StoreError, UserStore};
use interview_scheduler::middleware::SessionKeys;
use interview_scheduler::models::{
    CalendarEvent, Credential, Interview, InterviewDraft, ResolvedIdentity, User,
};
use interview_scheduler::routes::create_router;
use interview_scheduler::services::calendar::{CalendarClient, CalendarError};
use interview_scheduler::services::notifier::{Notifier, NotifyError};
use interview_scheduler::services::templates::{self, NotificationKind};
use interview_scheduler::services::{GoogleOAuthClient, KmsService, Orchestrator, OrchestratorSettings};
use interview_scheduler::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const OWNER: &str = "owner-1";
pub const OTHER_OWNER: &str = "owner-2";

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project", KmsService::new_mock())
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

// ─── Call log ───────────────────────────────────────────────

/// Ordered record of every store and adapter call, shared across fakes.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

/// How a fake adapter answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

#[derive(Clone)]
struct Switch(Arc<Mutex<Behavior>>);

impl Switch {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Behavior::Succeed)))
    }

    fn get(&self) -> Behavior {
        *self.0.lock().unwrap()
    }

    fn set(&self, behavior: Behavior) {
        *self.0.lock().unwrap() = behavior;
    }
}

// ─── Fake calendar ──────────────────────────────────────────

#[derive(Clone)]
pub struct FakeCalendar {
    log: CallLog,
    behavior: Switch,
    next_event: Arc<AtomicUsize>,
}

impl FakeCalendar {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            behavior: Switch::new(),
            next_event: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.behavior.set(behavior);
    }

    async fn answer(&self) -> Result<(), CalendarError> {
        match self.behavior.get() {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(CalendarError::Api("calendar is down".to_string())),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

impl CalendarClient for FakeCalendar {
    async fn create_event(
        &self,
        interview: &Interview,
        _credential: &Credential,
    ) -> Result<CalendarEvent, CalendarError> {
        self.log.push(format!("calendar.create:{}", interview.id));
        self.answer().await?;

        let n = self.next_event.fetch_add(1, Ordering::SeqCst);
        Ok(CalendarEvent {
            event_id: format!("evt-{n}"),
            meeting_link: Some(format!("https://meet.example.com/evt-{n}")),
        })
    }

    async fn update_event(
        &self,
        event_id: &str,
        _interview: &Interview,
        _credential: &Credential,
    ) -> Result<(), CalendarError> {
        self.log.push(format!("calendar.update:{event_id}"));
        self.answer().await
    }

    async fn delete_event(&self, event_id: &str, _credential: &Credential) -> Result<(), CalendarError> {
        self.log.push(format!("calendar.delete:{event_id}"));
        self.answer().await
    }
}

// ─── Fake notifier ──────────────────────────────────────────

#[derive(Clone)]
pub struct FakeNotifier {
    log: CallLog,
    behavior: Switch,
}

impl FakeNotifier {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            behavior: Switch::new(),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.behavior.set(behavior);
    }
}

impl Notifier for FakeNotifier {
    async fn notify(&self, kind: NotificationKind, interview: &Interview) -> Result<(), NotifyError> {
        // One entry per recipient, like a real delivery attempt.
        for message in templates::render_pair(kind, interview) {
            self.log.push(format!("{}:{}", kind.step(), message.to_email));
        }

        match self.behavior.get() {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(NotifyError::Failed("relay refused".to_string())),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

// ─── Recording store ────────────────────────────────────────

/// `MemoryDb` wrapper that logs interview writes and can stall or fail them.
#[derive(Clone)]
pub struct RecordingStore {
    pub inner: MemoryDb,
    log: CallLog,
    hang: Arc<AtomicBool>,
    fail_attach: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryDb::new(),
            log,
            hang: Arc::new(AtomicBool::new(false)),
            fail_attach: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every subsequent store call never completes.
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn set_fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    /// Updates and deletes fail while reads and creates keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("down".to_string()));
        }
        Ok(())
    }

    async fn gate(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

impl InterviewStore for RecordingStore {
    async fn create_interview(
        &self,
        draft: InterviewDraft,
        owner: &str,
    ) -> Result<Interview, StoreError> {
        self.gate().await;
        self.log.push("store.create");
        self.inner.create_interview(draft, owner).await
    }

    async fn get_interview(&self, id: Uuid, owner: &str) -> Result<Option<Interview>, StoreError> {
        self.gate().await;
        self.inner.get_interview(id, owner).await
    }

    async fn list_interviews(&self, owner: &str) -> Result<Vec<Interview>, StoreError> {
        self.gate().await;
        self.inner.list_interviews(owner).await
    }

    async fn update_interview(&self, interview: &Interview) -> Result<Interview, StoreError> {
        self.gate().await;
        self.log.push(format!("store.update:{}", interview.id));
        self.check_writable()?;
        self.inner.update_interview(interview).await
    }

    async fn attach_calendar_event(
        &self,
        id: Uuid,
        owner: &str,
        event: &CalendarEvent,
    ) -> Result<Interview, StoreError> {
        self.gate().await;
        self.log.push(format!("store.attach:{}", event.event_id));
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write-back refused".to_string()));
        }
        self.inner.attach_calendar_event(id, owner, event).await
    }

    async fn delete_interview(&self, id: Uuid, owner: &str) -> Result<(), StoreError> {
        self.gate().await;
        self.log.push(format!("store.delete:{id}"));
        self.check_writable()?;
        self.inner.delete_interview(id, owner).await
    }
}

impl UserStore for RecordingStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        self.gate().await;
        self.inner.get_user(user_id).await
    }

    async fn upsert_user(&self, identity: &ResolvedIdentity) -> Result<User, StoreError> {
        self.gate().await;
        self.inner.upsert_user(identity).await
    }
}

// ─── Builders ───────────────────────────────────────────────

/// A signed-in user with a working calendar credential.
pub fn user(id: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: format!("User {id}"),
        avatar_url: None,
        credential: Some(Credential {
            access_token: format!("access-{id}"),
            refresh_token: Some(format!("refresh-{id}")),
        }),
        created_at: now,
        updated_at: now,
    }
}

/// A signed-in user whose credential cannot be used.
pub fn user_without_credential(id: &str) -> User {
    User {
        credential: None,
        ..user(id)
    }
}

/// A valid draft starting `hours_ahead` from now, lasting one hour.
pub fn draft(hours_ahead: i64) -> InterviewDraft {
    let start = Utc::now() + ChronoDuration::hours(hours_ahead);
    InterviewDraft {
        job_title: "Backend Engineer".to_string(),
        candidate_name: "Ada Candidate".to_string(),
        candidate_email: "a@x.com".to_string(),
        interviewer_name: "Bob Interviewer".to_string(),
        interviewer_email: "b@x.com".to_string(),
        start_time: start,
        end_time: start + ChronoDuration::hours(1),
    }
}

pub fn settings(timeout: Duration) -> OrchestratorSettings {
    OrchestratorSettings {
        external_call_timeout: timeout,
        persistence_timeout: timeout,
    }
}

/// Orchestrator over fakes that share one call log.
pub struct Harness {
    pub log: CallLog,
    pub store: RecordingStore,
    pub calendar: FakeCalendar,
    pub notifier: FakeNotifier,
    pub orchestrator: Orchestrator<RecordingStore, FakeCalendar, FakeNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let log = CallLog::default();
        let store = RecordingStore::new(log.clone());
        let calendar = FakeCalendar::new(log.clone());
        let notifier = FakeNotifier::new(log.clone());

        store.inner.insert_user(user(OWNER));
        store.inner.insert_user(user(OTHER_OWNER));

        let orchestrator = Orchestrator::new(
            store.clone(),
            calendar.clone(),
            notifier.clone(),
            settings(timeout),
        );

        Self {
            log,
            store,
            calendar,
            notifier,
            orchestrator,
        }
    }
}

// ─── HTTP app ───────────────────────────────────────────────

pub type TestState = AppState<MemoryDb, FakeCalendar, FakeNotifier>;

/// Router over an in-memory store and fake adapters, with one seeded user.
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<TestState>,
    pub db: MemoryDb,
    pub log: CallLog,
    pub calendar: FakeCalendar,
    pub notifier: FakeNotifier,
}

pub fn create_test_app() -> TestApp {
    let oauth = GoogleOAuthClient::new(&Config::test_default()).expect("oauth client");
    create_test_app_with_oauth(oauth)
}

/// Same as [`create_test_app`], with the OAuth client pointed elsewhere.
pub fn create_test_app_with_oauth(oauth: GoogleOAuthClient) -> TestApp {
    let config = Config::test_default();
    let log = CallLog::default();
    let db = MemoryDb::new();
    db.insert_user(user(OWNER));

    let calendar = FakeCalendar::new(log.clone());
    let notifier = FakeNotifier::new(log.clone());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        calendar.clone(),
        notifier.clone(),
        oauth,
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        log,
        calendar,
        notifier,
    }
}

/// Session token for `user_id`, signed with the test configuration's key.
pub fn create_test_jwt(user_id: &str) -> String {
    SessionKeys::from_config(&Config::test_default())
        .issue(&user(user_id))
        .expect("issue token")
}
