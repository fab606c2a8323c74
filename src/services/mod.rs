// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod identity;
pub mod kms;
pub mod notifier;
pub mod orchestrator;
pub mod templates;

pub use calendar::{CalendarClient, CalendarError, GoogleCalendarClient};
pub use identity::{GoogleOAuthClient, IdentityError, IdentityResolver};
pub use kms::KmsService;
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
pub use orchestrator::{
    InterviewError, Orchestrator, OrchestratorSettings, Outcome, SkipReason, SyncFailure, SyncReport,
    SyncStep,
};
pub use templates::NotificationKind;
