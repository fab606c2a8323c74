// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod interview;
pub mod user;

pub use interview::{CalendarEvent, Interview, InterviewDraft};
pub use user::{Credential, ResolvedIdentity, User, UserId, UserTokens};
