// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interview records and the validated input that creates or edits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::user::UserId;

const MAX_FIELD_LEN: u64 = 255;

/// Authoritative interview record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    /// Assigned by the store (also used as document ID)
    pub id: Uuid,
    pub job_title: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub interviewer_name: String,
    pub interviewer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Conference link obtained from the calendar provider
    pub meeting_link: Option<String>,
    /// Provider event handle; set once, reused for update/delete
    pub external_event_id: Option<String>,
    pub owner_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    /// Build a fresh record from a validated draft.
    pub fn from_draft(id: Uuid, draft: InterviewDraft, owner: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            job_title: draft.job_title,
            candidate_name: draft.candidate_name,
            candidate_email: draft.candidate_email,
            interviewer_name: draft.interviewer_name,
            interviewer_email: draft.interviewer_email,
            start_time: draft.start_time,
            end_time: draft.end_time,
            meeting_link: None,
            external_event_id: None,
            owner_user_id: owner.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields. Calendar fields are left alone.
    pub fn apply_draft(&mut self, draft: InterviewDraft, now: DateTime<Utc>) {
        self.job_title = draft.job_title;
        self.candidate_name = draft.candidate_name;
        self.candidate_email = draft.candidate_email;
        self.interviewer_name = draft.interviewer_name;
        self.interviewer_email = draft.interviewer_email;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.updated_at = now;
    }

    /// Record the result of a successful calendar create.
    pub fn attach_event(&mut self, event: &CalendarEvent) {
        self.external_event_id = Some(event.event_id.clone());
        self.meeting_link = event.meeting_link.clone();
    }
}

/// The six caller-supplied interview fields plus the time window.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InterviewDraft {
    #[validate(length(min = 1, max = MAX_FIELD_LEN), custom(function = "not_blank"))]
    pub job_title: String,
    #[validate(length(min = 1, max = MAX_FIELD_LEN), custom(function = "not_blank"))]
    pub candidate_name: String,
    #[validate(email, length(max = MAX_FIELD_LEN))]
    pub candidate_email: String,
    #[validate(length(min = 1, max = MAX_FIELD_LEN), custom(function = "not_blank"))]
    pub interviewer_name: String,
    #[validate(email, length(max = MAX_FIELD_LEN))]
    pub interviewer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl InterviewDraft {
    /// Field-level checks shared by create and update.
    pub fn check_fields(&self) -> Result<(), String> {
        self.validate().map_err(|e| describe(&e))?;

        if self.start_time >= self.end_time {
            return Err("End time must be after start time".to_string());
        }
        Ok(())
    }

    /// Create additionally requires a start strictly in the future.
    pub fn check_for_create(&self, now: DateTime<Utc>) -> Result<(), String> {
        self.check_fields()?;

        if self.start_time <= now {
            return Err("Interview time must be in the future".to_string());
        }
        Ok(())
    }
}

/// Event handle and link returned by the calendar provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub event_id: String,
    pub meeting_link: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Flatten validator output into a stable one-line message.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let code = errs.first().map(|e| e.code.as_ref()).unwrap_or("invalid");
            format!("{}: {}", field, code)
        })
        .collect();
    fields.sort();
    format!("Invalid fields ({})", fields.join(", "))
}
