// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar provider contract and the Google Calendar v3 adapter.
//!
//! Adapters never touch the interview store. The orchestrator owns every
//! write, including the write-back of the event id and meeting link.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::instrument;

use crate::models::{CalendarEvent, Credential, Interview};
use crate::time_utils::format_utc_rfc3339;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Calendar access forbidden")]
    Forbidden,

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Operations the orchestrator needs from a calendar provider.
pub trait CalendarClient: Send + Sync {
    /// Create an event (with a conference link) for the interview.
    fn create_event(
        &self,
        interview: &Interview,
        credential: &Credential,
    ) -> impl Future<Output = Result<CalendarEvent, CalendarError>> + Send;

    /// Bring an existing event in line with the interview.
    fn update_event(
        &self,
        event_id: &str,
        interview: &Interview,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Remove an event. An event that is already gone counts as removed.
    fn delete_event(
        &self,
        event_id: &str,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    hangout_link: Option<String>,
    html_link: Option<String>,
}

/// Google Calendar REST client operating on the owner's primary calendar.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base_url(CALENDAR_API_BASE, timeout)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building calendar HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn event_url(&self, event_id: &str) -> String {
        format!(
            "{}/calendars/primary/events/{}",
            self.base_url,
            urlencoding::encode(event_id)
        )
    }

    /// Fields shared by create and update.
    fn event_body(interview: &Interview) -> serde_json::Value {
        let description = format!(
            "Interview for the position of {}\n\n\
             Candidate: {} ({})\n\
             Interviewer: {} ({})",
            interview.job_title,
            interview.candidate_name,
            interview.candidate_email,
            interview.interviewer_name,
            interview.interviewer_email,
        );

        serde_json::json!({
            "summary": format!("Interview: {}", interview.job_title),
            "description": description,
            "start": {
                "dateTime": format_utc_rfc3339(interview.start_time),
                "timeZone": "UTC",
            },
            "end": {
                "dateTime": format_utc_rfc3339(interview.end_time),
                "timeZone": "UTC",
            },
            "attendees": [
                { "email": interview.candidate_email, "displayName": interview.candidate_name },
                { "email": interview.interviewer_email, "displayName": interview.interviewer_name },
            ],
        })
    }

    /// Map a non-success response onto a [`CalendarError`].
    async fn classify(response: reqwest::Response) -> CalendarError {
        let status = response.status();

        match status.as_u16() {
            401 => CalendarError::TokenExpired,
            403 => CalendarError::Forbidden,
            404 | 410 => CalendarError::EventNotFound(response.text().await.unwrap_or_default()),
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                CalendarError::RateLimited(retry_after)
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                CalendarError::Api(format!("{}: {}", status, text))
            }
        }
    }
}

impl CalendarClient for GoogleCalendarClient {
    #[instrument(skip_all, fields(interview_id = %interview.id), level = "info")]
    async fn create_event(
        &self,
        interview: &Interview,
        credential: &Credential,
    ) -> Result<CalendarEvent, CalendarError> {
        let url = format!(
            "{}/calendars/primary/events?conferenceDataVersion=1&sendUpdates=all",
            self.base_url
        );

        let mut body = Self::event_body(interview);
        // Keyed on the interview id so a repeated create yields the same conference.
        body["conferenceData"] = serde_json::json!({
            "createRequest": {
                "requestId": interview.id.to_string(),
                "conferenceSolutionKey": { "type": "hangoutsMeet" },
            },
        });
        body["reminders"] = serde_json::json!({
            "useDefault": false,
            "overrides": [
                { "method": "email", "minutes": 24 * 60 },
                { "method": "popup", "minutes": 15 },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credential.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }

        let event: EventResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Api(format!("JSON parse error: {}", e)))?;

        tracing::info!(event_id = %event.id, "Calendar event created");

        Ok(CalendarEvent {
            event_id: event.id,
            meeting_link: event.hangout_link.or(event.html_link),
        })
    }

    #[instrument(skip_all, fields(interview_id = %interview.id, event_id = %event_id), level = "info")]
    async fn update_event(
        &self,
        event_id: &str,
        interview: &Interview,
        credential: &Credential,
    ) -> Result<(), CalendarError> {
        let url = format!("{}?sendUpdates=all", self.event_url(event_id));

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&credential.access_token)
            .json(&Self::event_body(interview))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        Ok(())
    }

    #[instrument(skip(self, credential), level = "info")]
    async fn delete_event(&self, event_id: &str, credential: &Credential) -> Result<(), CalendarError> {
        let url = format!("{}?sendUpdates=all", self.event_url(event_id));

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        match Self::classify(response).await {
            CalendarError::EventNotFound(_) => {
                tracing::debug!(event_id, "Calendar event already gone");
                Ok(())
            }
            other => Err(other),
        }
    }
}
