// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interview CRUD routes. All access is scoped to the signed-in owner.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Interview, InterviewDraft};
use crate::services::{CalendarClient, Notifier};
use crate::AppState;

/// Interview routes (require authentication via JWT).
pub fn routes<S, C, N>() -> Router<Arc<AppState<S, C, N>>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/interview",
            get(list_interviews::<S, C, N>).post(create_interview::<S, C, N>),
        )
        .route(
            "/interview/{id}",
            get(get_interview::<S, C, N>)
                .put(update_interview::<S, C, N>)
                .delete(delete_interview::<S, C, N>),
        )
}

/// Interview as returned to the owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub job_title: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub interviewer_name: String,
    pub interviewer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Interview> for InterviewResponse {
    fn from(record: Interview) -> Self {
        Self {
            id: record.id,
            job_title: record.job_title,
            candidate_name: record.candidate_name,
            candidate_email: record.candidate_email,
            interviewer_name: record.interviewer_name,
            interviewer_email: record.interviewer_email,
            start_time: record.start_time,
            end_time: record.end_time,
            meeting_link: record.meeting_link,
            external_event_id: record.external_event_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// An id that is not a UUID cannot name any record.
fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Interview not found".to_string()))
}

fn parse_body(body: std::result::Result<Json<InterviewDraft>, JsonRejection>) -> Result<InterviewDraft> {
    body.map(|Json(draft)| draft)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn list_interviews<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<InterviewResponse>>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let records = state.orchestrator.list(&user.user_id).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn get_interview<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<InterviewResponse>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let id = parse_id(&id)?;
    let record = state.orchestrator.get(id, &user.user_id).await?;
    Ok(Json(record.into()))
}

async fn create_interview<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<InterviewDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<InterviewResponse>)>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let draft = parse_body(body)?;
    let outcome = state.orchestrator.create(draft, &user.user_id).await?;
    Ok((StatusCode::CREATED, Json(outcome.record.into())))
}

async fn update_interview<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: std::result::Result<Json<InterviewDraft>, JsonRejection>,
) -> Result<Json<InterviewResponse>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let id = parse_id(&id)?;
    let draft = parse_body(body)?;
    let outcome = state.orchestrator.update(id, draft, &user.user_id).await?;
    Ok(Json(outcome.record.into()))
}

async fn delete_interview<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let id = parse_id(&id)?;
    state.orchestrator.delete(id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
