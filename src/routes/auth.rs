// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in and session routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{Store, UserStore};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::services::{CalendarClient, Notifier};
use crate::AppState;

/// Routes reachable without a session.
pub fn public_routes<S, C, N>() -> Router<Arc<AppState<S, C, N>>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    Router::new().route("/auth/google", post(google_sign_in::<S, C, N>))
}

/// Routes that need a session (auth layer applied in routes/mod.rs).
pub fn protected_routes<S, C, N>() -> Router<Arc<AppState<S, C, N>>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    Router::new().route("/auth/me", get(get_me::<S, C, N>))
}

/// Authorization code obtained by the frontend's Google sign-in.
#[derive(Deserialize)]
pub struct GoogleSignInRequest {
    #[serde(default)]
    pub code: String,
}

/// Public view of a user.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Exchange an authorization code for a session token.
async fn google_sign_in<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    body: std::result::Result<Json<GoogleSignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (user, token) = state.identity.resolve(&request.code).await?;

    Ok(Json(SignInResponse {
        token,
        user: user.into(),
    }))
}

/// Get current user profile.
async fn get_me<S, C, N>(
    State(state): State<Arc<AppState<S, C, N>>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>>
where
    S: Store,
    C: CalendarClient + 'static,
    N: Notifier + 'static,
{
    let profile = state
        .store
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.into()))
}
