// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Interview Scheduler: schedule interviews and keep calendars and inboxes
//! in step.
//!
//! This crate provides the backend API. Interview records are authoritative;
//! calendar events and email notifications are best-effort side effects
//! driven by the [`services::orchestrator`].

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use middleware::SessionKeys;
use services::{
    CalendarClient, GoogleOAuthClient, IdentityResolver, Notifier, Orchestrator,
    OrchestratorSettings,
};

/// Shared application state.
pub struct AppState<S, C, N> {
    pub config: Config,
    pub store: S,
    pub orchestrator: Orchestrator<S, C, N>,
    pub identity: IdentityResolver<S>,
    pub session: SessionKeys,
}

impl<S, C, N> AppState<S, C, N>
where
    S: Store,
    C: CalendarClient,
    N: Notifier,
{
    /// Wire every component from one configuration value.
    pub fn new(config: Config, store: S, calendar: C, notifier: N, oauth: GoogleOAuthClient) -> Self {
        let session = SessionKeys::from_config(&config);
        let orchestrator = Orchestrator::new(
            store.clone(),
            calendar,
            notifier,
            OrchestratorSettings::from_config(&config),
        );
        let identity = IdentityResolver::new(oauth, store.clone(), session.clone());

        Self {
            config,
            store,
            orchestrator,
            identity,
            session,
        }
    }
}
