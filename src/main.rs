// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interview Scheduler API Server
//!
//! Stores interview schedules and keeps each participant's calendar and
//! inbox in step with them.

use interview_scheduler::{
    config::Config,
    db::FirestoreDb,
    services::{GoogleCalendarClient, GoogleOAuthClient, KmsService, SmtpNotifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Interview Scheduler API");

    // Initialize KMS service
    let kms = KmsService::new(
        &config.gcp_project_id,
        &config.gcp_region,
        "token-encryption",
    )
    .await
    .expect("Failed to initialize KMS service");
    tracing::info!("KMS service initialized");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id, kms)
        .await
        .expect("Failed to connect to Firestore");

    let calendar = GoogleCalendarClient::new(config.external_call_timeout)
        .expect("Failed to build calendar client");
    let notifier = SmtpNotifier::new(&config).expect("Failed to build SMTP notifier");
    let oauth = GoogleOAuthClient::new(&config).expect("Failed to build OAuth client");

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        calendar,
        notifier,
        oauth,
    ));

    // Build router
    let app = interview_scheduler::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("interview_scheduler=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
