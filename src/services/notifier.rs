// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participant notification contract and SMTP delivery.

use std::future::Future;

use anyhow::Context;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::models::Interview;
use crate::services::templates::{self, NotificationKind, RenderedMessage};

/// Port on which the relay expects implicit TLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivery failure. Both recipients are always attempted, so a partial
/// failure means the other message already went out.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery to {recipient} failed: {reason}")]
    Partial { recipient: String, reason: String },

    #[error("delivery to all recipients failed: {0}")]
    Failed(String),
}

/// Sends lifecycle notifications to the candidate and the interviewer.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        kind: NotificationKind,
        interview: &Interview,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    fn notify_created(
        &self,
        interview: &Interview,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        self.notify(NotificationKind::Created, interview)
    }

    fn notify_updated(
        &self,
        interview: &Interview,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        self.notify(NotificationKind::Updated, interview)
    }

    fn notify_cancelled(
        &self,
        interview: &Interview,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        self.notify(NotificationKind::Cancelled, interview)
    }
}

/// Fold per-recipient outcomes into a single result.
pub fn summarize(outcomes: Vec<(String, Result<(), String>)>) -> Result<(), NotifyError> {
    let total = outcomes.len();
    let failures: Vec<(String, String)> = outcomes
        .into_iter()
        .filter_map(|(recipient, result)| result.err().map(|reason| (recipient, reason)))
        .collect();

    match failures.len() {
        0 => Ok(()),
        n if n == total => Err(NotifyError::Failed(
            failures
                .iter()
                .map(|(recipient, reason)| format!("{}: {}", recipient, reason))
                .collect::<Vec<_>>()
                .join("; "),
        )),
        _ => {
            let (recipient, reason) = failures.into_iter().next().unwrap_or_default();
            Err(NotifyError::Partial { recipient, reason })
        }
    }
}

/// HTML mail over an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .context("failed configuring SMTP relay")?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(config.external_call_timeout))
            .build();

        let from = Mailbox::new(
            Some(config.mail_from_name.clone()),
            config
                .mail_from_address
                .parse()
                .context("invalid MAIL_FROM_ADDRESS")?,
        );

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "SMTP notifier configured"
        );

        Ok(Self { transport, from })
    }

    fn build(&self, message: &RenderedMessage) -> Result<Message, String> {
        let to = Mailbox::new(
            Some(message.to_name.clone()),
            message.to_email.parse().map_err(|e| format!("{}", e))?,
        );

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .map_err(|e| e.to_string())
    }

    async fn deliver(&self, message: &RenderedMessage) -> Result<(), String> {
        let email = self.build(message)?;
        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl Notifier for SmtpNotifier {
    async fn notify(&self, kind: NotificationKind, interview: &Interview) -> Result<(), NotifyError> {
        let mut outcomes = Vec::with_capacity(2);

        for message in templates::render_pair(kind, interview) {
            let result = self.deliver(&message).await;
            if result.is_ok() {
                tracing::debug!(
                    interview_id = %interview.id,
                    step = kind.step(),
                    recipient = ?message.recipient,
                    "Notification sent"
                );
            }
            outcomes.push((message.to_email, result));
        }

        summarize(outcomes)
    }
}
