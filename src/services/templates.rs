// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification content for interview participants.
//!
//! Every message is rendered from the final record state, so a missing
//! meeting link shows a placeholder instead of a dead link.

use crate::models::Interview;
use crate::time_utils::{duration_minutes, format_human_utc};

const LINK_PLACEHOLDER: &str = "Will be provided separately";

/// Which lifecycle event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Created,
    Updated,
    Cancelled,
}

impl NotificationKind {
    /// Step name used in logs.
    pub fn step(self) -> &'static str {
        match self {
            NotificationKind::Created => "notify.created",
            NotificationKind::Updated => "notify.updated",
            NotificationKind::Cancelled => "notify.cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Candidate,
    Interviewer,
}

/// A rendered HTML message for one recipient.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub recipient: Recipient,
    pub to_name: String,
    pub to_email: String,
    pub subject: &'static str,
    pub html: String,
}

/// Render the pair of messages (candidate first) for a lifecycle event.
pub fn render_pair(kind: NotificationKind, interview: &Interview) -> [RenderedMessage; 2] {
    [
        render(kind, Recipient::Candidate, interview),
        render(kind, Recipient::Interviewer, interview),
    ]
}

pub fn render(kind: NotificationKind, recipient: Recipient, interview: &Interview) -> RenderedMessage {
    let (to_name, to_email) = match recipient {
        Recipient::Candidate => (&interview.candidate_name, &interview.candidate_email),
        Recipient::Interviewer => (&interview.interviewer_name, &interview.interviewer_email),
    };

    RenderedMessage {
        recipient,
        to_name: to_name.clone(),
        to_email: to_email.clone(),
        subject: subject(kind, recipient),
        html: body(kind, recipient, interview),
    }
}

pub fn subject(kind: NotificationKind, recipient: Recipient) -> &'static str {
    match (kind, recipient) {
        (NotificationKind::Created, Recipient::Candidate) => "Interview Scheduled - Action Required",
        (NotificationKind::Created, Recipient::Interviewer) => "New Interview Scheduled",
        (NotificationKind::Updated, Recipient::Candidate) => "Interview Updated - Please Review",
        (NotificationKind::Updated, Recipient::Interviewer) => "Interview Updated",
        (NotificationKind::Cancelled, _) => "Interview Cancelled",
    }
}

/// Escape text for interpolation into HTML element content or attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn body(kind: NotificationKind, recipient: Recipient, interview: &Interview) -> String {
    let name = match recipient {
        Recipient::Candidate => &interview.candidate_name,
        Recipient::Interviewer => &interview.interviewer_name,
    };
    let title = html_escape(&interview.job_title);
    let when = format_human_utc(interview.start_time);

    let (heading, accent, intro) = match (kind, recipient) {
        (NotificationKind::Created, Recipient::Candidate) => (
            "Interview Scheduled",
            "#2563eb",
            format!(
                "Your interview for the <strong>{}</strong> position has been scheduled.",
                title
            ),
        ),
        (NotificationKind::Created, Recipient::Interviewer) => (
            "New Interview Scheduled",
            "#059669",
            format!(
                "A new interview has been scheduled for the <strong>{}</strong> position.",
                title
            ),
        ),
        (NotificationKind::Updated, _) => (
            "Interview Updated",
            "#d97706",
            "The interview details have changed. Please review the information below.".to_string(),
        ),
        (NotificationKind::Cancelled, Recipient::Candidate) => (
            "Interview Cancelled",
            "#dc2626",
            format!(
                "Your interview for the {} position has been cancelled.",
                title
            ),
        ),
        (NotificationKind::Cancelled, Recipient::Interviewer) => (
            "Interview Cancelled",
            "#dc2626",
            "An interview has been cancelled.".to_string(),
        ),
    };

    let mut details = vec![item("Position", &title)];
    match recipient {
        Recipient::Candidate => {
            details.push(item("Interviewer", &html_escape(&interview.interviewer_name)));
        }
        Recipient::Interviewer => {
            details.push(item("Candidate", &html_escape(&interview.candidate_name)));
            if kind != NotificationKind::Cancelled {
                let email = html_escape(&interview.candidate_email);
                details.push(item(
                    "Candidate Email",
                    &format!("<a href=\"mailto:{0}\">{0}</a>", email),
                ));
            }
        }
    }

    if kind == NotificationKind::Cancelled {
        details.push(item("Originally Scheduled", &when));
    } else {
        details.push(item("Date &amp; Time", &when));
        details.push(item(
            "Duration",
            &format!(
                "{} minutes",
                duration_minutes(interview.start_time, interview.end_time)
            ),
        ));
        let link = match interview.meeting_link.as_deref() {
            Some(link) => format!("<a href=\"{}\">Join Meeting</a>", html_escape(link)),
            None => LINK_PLACEHOLDER.to_string(),
        };
        details.push(item("Meeting Link", &link));
    }

    format!(
        "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
         <div style=\"max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"background: {accent}; color: white; padding: 16px;\">{heading}</h2>\
         <p>Dear <strong>{name}</strong>,</p>\
         <p>{intro}</p>\
         <ul>{details}</ul>\
         <p style=\"color: #6b7280; font-size: 12px;\">This is an automated message. \
         Please do not reply to this email.</p>\
         </div></body></html>",
        accent = accent,
        heading = heading,
        name = html_escape(name),
        intro = intro,
        details = details.concat(),
    )
}

fn item(label: &str, value: &str) -> String {
    format!("<li><strong>{}:</strong> {}</li>", label, value)
}
