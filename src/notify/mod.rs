//! Push notifications for build and check results

use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::NotifyConfig;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification token and user must both be set")]
    MissingCredentials,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivery priority understood by the notification service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Emergency,
}

impl Priority {
    /// Wire value, -2 through 2
    pub fn value(self) -> i8 {
        match self {
            Priority::Lowest => -2,
            Priority::Low => -1,
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

impl TryFrom<i8> for Priority {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -2 => Ok(Priority::Lowest),
            -1 => Ok(Priority::Low),
            0 => Ok(Priority::Normal),
            1 => Ok(Priority::High),
            2 => Ok(Priority::Emergency),
            other => Err(other),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Warnings,
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Success => "passed",
            Outcome::Warnings => "passed with warnings",
            Outcome::Failure => "failed",
        })
    }
}

/// Pick the priority for an outcome. An explicit in-range value wins.
pub fn resolve_priority(outcome: Outcome, explicit: Option<i8>) -> Priority {
    if let Some(value) = explicit {
        match Priority::try_from(value) {
            Ok(priority) => return priority,
            Err(value) => tracing::warn!("Ignoring out-of-range priority {}", value),
        }
    }

    match outcome {
        Outcome::Failure => Priority::High,
        Outcome::Warnings => Priority::Normal,
        Outcome::Success => Priority::Low,
    }
}

/// Message payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub url: Option<String>,
    pub url_title: Option<String>,
    pub priority: Priority,
}

#[derive(Serialize)]
struct Form<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
    priority: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_title: Option<&'a str>,
}

/// Form-encoded POST client for the notification service
pub struct Notifier {
    client: Client,
    endpoint: String,
    token: String,
    user: String,
}

impl Notifier {
    /// Create a notifier; both credentials are required
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let (Some(token), Some(user)) = (config.token.as_deref(), config.user.as_deref()) else {
            return Err(NotifyError::MissingCredentials);
        };
        if token.is_empty() || user.is_empty() {
            return Err(NotifyError::MissingCredentials);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: token.to_string(),
            user: user.to_string(),
        })
    }

    /// Send one notification
    pub async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let form = Form {
            token: &self.token,
            user: &self.user,
            title: &notification.title,
            message: &notification.message,
            priority: notification.priority.value(),
            url: notification.url.as_deref(),
            url_title: notification.url_title.as_deref(),
        };

        let response = self.client.post(&self.endpoint).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Notification sent: {}", notification.title);
        Ok(())
    }
}
