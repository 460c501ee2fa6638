use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::config::{SkipReason, WebhookConfig};
use crate::dto::notification_dto::NotificationPayload;
use crate::error::Result;

const SUCCESS_CODES: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];

const LOGGED_BODY_LIMIT: usize = 500;

/// Classification of a single outbound attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NotificationResult {
    Success {
        status_code: u16,
        body: Option<JsonValue>,
    },
    Rejected {
        status_code: u16,
        body: String,
    },
    ConnectionFailed {
        message: String,
    },
    TimedOut,
    UnknownError {
        message: String,
    },
}

impl NotificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// What a dispatch path did with one certificate transition. Every entry
/// point returns one of these; none of them is surfaced as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Notified { result: NotificationResult },
    Skipped { reason: SkipReason },
    Filtered { status: String },
    MarkedUnverified,
    Failed { reason: String },
}

/// Sends one payload to one endpoint, exactly once. Retry or outbox layers
/// wrap this trait rather than living inside an implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        payload: &NotificationPayload,
        config: &WebhookConfig,
    ) -> NotificationResult;
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        payload: &NotificationPayload,
        config: &WebhookConfig,
    ) -> NotificationResult {
        info!(
            url = %config.url,
            timeout_secs = config.timeout.as_secs_f64(),
            authenticated = config.bearer_token.is_some(),
            username = %payload.username,
            course_id = %payload.course_id,
            certificate_uuid = %payload.certificate_uuid,
            "Posting certificate notification"
        );

        let mut request = self
            .client
            .post(&config.url)
            .timeout(config.timeout)
            .json(payload);
        if let Some(token) = &config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return classify_transport_error(err, config),
        };

        let status = response.status();
        if SUCCESS_CODES.contains(&status) {
            let body = match response.bytes().await {
                Ok(bytes) if bytes.is_empty() => None,
                Ok(bytes) => match serde_json::from_slice::<JsonValue>(&bytes) {
                    Ok(json) => Some(json),
                    Err(e) => {
                        debug!(error = %e, "Notification response body is not JSON");
                        None
                    }
                },
                Err(e) => {
                    debug!(error = %e, "Failed to read notification response body");
                    None
                }
            };
            info!(
                url = %config.url,
                status = status.as_u16(),
                username = %payload.username,
                course_id = %payload.course_id,
                "Certificate notification accepted"
            );
            return NotificationResult::Success {
                status_code: status.as_u16(),
                body,
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Failed to read rejected notification response body");
                String::new()
            }
        };
        warn!(
            url = %config.url,
            status = status.as_u16(),
            username = %payload.username,
            course_id = %payload.course_id,
            response = %truncate(&body, LOGGED_BODY_LIMIT),
            "Certificate notification rejected"
        );
        NotificationResult::Rejected {
            status_code: status.as_u16(),
            body,
        }
    }
}

fn classify_transport_error(err: reqwest::Error, config: &WebhookConfig) -> NotificationResult {
    if err.is_timeout() {
        error!(
            url = %config.url,
            timeout_secs = config.timeout.as_secs_f64(),
            "Timed out posting certificate notification"
        );
        NotificationResult::TimedOut
    } else if err.is_connect() {
        error!(url = %config.url, error = %err, "Could not connect to notification endpoint");
        NotificationResult::ConnectionFailed {
            message: err.to_string(),
        }
    } else {
        error!(url = %config.url, error = ?err, "Unexpected error posting certificate notification");
        NotificationResult::UnknownError {
            message: err.to_string(),
        }
    }
}

/// Logs why a dispatch path did not call the notifier.
pub fn log_skip(reason: SkipReason, path: &str) {
    match reason {
        SkipReason::ConfigDisabled => {
            info!(path, "Webhook is disabled, skipping certificate notification")
        }
        SkipReason::ConfigMissing => {
            warn!(path, "Webhook URL is not configured, skipping certificate notification")
        }
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
