use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::WebhookConfig;
use crate::dto::event_dto::{CertificateEventEnvelope, ExtractedCertificate};
use crate::dto::notification_dto::NotificationPayload;
use crate::error::Error;
use crate::services::notifier_service::{log_skip, DeliveryOutcome, Notifier};

const DOWNLOADABLE: &str = "downloadable";

/// Certificate lifecycle events the host emits. Accepted by short name or by
/// the host's full event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateSignal {
    Created,
    Changed,
}

impl CertificateSignal {
    pub const ALL: [CertificateSignal; 2] = [Self::Created, Self::Changed];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "certificate-created",
            Self::Changed => "certificate-changed",
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created => "org.openedx.learning.certificate.created.v1",
            Self::Changed => "org.openedx.learning.certificate.changed.v1",
        }
    }
}

impl fmt::Display for CertificateSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CertificateSignal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.name() == s || signal.event_type() == s)
            .ok_or_else(|| Error::NotFound(format!("unknown certificate signal: {}", s)))
    }
}

/// Signal-driven path: forwards certificate created/changed events to the
/// configured webhook.
///
/// Nothing here deduplicates against `CertificateGenerator`. When the host
/// both calls the generator and emits an event for one transition, the
/// receiver gets two notifications and is expected to key on the
/// certificate itself.
#[derive(Clone)]
pub struct EventWebhookDispatcher {
    notifier: Arc<dyn Notifier>,
    config: WebhookConfig,
}

impl EventWebhookDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, config: WebhookConfig) -> Self {
        Self { notifier, config }
    }

    pub async fn on_certificate_created(
        &self,
        event: &CertificateEventEnvelope,
    ) -> DeliveryOutcome {
        let extracted = match self.prepare(CertificateSignal::Created, event) {
            Ok(extracted) => extracted,
            Err(outcome) => return outcome,
        };
        self.send(CertificateSignal::Created, &extracted).await
    }

    /// Only a transition into `downloadable` is forwarded.
    pub async fn on_certificate_changed(
        &self,
        event: &CertificateEventEnvelope,
    ) -> DeliveryOutcome {
        let extracted = match self.prepare(CertificateSignal::Changed, event) {
            Ok(extracted) => extracted,
            Err(outcome) => return outcome,
        };

        if extracted.status != DOWNLOADABLE {
            info!(
                username = %extracted.username,
                course_id = %extracted.course_key,
                status = %extracted.status,
                "Certificate is not downloadable, skipping webhook"
            );
            return DeliveryOutcome::Filtered {
                status: extracted.status,
            };
        }

        self.send(CertificateSignal::Changed, &extracted).await
    }

    fn prepare(
        &self,
        signal: CertificateSignal,
        event: &CertificateEventEnvelope,
    ) -> std::result::Result<ExtractedCertificate, DeliveryOutcome> {
        if let Some(reason) = self.config.skip_reason() {
            log_skip(reason, signal.name());
            return Err(DeliveryOutcome::Skipped { reason });
        }

        ExtractedCertificate::from_envelope(event).map_err(|e| {
            error!(signal = signal.name(), error = %e, "Could not extract certificate event");
            DeliveryOutcome::Failed {
                reason: e.to_string(),
            }
        })
    }

    async fn send(
        &self,
        signal: CertificateSignal,
        extracted: &ExtractedCertificate,
    ) -> DeliveryOutcome {
        info!(
            signal = signal.name(),
            username = %extracted.username,
            course_id = %extracted.course_key,
            status = %extracted.status,
            "Sending certificate event webhook"
        );
        let payload = NotificationPayload::from_event(extracted);
        let result = self.notifier.notify(&payload, &self.config).await;
        DeliveryOutcome::Notified { result }
    }
}
