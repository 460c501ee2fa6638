use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::WebhookConfig;
use crate::dto::notification_dto::NotificationPayload;
use crate::error::Result;
use crate::models::certificate::{CertificateRecord, CertificateStatus, GenerationMode};
use crate::models::course::CourseMetadata;
use crate::services::notifier_service::{log_skip, DeliveryOutcome, Notifier};
use crate::utils::time;

pub const UNVERIFIED_SOURCE: &str = "certificate_generation";

/// Operations the generator needs from the host that owns certificates and
/// courses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateHost: Send + Sync {
    async fn course_metadata(&self, course_id: &str) -> Result<Option<CourseMetadata>>;

    /// Download URL as currently reported by the host, if it knows one.
    async fn download_url(&self, certificate: &CertificateRecord) -> Result<Option<String>>;

    async fn mark_unverified(
        &self,
        certificate: &CertificateRecord,
        mode: &str,
        source: &str,
    ) -> Result<()>;
}

/// Direct-call path, run by the host right after its certificate upsert.
///
/// The outbound call is awaited before returning, so the host's issuance
/// request waits up to `config.timeout` on a slow receiver.
#[derive(Clone)]
pub struct CertificateGenerator {
    notifier: Arc<dyn Notifier>,
    config: WebhookConfig,
}

impl CertificateGenerator {
    pub fn new(notifier: Arc<dyn Notifier>, config: WebhookConfig) -> Self {
        Self { notifier, config }
    }

    pub async fn on_certificate_issued(
        &self,
        host: &dyn CertificateHost,
        certificate: &CertificateRecord,
        generation_mode: GenerationMode,
    ) -> DeliveryOutcome {
        if certificate.status.is_passing() {
            return self.notify_passing(host, certificate, generation_mode).await;
        }

        if certificate.status == CertificateStatus::Unverified {
            let mode = certificate.mode.as_deref().unwrap_or_default();
            return match host
                .mark_unverified(certificate, mode, UNVERIFIED_SOURCE)
                .await
            {
                Ok(()) => {
                    info!(
                        user_id = certificate.user.id,
                        course_id = %certificate.course_id,
                        "Certificate marked unverified"
                    );
                    DeliveryOutcome::MarkedUnverified
                }
                Err(e) => {
                    error!(
                        user_id = certificate.user.id,
                        course_id = %certificate.course_id,
                        error = %e,
                        "Failed to mark certificate unverified"
                    );
                    DeliveryOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
        }

        info!(
            user_id = certificate.user.id,
            course_id = %certificate.course_id,
            status = %certificate.status,
            "Certificate status is not passing, no notification sent"
        );
        DeliveryOutcome::Filtered {
            status: certificate.status.to_string(),
        }
    }

    async fn notify_passing(
        &self,
        host: &dyn CertificateHost,
        certificate: &CertificateRecord,
        generation_mode: GenerationMode,
    ) -> DeliveryOutcome {
        if let Some(reason) = self.config.skip_reason() {
            log_skip(reason, "certificate_generation");
            return DeliveryOutcome::Skipped { reason };
        }

        info!(
            user_id = certificate.user.id,
            username = %certificate.user.username,
            course_id = %certificate.course_id,
            certificate_uuid = %certificate.verify_uuid,
            generation_mode = %generation_mode,
            "Notifying external certificate API"
        );

        let course = match host.course_metadata(&certificate.course_id).await {
            Ok(course) => course,
            Err(e) => {
                error!(
                    user_id = certificate.user.id,
                    course_id = %certificate.course_id,
                    certificate_uuid = %certificate.verify_uuid,
                    error = %e,
                    "Failed to load course metadata, notification not sent"
                );
                return DeliveryOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let download_url = match host.download_url(certificate).await {
            Ok(Some(url)) if !url.is_empty() => url,
            Ok(_) => certificate.download_url.clone().unwrap_or_default(),
            Err(e) => {
                warn!(
                    course_id = %certificate.course_id,
                    error = %e,
                    "Could not resolve download URL from host, using certificate record"
                );
                certificate.download_url.clone().unwrap_or_default()
            }
        };

        let payload = NotificationPayload::from_certificate(
            certificate,
            course.as_ref(),
            &download_url,
            time::now(),
        );
        let result = self.notifier.notify(&payload, &self.config).await;
        DeliveryOutcome::Notified { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkipReason;
    use crate::error::Error;
    use crate::models::certificate::Learner;
    use crate::services::notifier_service::{MockNotifier, NotificationResult};

    fn certificate(status: CertificateStatus) -> CertificateRecord {
        CertificateRecord {
            user: Learner {
                id: 42,
                username: "alice".into(),
                email: Some("alice@example.com".into()),
            },
            course_id: "course-v1:X+Y+Z".into(),
            status,
            grade: Some("0.85".into()),
            mode: Some("verified".into()),
            verify_uuid: "abc123".into(),
            download_url: Some("https://lms/cert/abc123".into()),
            name: None,
        }
    }

    fn config() -> WebhookConfig {
        WebhookConfig::new("https://ext/webhook")
    }

    fn accepted() -> NotificationResult {
        NotificationResult::Success {
            status_code: 200,
            body: None,
        }
    }

    fn host_with_course() -> MockCertificateHost {
        let mut host = MockCertificateHost::new();
        host.expect_course_metadata().returning(|_| {
            Ok(Some(CourseMetadata {
                display_name: "Demo Course".into(),
                number: "Y".into(),
            }))
        });
        host.expect_download_url().returning(|_| Ok(None));
        host.expect_mark_unverified().never();
        host
    }

    #[tokio::test]
    async fn passing_certificate_is_notified_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|payload, config| {
                payload.username == "alice"
                    && payload.status == "downloadable"
                    && payload.certificate_uuid == "abc123"
                    && payload.course_name == "Demo Course"
                    && payload.course_number == "Y"
                    && payload.certificate_url == "https://lms/cert/abc123"
                    && config.url == "https://ext/webhook"
            })
            .times(1)
            .returning(|_, _| accepted());

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        let outcome = generator
            .on_certificate_issued(
                &host_with_course(),
                &certificate(CertificateStatus::Downloadable),
                GenerationMode::Batch,
            )
            .await;

        assert_eq!(outcome, DeliveryOutcome::Notified { result: accepted() });
    }

    #[tokio::test]
    async fn generating_status_also_counts_as_passing() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _| accepted());

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        let outcome = generator
            .on_certificate_issued(
                &host_with_course(),
                &certificate(CertificateStatus::Generating),
                GenerationMode::SelfGenerated,
            )
            .await;
        assert!(matches!(outcome, DeliveryOutcome::Notified { .. }));
    }

    #[tokio::test]
    async fn non_passing_certificate_is_not_notified() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        for status in [
            CertificateStatus::Notpassing,
            CertificateStatus::AuditPassing,
            CertificateStatus::Other("on_hold".into()),
        ] {
            let outcome = generator
                .on_certificate_issued(
                    &host_with_course(),
                    &certificate(status.clone()),
                    GenerationMode::Batch,
                )
                .await;
            assert_eq!(
                outcome,
                DeliveryOutcome::Filtered {
                    status: status.to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn unverified_certificate_is_marked_instead_of_notified() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let mut host = MockCertificateHost::new();
        host.expect_mark_unverified()
            .withf(|cert, mode, source| {
                cert.verify_uuid == "abc123"
                    && mode.to_string() == "verified"
                    && source.to_string() == UNVERIFIED_SOURCE
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        let outcome = generator
            .on_certificate_issued(
                &host,
                &certificate(CertificateStatus::Unverified),
                GenerationMode::Batch,
            )
            .await;
        assert_eq!(outcome, DeliveryOutcome::MarkedUnverified);
    }

    #[tokio::test]
    async fn disabled_or_missing_config_skips_the_call() {
        for (config, reason) in [
            (WebhookConfig::disabled(), SkipReason::ConfigDisabled),
            (WebhookConfig::new(""), SkipReason::ConfigMissing),
        ] {
            let mut notifier = MockNotifier::new();
            notifier.expect_notify().never();

            let mut host = MockCertificateHost::new();
            host.expect_course_metadata().never();

            let generator = CertificateGenerator::new(Arc::new(notifier), config);
            let outcome = generator
                .on_certificate_issued(
                    &host,
                    &certificate(CertificateStatus::Downloadable),
                    GenerationMode::Batch,
                )
                .await;
            assert_eq!(outcome, DeliveryOutcome::Skipped { reason });
        }
    }

    #[tokio::test]
    async fn course_lookup_failure_is_contained() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let mut host = MockCertificateHost::new();
        host.expect_course_metadata()
            .returning(|_| Err(Error::Internal("course store unavailable".into())));

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        let outcome = generator
            .on_certificate_issued(
                &host,
                &certificate(CertificateStatus::Downloadable),
                GenerationMode::Batch,
            )
            .await;
        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn missing_course_and_failed_url_lookup_fall_back_to_defaults() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|payload, _| {
                payload.course_name.is_empty()
                    && payload.course_number.is_empty()
                    && payload.certificate_pdf_url == "https://lms/cert/abc123"
            })
            .times(1)
            .returning(|_, _| NotificationResult::TimedOut);

        let mut host = MockCertificateHost::new();
        host.expect_course_metadata().returning(|_| Ok(None));
        host.expect_download_url()
            .returning(|_| Err(Error::Internal("lookup failed".into())));

        let generator = CertificateGenerator::new(Arc::new(notifier), config());
        let outcome = generator
            .on_certificate_issued(
                &host,
                &certificate(CertificateStatus::Downloadable),
                GenerationMode::Batch,
            )
            .await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Notified {
                result: NotificationResult::TimedOut
            }
        );
    }
}
