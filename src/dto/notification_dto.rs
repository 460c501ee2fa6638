use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::event_dto::ExtractedCertificate;
use crate::models::{certificate::CertificateRecord, course::CourseMetadata};
use crate::utils::time;

/// JSON body posted to the external receiver. Built fresh for every call;
/// every text field is an empty string rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub username: String,
    pub email: String,
    pub course_id: String,
    pub course_name: String,
    pub course_number: String,
    pub user_id: i64,
    pub certificate_url: String,
    pub certificate_pdf_url: String,
    pub certificate_uuid: String,
    pub completed_date: String,
    pub grade: String,
    pub mode: String,
    pub status: String,
}

impl NotificationPayload {
    pub fn from_certificate(
        certificate: &CertificateRecord,
        course: Option<&CourseMetadata>,
        download_url: &str,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: certificate.user.username.clone(),
            email: certificate.user.email.clone().unwrap_or_default(),
            course_id: certificate.course_id.clone(),
            course_name: course.map(|c| c.display_name.clone()).unwrap_or_default(),
            course_number: course.map(|c| c.number.clone()).unwrap_or_default(),
            user_id: certificate.user.id,
            certificate_url: download_url.to_string(),
            certificate_pdf_url: download_url.to_string(),
            certificate_uuid: certificate.verify_uuid.clone(),
            completed_date: time::to_iso8601(completed_at),
            grade: certificate.grade.clone().unwrap_or_default(),
            mode: certificate.mode.clone().unwrap_or_default(),
            status: certificate.status.to_string(),
        }
    }

    /// Event payloads carry no verification UUID and no course number.
    pub fn from_event(extracted: &ExtractedCertificate) -> Self {
        Self {
            username: extracted.username.clone(),
            email: extracted.email.clone(),
            course_id: extracted.course_key.clone(),
            course_name: extracted.name.clone(),
            course_number: String::new(),
            user_id: extracted.user_id,
            certificate_url: extracted.download_url.clone(),
            certificate_pdf_url: extracted.download_url.clone(),
            certificate_uuid: String::new(),
            completed_date: extracted.completed_date.clone(),
            grade: extracted.grade.clone(),
            mode: extracted.mode.clone(),
            status: extracted.status.clone(),
        }
    }
}
