use std::sync::Mutex;

use async_trait::async_trait;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::Result,
    models::{
        certificate::{CertificateRecord, GenerationMode},
        course::CourseMetadata,
    },
    services::certificate_service::CertificateHost,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CertificateIssuedRequest {
    pub certificate: CertificateRecord,
    #[serde(default)]
    pub generation_mode: GenerationMode,
    #[serde(default)]
    pub course: Option<CourseMetadata>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Work the host still has to do after the call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FollowUp {
    MarkUnverified { mode: String, source: String },
}

/// Serves what the host sent along with the request and records the
/// operations it has to perform itself.
struct RequestHost {
    course: Option<CourseMetadata>,
    download_url: Option<String>,
    follow_up: Mutex<Vec<FollowUp>>,
}

impl RequestHost {
    fn new(course: Option<CourseMetadata>, download_url: Option<String>) -> Self {
        Self {
            course,
            download_url,
            follow_up: Mutex::new(Vec::new()),
        }
    }

    fn into_follow_up(self) -> Vec<FollowUp> {
        self.follow_up
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CertificateHost for RequestHost {
    async fn course_metadata(&self, _course_id: &str) -> Result<Option<CourseMetadata>> {
        Ok(self.course.clone())
    }

    async fn download_url(&self, _certificate: &CertificateRecord) -> Result<Option<String>> {
        Ok(self.download_url.clone())
    }

    async fn mark_unverified(
        &self,
        _certificate: &CertificateRecord,
        mode: &str,
        source: &str,
    ) -> Result<()> {
        self.follow_up
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(FollowUp::MarkUnverified {
                mode: mode.to_string(),
                source: source.to_string(),
            });
        Ok(())
    }
}

/// Called by the host once its certificate upsert has completed. Always
/// answers 200; the delivery outcome is informational.
pub async fn certificate_issued(
    State(state): State<AppState>,
    Json(request): Json<CertificateIssuedRequest>,
) -> Result<Json<serde_json::Value>> {
    let host = RequestHost::new(request.course, request.download_url);
    let delivery = state
        .generator
        .on_certificate_issued(&host, &request.certificate, request.generation_mode)
        .await;

    Ok(Json(json!({
        "delivery": delivery,
        "follow_up": host.into_follow_up(),
    })))
}
