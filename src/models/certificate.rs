use serde::{Deserialize, Serialize};
use std::fmt;

/// Certificate status as stored by the host. Unknown values survive as
/// `Other` so they can still be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CertificateStatus {
    Deleted,
    Deleting,
    Downloadable,
    Error,
    Generating,
    Notpassing,
    Restricted,
    Unavailable,
    Auditing,
    AuditPassing,
    AuditNotpassing,
    HonorPassing,
    Unverified,
    Invalidated,
    Requesting,
    Other(String),
}

impl CertificateStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deleted => "deleted",
            Self::Deleting => "deleting",
            Self::Downloadable => "downloadable",
            Self::Error => "error",
            Self::Generating => "generating",
            Self::Notpassing => "notpassing",
            Self::Restricted => "restricted",
            Self::Unavailable => "unavailable",
            Self::Auditing => "auditing",
            Self::AuditPassing => "audit_passing",
            Self::AuditNotpassing => "audit_notpassing",
            Self::HonorPassing => "honor_passing",
            Self::Unverified => "unverified",
            Self::Invalidated => "invalidated",
            Self::Requesting => "requesting",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_passing(&self) -> bool {
        matches!(self, Self::Downloadable | Self::Generating)
    }
}

impl From<&str> for CertificateStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "deleted" => Self::Deleted,
            "deleting" => Self::Deleting,
            "downloadable" => Self::Downloadable,
            "error" => Self::Error,
            "generating" => Self::Generating,
            "notpassing" => Self::Notpassing,
            "restricted" => Self::Restricted,
            "unavailable" => Self::Unavailable,
            "auditing" => Self::Auditing,
            "audit_passing" => Self::AuditPassing,
            "audit_notpassing" => Self::AuditNotpassing,
            "honor_passing" => Self::HonorPassing,
            "unverified" => Self::Unverified,
            "invalidated" => Self::Invalidated,
            "requesting" => Self::Requesting,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CertificateStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<CertificateStatus> for String {
    fn from(status: CertificateStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// The learner requested the certificate.
    #[serde(rename = "self")]
    SelfGenerated,
    #[default]
    Batch,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfGenerated => f.write_str("self"),
            Self::Batch => f.write_str("batch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A learner's certificate for one course run. Owned by the host; this
/// service only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub user: Learner,
    pub course_id: String,
    pub status: CertificateStatus,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub verify_uuid: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_downloadable_and_generating_are_passing() {
        assert!(CertificateStatus::Downloadable.is_passing());
        assert!(CertificateStatus::Generating.is_passing());
        for status in ["notpassing", "unverified", "audit_passing", "error", "bogus"] {
            assert!(!CertificateStatus::from(status).is_passing(), "{}", status);
        }
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status: CertificateStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(status, CertificateStatus::Other("on_hold".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("on_hold"));
    }

    #[test]
    fn record_deserializes_with_optional_fields_missing() {
        let record: CertificateRecord = serde_json::from_value(json!({
            "user": { "id": 7, "username": "alice" },
            "course_id": "course-v1:X+Y+Z",
            "status": "audit_notpassing"
        }))
        .unwrap();

        assert_eq!(record.status, CertificateStatus::AuditNotpassing);
        assert!(record.user.email.is_none());
        assert!(record.verify_uuid.is_empty());
    }

    #[test]
    fn generation_mode_uses_host_tags() {
        let mode: GenerationMode = serde_json::from_value(json!("self")).unwrap();
        assert_eq!(mode, GenerationMode::SelfGenerated);
        assert_eq!(GenerationMode::Batch.to_string(), "batch");
    }
}
