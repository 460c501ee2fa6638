use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::utils::time;

/// Event as broadcast by the host. The nested certificate data has no fixed
/// shape, so it stays untyped until `ExtractedCertificate::from_envelope`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateEventEnvelope {
    #[serde(default)]
    pub certificate: Option<JsonValue>,
    #[serde(default)]
    pub time: Option<JsonValue>,
}

/// Flattened view of a certificate event with every field populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCertificate {
    pub username: String,
    pub email: String,
    pub user_id: i64,
    pub course_key: String,
    pub name: String,
    pub download_url: String,
    pub grade: String,
    pub mode: String,
    pub status: String,
    pub completed_date: String,
}

impl ExtractedCertificate {
    /// Only a missing or non-object `certificate` is an error; every other
    /// absent field falls back to `""` (or `0` for the user id).
    pub fn from_envelope(envelope: &CertificateEventEnvelope) -> Result<Self> {
        let certificate = match &envelope.certificate {
            Some(JsonValue::Object(_)) => envelope.certificate.as_ref(),
            Some(other) => {
                return Err(Error::Extraction(format!(
                    "certificate must be an object, got {}",
                    kind_of(other)
                )))
            }
            None => None,
        }
        .ok_or_else(|| Error::Extraction("certificate data not found in event".to_string()))?;

        let user = certificate.get("user");
        let identity = user
            .and_then(|u| u.get("pii"))
            .filter(|pii| pii.is_object())
            .or(user);

        Ok(Self {
            username: text_at(identity, &["username"]),
            email: text_at(identity, &["email"]),
            user_id: user
                .and_then(|u| u.get("id"))
                .and_then(JsonValue::as_i64)
                .unwrap_or(0),
            course_key: text_at(Some(certificate), &["course", "course_key"]),
            name: text_at(Some(certificate), &["name"]),
            download_url: text_at(Some(certificate), &["download_url"]),
            grade: text_at(Some(certificate), &["grade"]),
            mode: text_at(Some(certificate), &["mode"]),
            status: text_at(Some(certificate), &["current_status"]),
            completed_date: match &envelope.time {
                Some(JsonValue::String(raw)) => time::normalize_timestamp(raw),
                Some(JsonValue::Number(n)) => n
                    .as_i64()
                    .and_then(time::epoch_to_iso8601)
                    .unwrap_or_else(|| n.to_string()),
                _ => String::new(),
            },
        })
    }
}

fn text_at(root: Option<&JsonValue>, path: &[&str]) -> String {
    let value = root.and_then(|r| path.iter().try_fold(r, |node, key| node.get(*key)));
    match value {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: JsonValue) -> CertificateEventEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn extracts_fields_from_pii_shape() {
        let event = envelope(json!({
            "certificate": {
                "user": {
                    "id": 9,
                    "is_active": true,
                    "pii": { "username": "alice", "email": "alice@example.com", "name": "Alice" }
                },
                "course": { "course_key": "course-v1:X+Y+Z" },
                "mode": "verified",
                "grade": 0.85,
                "current_status": "downloadable",
                "download_url": null,
                "name": "Alice Liddell"
            },
            "time": "2024-03-10T15:30:00+02:00"
        }));

        let extracted = ExtractedCertificate::from_envelope(&event).unwrap();
        assert_eq!(extracted.username, "alice");
        assert_eq!(extracted.email, "alice@example.com");
        assert_eq!(extracted.user_id, 9);
        assert_eq!(extracted.course_key, "course-v1:X+Y+Z");
        assert_eq!(extracted.grade, "0.85");
        assert_eq!(extracted.status, "downloadable");
        assert_eq!(extracted.download_url, "");
        assert_eq!(extracted.name, "Alice Liddell");
        assert_eq!(extracted.completed_date, "2024-03-10T13:30:00.000000+00:00");
    }

    #[test]
    fn falls_back_to_flat_user_when_pii_is_null() {
        let event = envelope(json!({
            "certificate": {
                "user": { "pii": null, "username": "bob", "email": "bob@example.com" },
                "current_status": "notpassing"
            }
        }));

        let extracted = ExtractedCertificate::from_envelope(&event).unwrap();
        assert_eq!(extracted.username, "bob");
        assert_eq!(extracted.email, "bob@example.com");
        assert_eq!(extracted.course_key, "");
        assert_eq!(extracted.completed_date, "");
    }

    #[test]
    fn offsetless_and_epoch_times_become_utc() {
        for time in [json!("2024-05-01T08:30:00"), json!(1714552200)] {
            let event = envelope(json!({ "certificate": {}, "time": time }));
            let extracted = ExtractedCertificate::from_envelope(&event).unwrap();
            assert_eq!(extracted.completed_date, "2024-05-01T08:30:00.000000+00:00");
        }

        let fractional = envelope(json!({ "certificate": {}, "time": 1.5 }));
        assert_eq!(
            ExtractedCertificate::from_envelope(&fractional)
                .unwrap()
                .completed_date,
            "1.5"
        );
    }

    #[test]
    fn missing_nested_objects_default_to_empty() {
        let extracted =
            ExtractedCertificate::from_envelope(&envelope(json!({ "certificate": {} }))).unwrap();
        assert_eq!(extracted, ExtractedCertificate::default());
    }

    #[test]
    fn missing_or_malformed_certificate_is_an_extraction_error() {
        assert!(matches!(
            ExtractedCertificate::from_envelope(&envelope(json!({}))),
            Err(Error::Extraction(_))
        ));
        assert!(matches!(
            ExtractedCertificate::from_envelope(&envelope(json!({ "certificate": "oops" }))),
            Err(Error::Extraction(_))
        ));
    }
}
