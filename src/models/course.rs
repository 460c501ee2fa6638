use serde::{Deserialize, Serialize};

/// Course run details supplied by the host's course store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMetadata {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub number: String,
}
