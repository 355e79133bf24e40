use serde::{Deserialize, Serialize};

/// A quality profile as listed by `qualityprofile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
}

/// A tag as listed by `tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}
