use crate::language::LanguageRef;
use crate::media_file::MediaFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A movie or series record from a catalog instance.
///
/// Only the fields the engine reads are typed; everything else the API
/// returned is captured through `extra` and serialized back unchanged,
/// because item updates must PUT the complete record rather than a
/// partial patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    pub quality_profile_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<LanguageRef>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_file: Option<MediaFile>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogItem {
    /// Current tags as a set, the unit the decision engine works in.
    pub fn tag_set(&self) -> BTreeSet<i64> {
        self.tags.iter().copied().collect()
    }

    /// Display name of the original language, for log lines.
    pub fn language_name(&self) -> &str {
        self.original_language
            .as_ref()
            .and_then(|lang| lang.name())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_round_trip() {
        let raw = r#"{
            "id": 42,
            "title": "Example",
            "tags": [3, 5],
            "qualityProfileId": 1,
            "originalLanguage": {"id": 7, "name": "English"},
            "monitored": true,
            "tmdbId": 550,
            "path": "/movies/Example",
            "minimumAvailability": "released"
        }"#;

        let item: CatalogItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.extra.get("path").and_then(|v| v.as_str()), Some("/movies/Example"));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["minimumAvailability"], "released");
        assert_eq!(back["qualityProfileId"], 1);
        assert_eq!(back["tags"], serde_json::json!([3, 5]));
    }

    #[test]
    fn language_name_defaults_to_unknown() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": 1, "qualityProfileId": 2}"#).unwrap();
        assert_eq!(item.language_name(), "Unknown");
        assert!(item.tag_set().is_empty());
    }
}
