use serde::{Deserialize, Serialize};

/// Embedded track metadata probed from a media file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Slash-delimited audio language names, e.g. `"English / German"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_languages: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Entry of the per-file `languages` list, the fallback source when no
/// probed track metadata is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLanguage {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The media file attached to a movie item.
///
/// Unknown fields ride along in `extra` so a full-record PUT of the
/// owning item reproduces the file object byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_info: Option<MediaInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<TrackLanguage>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One episode file of a series, fetched separately via `episodefile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeFile {
    pub id: i64,
    pub series_id: i64,
    #[serde(default)]
    pub media_info: Option<MediaInfo>,
    #[serde(default)]
    pub languages: Option<Vec<TrackLanguage>>,
}
