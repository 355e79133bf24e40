use crate::request::RequestKind;
use serde::Deserialize;

/// Notification payload posted by the intake service.
///
/// The intake webhook mixes naming conventions (`tmdbId` next to
/// `media_type`), and the TMDB id arrives as either a number or a
/// string depending on the template, so both are tolerated here.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub media: Option<WebhookMedia>,
    #[serde(default)]
    pub request: Option<WebhookRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMedia {
    #[serde(rename = "tmdbId", default)]
    pub tmdb_id: Option<serde_json::Value>,
    #[serde(rename = "media_type", default)]
    pub media_type: Option<RequestKind>,
}

impl WebhookMedia {
    pub fn tmdb_id(&self) -> Option<i64> {
        match self.tmdb_id.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub request_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_mixed_conventions() {
        let raw = r#"{
            "notification_type": "MEDIA_AUTO_APPROVED",
            "media": {"tmdbId": "603", "media_type": "movie"},
            "request": {"request_id": 12}
        }"#;
        let payload: WebhookPayload = serde_json::from_str(raw).unwrap();
        let media = payload.media.unwrap();
        assert_eq!(media.tmdb_id(), Some(603));
        assert_eq!(media.media_type, Some(RequestKind::Movie));
        assert_eq!(payload.request.unwrap().request_id, Some(12));
    }

    #[test]
    fn payload_tolerates_missing_sections() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.notification_type.is_none());
        assert!(payload.media.is_none());
    }
}
