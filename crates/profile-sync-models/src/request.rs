use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kind as the request-intake service names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Movie,
    Tv,
}

impl RequestKind {
    pub fn service_kind(&self) -> ServiceKind {
        match self {
            RequestKind::Movie => ServiceKind::Movies,
            RequestKind::Tv => ServiceKind::Series,
        }
    }

    /// Intake endpoint segment used to read cached TMDB metadata.
    pub fn detail_endpoint(&self) -> &'static str {
        match self {
            RequestKind::Movie => "movie",
            RequestKind::Tv => "tv",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Movie => write!(f, "movie"),
            RequestKind::Tv => write!(f, "tv"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMedia {
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A pending request from the intake service.
///
/// `request_type` is the intake service's numeric discriminator:
/// 1 = movie, anything else = tv.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: i64,
    #[serde(rename = "type")]
    pub request_type: i64,
    #[serde(default)]
    pub media: RequestMedia,
    #[serde(default)]
    pub server_id: Option<i64>,
    #[serde(default)]
    pub profile_id: Option<i64>,
    #[serde(default)]
    pub seasons: Option<Vec<i64>>,
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        if self.request_type == 1 {
            RequestKind::Movie
        } else {
            RequestKind::Tv
        }
    }

    pub fn title(&self) -> &str {
        self.media.title.as_deref().unwrap_or("Unknown")
    }
}

/// Paged envelope returned by the intake `request` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedRequests {
    #[serde(default)]
    pub results: Vec<PendingRequest>,
}
