use crate::error::ServiceError;
use crate::http::RequestExecutor;
use profile_sync_models::{PagedRequests, PendingRequest, QualityProfile, RequestKind, ServiceKind};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct IntakeStatus {
    #[serde(default)]
    pub version: Option<String>,
}

/// Client for the request-intake service (an Overseerr-style v1 API).
#[derive(Debug, Clone)]
pub struct IntakeClient {
    executor: RequestExecutor,
}

/// The intake API names its catalog connections after the upstream
/// *arr services, independent of what we call them.
fn wire_segment(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Movies => "radarr",
        ServiceKind::Series => "sonarr",
    }
}

impl IntakeClient {
    pub fn new(name: &str, base_url: &str, api_key: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            executor: RequestExecutor::new(name, base_url, api_key)?,
        })
    }

    pub fn name(&self) -> &str {
        self.executor.name()
    }

    fn path(endpoint: &str) -> String {
        format!("api/v1/{}", endpoint)
    }

    pub async fn status(&self) -> Result<IntakeStatus, ServiceError> {
        self.executor.get(&Self::path("status")).await
    }

    pub async fn pending_requests(&self) -> Result<Vec<PendingRequest>, ServiceError> {
        let page: PagedRequests = self
            .executor
            .get(&Self::path("request?filter=pending&take=100"))
            .await?;
        Ok(page.results)
    }

    /// Original language from the intake service's cached TMDB record,
    /// as an ISO 639-1 code. None when the cache has no language.
    pub async fn media_language(
        &self,
        kind: RequestKind,
        tmdb_id: i64,
    ) -> Result<Option<String>, ServiceError> {
        let endpoint = format!("{}/{}", kind.detail_endpoint(), tmdb_id);
        let media: serde_json::Value = self.executor.get(&Self::path(&endpoint)).await?;
        let language = media
            .get("originalLanguage")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        match &language {
            Some(code) => debug!("[{}] TMDB {}: originalLanguage = {}", self.name(), tmdb_id, code),
            None => warn!("[{}] TMDB {}: no originalLanguage found", self.name(), tmdb_id),
        }
        Ok(language)
    }

    /// Quality profiles the intake service knows for one of its
    /// connected catalog servers.
    pub async fn server_profiles(
        &self,
        kind: ServiceKind,
        server_id: i64,
    ) -> Result<Vec<QualityProfile>, ServiceError> {
        let endpoint = format!("service/{}/{}", wire_segment(kind), server_id);
        let server: serde_json::Value = self.executor.get(&Self::path(&endpoint)).await?;
        let profiles = server
            .get("profiles")
            .cloned()
            .unwrap_or(serde_json::Value::Array(Vec::new()));
        serde_json::from_value(profiles).map_err(|source| ServiceError::Decode {
            endpoint,
            source,
        })
    }

    /// Update a request's profile. The intake API requires `mediaType`
    /// in the body, and `seasons` for series requests.
    pub async fn update_request_profile(
        &self,
        request_id: i64,
        profile_id: i64,
        kind: RequestKind,
        seasons: Option<&[i64]>,
    ) -> Result<(), ServiceError> {
        let mut body = json!({
            "mediaType": kind,
            "profileId": profile_id,
        });
        if kind == RequestKind::Tv {
            if let Some(seasons) = seasons {
                body["seasons"] = json!(seasons);
            }
        }

        let _: serde_json::Value = self
            .executor
            .put(&Self::path(&format!("request/{}", request_id)), &body)
            .await?;
        Ok(())
    }
}
