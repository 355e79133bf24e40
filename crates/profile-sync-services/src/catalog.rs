use crate::error::ServiceError;
use crate::http::RequestExecutor;
use async_trait::async_trait;
use profile_sync_models::{CatalogItem, EpisodeFile, QualityProfile, ServiceKind, Tag};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub version: Option<String>,
}

/// Client for one movie/series catalog instance (a Radarr/Sonarr-style
/// v3 API).
#[derive(Debug, Clone)]
pub struct CatalogClient {
    executor: RequestExecutor,
    kind: ServiceKind,
}

impl CatalogClient {
    pub fn new(
        name: &str,
        kind: ServiceKind,
        base_url: &str,
        api_key: &str,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            executor: RequestExecutor::new(name, base_url, api_key)?,
            kind,
        })
    }

    pub fn name(&self) -> &str {
        self.executor.name()
    }

    fn path(endpoint: &str) -> String {
        format!("api/v3/{}", endpoint)
    }

    pub async fn system_status(&self) -> Result<SystemStatus, ServiceError> {
        self.executor.get(&Self::path("system/status")).await
    }

    pub async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, ServiceError> {
        self.executor.get(&Self::path("qualityprofile")).await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, ServiceError> {
        self.executor.get(&Self::path("tag")).await
    }

    pub async fn create_tag(&self, label: &str) -> Result<Tag, ServiceError> {
        let tag: Tag = self
            .executor
            .post(&Self::path("tag"), &json!({ "label": label }))
            .await?;
        info!("[{}] Created tag '{}' (ID: {})", self.name(), label, tag.id);
        Ok(tag)
    }

    /// Fetch every item of this instance's kind.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        self.executor.get(&Self::path(self.kind.item_endpoint())).await
    }

    /// Linear scan for an item carrying the given TMDB id. The catalog
    /// API has no lookup endpoint for already-imported items, so this
    /// pages through the full listing like the batch path does.
    pub async fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<CatalogItem>, ServiceError> {
        let items = self.list_items().await?;
        let found = items.into_iter().find(|item| item.tmdb_id == Some(tmdb_id));
        if found.is_none() {
            debug!(
                "[{}] No {} found with TMDB ID {}",
                self.name(),
                self.kind.item_endpoint(),
                tmdb_id
            );
        }
        Ok(found)
    }

    /// Episode files for one series, the per-episode source the audio
    /// aggregation intersects over.
    pub async fn episode_files(&self, series_id: i64) -> Result<Vec<EpisodeFile>, ServiceError> {
        self.executor
            .get(&Self::path(&format!("episodefile?seriesId={}", series_id)))
            .await
    }
}

/// The mutation surface the reconciler drives. Split out as a trait so
/// the engine can run against an in-process fake in tests.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ServiceKind;

    /// PUT the complete item record. The remote API replaces the record
    /// wholesale, so `item` must carry every field it originally had.
    async fn update_item(&self, item: &CatalogItem) -> Result<(), ServiceError>;

    /// POST the kind-appropriate search command for one item.
    async fn trigger_search(&self, item_id: i64) -> Result<(), ServiceError>;
}

#[async_trait]
impl CatalogWriter for CatalogClient {
    fn name(&self) -> &str {
        self.executor.name()
    }

    fn kind(&self) -> ServiceKind {
        self.kind
    }

    async fn update_item(&self, item: &CatalogItem) -> Result<(), ServiceError> {
        let endpoint = format!("{}/{}", self.kind.item_endpoint(), item.id);
        let _: serde_json::Value = self.executor.put(&Self::path(&endpoint), item).await?;
        Ok(())
    }

    async fn trigger_search(&self, item_id: i64) -> Result<(), ServiceError> {
        let command = match self.kind {
            ServiceKind::Movies => json!({
                "name": self.kind.search_command(),
                "movieIds": [item_id],
            }),
            ServiceKind::Series => json!({
                "name": self.kind.search_command(),
                "seriesId": item_id,
            }),
        };
        let _: serde_json::Value = self.executor.post(&Self::path("command"), &command).await?;
        Ok(())
    }
}
