//! Request-intake integration: give pending requests the
//! language-appropriate profile before the catalogs import them.

use crate::error::SyncError;
use crate::instance::CatalogInstance;
use crate::reconcile::ReconcilerConfig;
use profile_sync_config::IntakeConfig;
use profile_sync_models::{PendingRequest, RequestKind, ServiceKind};
use profile_sync_services::IntakeClient;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// One intake instance, routing its servers to catalog instances.
pub struct IntakeInstance {
    name: String,
    client: IntakeClient,
    movie_servers: BTreeMap<i64, Arc<CatalogInstance>>,
    series_servers: BTreeMap<i64, Arc<CatalogInstance>>,
    /// (kind, server id, profile name) -> intake-side profile id.
    profile_cache: Mutex<HashMap<(ServiceKind, i64, String), i64>>,
    dry_run: bool,
    update_delay: Duration,
}

impl IntakeInstance {
    pub fn from_config(
        name: &str,
        settings: &IntakeConfig,
        movies: &BTreeMap<String, Arc<CatalogInstance>>,
        series: &BTreeMap<String, Arc<CatalogInstance>>,
        reconciler: &ReconcilerConfig,
    ) -> Result<Self, SyncError> {
        let client = IntakeClient::new(name, &settings.base_url, &settings.api_key)?;
        let movie_servers = build_server_map(name, &settings.movie_servers, movies)?;
        let series_servers = build_server_map(name, &settings.series_servers, series)?;

        Ok(Self {
            name: name.to_string(),
            client,
            movie_servers,
            series_servers,
            profile_cache: Mutex::new(HashMap::new()),
            dry_run: reconciler.dry_run,
            update_delay: reconciler.update_delay,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Poll pending requests and set the language-appropriate profile
    /// on each. Returns how many requests were updated.
    pub async fn process_pending_requests(&self) -> usize {
        match self.client.status().await {
            Ok(status) => debug!(
                "[{}] Connected to intake v{}",
                self.name,
                status.version.as_deref().unwrap_or("unknown")
            ),
            Err(e) => {
                error!(
                    "[{}] Connection failed, skipping intake processing: {}",
                    self.name, e
                );
                return 0;
            }
        }

        info!("[{}] Processing pending intake requests...", self.name);
        let requests = match self.client.pending_requests().await {
            Ok(requests) => requests,
            Err(e) => {
                error!("[{}] Failed to fetch pending requests: {}", self.name, e);
                return 0;
            }
        };
        info!("[{}] Found {} pending requests", self.name, requests.len());
        if requests.is_empty() {
            return 0;
        }

        let mut updated = 0;
        for request in &requests {
            match self.process_request(request).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("[{}] Error processing request {}: {}", self.name, request.id, e)
                }
            }
        }

        info!("[{}] Updated {}/{} pending requests", self.name, updated, requests.len());
        updated
    }

    async fn process_request(&self, request: &PendingRequest) -> Result<bool, SyncError> {
        let kind = request.kind();
        let service_kind = kind.service_kind();
        info!(
            "[{}] Processing request {}: '{}' ({}, serverId={:?})",
            self.name,
            request.id,
            request.title(),
            kind,
            request.server_id
        );

        let mapping = self.server_map(service_kind);
        // Requests without a serverId land on the first configured server.
        let server_id = match request.server_id.or_else(|| mapping.keys().next().copied()) {
            Some(id) => id,
            None => {
                info!(
                    "[{}] Request {} has no serverId and no {} servers configured",
                    self.name, request.id, service_kind
                );
                return Ok(false);
            }
        };
        let Some(instance) = mapping.get(&server_id) else {
            info!(
                "[{}] Request {}: no mapping for {} server {} (available: {:?})",
                self.name,
                request.id,
                service_kind,
                server_id,
                mapping.keys().collect::<Vec<_>>()
            );
            return Ok(false);
        };

        let Some(tmdb_id) = request.media.tmdb_id else {
            warn!("[{}] Request {} carries no TMDB id", self.name, request.id);
            return Ok(false);
        };
        let Some(language) = self.client.media_language(kind, tmdb_id).await? else {
            warn!("[{}] Request {}: could not determine language", self.name, request.id);
            return Ok(false);
        };

        let profile_name = if instance.is_original_token(&language) {
            instance.settings().original_profile.clone()
        } else {
            instance.settings().dub_profile.clone()
        };
        debug!("[{}] Language '{}' -> {}", self.name, language, profile_name);

        let Some(profile_id) = self
            .map_profile_name(service_kind, server_id, &profile_name)
            .await
        else {
            error!(
                "[{}] Request {}: could not map profile '{}'",
                self.name, request.id, profile_name
            );
            return Ok(false);
        };

        if request.profile_id == Some(profile_id) {
            debug!(
                "[{}] Request {} already has correct profile {}",
                self.name, request.id, profile_id
            );
            return Ok(false);
        }

        info!(
            "[{}] Request {} ('{}'): {} -> {}",
            self.name,
            request.id,
            request.title(),
            language,
            profile_name
        );

        if self.dry_run {
            info!(
                "[{}] [DRY-RUN] Would update request {} -> profileId {}",
                self.name, request.id, profile_id
            );
            return Ok(true);
        }

        self.client
            .update_request_profile(request.id, profile_id, kind, request.seasons.as_deref())
            .await?;
        info!("[{}] Updated request {} -> profileId {}", self.name, request.id, profile_id);

        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }
        Ok(true)
    }

    fn server_map(&self, kind: ServiceKind) -> &BTreeMap<i64, Arc<CatalogInstance>> {
        match kind {
            ServiceKind::Movies => &self.movie_servers,
            ServiceKind::Series => &self.series_servers,
        }
    }

    /// Profile name -> intake-side profile id, cached per server for
    /// the life of the instance.
    async fn map_profile_name(
        &self,
        kind: ServiceKind,
        server_id: i64,
        profile_name: &str,
    ) -> Option<i64> {
        let cache_key = (kind, server_id, profile_name.to_string());
        {
            let cache = self.profile_cache.lock().await;
            if let Some(id) = cache.get(&cache_key) {
                return Some(*id);
            }
        }

        let profiles = match self.client.server_profiles(kind, server_id).await {
            Ok(profiles) => profiles,
            Err(e) => {
                error!(
                    "[{}] Failed to get profiles for {} server {}: {}",
                    self.name, kind, server_id, e
                );
                return None;
            }
        };

        let mut cache = self.profile_cache.lock().await;
        for profile in &profiles {
            cache.insert((kind, server_id, profile.name.clone()), profile.id);
        }

        let found = cache.get(&cache_key).copied();
        if found.is_none() {
            warn!(
                "[{}] Profile '{}' not found on {} server {}",
                self.name, profile_name, kind, server_id
            );
            debug!(
                "[{}] Available profiles: {:?}",
                self.name,
                profiles.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
            );
        }
        found
    }

    /// Language lookup for the webhook path, which has no pending
    /// request of its own to read from.
    pub async fn media_language(
        &self,
        kind: RequestKind,
        tmdb_id: i64,
    ) -> Result<Option<String>, SyncError> {
        Ok(self.client.media_language(kind, tmdb_id).await?)
    }
}

fn build_server_map(
    name: &str,
    configured: &BTreeMap<String, String>,
    instances: &BTreeMap<String, Arc<CatalogInstance>>,
) -> Result<BTreeMap<i64, Arc<CatalogInstance>>, SyncError> {
    let mut map = BTreeMap::new();
    for (server_id, instance_name) in configured {
        let id: i64 = server_id.parse().map_err(|_| {
            SyncError::Configuration(format!(
                "[{}] intake server id '{}' is not a number",
                name, server_id
            ))
        })?;
        match instances.get(instance_name) {
            Some(instance) => {
                debug!("[{}] Mapped server {} -> {}", name, id, instance_name);
                map.insert(id, Arc::clone(instance));
            }
            None => warn!(
                "[{}] Instance '{}' not found for server {}",
                name, instance_name, server_id
            ),
        }
    }
    Ok(map)
}
