//! One configured catalog instance and its per-run state.

use crate::decision::ProfilePolicy;
use crate::error::SyncError;
use crate::reconcile::{ReconcileOutcome, Reconciler, ReconcilerConfig};
use crate::resolver::{self, LanguageMap};
use crate::throttle::{SearchPolicy, SearchThrottle};
use profile_sync_config::InstanceConfig;
use profile_sync_models::{CatalogItem, ServiceKind, TargetState};
use profile_sync_services::CatalogClient;
use tokio::sync::RwLock;
use tracing::info;

/// Remote definitions resolved at setup: the two profile ids and the
/// marker tag id. Unresolvable definitions are fatal to the instance.
#[derive(Debug, Clone)]
pub struct InstanceSetup {
    pub policy: ProfilePolicy,
    pub tag_id: i64,
}

/// Sentinel id reported when dry-run would have created the marker tag.
const DRY_RUN_TAG_ID: i64 = 999_999;

/// A catalog instance: client, policy settings, rate-limiter state, and
/// the language map of the current run.
///
/// Shared between the batch and webhook paths behind an `Arc`; the
/// language map is rebuilt at the start of each batch run and read-only
/// for the rest of it.
pub struct CatalogInstance {
    name: String,
    kind: ServiceKind,
    client: CatalogClient,
    settings: InstanceConfig,
    reconciler: Reconciler,
    throttle: SearchThrottle,
    language_map: RwLock<LanguageMap>,
    setup: RwLock<Option<InstanceSetup>>,
}

impl CatalogInstance {
    pub fn from_config(
        name: &str,
        kind: ServiceKind,
        settings: &InstanceConfig,
        reconciler: ReconcilerConfig,
    ) -> Result<Self, SyncError> {
        let client = CatalogClient::new(name, kind, &settings.base_url, &settings.api_key)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            client,
            settings: settings.clone(),
            reconciler: Reconciler::new(reconciler),
            throttle: SearchThrottle::new(SearchPolicy::from(&settings.search)),
            language_map: RwLock::new(LanguageMap::new()),
            setup: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn settings(&self) -> &InstanceConfig {
        &self.settings
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Resolve profiles and the marker tag fresh from the remote and
    /// cache the result for the webhook path.
    pub async fn refresh_setup(&self) -> Result<InstanceSetup, SyncError> {
        info!("[{}] Fetching quality profiles...", self.name);
        let profiles = self.client.quality_profiles().await?;
        let policy = ProfilePolicy::resolve(
            &self.name,
            &profiles,
            &self.settings.original_profile,
            &self.settings.dub_profile,
        )?;
        info!(
            "[{}] Found profiles '{}' (ID: {}) and '{}' (ID: {})",
            self.name, policy.original_name, policy.original_id, policy.dub_name, policy.dub_id
        );

        let tag_id = self.ensure_tag(&self.settings.tag_name).await?;

        let setup = InstanceSetup { policy, tag_id };
        *self.setup.write().await = Some(setup.clone());
        Ok(setup)
    }

    /// Cached setup, resolving on first use: the webhook path can fire
    /// before any batch run has populated the cache.
    pub async fn setup(&self) -> Result<InstanceSetup, SyncError> {
        if let Some(setup) = self.setup.read().await.clone() {
            return Ok(setup);
        }
        self.refresh_setup().await
    }

    /// Look up a tag by label, creating it when missing.
    pub async fn ensure_tag(&self, label: &str) -> Result<i64, SyncError> {
        let tags = self.client.tags().await?;
        if let Some(tag) = tags.iter().find(|tag| tag.label == label) {
            info!("[{}] Tag '{}' exists (ID: {})", self.name, label, tag.id);
            return Ok(tag.id);
        }

        if self.reconciler.is_dry_run() {
            info!("[{}] [DRY-RUN] Would create tag '{}'", self.name, label);
            return Ok(DRY_RUN_TAG_ID);
        }

        let tag = self.client.create_tag(label).await?;
        Ok(tag.id)
    }

    pub async fn rebuild_language_map(&self, items: &[CatalogItem]) {
        let map = resolver::build_language_map(&self.name, items, &self.settings.original_languages);
        *self.language_map.write().await = map;
    }

    pub async fn is_original(&self, item: &CatalogItem) -> bool {
        let map = self.language_map.read().await;
        resolver::resolve_is_original(&self.name, item, &map, &self.settings.original_languages)
    }

    /// Webhook-path decision from a bare ISO code: only the
    /// direct-comparison tier applies, since no catalog id is involved.
    pub fn is_original_token(&self, token: &str) -> bool {
        resolver::is_configured_token(
            &token.trim().to_lowercase(),
            &self.settings.original_languages,
        )
    }

    pub async fn reconcile_item(
        &self,
        item: &CatalogItem,
        target: &TargetState,
    ) -> ReconcileOutcome {
        self.reconciler
            .reconcile(&self.client, &self.throttle, item, target)
            .await
    }
}
