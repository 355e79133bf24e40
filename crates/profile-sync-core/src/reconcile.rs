//! Idempotent application of a computed target state to the remote.

use crate::throttle::SearchThrottle;
use profile_sync_config::ReconcilerSettings;
use profile_sync_models::{CatalogItem, TargetState};
use profile_sync_services::CatalogWriter;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Explicit reconciler behavior, passed in rather than read from the
/// environment so tests can vary it per case.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub dry_run: bool,
    /// Pause after each remote write.
    pub update_delay: Duration,
    /// Pause between a profile write and the follow-up search trigger,
    /// so the remote has committed the update before searching.
    pub settle_delay: Duration,
}

impl From<&ReconcilerSettings> for ReconcilerConfig {
    fn from(settings: &ReconcilerSettings) -> Self {
        Self {
            dry_run: settings.dry_run,
            update_delay: Duration::from_millis(settings.update_delay_ms),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOutcome {
    pub updated: bool,
    pub profile_changed: bool,
    /// A change was required, whether or not it was applied. Dry-run
    /// sets this without `updated`, so stats can tell "would change"
    /// from "changed".
    pub would_update: bool,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Apply `target` to one item, if it differs from the current
    /// state.
    ///
    /// The write replaces the whole remote record (current item overlaid
    /// with the target tag set and profile). The diff check here is the
    /// only guard against concurrent writers: it is not atomic with the
    /// PUT, so the webhook and batch paths can race on the same item
    /// within that window. The catalog API offers no conditional write,
    /// so the hazard stands as designed.
    ///
    /// Failures are contained: a failed write logs, reports
    /// `updated = false`, and lets the batch continue.
    pub async fn reconcile(
        &self,
        writer: &dyn CatalogWriter,
        throttle: &SearchThrottle,
        item: &CatalogItem,
        target: &TargetState,
    ) -> ReconcileOutcome {
        if item.tag_set() == target.tags && item.quality_profile_id == target.quality_profile_id {
            return ReconcileOutcome::default();
        }

        let summary = target.changes.join(", ");

        if self.config.dry_run {
            info!(
                "[{}] [DRY-RUN] Would update '{}' [{}]: {}",
                writer.name(),
                item.title,
                item.language_name(),
                summary
            );
            // Dry-run never counts as a mutation.
            return ReconcileOutcome {
                would_update: true,
                ..ReconcileOutcome::default()
            };
        }

        info!(
            "[{}] Updating '{}' [{}]: {}",
            writer.name(),
            item.title,
            item.language_name(),
            summary
        );

        let mut payload = item.clone();
        payload.tags = target.tags.iter().copied().collect();
        payload.quality_profile_id = target.quality_profile_id;

        if let Err(e) = writer.update_item(&payload).await {
            error!("[{}] Failed to update '{}': {}", writer.name(), item.title, e);
            return ReconcileOutcome::default();
        }

        if !self.config.update_delay.is_zero() {
            tokio::time::sleep(self.config.update_delay).await;
        }

        if target.profile_changed {
            debug!(
                "[{}] Profile updated for '{}', checking if search should be triggered",
                writer.name(),
                item.title
            );
            tokio::time::sleep(self.config.settle_delay).await;
            self.trigger_search(writer, throttle, item.id).await;
        }

        ReconcileOutcome {
            updated: true,
            profile_changed: target.profile_changed,
            would_update: true,
        }
    }

    async fn trigger_search(
        &self,
        writer: &dyn CatalogWriter,
        throttle: &SearchThrottle,
        item_id: i64,
    ) {
        if !throttle.try_acquire(item_id).await {
            return;
        }

        match writer.trigger_search(item_id).await {
            Ok(()) => {
                info!(
                    "[{}] Triggered search for {} ID {}",
                    writer.name(),
                    writer.kind().item_endpoint(),
                    item_id
                );
                throttle.record_trigger(item_id).await;
            }
            Err(e) => {
                warn!(
                    "[{}] Failed to trigger search for {} {}: {}",
                    writer.name(),
                    writer.kind().item_endpoint(),
                    item_id,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::SearchPolicy;
    use async_trait::async_trait;
    use profile_sync_models::ServiceKind;
    use profile_sync_services::ServiceError;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingWriter {
        updates: Mutex<Vec<CatalogItem>>,
        searches: Mutex<Vec<i64>>,
        fail_updates: bool,
    }

    #[async_trait]
    impl CatalogWriter for RecordingWriter {
        fn name(&self) -> &str {
            "test"
        }

        fn kind(&self) -> ServiceKind {
            ServiceKind::Movies
        }

        async fn update_item(&self, item: &CatalogItem) -> Result<(), ServiceError> {
            if self.fail_updates {
                return Err(ServiceError::Decode {
                    endpoint: "api/v3/movie/10".to_string(),
                    source: serde_json::from_str::<i64>("boom").unwrap_err(),
                });
            }
            self.updates.lock().unwrap().push(item.clone());
            Ok(())
        }

        async fn trigger_search(&self, item_id: i64) -> Result<(), ServiceError> {
            self.searches.lock().unwrap().push(item_id);
            Ok(())
        }
    }

    fn item(tags: &[i64], profile: i64) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": 10,
            "title": "Example",
            "tags": tags,
            "qualityProfileId": profile,
            "path": "/movies/Example",
        }))
        .unwrap()
    }

    fn target(tags: &[i64], profile: i64, profile_changed: bool) -> TargetState {
        TargetState {
            tags: tags.iter().copied().collect::<BTreeSet<i64>>(),
            quality_profile_id: profile,
            profile_changed,
            changes: vec!["test change".to_string()],
        }
    }

    fn reconciler(dry_run: bool) -> Reconciler {
        Reconciler::new(ReconcilerConfig {
            dry_run,
            update_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        })
    }

    fn throttle() -> SearchThrottle {
        SearchThrottle::new(SearchPolicy {
            trigger_on_update: true,
            per_item_cooldown: Duration::from_secs(60),
            min_global_interval: Duration::ZERO,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_item_is_a_noop() {
        let writer = RecordingWriter::default();
        let outcome = reconciler(false)
            .reconcile(&writer, &throttle(), &item(&[5], 1), &target(&[5], 1, false))
            .await;

        assert!(!outcome.updated);
        assert!(writer.updates.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_writes_nothing() {
        let writer = RecordingWriter::default();
        let outcome = reconciler(true)
            .reconcile(&writer, &throttle(), &item(&[], 1), &target(&[5], 2, true))
            .await;

        assert!(!outcome.updated, "dry-run never counts as a mutation");
        assert!(outcome.would_update, "the required change is still reported");
        assert!(writer.updates.lock().unwrap().is_empty());
        assert!(writer.searches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_sends_full_overlaid_record() {
        let writer = RecordingWriter::default();
        let outcome = reconciler(false)
            .reconcile(&writer, &throttle(), &item(&[], 1), &target(&[5], 2, true))
            .await;

        assert!(outcome.updated);
        assert!(outcome.profile_changed);

        let updates = writer.updates.lock().unwrap();
        let payload = serde_json::to_value(&updates[0]).unwrap();
        assert_eq!(payload["tags"], serde_json::json!([5]));
        assert_eq!(payload["qualityProfileId"], 2);
        // Fields the engine does not touch survive the overlay.
        assert_eq!(payload["path"], "/movies/Example");
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_change_triggers_search() {
        let writer = RecordingWriter::default();
        reconciler(false)
            .reconcile(&writer, &throttle(), &item(&[], 1), &target(&[5], 2, true))
            .await;

        assert_eq!(*writer.searches.lock().unwrap(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tag_only_change_does_not_search() {
        let writer = RecordingWriter::default();
        let outcome = reconciler(false)
            .reconcile(&writer, &throttle(), &item(&[], 1), &target(&[5], 1, false))
            .await;

        assert!(outcome.updated);
        assert!(writer.searches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_is_contained() {
        let writer = RecordingWriter { fail_updates: true, ..Default::default() };
        let outcome = reconciler(false)
            .reconcile(&writer, &throttle(), &item(&[], 1), &target(&[5], 2, true))
            .await;

        assert!(!outcome.updated);
        assert!(writer.searches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_is_idempotent() {
        // reconcile, then recompute against the written state: no-op.
        let writer = RecordingWriter::default();
        let reconciler = reconciler(false);
        let throttle = throttle();

        let first = item(&[], 1);
        let desired = target(&[5], 2, true);
        let outcome = reconciler.reconcile(&writer, &throttle, &first, &desired).await;
        assert!(outcome.updated);

        let written = writer.updates.lock().unwrap()[0].clone();
        let second = reconciler
            .reconcile(&writer, &throttle, &written, &target(&[5], 2, false))
            .await;
        assert!(!second.updated, "unchanged remote state reconciles to a no-op");
    }
}
