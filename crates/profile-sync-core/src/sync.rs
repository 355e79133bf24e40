//! Batch passes: the per-instance profile sync, the audio-tagging
//! scan, and the top-level run cycle driving both kinds of service.

use crate::audio::{aggregate_across_files, diff_tags, parse_track_languages};
use crate::decision::compute_target;
use crate::error::SyncError;
use crate::instance::CatalogInstance;
use crate::intake::IntakeInstance;
use crate::language::normalize;
use profile_sync_models::{AudioScanStats, ServiceKind, SyncStats, TargetState};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Audio tag labels resolved to remote ids, keyed by canonical
/// language for the diff and by id for log lines.
#[derive(Debug, Default)]
struct AudioTagSet {
    wanted: BTreeMap<String, i64>,
    labels: BTreeMap<i64, String>,
}

impl CatalogInstance {
    /// Full profile-sync pass over every item of this instance.
    pub async fn run_sync(&self) -> Result<SyncStats, SyncError> {
        info!("[{}] {}", self.name(), "=".repeat(60));
        info!("[{}] Processing {} instance", self.name(), self.kind());
        if self.reconciler().is_dry_run() {
            info!("[{}] DRY-RUN MODE: No changes will be made", self.name());
        }
        info!("[{}] {}", self.name(), "=".repeat(60));

        match self.client().system_status().await {
            Ok(status) => info!(
                "[{}] Connected to {} catalog v{}",
                self.name(),
                self.kind(),
                status.version.as_deref().unwrap_or("unknown")
            ),
            Err(e) => {
                error!("[{}] Skipping due to connection failure: {}", self.name(), e);
                return Err(e.into());
            }
        }

        let setup = self.refresh_setup().await?;

        let endpoint = self.kind().item_endpoint();
        info!("[{}] Fetching all {}...", self.name(), endpoint);
        let items = self.client().list_items().await?;
        info!("[{}] Found {} {}", self.name(), items.len(), endpoint);

        info!("[{}] Building language mapping...", self.name());
        self.rebuild_language_map(&items).await;

        let mut stats = SyncStats { total: items.len(), ..Default::default() };

        for (idx, item) in items.iter().enumerate() {
            if (idx + 1) % 100 == 0 {
                info!(
                    "[{}] Progress: {}/{} items processed",
                    self.name(),
                    idx + 1,
                    items.len()
                );
            }

            let is_original = self.is_original(item).await;
            let target = compute_target(
                item,
                is_original,
                setup.tag_id,
                &self.settings().tag_name,
                &setup.policy,
            );
            let outcome = self.reconcile_item(item, &target).await;
            if outcome.updated || outcome.would_update {
                stats.updated += 1;
            } else {
                stats.skipped += 1;
            }
        }

        info!("[{}] Processing complete!", self.name());
        if self.reconciler().is_dry_run() {
            info!("[{}]   Would update: {}", self.name(), stats.updated);
        } else {
            info!("[{}]   Updated: {}", self.name(), stats.updated);
        }
        info!("[{}]   Already correct: {}", self.name(), stats.skipped);
        info!("[{}]   Total: {}", self.name(), stats.total);

        Ok(stats)
    }

    /// Audio-tagging pass: derive per-language marker tags from the
    /// languages actually present in each item's files.
    ///
    /// Series are aggregated conservatively: a language counts only
    /// when every episode file carries it. Items with no files yet are
    /// left alone rather than stripped.
    ///
    /// This pass and the profile pass each diff tags against their own
    /// snapshot and write the full tag array back; interleaving them
    /// against the same instance can momentarily drop one side's tag
    /// until the next pass restores it.
    pub async fn run_audio_scan(&self) -> Result<AudioScanStats, SyncError> {
        if self.settings().audio_tags.is_empty() {
            debug!("[{}] No audio tags configured, skipping audio scan", self.name());
            return Ok(AudioScanStats::default());
        }

        let tag_set = self.resolve_audio_tags().await?;
        if tag_set.wanted.is_empty() {
            return Ok(AudioScanStats::default());
        }

        info!(
            "[{}] Audio scan: tracking {} languages",
            self.name(),
            tag_set.wanted.len()
        );

        let items = self.client().list_items().await?;
        let mut stats = AudioScanStats { total: items.len(), ..Default::default() };

        for item in &items {
            let detected = match self.kind() {
                ServiceKind::Movies => match &item.movie_file {
                    Some(file) => {
                        parse_track_languages(file.media_info.as_ref(), file.languages.as_deref())
                    }
                    None => {
                        debug!(
                            "[{}] '{}' has no media file yet, leaving audio tags alone",
                            self.name(),
                            item.title
                        );
                        stats.skipped += 1;
                        continue;
                    }
                },
                ServiceKind::Series => {
                    let files = match self.client().episode_files(item.id).await {
                        Ok(files) => files,
                        Err(e) => {
                            warn!(
                                "[{}] Failed to fetch episode files for '{}': {}",
                                self.name(),
                                item.title,
                                e
                            );
                            stats.skipped += 1;
                            continue;
                        }
                    };
                    if files.is_empty() {
                        debug!(
                            "[{}] '{}' has no episode files yet, leaving audio tags alone",
                            self.name(),
                            item.title
                        );
                        stats.skipped += 1;
                        continue;
                    }
                    let per_file: Vec<_> = files
                        .iter()
                        .map(|f| parse_track_languages(f.media_info.as_ref(), f.languages.as_deref()))
                        .collect();
                    aggregate_across_files(&per_file)
                }
            };

            let current = item.tag_set();
            let delta = diff_tags(&current, &tag_set.wanted, &detected);
            if delta.is_empty() {
                stats.skipped += 1;
                continue;
            }

            let mut tags = current;
            for tag in &delta.to_remove {
                tags.remove(tag);
            }
            tags.extend(delta.to_add.iter().copied());

            let mut changes = Vec::new();
            for tag in &delta.to_add {
                changes.push(format!("add tag '{}'", tag_set.label(*tag)));
            }
            for tag in &delta.to_remove {
                changes.push(format!("remove tag '{}'", tag_set.label(*tag)));
            }

            let target = TargetState {
                tags,
                quality_profile_id: item.quality_profile_id,
                profile_changed: false,
                changes,
            };
            let outcome = self.reconcile_item(item, &target).await;
            if outcome.updated || outcome.would_update {
                stats.tagged += 1;
            } else {
                stats.skipped += 1;
            }
        }

        info!(
            "[{}] Audio scan complete: {} tagged, {} skipped, {} total",
            self.name(),
            stats.tagged,
            stats.skipped,
            stats.total
        );
        Ok(stats)
    }

    async fn resolve_audio_tags(&self) -> Result<AudioTagSet, SyncError> {
        let existing = self.client().tags().await?;
        let mut tag_set = AudioTagSet::default();

        for (language, label) in &self.settings().audio_tags {
            let id = match existing.iter().find(|tag| &tag.label == label) {
                Some(tag) => tag.id,
                None if self.reconciler().is_dry_run() => {
                    info!(
                        "[{}] [DRY-RUN] Would create tag '{}', skipping '{}' this run",
                        self.name(),
                        label,
                        language
                    );
                    continue;
                }
                None => self.client().create_tag(label).await?.id,
            };
            tag_set.wanted.insert(normalize(language), id);
            tag_set.labels.insert(id, label.clone());
        }

        Ok(tag_set)
    }
}

impl AudioTagSet {
    fn label(&self, id: i64) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// One full sync cycle: intake requests first (so new requests pick up
/// the right profile before the catalogs import them), then every
/// catalog instance as the safety net.
pub async fn run_once(
    intakes: &[Arc<IntakeInstance>],
    catalogs: &[Arc<CatalogInstance>],
) -> (usize, usize) {
    info!("{}", "=".repeat(80));
    info!("langarr - starting sync");
    info!("{}", "=".repeat(80));

    for intake in intakes {
        intake.process_pending_requests().await;
    }

    let mut success = 0usize;
    let mut failed = 0usize;
    for instance in catalogs {
        match instance.run_sync().await {
            Ok(_) => success += 1,
            Err(e) => {
                error!("[{}] Processing failed: {}", instance.name(), e);
                failed += 1;
            }
        }
    }

    info!("{}", "=".repeat(80));
    info!("Sync complete: {} successful, {} failed", success, failed);
    info!("{}", "=".repeat(80));
    (success, failed)
}

/// Audio pass across all instances; one instance's failure does not
/// stop the others.
pub async fn run_audio_scan(catalogs: &[Arc<CatalogInstance>]) -> Vec<(String, AudioScanStats)> {
    let mut results = Vec::new();
    for instance in catalogs {
        match instance.run_audio_scan().await {
            Ok(stats) => results.push((instance.name().to_string(), stats)),
            Err(e) => {
                error!("[{}] Audio scan failed: {}", instance.name(), e);
                results.push((instance.name().to_string(), AudioScanStats::default()));
            }
        }
    }
    results
}
