//! Real-time path: react to intake notifications by reconciling the
//! affected item immediately, before downstream processing picks the
//! wrong profile.

use crate::decision::compute_target;
use crate::error::SyncError;
use crate::instance::CatalogInstance;
use crate::intake::IntakeInstance;
use profile_sync_models::WebhookPayload;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MEDIA_PENDING: &str = "MEDIA_PENDING";
pub const MEDIA_AUTO_APPROVED: &str = "MEDIA_AUTO_APPROVED";

/// Delay before looking the item up, giving the intake service time to
/// hand the new request over to the catalog.
const LOOKUP_GRACE: Duration = Duration::from_millis(500);

/// Whether a notification type warrants processing at all. Everything
/// else is acknowledged and ignored.
pub fn is_actionable(notification_type: &str) -> bool {
    matches!(notification_type, MEDIA_PENDING | MEDIA_AUTO_APPROVED)
}

/// Apply the per-item policy for a media request announced by webhook.
///
/// This is the same reconciliation as the batch path, driven by the
/// ISO language code the intake service reports instead of a catalog
/// language id. It runs concurrently with any batch pass; the
/// reconciler's diff-before-write check is the only guard between
/// them.
pub async fn process_webhook(
    payload: &WebhookPayload,
    intakes: &[Arc<IntakeInstance>],
    catalogs: &[Arc<CatalogInstance>],
) -> Result<(), SyncError> {
    let Some(media) = payload.media.as_ref() else {
        warn!("Webhook missing media section");
        return Ok(());
    };
    let (Some(tmdb_id), Some(kind)) = (media.tmdb_id(), media.media_type) else {
        warn!("Webhook missing tmdbId or media_type");
        return Ok(());
    };
    let request_id = payload.request.as_ref().and_then(|r| r.request_id);

    info!("Processing webhook for {} TMDB {} (request {:?})", kind, tmdb_id, request_id);

    let Some(intake) = intakes.first() else {
        debug!("No intake instances configured, skipping webhook processing");
        return Ok(());
    };

    let Some(language) = intake.media_language(kind, tmdb_id).await? else {
        warn!("Could not determine language for TMDB {}", tmdb_id);
        return Ok(());
    };

    let service_kind = kind.service_kind();
    let relevant: Vec<_> = catalogs
        .iter()
        .filter(|instance| instance.kind() == service_kind)
        .collect();
    if relevant.is_empty() {
        warn!("No {} instances configured", service_kind);
        return Ok(());
    }

    for instance in relevant {
        info!("[{}] Processing webhook for {} TMDB {}", instance.name(), kind, tmdb_id);

        let is_original = instance.is_original_token(&language);
        let profile_name = if is_original {
            &instance.settings().original_profile
        } else {
            &instance.settings().dub_profile
        };
        info!(
            "[{}] {} TMDB {}: {} -> {}",
            instance.name(),
            kind,
            tmdb_id,
            language,
            profile_name
        );

        tokio::time::sleep(LOOKUP_GRACE).await;

        let item = match instance.client().find_by_tmdb_id(tmdb_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                warn!(
                    "[{}] Could not find {} with TMDB ID {} (may not be added yet)",
                    instance.name(),
                    kind,
                    tmdb_id
                );
                continue;
            }
            Err(e) => {
                warn!(
                    "[{}] Error finding item by TMDB ID {}: {}",
                    instance.name(),
                    tmdb_id,
                    e
                );
                continue;
            }
        };
        info!("[{}] Found {} '{}' (ID {})", instance.name(), kind, item.title, item.id);

        let setup = match instance.setup().await {
            Ok(setup) => setup,
            Err(e) => {
                warn!("[{}] Skipping webhook update: {}", instance.name(), e);
                continue;
            }
        };

        let target = compute_target(
            &item,
            is_original,
            setup.tag_id,
            &instance.settings().tag_name,
            &setup.policy,
        );
        let outcome = instance.reconcile_item(&item, &target).await;
        if outcome.updated {
            info!("[{}] Updated {} ID {} -> {}", instance.name(), kind, item.id, profile_name);
        } else {
            debug!("[{}] No update needed for {} ID {}", instance.name(), kind, item.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actionable_notification_types() {
        assert!(is_actionable(MEDIA_PENDING));
        assert!(is_actionable(MEDIA_AUTO_APPROVED));
        assert!(!is_actionable("MEDIA_AVAILABLE"));
        assert!(!is_actionable("TEST_NOTIFICATION"));
    }
}
