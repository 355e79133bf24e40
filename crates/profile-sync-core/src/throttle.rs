//! Search-trigger rate limiting.
//!
//! Two tiers guard the post-update search side effect: a per-item
//! cooldown that denies repeat searches for the same title, and a
//! global minimum interval that spaces searches out so the downstream
//! indexer is not flooded. The per-item tier rejects; the global tier
//! waits.

use profile_sync_config::SearchSettings;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SearchPolicy {
    pub trigger_on_update: bool,
    pub per_item_cooldown: Duration,
    pub min_global_interval: Duration,
}

impl From<&SearchSettings> for SearchPolicy {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            trigger_on_update: settings.trigger_search_on_update,
            per_item_cooldown: Duration::from_secs(settings.search_cooldown_seconds),
            min_global_interval: Duration::from_secs(settings.min_search_interval_seconds),
        }
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_per_item: HashMap<i64, Instant>,
    last_any: Option<Instant>,
}

/// Per-instance cooldown tracker. In-memory only; resets with the
/// process. Instances never share one.
#[derive(Debug)]
pub struct SearchThrottle {
    policy: SearchPolicy,
    state: Mutex<ThrottleState>,
}

impl SearchThrottle {
    pub fn new(policy: SearchPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Ask permission to trigger a search for `item_id`.
    ///
    /// Returns false without side effects when the feature is off or
    /// the item's cooldown has not elapsed. When only the global
    /// minimum interval is in the way, this sleeps out the remainder
    /// and then grants. Granting does not stamp the trackers; call
    /// [`record_trigger`](Self::record_trigger) once the search
    /// actually fired.
    pub async fn try_acquire(&self, item_id: i64) -> bool {
        if !self.policy.trigger_on_update {
            return false;
        }

        let global_wait = {
            let state = self.state.lock().await;

            if let Some(last) = state.last_per_item.get(&item_id) {
                let since = last.elapsed();
                if since < self.policy.per_item_cooldown {
                    debug!(
                        "Skipping search for item {} (searched {}s ago, cooldown: {}s)",
                        item_id,
                        since.as_secs(),
                        self.policy.per_item_cooldown.as_secs()
                    );
                    return false;
                }
            }

            state
                .last_any
                .and_then(|last| self.policy.min_global_interval.checked_sub(last.elapsed()))
        };

        if let Some(wait) = global_wait {
            if !wait.is_zero() {
                debug!("Waiting {:.1}s for search rate limit", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }

        true
    }

    /// Stamp both trackers after a successful downstream trigger.
    pub async fn record_trigger(&self, item_id: i64) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.last_per_item.insert(item_id, now);
        state.last_any = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(cooldown_secs: u64, global_secs: u64) -> SearchPolicy {
        SearchPolicy {
            trigger_on_update: true,
            per_item_cooldown: Duration::from_secs(cooldown_secs),
            min_global_interval: Duration::from_secs(global_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_feature_always_denies() {
        let throttle = SearchThrottle::new(SearchPolicy {
            trigger_on_update: false,
            ..policy(0, 0)
        });
        assert!(!throttle.try_acquire(1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_item_cooldown_denies_then_allows() {
        let throttle = SearchThrottle::new(policy(60, 0));

        assert!(throttle.try_acquire(1).await);
        throttle.record_trigger(1).await;

        assert!(!throttle.try_acquire(1).await, "second call within cooldown");

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(throttle.try_acquire(1).await, "cooldown elapsed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_is_per_item() {
        let throttle = SearchThrottle::new(policy(60, 0));

        assert!(throttle.try_acquire(1).await);
        throttle.record_trigger(1).await;

        assert!(throttle.try_acquire(2).await, "different item is unaffected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_interval_blocks_until_elapsed() {
        let throttle = SearchThrottle::new(policy(60, 5));

        assert!(throttle.try_acquire(1).await);
        throttle.record_trigger(1).await;

        let before = Instant::now();
        assert!(throttle.try_acquire(2).await, "blocks, then grants");
        assert!(
            before.elapsed() >= Duration::from_secs(5),
            "global minimum interval was waited out"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_denial_leaves_no_trace() {
        let throttle = SearchThrottle::new(policy(60, 5));

        assert!(throttle.try_acquire(1).await);
        throttle.record_trigger(1).await;
        assert!(!throttle.try_acquire(1).await);

        // The denied call must not have refreshed the global stamp.
        tokio::time::advance(Duration::from_secs(6)).await;
        let before = Instant::now();
        assert!(throttle.try_acquire(2).await);
        assert!(before.elapsed() < Duration::from_secs(1), "no extra wait imposed");
    }
}
