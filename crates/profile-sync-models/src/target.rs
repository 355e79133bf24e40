use std::collections::BTreeSet;

/// The tag/profile state an item should have after this run.
///
/// Derived purely from the current item and static configuration;
/// recomputed every run, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetState {
    pub tags: BTreeSet<i64>,
    pub quality_profile_id: i64,
    /// True when the profile itself differs from the current one. Only a
    /// profile change qualifies for a downstream search trigger.
    pub profile_changed: bool,
    /// Human-readable change descriptions for log lines.
    pub changes: Vec<String>,
}
