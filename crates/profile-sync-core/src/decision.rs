//! Target-state computation for the profile/tag policy.

use crate::error::SyncError;
use profile_sync_models::{CatalogItem, QualityProfile, TargetState};

/// The two quality profiles a catalog instance switches between,
/// resolved to ids at instance setup.
#[derive(Debug, Clone)]
pub struct ProfilePolicy {
    pub original_id: i64,
    pub original_name: String,
    pub dub_id: i64,
    pub dub_name: String,
}

impl ProfilePolicy {
    /// Resolve both configured profile names against the instance's
    /// profile list, case-insensitively. A missing profile is fatal for
    /// the instance: without both ids the sync must not proceed.
    pub fn resolve(
        instance: &str,
        profiles: &[QualityProfile],
        original_name: &str,
        dub_name: &str,
    ) -> Result<Self, SyncError> {
        let original = find_profile(profiles, original_name);
        let dub = find_profile(profiles, dub_name);

        match (original, dub) {
            (Some(original), Some(dub)) => Ok(Self {
                original_id: original.id,
                original_name: original.name.clone(),
                dub_id: dub.id,
                dub_name: dub.name.clone(),
            }),
            _ => {
                let missing = if original.is_none() { original_name } else { dub_name };
                let available: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
                Err(SyncError::Configuration(format!(
                    "[{}] required profile '{}' does not exist (available: {})",
                    instance,
                    missing,
                    available.join(", ")
                )))
            }
        }
    }
}

fn find_profile<'a>(profiles: &'a [QualityProfile], name: &str) -> Option<&'a QualityProfile> {
    profiles
        .iter()
        .find(|profile| profile.name.eq_ignore_ascii_case(name))
}

/// Compute the tag/profile state an item should have.
///
/// Dub-preferred items gain the marker tag and the dub profile;
/// original-preferred items lose the tag and get the original profile.
/// Tags other than the marker are never touched here.
pub fn compute_target(
    item: &CatalogItem,
    is_original: bool,
    tag_id: i64,
    tag_name: &str,
    policy: &ProfilePolicy,
) -> TargetState {
    let mut tags = item.tag_set();
    let mut changes = Vec::new();

    let (target_profile_id, target_profile_name) = if is_original {
        if tags.remove(&tag_id) {
            changes.push(format!("remove tag '{}'", tag_name));
        }
        (policy.original_id, policy.original_name.as_str())
    } else {
        if tags.insert(tag_id) {
            changes.push(format!("add tag '{}'", tag_name));
        }
        (policy.dub_id, policy.dub_name.as_str())
    };

    let profile_changed = item.quality_profile_id != target_profile_id;
    if profile_changed {
        changes.push(format!("set profile to '{}'", target_profile_name));
    }

    TargetState {
        tags,
        quality_profile_id: target_profile_id,
        profile_changed,
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ProfilePolicy {
        ProfilePolicy {
            original_id: 1,
            original_name: "Original Preferred".to_string(),
            dub_id: 2,
            dub_name: "Dub Preferred".to_string(),
        }
    }

    fn item(tags: &[i64], profile: i64) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": 10,
            "title": "Example",
            "tags": tags,
            "qualityProfileId": profile,
        }))
        .unwrap()
    }

    #[test]
    fn test_dub_preferred_adds_tag_and_switches_profile() {
        let target = compute_target(&item(&[], 1), false, 5, "prefer-dub", &policy());
        assert!(target.tags.contains(&5));
        assert_eq!(target.quality_profile_id, 2);
        assert!(target.profile_changed);
        assert_eq!(
            target.changes,
            vec!["add tag 'prefer-dub'", "set profile to 'Dub Preferred'"]
        );
    }

    #[test]
    fn test_original_preferred_removes_tag() {
        let target = compute_target(&item(&[5, 9], 2), true, 5, "prefer-dub", &policy());
        assert!(!target.tags.contains(&5));
        assert!(target.tags.contains(&9), "unrelated tags stay untouched");
        assert_eq!(target.quality_profile_id, 1);
        assert!(target.profile_changed);
    }

    #[test]
    fn test_settled_item_yields_no_changes() {
        let target = compute_target(&item(&[5], 2), false, 5, "prefer-dub", &policy());
        assert_eq!(target.tags, item(&[5], 2).tag_set());
        assert!(!target.profile_changed);
        assert!(target.changes.is_empty());
    }

    #[test]
    fn test_tag_only_change_does_not_flag_profile() {
        let target = compute_target(&item(&[], 2), false, 5, "prefer-dub", &policy());
        assert!(target.tags.contains(&5));
        assert!(!target.profile_changed);
        assert_eq!(target.changes, vec!["add tag 'prefer-dub'"]);
    }

    #[test]
    fn test_resolve_profiles_case_insensitive() {
        let profiles = vec![
            QualityProfile { id: 4, name: "original preferred".to_string() },
            QualityProfile { id: 7, name: "DUB PREFERRED".to_string() },
        ];
        let policy =
            ProfilePolicy::resolve("test", &profiles, "Original Preferred", "Dub Preferred")
                .unwrap();
        assert_eq!(policy.original_id, 4);
        assert_eq!(policy.dub_id, 7);
    }

    #[test]
    fn test_resolve_profiles_missing_is_configuration_error() {
        let profiles = vec![QualityProfile { id: 4, name: "Any".to_string() }];
        let err = ProfilePolicy::resolve("test", &profiles, "Original Preferred", "Dub Preferred")
            .unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(err.to_string().contains("Original Preferred"));
    }
}
