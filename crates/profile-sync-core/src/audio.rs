//! Audio-track language aggregation and tag diffing.
//!
//! The audio pass tags items with the languages actually present in
//! their files. Movies read one file; series intersect across every
//! episode file, so a language counts only when every episode has it.

use crate::language::normalize;
use profile_sync_models::{MediaInfo, TrackLanguage};
use std::collections::{BTreeMap, BTreeSet};

/// Extract the canonical audio-language set of one media file.
///
/// The primary source is the probed `audioLanguages` string, slash
/// delimited with arbitrary whitespace ("English / German"). When that
/// is absent or empty, the per-file `languages` list stands in.
pub fn parse_track_languages(
    media_info: Option<&MediaInfo>,
    fallback: Option<&[TrackLanguage]>,
) -> BTreeSet<String> {
    let mut detected = BTreeSet::new();

    if let Some(raw) = media_info.and_then(|info| info.audio_languages.as_deref()) {
        for token in raw.split('/') {
            let token = token.trim();
            if !token.is_empty() {
                detected.insert(normalize(token));
            }
        }
    }

    if detected.is_empty() {
        if let Some(languages) = fallback {
            for language in languages {
                let name = language.name.trim();
                if !name.is_empty() {
                    detected.insert(normalize(name));
                }
            }
        }
    }

    detected
}

/// Intersect per-file language sets: the aggregate keeps a language
/// only if every file exhibits it. An empty input yields an empty set.
pub fn aggregate_across_files(per_file: &[BTreeSet<String>]) -> BTreeSet<String> {
    let mut files = per_file.iter();
    let Some(first) = files.next() else {
        return BTreeSet::new();
    };

    files.fold(first.clone(), |acc, set| {
        acc.intersection(set).cloned().collect()
    })
}

/// Tag changes required to make `current` reflect `detected`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub to_add: BTreeSet<i64>,
    pub to_remove: BTreeSet<i64>,
}

impl TagDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Diff the configured language->tag pairs against the detected set.
/// Tags not owned by any configured language are left untouched.
pub fn diff_tags(
    current: &BTreeSet<i64>,
    wanted: &BTreeMap<String, i64>,
    detected: &BTreeSet<String>,
) -> TagDelta {
    let mut delta = TagDelta::default();

    for (language, tag_id) in wanted {
        if detected.contains(language) {
            if !current.contains(tag_id) {
                delta.to_add.insert(*tag_id);
            }
        } else if current.contains(tag_id) {
            delta.to_remove.insert(*tag_id);
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(languages: &[&str]) -> BTreeSet<String> {
        languages.iter().map(|s| s.to_string()).collect()
    }

    fn media_info(audio_languages: &str) -> MediaInfo {
        serde_json::from_value(serde_json::json!({ "audioLanguages": audio_languages })).unwrap()
    }

    fn fallback(names: &[&str]) -> Vec<TrackLanguage> {
        names
            .iter()
            .map(|name| serde_json::from_value(serde_json::json!({ "name": name })).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_slash_delimited_with_whitespace() {
        let info = media_info("English / German");
        assert_eq!(parse_track_languages(Some(&info), None), set(&["english", "german"]));
    }

    #[test]
    fn test_parse_falls_back_to_language_list() {
        let languages = fallback(&["French"]);
        assert_eq!(parse_track_languages(None, Some(&languages)), set(&["french"]));
    }

    #[test]
    fn test_parse_prefers_primary_over_fallback() {
        let info = media_info("Japanese");
        let languages = fallback(&["French"]);
        assert_eq!(
            parse_track_languages(Some(&info), Some(&languages)),
            set(&["japanese"])
        );
    }

    #[test]
    fn test_parse_empty_primary_uses_fallback() {
        let info = media_info("  ");
        let languages = fallback(&["French"]);
        assert_eq!(
            parse_track_languages(Some(&info), Some(&languages)),
            set(&["french"])
        );
    }

    #[test]
    fn test_aggregate_intersects() {
        let per_file = vec![set(&["english", "german"]), set(&["english"])];
        assert_eq!(aggregate_across_files(&per_file), set(&["english"]));
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate_across_files(&[]).is_empty());
    }

    #[test]
    fn test_aggregate_single_file_passes_through() {
        let per_file = vec![set(&["german", "japanese"])];
        assert_eq!(aggregate_across_files(&per_file), set(&["german", "japanese"]));
    }

    #[test]
    fn test_diff_adds_detected_and_removes_missing() {
        let wanted: BTreeMap<String, i64> =
            [("german".to_string(), 11), ("english".to_string(), 12)].into_iter().collect();
        let current: BTreeSet<i64> = [12, 99].into_iter().collect();

        let delta = diff_tags(&current, &wanted, &set(&["german"]));
        assert_eq!(delta.to_add, [11].into_iter().collect());
        assert_eq!(delta.to_remove, [12].into_iter().collect());
    }

    #[test]
    fn test_diff_leaves_unrelated_tags_alone() {
        let wanted: BTreeMap<String, i64> = [("german".to_string(), 11)].into_iter().collect();
        let current: BTreeSet<i64> = [99].into_iter().collect();

        let delta = diff_tags(&current, &wanted, &set(&[]));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_diff_settled_state_is_empty() {
        let wanted: BTreeMap<String, i64> = [("german".to_string(), 11)].into_iter().collect();
        let current: BTreeSet<i64> = [11].into_iter().collect();

        let delta = diff_tags(&current, &wanted, &set(&["german"]));
        assert!(delta.is_empty());
    }
}
