//! Per-instance language-id resolution.
//!
//! Catalog APIs report an item's original language as an internal
//! numeric id whose meaning differs between instances. Each sync run
//! therefore samples the instance's own items to learn which ids
//! correspond to the configured languages; webhook lookups, which carry
//! ISO codes instead of ids, are covered by a direct string fallback.

use crate::language::normalize;
use profile_sync_models::{CatalogItem, LanguageKey, LanguageRef};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Catalog-internal language id -> canonical language name, for the
/// configured languages only. Built once per run, read-only afterwards,
/// never persisted.
pub type LanguageMap = BTreeMap<i64, String>;

/// How many items to sample when learning the instance's id scheme.
const LANGUAGE_SAMPLE_SIZE: usize = 50;

/// Build the id map by matching each configured language against the
/// language names observed in a sample of the instance's items.
///
/// Configured tokens that parse as integers match observed ids
/// directly, for operators who configure raw catalog ids. Everything
/// else is normalized and matched against normalized observed names,
/// exact hits first, then the first substring overlap in observation
/// order. Unresolved tokens are dropped with a diagnostic.
pub fn build_language_map(
    instance: &str,
    items: &[CatalogItem],
    configured: &[String],
) -> LanguageMap {
    let mut observed: Vec<(i64, String)> = Vec::new();
    for item in items.iter().take(LANGUAGE_SAMPLE_SIZE) {
        if let Some(LanguageRef::Keyed { id: Some(LanguageKey::Id(id)), name: Some(name) }) =
            &item.original_language
        {
            let name = name.trim();
            if !name.is_empty() && !observed.iter().any(|(seen, _)| seen == id) {
                observed.push((*id, name.to_string()));
            }
        }
    }

    if observed.is_empty() {
        warn!("[{}] No language data found in items, cannot build mapping", instance);
        warn!("[{}] Will use direct comparison (may not work correctly)", instance);
        return LanguageMap::new();
    }

    let mut map = LanguageMap::new();
    for token in configured {
        if let Ok(id) = token.trim().parse::<i64>() {
            if let Some((_, name)) = observed.iter().find(|(seen, _)| *seen == id) {
                info!("[{}] Mapped '{}' -> API ID {} ({})", instance, token, id, name);
                map.insert(id, normalize(name));
                continue;
            }
        }

        let target = normalize(token);

        let exact = observed
            .iter()
            .find(|(_, name)| normalize(name) == target);
        let matched = exact.or_else(|| {
            observed.iter().find(|(_, name)| {
                let name = normalize(name);
                name.contains(&target) || target.contains(&name)
            })
        });

        match matched {
            Some((id, name)) => {
                info!("[{}] Mapped '{}' -> API ID {} ({})", instance, token, id, name);
                map.insert(*id, target);
            }
            None => {
                warn!("[{}] Could not map configured language '{}' to any API language", instance, token);
                let sample: Vec<String> = observed
                    .iter()
                    .take(10)
                    .map(|(id, name)| format!("{}: {}", id, name))
                    .collect();
                warn!("[{}] Available languages: {{{}}}", instance, sample.join(", "));
            }
        }
    }

    info!("[{}] Language mapping complete: {} languages mapped", instance, map.len());
    map
}

/// Decide whether an item's original language counts as one the
/// audience understands (so the original-preferred profile applies).
///
/// Missing or malformed language metadata defaults to original
/// preferred with a diagnostic, never an error. Ids the map knows are
/// original; everything else falls back to comparing the stringified id
/// against the configured tokens, which is how webhook-supplied ISO
/// codes resolve.
pub fn resolve_is_original(
    instance: &str,
    item: &CatalogItem,
    map: &LanguageMap,
    configured: &[String],
) -> bool {
    let key = match &item.original_language {
        None => {
            warn!(
                "[{}] '{}' has no original language info, defaulting to original preferred",
                instance, item.title
            );
            return true;
        }
        Some(LanguageRef::Malformed(value)) => {
            warn!(
                "[{}] '{}' has malformed originalLanguage field: {}, defaulting to original preferred",
                instance, item.title, value
            );
            return true;
        }
        Some(reference) => match reference.key() {
            None => {
                warn!(
                    "[{}] '{}' has no original language ID, defaulting to original preferred",
                    instance, item.title
                );
                return true;
            }
            Some(key) => key,
        },
    };

    if let Some(id) = key.as_id() {
        if map.contains_key(&id) {
            return true;
        }
    }

    is_configured_token(&key.as_token(), configured)
}

/// Direct comparison of a language token against the configured list,
/// the second tier of the fallback above. Webhook lookups call this
/// with the ISO code the intake service reported.
pub fn is_configured_token(token: &str, configured: &[String]) -> bool {
    configured
        .iter()
        .any(|lang| lang.trim().to_lowercase() == token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, lang: serde_json::Value) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Item {id}"),
            "qualityProfileId": 1,
            "originalLanguage": lang,
        }))
        .unwrap()
    }

    fn plain_item(id: i64) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Item {id}"),
            "qualityProfileId": 1,
        }))
        .unwrap()
    }

    fn configured(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_map_matches_codes_to_observed_names() {
        let items = vec![
            item(1, serde_json::json!({"id": 7, "name": "English"})),
            item(2, serde_json::json!({"id": 12, "name": "Japanese"})),
        ];
        let map = build_language_map("test", &items, &configured(&["en", "de"]));
        assert_eq!(map.get(&7).map(String::as_str), Some("english"));
        assert!(!map.contains_key(&12));
    }

    #[test]
    fn test_build_map_accepts_raw_numeric_ids() {
        let items = vec![item(1, serde_json::json!({"id": 7, "name": "English"}))];
        let map = build_language_map("test", &items, &configured(&["7"]));
        assert_eq!(map.get(&7).map(String::as_str), Some("english"));
    }

    #[test]
    fn test_build_map_substring_overlap() {
        let items = vec![item(1, serde_json::json!({"id": 3, "name": "English (US)"}))];
        let map = build_language_map("test", &items, &configured(&["english"]));
        assert_eq!(map.get(&3).map(String::as_str), Some("english"));
    }

    #[test]
    fn test_build_map_empty_without_observations() {
        let items = vec![plain_item(1), plain_item(2)];
        assert!(build_language_map("test", &items, &configured(&["en"])).is_empty());
    }

    #[test]
    fn test_resolve_scenario_mapped_and_unmapped() {
        let a = item(1, serde_json::json!({"id": 7, "name": "English"}));
        let b = item(2, serde_json::json!({"id": 12, "name": "Japanese"}));
        let langs = configured(&["en", "de"]);
        let map = build_language_map("test", &[a.clone(), b.clone()], &langs);

        assert!(resolve_is_original("test", &a, &map, &langs));
        assert!(!resolve_is_original("test", &b, &map, &langs));
    }

    #[test]
    fn test_resolve_defaults_to_original_without_language() {
        let item = plain_item(1);
        assert!(resolve_is_original("test", &item, &LanguageMap::new(), &configured(&["en"])));
    }

    #[test]
    fn test_resolve_defaults_to_original_when_malformed() {
        let item = item(1, serde_json::json!("english"));
        assert!(resolve_is_original("test", &item, &LanguageMap::new(), &configured(&["ja"])));
    }

    #[test]
    fn test_resolve_falls_back_to_code_comparison() {
        // Webhook path: the "id" is an ISO code and no map exists.
        let ko = item(1, serde_json::json!({"id": "ko"}));
        let en = item(2, serde_json::json!({"id": "en"}));
        let langs = configured(&["en", "de"]);

        assert!(!resolve_is_original("test", &ko, &LanguageMap::new(), &langs));
        assert!(resolve_is_original("test", &en, &LanguageMap::new(), &langs));
    }
}
