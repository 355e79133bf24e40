//! Language-token normalization.
//!
//! Every language comparison in the engine goes through [`normalize`],
//! which folds ISO 639-1/639-2 codes, endonyms, and English names into
//! one canonical lowercase name per language.

/// Fixed, ordered alias table. Order matters: substring resolution
/// takes the first hit, so this is a slice, not a map.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("en", "english"),
    ("eng", "english"),
    ("english", "english"),
    ("de", "german"),
    ("deu", "german"),
    ("ger", "german"),
    ("deutsch", "german"),
    ("german", "german"),
    ("fr", "french"),
    ("fra", "french"),
    ("fre", "french"),
    ("francais", "french"),
    ("french", "french"),
    ("es", "spanish"),
    ("spa", "spanish"),
    ("espanol", "spanish"),
    ("spanish", "spanish"),
    ("it", "italian"),
    ("ita", "italian"),
    ("italiano", "italian"),
    ("italian", "italian"),
    ("ja", "japanese"),
    ("jpn", "japanese"),
    ("japanese", "japanese"),
    ("ko", "korean"),
    ("kor", "korean"),
    ("korean", "korean"),
    ("zh", "chinese"),
    ("zho", "chinese"),
    ("chi", "chinese"),
    ("chinese", "chinese"),
    ("ru", "russian"),
    ("rus", "russian"),
    ("russian", "russian"),
    ("pt", "portuguese"),
    ("por", "portuguese"),
    ("portugues", "portuguese"),
    ("portuguese", "portuguese"),
    ("nl", "dutch"),
    ("nld", "dutch"),
    ("dut", "dutch"),
    ("nederlands", "dutch"),
    ("dutch", "dutch"),
    ("sv", "swedish"),
    ("swe", "swedish"),
    ("svenska", "swedish"),
    ("swedish", "swedish"),
    ("no", "norwegian"),
    ("nor", "norwegian"),
    ("norsk", "norwegian"),
    ("norwegian", "norwegian"),
    ("da", "danish"),
    ("dan", "danish"),
    ("dansk", "danish"),
    ("danish", "danish"),
    ("fi", "finnish"),
    ("fin", "finnish"),
    ("suomi", "finnish"),
    ("finnish", "finnish"),
    ("pl", "polish"),
    ("pol", "polish"),
    ("polski", "polish"),
    ("polish", "polish"),
    ("cs", "czech"),
    ("ces", "czech"),
    ("cze", "czech"),
    ("cestina", "czech"),
    ("czech", "czech"),
    ("hu", "hungarian"),
    ("hun", "hungarian"),
    ("magyar", "hungarian"),
    ("hungarian", "hungarian"),
    ("tr", "turkish"),
    ("tur", "turkish"),
    ("turkce", "turkish"),
    ("turkish", "turkish"),
    ("ar", "arabic"),
    ("ara", "arabic"),
    ("arabic", "arabic"),
    ("hi", "hindi"),
    ("hin", "hindi"),
    ("hindi", "hindi"),
    ("hr", "croatian"),
    ("hrv", "croatian"),
    ("hrvatski", "croatian"),
    ("croatian", "croatian"),
];

/// Map an arbitrary language token to its canonical lowercase name.
///
/// Exact alias hits win; otherwise the first alias related by substring
/// containment in either direction decides (so "English (US)" resolves
/// to "english"). Unknown tokens pass through lowercased and become
/// their own canonical key.
pub fn normalize(token: &str) -> String {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return token;
    }

    for (alias, canonical) in LANGUAGE_ALIASES {
        if *alias == token {
            return (*canonical).to_string();
        }
    }

    for (alias, canonical) in LANGUAGE_ALIASES {
        if token.contains(alias) || alias.contains(token.as_str()) {
            return (*canonical).to_string();
        }
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_names_agree() {
        assert_eq!(normalize("de"), normalize("german"));
        assert_eq!(normalize("deu"), normalize("Deutsch"));
        assert_eq!(normalize("ja"), normalize("Japanese"));
        assert_eq!(normalize("fra"), normalize("French"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(normalize("  EN "), "english");
        assert_eq!(normalize("GERMAN"), "german");
    }

    #[test]
    fn test_regional_variant_resolves_by_substring() {
        assert_eq!(normalize("English (US)"), "english");
        assert_eq!(normalize("Portuguese (Brazil)"), "portuguese");
    }

    #[test]
    fn test_unknown_token_passes_through() {
        assert_eq!(normalize("Klingon"), "klingon");
    }

    #[test]
    fn test_idempotent() {
        for token in ["en", "Deutsch", "English (US)", "Klingon", "zh", "suomi"] {
            let once = normalize(token);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {token:?}");
        }
    }

    #[test]
    fn test_deterministic_over_the_whole_table() {
        for (alias, canonical) in LANGUAGE_ALIASES {
            assert_eq!(normalize(alias), *canonical);
        }
    }
}
