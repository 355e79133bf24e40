use serde::{Deserialize, Serialize};

/// A catalog-internal language identifier.
///
/// Batch item listings carry numeric ids; webhook-derived lookups
/// substitute an ISO code string in the same position. Both forms are
/// accepted and compared through their lowercased string token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageKey {
    Id(i64),
    Code(String),
}

impl LanguageKey {
    /// Numeric id, when this key is one.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            LanguageKey::Id(id) => Some(*id),
            LanguageKey::Code(_) => None,
        }
    }

    /// Stringified, lowercased, trimmed form used for direct comparison
    /// against configured language tokens.
    pub fn as_token(&self) -> String {
        match self {
            LanguageKey::Id(id) => id.to_string(),
            LanguageKey::Code(code) => code.trim().to_ascii_lowercase(),
        }
    }
}

/// Original-language reference as the catalog API returns it.
///
/// A well-formed reference is an `{id, name}` object; both fields are
/// independently optional because some API versions omit one or the
/// other. Any other JSON shape is preserved verbatim as `Malformed` and
/// resolves to the default-to-original policy downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageRef {
    Keyed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<LanguageKey>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Malformed(serde_json::Value),
}

impl LanguageRef {
    pub fn key(&self) -> Option<&LanguageKey> {
        match self {
            LanguageRef::Keyed { id, .. } => id.as_ref(),
            LanguageRef::Malformed(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            LanguageRef::Keyed { name, .. } => name.as_deref(),
            LanguageRef::Malformed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_reference_parses_numeric_id() {
        let lang: LanguageRef = serde_json::from_str(r#"{"id": 7, "name": "English"}"#).unwrap();
        assert_eq!(lang.key().and_then(LanguageKey::as_id), Some(7));
        assert_eq!(lang.name(), Some("English"));
    }

    #[test]
    fn keyed_reference_parses_code_id() {
        let lang: LanguageRef = serde_json::from_str(r#"{"id": "en"}"#).unwrap();
        assert_eq!(lang.key().map(LanguageKey::as_token), Some("en".to_string()));
        assert_eq!(lang.name(), None);
    }

    #[test]
    fn non_object_reference_is_malformed() {
        let lang: LanguageRef = serde_json::from_str(r#""english""#).unwrap();
        assert!(matches!(lang, LanguageRef::Malformed(_)));
        assert!(lang.key().is_none());
    }

    #[test]
    fn token_is_lowercased_and_trimmed() {
        assert_eq!(LanguageKey::Code(" EN ".to_string()).as_token(), "en");
        assert_eq!(LanguageKey::Id(12).as_token(), "12");
    }
}
