//! Suggestion cache: AI-generated improvement text plus user notes per section.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SUGGESTION_SERVICE: &str = "suggestion";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Replaced on every new request.
    pub suggestion_text: String,
    /// Survives new requests until the user edits it.
    #[serde(default)]
    pub user_notes: String,
}

/// Section key to suggestion. `None` marks a record that failed migration.
pub type SuggestionCache = BTreeMap<String, Option<Suggestion>>;

/// Marks a section as loading: clears its text, keeps its notes.
pub fn begin_suggestion(cache: &SuggestionCache, section_key: &str) -> SuggestionCache {
    let mut next = cache.clone();
    let entry = next
        .entry(section_key.to_string())
        .or_insert(None)
        .get_or_insert_with(Suggestion::default);
    entry.suggestion_text.clear();
    next
}

/// Stores the text of a completed request without touching notes.
pub fn complete_suggestion(cache: &SuggestionCache, section_key: &str, text: &str) -> SuggestionCache {
    let mut next = cache.clone();
    next.entry(section_key.to_string())
        .or_insert(None)
        .get_or_insert_with(Suggestion::default)
        .suggestion_text = text.to_string();
    next
}

pub fn update_user_notes(cache: &SuggestionCache, section_key: &str, notes: &str) -> SuggestionCache {
    let mut next = cache.clone();
    next.entry(section_key.to_string())
        .or_insert(None)
        .get_or_insert_with(Suggestion::default)
        .user_notes = notes.to_string();
    next
}

/// Normalizes one stored record.
///
/// A bare string becomes `{ suggestionText: <string>, userNotes: "" }`, a
/// well-formed object is kept, anything else becomes `None`.
pub fn migrate_suggestion(value: &Value) -> Option<Suggestion> {
    match value {
        Value::String(text) => Some(Suggestion {
            suggestion_text: text.clone(),
            user_notes: String::new(),
        }),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

pub fn migrate_suggestions(raw: &BTreeMap<String, Value>) -> SuggestionCache {
    raw.iter()
        .map(|(key, value)| {
            let migrated = migrate_suggestion(value);
            if migrated.is_none() && !value.is_null() {
                tracing::warn!(section = %key, "Dropping malformed suggestion record");
            }
            (key.clone(), migrated)
        })
        .collect()
}

/// Serde adapter that accepts legacy suggestion records.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<SuggestionCache, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(migrate_suggestions(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_begin_clears_text_and_keeps_notes() {
        let cache = complete_suggestion(&SuggestionCache::new(), "intake", "old text");
        let cache = update_user_notes(&cache, "intake", "my notes");

        let loading = begin_suggestion(&cache, "intake");
        let entry = loading["intake"].as_ref().unwrap();
        assert!(entry.suggestion_text.is_empty());
        assert_eq!(entry.user_notes, "my notes");

        let done = complete_suggestion(&loading, "intake", "new text");
        let entry = done["intake"].as_ref().unwrap();
        assert_eq!(entry.suggestion_text, "new text");
        assert_eq!(entry.user_notes, "my notes");
    }

    #[test]
    fn test_begin_creates_empty_entry() {
        let cache = begin_suggestion(&SuggestionCache::new(), "duties");
        assert_eq!(cache["duties"], Some(Suggestion::default()));
    }

    #[test]
    fn test_legacy_records_are_normalized() {
        let raw: BTreeMap<String, Value> = serde_json::from_value(json!({
            "bare": "improve this",
            "current": {"suggestionText": "t", "userNotes": "n"},
            "missingNotes": {"suggestionText": "t"},
            "broken": {"text": 3},
            "number": 42,
            "null": null
        }))
        .unwrap();

        let cache = migrate_suggestions(&raw);
        assert_eq!(
            cache["bare"],
            Some(Suggestion {
                suggestion_text: "improve this".into(),
                user_notes: String::new()
            })
        );
        assert_eq!(cache["current"].as_ref().unwrap().user_notes, "n");
        assert_eq!(cache["missingNotes"].as_ref().unwrap().user_notes, "");
        assert_eq!(cache["broken"], None);
        assert_eq!(cache["number"], None);
        assert_eq!(cache["null"], None);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let raw: BTreeMap<String, Value> = serde_json::from_value(json!({
            "a": "legacy",
            "b": {"suggestionText": "x", "userNotes": "y"},
            "c": 1
        }))
        .unwrap();

        let once = serde_json::to_string(&migrate_suggestions(&raw)).unwrap();
        let reparsed: BTreeMap<String, Value> = serde_json::from_str(&once).unwrap();
        let twice = serde_json::to_string(&migrate_suggestions(&reparsed)).unwrap();
        assert_eq!(once, twice);
    }
}
