//! User memories: a photo, an optional song and a name.
//!
//! Memories live in an ordered collection (newest first), persisted as a JSON
//! array through a [`KeyValueStore`]. The same JSON array is the import/export
//! file format:
//!
//! ```json
//! [{ "id": 1734567890123, "name": "First snow", "photo": "data:image/jpeg;base64,...", "music": "" }]
//! ```

mod draft;
mod store;

pub use draft::{data_uri_from_bytes, mime_for_path, MemoryDraft, PendingLoads};
pub use store::{FileStore, InMemoryStore, KeyValueStore, MemoryStore, Persisted};

use crate::error::MemoryError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Memory identifier. Numbers and strings are both accepted on import and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryId {
    Number(serde_json::Number),
    Text(String),
}

impl MemoryId {
    /// Millisecond timestamp id, bumped until it does not collide with
    /// `existing`.
    pub fn fresh<'a>(existing: impl IntoIterator<Item = &'a MemoryId> + Clone) -> Self {
        let mut candidate = chrono::Utc::now().timestamp_millis().max(0) as u64;
        loop {
            let id = MemoryId::from(candidate);
            if !existing.clone().into_iter().any(|e| *e == id) {
                return id;
            }
            candidate += 1;
        }
    }

    /// Parse a command-line style id: digits become a number, anything else
    /// a string.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => MemoryId::from(n),
            Err(_) => MemoryId::Text(raw.to_string()),
        }
    }
}

impl From<u64> for MemoryId {
    fn from(n: u64) -> Self {
        MemoryId::Number(n.into())
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        MemoryId::Text(s.to_string())
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryId::Number(n) => write!(f, "{}", n),
            MemoryId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub name: String,
    /// Photo as a data URI (or any URL the renderer understands).
    pub photo: String,
    /// Song as a data URI. Empty on the wire means none.
    #[serde(
        default,
        serialize_with = "serialize_music",
        deserialize_with = "deserialize_music"
    )]
    pub music: Option<String>,
}

fn serialize_music<S: Serializer>(music: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(music.as_deref().unwrap_or(""))
}

fn deserialize_music<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

/// Parse an import file. The top-level value must be an array.
pub fn parse_collection(json: &str) -> Result<Vec<Memory>, MemoryError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| MemoryError::InvalidImport(format!("not valid JSON: {}", e)))?;
    if !value.is_array() {
        return Err(MemoryError::InvalidImport(
            "top-level value must be an array".into(),
        ));
    }
    let memories: Vec<Memory> = serde_json::from_value(value)
        .map_err(|e| MemoryError::InvalidImport(format!("malformed memory entry: {}", e)))?;
    let mut seen = HashSet::new();
    if let Some(dup) = memories.iter().find(|m| !seen.insert(&m.id)) {
        return Err(MemoryError::InvalidImport(format!("duplicate memory id {}", dup.id)));
    }
    Ok(memories)
}

/// Serialize a collection to the import/export format.
pub fn serialize_collection(memories: &[Memory]) -> Result<String, MemoryError> {
    Ok(serde_json::to_string_pretty(memories)?)
}

/// Export file name for a given day: `arix-memories-YYYY-MM-DD.json`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("arix-memories-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_number_and_text_roundtrip() {
        let json = r#"[{"id":1734567890123,"name":"a","photo":"p","music":""},
                       {"id":"abc","name":"b","photo":"q","music":"m"}]"#;
        let memories = parse_collection(json).unwrap();
        assert_eq!(memories[0].id, MemoryId::from(1734567890123));
        assert_eq!(memories[1].id, MemoryId::from("abc"));
        assert_eq!(memories[0].music, None);
        assert_eq!(memories[1].music.as_deref(), Some("m"));

        let again = parse_collection(&serialize_collection(&memories).unwrap()).unwrap();
        assert_eq!(again, memories);
    }

    #[test]
    fn test_missing_music_is_none() {
        let memories = parse_collection(r#"[{"id":1,"name":"a","photo":"p"}]"#).unwrap();
        assert_eq!(memories[0].music, None);
    }

    #[test]
    fn test_reject_non_array() {
        let err = parse_collection(r#"{"id":1}"#).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidImport(_)));
    }

    #[test]
    fn test_reject_parse_failure() {
        let err = parse_collection("not json").unwrap_err();
        assert!(matches!(err, MemoryError::InvalidImport(_)));
    }

    #[test]
    fn test_reject_duplicate_ids() {
        let json = r#"[{"id":1,"name":"a","photo":"p"},{"id":"x","name":"b","photo":"p"},{"id":1,"name":"c","photo":"p"}]"#;
        let err = parse_collection(json).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidImport(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_export_filename_contains_date() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 24).unwrap();
        assert_eq!(export_filename(date), "arix-memories-2026-12-24.json");
    }

    #[test]
    fn test_fresh_id_avoids_collisions() {
        let first = MemoryId::fresh(std::iter::empty::<&MemoryId>());
        let existing = [first.clone()];
        let second = MemoryId::fresh(existing.iter());
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(MemoryId::parse("42"), MemoryId::from(42));
        assert_eq!(MemoryId::parse("x-1"), MemoryId::from("x-1"));
    }
}
