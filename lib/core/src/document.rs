use crate::{Error, Result, Value};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between row records in [`Document::content`].
///
/// Records are compact JSON, which escapes newlines inside strings, so a raw
/// newline never occurs within a record.
pub const ROW_SEPARATOR: &str = "\n";

/// One serialized row: field name and rendered value, in column order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(pub Vec<(String, String)>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON object, fields in insertion order
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object of string fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Record, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    fields.push((name, value));
                }
                Ok(Record(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// The unit handed to the index: serialized rows of one category plus metadata.
///
/// Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    metadata: BTreeMap<String, Value>,
}

impl Document {
    #[inline]
    #[must_use]
    pub fn new(content: String, metadata: BTreeMap<String, Value>) -> Self {
        Self { content, metadata }
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// The category value this document was assembled for
    pub fn category(&self) -> Option<&Value> {
        self.metadata.values().next()
    }

    /// Number of row records in the content
    pub fn record_count(&self) -> usize {
        if self.content.is_empty() {
            0
        } else {
            self.content.split(ROW_SEPARATOR).count()
        }
    }

    /// Parse the content back into its row records
    pub fn records(&self) -> Result<Vec<Record>> {
        if self.content.is_empty() {
            return Ok(Vec::new());
        }
        self.content
            .split(ROW_SEPARATOR)
            .map(|line| serde_json::from_str(line).map_err(|e| Error::Serialization(e.to_string())))
            .collect()
    }

    /// Text to embed for this document.
    ///
    /// With `include_metadata`, each metadata entry is prepended as a
    /// `key: value` line; the category is otherwise absent from the content.
    pub fn embedding_text(&self, include_metadata: bool) -> Cow<'_, str> {
        if !include_metadata || self.metadata.is_empty() {
            return Cow::Borrowed(&self.content);
        }
        let mut text = String::with_capacity(self.content.len() + 64);
        for (key, value) in &self.metadata {
            text.push_str(&format!("{}: {}\n", key, value));
        }
        text.push_str(&self.content);
        Cow::Owned(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> Record {
        Record(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_record_json_keeps_field_order() {
        let r = record(&[("zeta", "1"), ("alpha", "two")]);
        assert_eq!(r.to_json().unwrap(), r#"{"zeta":"1","alpha":"two"}"#);
    }

    #[test]
    fn test_record_escapes_newlines() {
        let r = record(&[("text", "line one\nline two")]);
        let json = r.to_json().unwrap();
        assert!(!json.contains(ROW_SEPARATOR));
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("text"), Some("line one\nline two"));
    }

    #[test]
    fn test_document_records() {
        let a = record(&[("id", "1"), ("product", "iPhone")]);
        let b = record(&[("id", "1"), ("product", "MacBook")]);
        let content = [a.to_json().unwrap(), b.to_json().unwrap()].join(ROW_SEPARATOR);
        let mut metadata = BTreeMap::new();
        metadata.insert("category".to_string(), Value::from("Electronics"));
        let doc = Document::new(content, metadata);

        assert_eq!(doc.record_count(), 2);
        assert_eq!(doc.records().unwrap(), vec![a, b]);
        assert_eq!(doc.category(), Some(&Value::from("Electronics")));
    }

    #[test]
    fn test_embedding_text() {
        let mut metadata = BTreeMap::new();
        metadata.insert("category".to_string(), Value::from("Books"));
        let doc = Document::new(r#"{"id":"2"}"#.to_string(), metadata);

        assert_eq!(doc.embedding_text(false), r#"{"id":"2"}"#);
        assert_eq!(doc.embedding_text(true), "category: Books\n{\"id\":\"2\"}");
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new(String::new(), BTreeMap::new());
        assert_eq!(doc.record_count(), 0);
        assert!(doc.records().unwrap().is_empty());
        assert_eq!(doc.category(), None);
    }
}
