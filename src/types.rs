//! Core types for pagestream

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// 1-based page number within a paginated API
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageNumber(pub u32);

impl PageNumber {
    /// The first page of every paginated API supported here
    pub const FIRST: PageNumber = PageNumber(1);

    /// Create a new PageNumber
    pub fn new(page: u32) -> Self {
        Self(page)
    }

    /// Get the inner u32 value
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PageNumber {
    fn from(page: u32) -> Self {
        Self(page)
    }
}

impl From<PageNumber> for u32 {
    fn from(page: PageNumber) -> Self {
        page.0
    }
}

impl PartialEq<u32> for PageNumber {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<PageNumber> for u32 {
    fn eq(&self, other: &PageNumber) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single record extracted from a page's record array
///
/// A record is a flat mapping of field names to JSON values. Records are
/// ephemeral: they are produced by the extractor and consumed immediately by
/// the row formatter, one CSV row per record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Create a record from a parsed JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Render a named field as plain text.
    ///
    /// Strings are returned verbatim; numbers and booleans render via their
    /// display form; `null` and missing fields render as the empty string
    /// (the documented fallback — never an error). Nested containers render
    /// as compact JSON.
    pub fn field(&self, name: &str) -> Cow<'_, str> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Cow::Borrowed(""),
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(Value::Number(n)) => Cow::Owned(n.to_string()),
            Some(Value::Bool(b)) => Cow::Owned(b.to_string()),
            Some(other) => Cow::Owned(serde_json::to_string(other).unwrap_or_default()),
        }
    }

    /// Number of fields present on this record
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => Record::new(map),
            _ => panic!("test records must be JSON objects"),
        }
    }

    #[test]
    fn test_page_number_display_and_conversions() {
        let page = PageNumber::new(7);
        assert_eq!(page.to_string(), "7");
        assert_eq!(page.get(), 7);
        assert_eq!(page, 7u32);
        assert_eq!(7u32, page);
        assert_eq!(u32::from(page), 7);
        assert_eq!(PageNumber::from(7u32), page);
        assert_eq!(PageNumber::FIRST, 1u32);
    }

    #[test]
    fn test_page_number_ordering() {
        assert!(PageNumber::new(1) < PageNumber::new(2));
    }

    #[test]
    fn test_field_renders_strings_verbatim() {
        let r = record(json!({"first_name": "George", "last_name": "Bluth"}));
        assert_eq!(r.field("first_name"), "George");
        assert_eq!(r.field("last_name"), "Bluth");
    }

    #[test]
    fn test_missing_and_null_fields_render_empty() {
        let r = record(json!({"first_name": null}));
        assert_eq!(r.field("first_name"), "");
        assert_eq!(r.field("last_name"), "");
    }

    #[test]
    fn test_scalar_fields_render_via_display() {
        let r = record(json!({"id": 4, "active": true}));
        assert_eq!(r.field("id"), "4");
        assert_eq!(r.field("active"), "true");
    }

    #[test]
    fn test_nested_fields_render_as_compact_json() {
        let r = record(json!({"tags": ["a", "b"]}));
        assert_eq!(r.field("tags"), r#"["a","b"]"#);
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(record(json!({})).is_empty());
        assert_eq!(record(json!({"a": 1, "b": 2})).len(), 2);
    }
}
