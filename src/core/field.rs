//! Field value types and semantic field types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Semantic type of a filterable field
///
/// The type decides which operators a field accepts and how raw JSON operands
/// are coerced before they reach the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Enum,
    Array,
    Relation,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
            FieldType::Array => "array",
            FieldType::Relation => "relation",
        }
    }

    /// Whether values of this type are lists (tags, related records)
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldType::Array | FieldType::Relation)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A polymorphic field value that can hold different types
///
/// Used both for record fields read by the query engine and for typed filter
/// operands once a condition has been validated. Incoming JSON operands go
/// through [`FieldValue::coerce`] with the field's type; serialization is
/// one-way (a date becomes its RFC 3339 string).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a number if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Order two values of the same variant
    ///
    /// Values of different variants (or lists) are incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Case-insensitive substring test, used by search and `contains`
    pub fn contains_text(&self, needle: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.to_lowercase().contains(&needle.to_lowercase()),
            FieldValue::List(items) => items.iter().any(|item| item.contains_text(needle)),
            _ => false,
        }
    }

    /// Coerce a raw JSON operand into a value of the given field type
    ///
    /// Strings are accepted for numbers, booleans and dates because hand-edited
    /// URLs carry everything as text. Collection fields take scalar operands
    /// (the element being looked for).
    pub fn coerce(raw: &Value, field_type: FieldType) -> Option<FieldValue> {
        match field_type {
            FieldType::Text | FieldType::Enum => raw.as_str().map(|s| FieldValue::Text(s.to_string())),
            FieldType::Number => match raw {
                Value::Number(n) => n.as_f64().map(FieldValue::Number),
                Value::String(s) => s.trim().parse::<f64>().ok().map(FieldValue::Number),
                _ => None,
            },
            FieldType::Boolean => match raw {
                Value::Bool(b) => Some(FieldValue::Boolean(*b)),
                Value::String(s) => match s.as_str() {
                    "true" => Some(FieldValue::Boolean(true)),
                    "false" => Some(FieldValue::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Date => raw.as_str().and_then(parse_date).map(FieldValue::Date),
            FieldType::Array | FieldType::Relation => match raw {
                Value::String(s) => Some(FieldValue::Text(s.clone())),
                Value::Number(n) => n.as_f64().map(FieldValue::Number),
                Value::Bool(b) => Some(FieldValue::Boolean(*b)),
                _ => None,
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_value_text() {
        let value = FieldValue::Text("test".to_string());
        assert_eq!(value.as_text(), Some("test"));
        assert_eq!(value.as_number(), None);
        assert!(!value.is_null());
    }

    #[test]
    fn test_field_value_null() {
        let value: FieldValue = Option::<String>::None.into();
        assert!(value.is_null());
        assert_eq!(value.as_text(), None);
    }

    #[test]
    fn test_compare_same_variant() {
        assert_eq!(
            FieldValue::Number(1.0).compare(&FieldValue::Number(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::from("b").compare(&FieldValue::from("a")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_mixed_variants_is_none() {
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::from("1")), None);
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
    }

    #[test]
    fn test_contains_text_is_case_insensitive() {
        let value = FieldValue::from("Symphonic Winds");
        assert!(value.contains_text("winds"));
        assert!(value.contains_text("SYMPH"));
        assert!(!value.contains_text("brass"));
    }

    #[test]
    fn test_contains_text_on_list() {
        let tags = FieldValue::List(vec!["Jazz".into(), "Latin".into()]);
        assert!(tags.contains_text("latin"));
        assert!(!tags.contains_text("rock"));
    }

    #[test]
    fn test_coerce_number_from_string() {
        assert_eq!(
            FieldValue::coerce(&json!("42.5"), FieldType::Number),
            Some(FieldValue::Number(42.5))
        );
        assert_eq!(FieldValue::coerce(&json!("abc"), FieldType::Number), None);
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            FieldValue::coerce(&json!(true), FieldType::Boolean),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            FieldValue::coerce(&json!("false"), FieldType::Boolean),
            Some(FieldValue::Boolean(false))
        );
        assert_eq!(FieldValue::coerce(&json!(1), FieldType::Boolean), None);
    }

    #[test]
    fn test_coerce_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FieldValue::coerce(&json!("2024-03-01"), FieldType::Date),
            Some(FieldValue::Date(expected))
        );
        assert_eq!(
            FieldValue::coerce(&json!("2024-03-01T00:00:00Z"), FieldType::Date),
            Some(FieldValue::Date(expected))
        );
        assert_eq!(FieldValue::coerce(&json!("yesterday"), FieldType::Date), None);
    }

    #[test]
    fn test_coerce_text_rejects_numbers() {
        assert_eq!(FieldValue::coerce(&json!(5), FieldType::Text), None);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let value = FieldValue::List(vec!["a".into(), FieldValue::Number(2.0), FieldValue::Date(date), FieldValue::Null]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!(["a", 2.0, "2024-03-01T00:00:00Z", null])
        );

        // Dates only come back as dates through the field type
        let operand = serde_json::to_value(FieldValue::Date(date)).unwrap();
        assert_eq!(FieldValue::coerce(&operand, FieldType::Date), Some(FieldValue::Date(date)));
    }
}
