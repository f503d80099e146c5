//! Typed answer and field values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recorded answer or extracted field value.
///
/// Serialized without a tag so persisted sessions stay plain JSON:
/// a string, an array of strings, or `{"raw_answer": .., "value": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    Structured { raw_answer: String, value: String },
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn structured(raw_answer: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Structured {
            raw_answer: raw_answer.into(),
            value: value.into(),
        }
    }

    /// Converts loosely typed JSON (model output) into a field value.
    ///
    /// Numbers and booleans become scalars, arrays keep their non-empty
    /// scalar elements. Objects with a `value` key become structured values.
    /// Null and other objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) => Some(Self::Scalar(s.clone())),
            Value::Number(n) => Some(Self::Scalar(n.to_string())),
            Value::Bool(b) => Some(Self::Scalar(b.to_string())),
            Value::Array(items) => Some(Self::List(
                items
                    .iter()
                    .filter_map(|item| match Self::from_json(item)? {
                        Self::Scalar(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::Object(map) => {
                let inner = Self::from_json(map.get("value")?)?.to_text();
                let raw = map
                    .get("raw_answer")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| inner.clone());
                Some(Self::structured(raw, inner))
            }
            Value::Null => None,
        }
    }

    /// True when the value carries no usable content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|item| item.trim().is_empty()),
            Self::Structured { value, .. } => value.trim().is_empty(),
        }
    }

    /// Normalized text form, lists joined with `", "`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(items) => items.join(", "),
            Self::Structured { value, .. } => value.clone(),
        }
    }

    /// What the interviewee actually typed, where known.
    pub fn raw_text(&self) -> String {
        match self {
            Self::Structured { raw_answer, .. } => raw_answer.clone(),
            other => other.to_text(),
        }
    }

    /// Integer reading of a scalar or structured value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Scalar(s) | Self::Structured { value: s, .. } => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// List membership for lists, substring test otherwise.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Self::List(items) => items.iter().any(|item| item == needle),
            Self::Scalar(s) | Self::Structured { value: s, .. } => s.contains(needle),
        }
    }

    /// Exact comparison of the text form against a literal.
    pub fn matches_literal(&self, literal: &str) -> bool {
        self.to_text() == literal
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Field id → value map of everything learned about the interviewee.
///
/// An entry whose value is empty is present but does not count as filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilledFields(BTreeMap<String, FieldValue>);

impl FilledFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.0.get(field_id)
    }

    /// True when the field holds a non-empty value.
    pub fn is_filled(&self, field_id: &str) -> bool {
        self.0.get(field_id).is_some_and(|value| !value.is_empty())
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, field_id: impl Into<String>, value: FieldValue) {
        self.0.insert(field_id.into(), value);
    }

    /// Inserts only if the field is not filled yet. Returns whether it was written.
    pub fn insert_if_unfilled(&mut self, field_id: &str, value: FieldValue) -> bool {
        if self.is_filled(field_id) {
            return false;
        }
        self.0.insert(field_id.to_string(), value);
        true
    }

    /// Number of fields holding a non-empty value.
    pub fn filled_count(&self) -> usize {
        self.0.values().filter(|value| !value.is_empty()).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FilledFields {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod accessors {
        use super::*;

        #[test]
        fn blank_values_are_empty() {
            assert!(FieldValue::scalar("  ").is_empty());
            assert!(FieldValue::List(vec![]).is_empty());
            assert!(FieldValue::List(vec![" ".to_string()]).is_empty());
            assert!(FieldValue::structured("hmm", "").is_empty());
            assert!(!FieldValue::scalar("x").is_empty());
        }

        #[test]
        fn integer_reading_trims() {
            assert_eq!(FieldValue::scalar(" 3 ").as_integer(), Some(3));
            assert_eq!(FieldValue::structured("three-ish", "3").as_integer(), Some(3));
            assert_eq!(FieldValue::scalar("three").as_integer(), None);
            assert_eq!(FieldValue::List(vec!["3".to_string()]).as_integer(), None);
        }

        #[test]
        fn contains_is_membership_for_lists() {
            let list = FieldValue::List(vec!["SAP".to_string(), "Jira".to_string()]);
            assert!(list.contains("SAP"));
            assert!(!list.contains("SA"));
        }

        #[test]
        fn contains_is_substring_for_text() {
            assert!(FieldValue::scalar("we use SAP daily").contains("SAP"));
            assert!(!FieldValue::scalar("we use Excel").contains("SAP"));
        }

        #[test]
        fn text_forms() {
            let list = FieldValue::List(vec!["a".to_string(), "b".to_string()]);
            assert_eq!(list.to_text(), "a, b");
            let structured = FieldValue::structured("about 4", "4");
            assert_eq!(structured.to_text(), "4");
            assert_eq!(structured.raw_text(), "about 4");
            assert!(structured.matches_literal("4"));
        }
    }

    mod serde_format {
        use super::*;

        #[test]
        fn persisted_shapes_are_plain_json() {
            assert_eq!(serde_json::to_value(FieldValue::scalar("x")).unwrap(), json!("x"));
            assert_eq!(
                serde_json::to_value(FieldValue::List(vec!["a".to_string()])).unwrap(),
                json!(["a"])
            );
            assert_eq!(
                serde_json::to_value(FieldValue::structured("about 4", "4")).unwrap(),
                json!({"raw_answer": "about 4", "value": "4"})
            );
        }

        #[test]
        fn plain_json_reads_back_into_variants() {
            let v: FieldValue = serde_json::from_value(json!(["a", "b"])).unwrap();
            assert_eq!(v, FieldValue::List(vec!["a".to_string(), "b".to_string()]));
            let v: FieldValue =
                serde_json::from_value(json!({"raw_answer": "r", "value": "v"})).unwrap();
            assert_eq!(v, FieldValue::structured("r", "v"));
        }
    }

    mod from_json {
        use super::*;

        #[test]
        fn numbers_and_bools_become_scalars() {
            assert_eq!(FieldValue::from_json(&json!(12)), Some(FieldValue::scalar("12")));
            assert_eq!(FieldValue::from_json(&json!(true)), Some(FieldValue::scalar("true")));
        }

        #[test]
        fn arrays_keep_scalar_elements() {
            assert_eq!(
                FieldValue::from_json(&json!(["SAP", 3, null, {"a": 1}])),
                Some(FieldValue::List(vec!["SAP".to_string(), "3".to_string()]))
            );
        }

        #[test]
        fn objects_need_a_value_key() {
            assert_eq!(
                FieldValue::from_json(&json!({"value": 5})),
                Some(FieldValue::structured("5", "5"))
            );
            assert_eq!(FieldValue::from_json(&json!({"other": 5})), None);
            assert_eq!(FieldValue::from_json(&json!(null)), None);
        }
    }

    mod filled_fields {
        use super::*;

        #[test]
        fn empty_entries_do_not_count_as_filled() {
            let mut fields = FilledFields::new();
            fields.insert("a", FieldValue::scalar(""));
            fields.insert("b", FieldValue::scalar("yes"));
            assert!(!fields.is_filled("a"));
            assert!(fields.is_filled("b"));
            assert_eq!(fields.len(), 2);
            assert_eq!(fields.filled_count(), 1);
        }

        #[test]
        fn insert_if_unfilled_never_overwrites() {
            let mut fields: FilledFields = [("a", FieldValue::scalar("first"))].into_iter().collect();
            assert!(!fields.insert_if_unfilled("a", FieldValue::scalar("second")));
            assert_eq!(fields.get("a"), Some(&FieldValue::scalar("first")));
            assert!(fields.insert_if_unfilled("b", FieldValue::scalar("new")));
        }

        #[test]
        fn insert_if_unfilled_replaces_blank_entries() {
            let mut fields: FilledFields = [("a", FieldValue::scalar(" "))].into_iter().collect();
            assert!(fields.insert_if_unfilled("a", FieldValue::scalar("value")));
            assert!(fields.is_filled("a"));
        }
    }
}
