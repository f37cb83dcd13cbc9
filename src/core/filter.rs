//! Filter grammar: operators, conditions, sort directives and field definitions
//!
//! Conditions travel over the wire in a loose JSON form ([`FilterCondition`]).
//! They become a [`TypedCondition`] only after [`FilterField::typed`] has
//! checked the operator against the field type and coerced every operand, so
//! the query engine never sees an operand of the wrong type.

use crate::core::error::FilterError;
use crate::core::field::{FieldType, FieldValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Closed set of filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Between => "between",
            FilterOperator::IsNull => "isNull",
            FilterOperator::IsNotNull => "isNotNull",
        }
    }

    /// Everything except the null-check pair needs an operand
    pub fn requires_value(&self) -> bool {
        !matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }

    /// Operators whose operand is a list
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::In | FilterOperator::NotIn | FilterOperator::Between
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldType {
    /// Operators a field of this type accepts
    pub fn operators(&self) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match self {
            FieldType::Text => &[
                Equals, NotEquals, Contains, StartsWith, EndsWith, In, NotIn, IsNull, IsNotNull,
            ],
            FieldType::Number => &[
                Equals, NotEquals, Gt, Gte, Lt, Lte, Between, In, NotIn, IsNull, IsNotNull,
            ],
            FieldType::Date => &[
                Equals, NotEquals, Gt, Gte, Lt, Lte, Between, IsNull, IsNotNull,
            ],
            FieldType::Boolean => &[Equals, NotEquals, IsNull, IsNotNull],
            FieldType::Enum => &[Equals, NotEquals, In, NotIn, IsNull, IsNotNull],
            FieldType::Array => &[Contains, In, NotIn, IsNull, IsNotNull],
            FieldType::Relation => &[Equals, In, NotIn, IsNull, IsNotNull],
        }
    }
}

/// A single field/operator/value predicate, in its wire form
///
/// `values` carries the operand list for `in`, `notIn` and `between`. When it
/// is absent, a JSON array in `value` (or the single scalar `value`) is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            values: None,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Equals, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    /// Build an `in`/`notIn`/`between` condition from an operand list
    pub fn list<V: Into<Value>>(
        field: impl Into<String>,
        operator: FilterOperator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Value::Null,
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::list(field, FilterOperator::Between, [low.into(), high.into()])
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, Value::Null)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, Value::Null)
    }

    /// Operand list for list operators, falling back to `value`
    fn operand_list(&self) -> Vec<&Value> {
        if let Some(values) = &self.values {
            return values.iter().collect();
        }
        match &self.value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One key of a multi-key sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub field: String,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Apply the direction to an ascending ordering
    pub fn orient(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Declaration of a filterable field, as shown by filter controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub operators: Vec<FilterOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FilterField {
    /// Create a field accepting every operator of its type
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            operators: field_type.operators().to_vec(),
            enum_values: None,
            placeholder: None,
            description: None,
            min: None,
            max: None,
        }
    }

    pub fn with_enum_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Validate a wire condition against this field and type its operands
    pub fn typed(&self, condition: &FilterCondition) -> Result<TypedCondition, FilterError> {
        let operator = condition.operator;
        if !self.operators.contains(&operator) {
            return Err(FilterError::InvalidOperator {
                field: self.key.clone(),
                operator,
                field_type: self.field_type,
            });
        }

        let predicate = match operator {
            FilterOperator::IsNull => Predicate::IsNull,
            FilterOperator::IsNotNull => Predicate::IsNotNull,
            FilterOperator::In | FilterOperator::NotIn => {
                let operands = self.coerce_list(condition)?;
                if operator == FilterOperator::In {
                    Predicate::In(operands)
                } else {
                    Predicate::NotIn(operands)
                }
            }
            FilterOperator::Between => {
                let mut operands = self.coerce_list(condition)?;
                if operands.len() != 2 {
                    return Err(FilterError::InvalidValue {
                        field: self.key.clone(),
                        message: "between requires exactly two values".to_string(),
                    });
                }
                let high = operands.remove(1);
                let low = operands.remove(0);
                Predicate::Between(low, high)
            }
            _ => {
                if condition.value.is_null() {
                    return Err(FilterError::MissingValue {
                        field: self.key.clone(),
                        operator,
                    });
                }
                let operand = self.coerce(&condition.value)?;
                match operator {
                    FilterOperator::Equals => Predicate::Equals(operand),
                    FilterOperator::NotEquals => Predicate::NotEquals(operand),
                    FilterOperator::Contains => Predicate::Contains(operand),
                    FilterOperator::StartsWith => Predicate::StartsWith(self.text_operand(operand)?),
                    FilterOperator::EndsWith => Predicate::EndsWith(self.text_operand(operand)?),
                    FilterOperator::Gt => Predicate::GreaterThan(operand),
                    FilterOperator::Gte => Predicate::GreaterOrEqual(operand),
                    FilterOperator::Lt => Predicate::LessThan(operand),
                    _ => Predicate::LessOrEqual(operand),
                }
            }
        };

        Ok(TypedCondition {
            field: self.key.clone(),
            predicate,
        })
    }

    fn coerce(&self, raw: &Value) -> Result<FieldValue, FilterError> {
        let value = FieldValue::coerce(raw, self.field_type).ok_or_else(|| FilterError::InvalidValue {
            field: self.key.clone(),
            message: format!("expected a {} value, got {}", self.field_type, raw),
        })?;

        if self.field_type == FieldType::Enum {
            if let (Some(allowed), Some(text)) = (&self.enum_values, value.as_text()) {
                if !allowed.iter().any(|v| v == text) {
                    return Err(FilterError::InvalidValue {
                        field: self.key.clone(),
                        message: format!("'{}' is not one of {:?}", text, allowed),
                    });
                }
            }
        }

        Ok(value)
    }

    fn coerce_list(&self, condition: &FilterCondition) -> Result<Vec<FieldValue>, FilterError> {
        let raw = condition.operand_list();
        if raw.is_empty() {
            return Err(FilterError::MissingValue {
                field: self.key.clone(),
                operator: condition.operator,
            });
        }
        raw.into_iter().map(|v| self.coerce(v)).collect()
    }

    fn text_operand(&self, operand: FieldValue) -> Result<String, FilterError> {
        match operand {
            FieldValue::Text(s) => Ok(s),
            other => Err(FilterError::InvalidValue {
                field: self.key.clone(),
                message: format!("expected text, got {:?}", other),
            }),
        }
    }
}

/// A validated predicate over one field value
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(FieldValue),
    NotEquals(FieldValue),
    Contains(FieldValue),
    StartsWith(String),
    EndsWith(String),
    GreaterThan(FieldValue),
    GreaterOrEqual(FieldValue),
    LessThan(FieldValue),
    LessOrEqual(FieldValue),
    In(Vec<FieldValue>),
    NotIn(Vec<FieldValue>),
    Between(FieldValue, FieldValue),
    IsNull,
    IsNotNull,
}

impl Predicate {
    /// Evaluate against a record's field value
    ///
    /// Follows SQL semantics for missing values: only `IsNull` matches them.
    /// List values (arrays, relations) match when any element does.
    pub fn matches(&self, value: Option<&FieldValue>) -> bool {
        let value = match value {
            None | Some(FieldValue::Null) => return matches!(self, Predicate::IsNull),
            Some(v) => v,
        };

        if let FieldValue::List(items) = value {
            return match self {
                Predicate::IsNull => false,
                Predicate::IsNotNull => true,
                Predicate::NotIn(operands) => !items
                    .iter()
                    .any(|item| operands.iter().any(|o| loose_eq(item, o))),
                Predicate::NotEquals(operand) => !items.iter().any(|item| loose_eq(item, operand)),
                other => items.iter().any(|item| other.matches(Some(item))),
            };
        }

        match self {
            Predicate::Equals(operand) => loose_eq(value, operand),
            Predicate::NotEquals(operand) => !loose_eq(value, operand),
            Predicate::Contains(operand) => match operand.as_text() {
                Some(needle) => value.contains_text(needle),
                None => loose_eq(value, operand),
            },
            Predicate::StartsWith(prefix) => value
                .as_text()
                .is_some_and(|s| s.to_lowercase().starts_with(&prefix.to_lowercase())),
            Predicate::EndsWith(suffix) => value
                .as_text()
                .is_some_and(|s| s.to_lowercase().ends_with(&suffix.to_lowercase())),
            Predicate::GreaterThan(operand) => value.compare(operand) == Some(Ordering::Greater),
            Predicate::GreaterOrEqual(operand) => {
                matches!(value.compare(operand), Some(Ordering::Greater | Ordering::Equal))
            }
            Predicate::LessThan(operand) => value.compare(operand) == Some(Ordering::Less),
            Predicate::LessOrEqual(operand) => {
                matches!(value.compare(operand), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::In(operands) => operands.iter().any(|o| loose_eq(value, o)),
            Predicate::NotIn(operands) => !operands.iter().any(|o| loose_eq(value, o)),
            Predicate::Between(low, high) => {
                matches!(value.compare(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(value.compare(high), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::IsNull => false,
            Predicate::IsNotNull => true,
        }
    }
}

fn loose_eq(a: &FieldValue, b: &FieldValue) -> bool {
    a.compare(b) == Some(Ordering::Equal)
}

/// A condition that passed validation against its field
#[derive(Debug, Clone, PartialEq)]
pub struct TypedCondition {
    pub field: String,
    pub predicate: Predicate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn price() -> FilterField {
        FilterField::new("price", "Price", FieldType::Number)
    }

    fn difficulty() -> FilterField {
        FilterField::new("difficulty", "Difficulty", FieldType::Enum)
            .with_enum_values(["Beginner", "Intermediate", "Advanced"])
    }

    #[test]
    fn test_operator_wire_names() {
        let json = serde_json::to_string(&FilterOperator::NotIn).unwrap();
        assert_eq!(json, "\"notIn\"");
        let op: FilterOperator = serde_json::from_str("\"isNotNull\"").unwrap();
        assert_eq!(op, FilterOperator::IsNotNull);
    }

    #[test]
    fn test_condition_wire_form_omits_empty_operands() {
        let json = serde_json::to_value(FilterCondition::is_null("description")).unwrap();
        assert_eq!(json, json!({ "field": "description", "operator": "isNull" }));
    }

    #[test]
    fn test_boolean_fields_reject_ordering_operators() {
        let featured = FilterField::new("featured", "Featured", FieldType::Boolean);
        let err = featured
            .typed(&FilterCondition::new("featured", FilterOperator::Gt, true))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperator { .. }));
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let err = price()
            .typed(&FilterCondition::new("price", FilterOperator::Gte, Value::Null))
            .unwrap_err();
        assert!(matches!(err, FilterError::MissingValue { .. }));
    }

    #[test]
    fn test_null_checks_need_no_value() {
        let typed = price().typed(&FilterCondition::is_not_null("price")).unwrap();
        assert_eq!(typed.predicate, Predicate::IsNotNull);
    }

    #[test]
    fn test_number_operand_from_string() {
        let typed = price()
            .typed(&FilterCondition::new("price", FilterOperator::Lte, "100"))
            .unwrap();
        assert_eq!(typed.predicate, Predicate::LessOrEqual(FieldValue::Number(100.0)));
    }

    #[test]
    fn test_between_requires_two_values() {
        let err = price()
            .typed(&FilterCondition::list("price", FilterOperator::Between, [1]))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));

        let typed = price().typed(&FilterCondition::between("price", 50, 150)).unwrap();
        assert!(typed.predicate.matches(Some(&FieldValue::Number(150.0))));
        assert!(!typed.predicate.matches(Some(&FieldValue::Number(151.0))));
    }

    #[test]
    fn test_in_accepts_array_value() {
        let cond = FilterCondition::new("difficulty", FilterOperator::In, json!(["Beginner", "Advanced"]));
        let typed = difficulty().typed(&cond).unwrap();
        assert!(typed.predicate.matches(Some(&"Advanced".into())));
        assert!(!typed.predicate.matches(Some(&"Intermediate".into())));
    }

    #[test]
    fn test_enum_value_outside_declared_set() {
        let err = difficulty()
            .typed(&FilterCondition::equals("difficulty", "Expert"))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_text_contains_is_case_insensitive() {
        let field = FilterField::new("type", "Type", FieldType::Text);
        let typed = field.typed(&FilterCondition::contains("type", "orchestral")).unwrap();
        assert!(typed.predicate.matches(Some(&"Full Orchestral Score".into())));
        assert!(!typed.predicate.matches(Some(&"Marching".into())));
    }

    #[test]
    fn test_missing_values_only_match_is_null() {
        assert!(Predicate::IsNull.matches(None));
        assert!(Predicate::IsNull.matches(Some(&FieldValue::Null)));
        assert!(!Predicate::NotEquals(FieldValue::from("x")).matches(None));
        assert!(!Predicate::NotIn(vec![FieldValue::from("x")]).matches(None));
    }

    #[test]
    fn test_relation_equals_matches_any_element() {
        let tags = FilterField::new("tags", "Tags", FieldType::Relation);
        let typed = tags.typed(&FilterCondition::equals("tags", "Jazz")).unwrap();
        let value = FieldValue::List(vec!["Latin".into(), "Jazz".into()]);
        assert!(typed.predicate.matches(Some(&value)));

        let typed = tags
            .typed(&FilterCondition::list("tags", FilterOperator::NotIn, ["Jazz"]))
            .unwrap();
        assert!(!typed.predicate.matches(Some(&value)));
    }

    #[test]
    fn test_sort_direction_orients_ordering() {
        assert_eq!(SortDirective::desc("price").orient(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirective::asc("price").orient(Ordering::Less), Ordering::Less);
    }
}
