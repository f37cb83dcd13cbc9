//! Resource schemas and filter field generation
//!
//! A [`ResourceSchema`] is what a list endpoint validates incoming filter
//! states against: which fields can be filtered (and how), which fields a
//! search term is matched over, which fields can be sorted and the fallback
//! sort. [`SchemaAnalyzer`] derives the filter fields from a table description
//! so the declarations stay in step with the database columns.

use crate::core::error::FilterError;
use crate::core::field::FieldType;
use crate::core::filter::{FilterCondition, FilterField, SortDirective, TypedCondition};
use crate::core::query::FilterState;
use chrono::Datelike;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Filterable surface of one list resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub name: String,
    pub fields: Vec<FilterField>,
    pub search_fields: Vec<String>,
    /// Sortable fields in addition to the filter fields
    pub sort_fields: Vec<String>,
    pub default_sort: Vec<SortDirective>,
}

impl ResourceSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            search_fields: Vec::new(),
            sort_fields: Vec::new(),
            default_sort: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FilterField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_search_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sort_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.sort_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_sort(mut self, sort: Vec<SortDirective>) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn field(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn is_sortable(&self, key: &str) -> bool {
        self.field(key).is_some() || self.sort_fields.iter().any(|f| f == key)
    }

    /// Validate and type every condition
    pub fn validate_conditions(
        &self,
        conditions: &[FilterCondition],
    ) -> Result<Vec<TypedCondition>, FilterError> {
        conditions
            .iter()
            .map(|condition| {
                let field = self.field(&condition.field).ok_or_else(|| FilterError::UnknownField {
                    resource: self.name.clone(),
                    field: condition.field.clone(),
                })?;
                field.typed(condition)
            })
            .collect()
    }

    /// Check sort fields exist and are not repeated
    pub fn validate_sort(&self, sort: &[SortDirective]) -> Result<(), FilterError> {
        let mut seen = HashSet::new();
        for directive in sort {
            if !self.is_sortable(&directive.field) {
                return Err(FilterError::UnknownSortField {
                    resource: self.name.clone(),
                    field: directive.field.clone(),
                });
            }
            if !seen.insert(directive.field.as_str()) {
                return Err(FilterError::DuplicateSortField {
                    field: directive.field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validate a whole filter state, returning its typed conditions
    pub fn validate(&self, state: &FilterState) -> Result<Vec<TypedCondition>, FilterError> {
        self.validate_sort(&state.sort)?;
        self.validate_conditions(&state.conditions)
    }

    /// Sort to apply: the requested one, or the resource default
    pub fn effective_sort<'a>(&'a self, state: &'a FilterState) -> &'a [SortDirective] {
        if state.sort.is_empty() {
            &self.default_sort
        } else {
            &state.sort
        }
    }
}

/// Column description inside a [`TableSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// SQL column type, e.g. `text`, `smallint`, `numeric`, `timestamp`
    pub sql_type: String,
    pub nullable: bool,
    pub enum_values: Option<Vec<String>>,
}

impl SchemaField {
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            nullable: false,
            enum_values: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_enum_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationField {
    pub kind: RelationKind,
    pub table: String,
}

/// Table description the analyzer works from
///
/// Column order is preserved so generated filter controls follow the table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSchema {
    pub name: String,
    pub fields: IndexMap<String, SchemaField>,
    pub relations: IndexMap<String, RelationField>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, key: impl Into<String>, field: SchemaField) -> Self {
        self.fields.insert(key.into(), field);
        self
    }

    pub fn relation(mut self, key: impl Into<String>, kind: RelationKind, table: impl Into<String>) -> Self {
        self.relations.insert(
            key.into(),
            RelationField {
                kind,
                table: table.into(),
            },
        );
        self
    }
}

/// Derives filterable fields from a table schema
pub struct SchemaAnalyzer;

impl SchemaAnalyzer {
    /// Map an SQL column type onto a semantic field type
    pub fn field_type(sql_type: &str) -> FieldType {
        let ty = sql_type.to_lowercase();

        if ty.contains("text") || ty.contains("varchar") || ty.contains("char") {
            FieldType::Text
        } else if ty.contains("int")
            || ty.contains("numeric")
            || ty.contains("decimal")
            || ty.contains("float")
        {
            FieldType::Number
        } else if ty.contains("timestamp") || ty.contains("date") || ty.contains("time") {
            FieldType::Date
        } else if ty.contains("bool") {
            FieldType::Boolean
        } else if ty.contains("enum") {
            FieldType::Enum
        } else if ty.contains("array") || ty.contains("[]") {
            FieldType::Array
        } else {
            FieldType::Text
        }
    }

    /// `displayOrder` → `Display Order`, `created_at` → `Created at`
    pub fn format_label(key: &str) -> String {
        static CAMEL: OnceLock<Regex> = OnceLock::new();
        let camel = CAMEL.get_or_init(|| Regex::new(r"([A-Z])").expect("static regex is valid"));

        let spaced = camel.replace_all(key, " $1").replace('_', " ");
        let mut chars = spaced.trim().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Generate filter fields for every column and relation not excluded
    pub fn generate_filter_fields(schema: &TableSchema, exclude: &[&str]) -> Vec<FilterField> {
        let mut fields = Vec::new();

        for (key, column) in &schema.fields {
            if exclude.contains(&key.as_str()) {
                continue;
            }

            let field_type = Self::field_type(&column.sql_type);
            let label = Self::format_label(key);
            let mut field = FilterField::new(key.clone(), label.clone(), field_type)
                .with_placeholder(format!("Filter by {}...", label.to_lowercase()));

            if field_type == FieldType::Enum {
                if let Some(values) = &column.enum_values {
                    field = field.with_enum_values(values.clone());
                }
            }

            if field_type == FieldType::Number {
                let (min, max) = Self::numeric_bounds(key);
                field = field.with_bounds(min, max);
            }

            fields.push(field);
        }

        for key in schema.relations.keys() {
            if exclude.contains(&key.as_str()) {
                continue;
            }
            let label = Self::format_label(key);
            fields.push(
                FilterField::new(key.clone(), label.clone(), FieldType::Relation)
                    .with_placeholder(format!("Filter by {}...", label.to_lowercase())),
            );
        }

        fields
    }

    fn numeric_bounds(key: &str) -> (Option<f64>, Option<f64>) {
        let lower = key.to_lowercase();
        if lower.contains("price") {
            (Some(0.0), Some(10_000.0))
        } else if lower.contains("year") {
            let ceiling = chrono::Utc::now().year() + 10;
            (Some(1900.0), Some(f64::from(ceiling)))
        } else {
            (Some(0.0), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterOperator;

    fn shows_table() -> TableSchema {
        TableSchema::new("shows")
            .field("id", SchemaField::new("serial"))
            .field("title", SchemaField::new("text"))
            .field("year", SchemaField::new("smallint"))
            .field(
                "difficulty",
                SchemaField::new("enum").with_enum_values(["Beginner", "Advanced"]),
            )
            .field("price", SchemaField::new("numeric"))
            .field("createdAt", SchemaField::new("timestamp"))
            .relation("tags", RelationKind::Many, "tags")
    }

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(SchemaAnalyzer::field_type("varchar(255)"), FieldType::Text);
        assert_eq!(SchemaAnalyzer::field_type("smallint"), FieldType::Number);
        assert_eq!(SchemaAnalyzer::field_type("timestamp with time zone"), FieldType::Date);
        assert_eq!(SchemaAnalyzer::field_type("boolean"), FieldType::Boolean);
        assert_eq!(SchemaAnalyzer::field_type("enum"), FieldType::Enum);
        assert_eq!(SchemaAnalyzer::field_type("jsonb"), FieldType::Text);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(SchemaAnalyzer::format_label("displayOrder"), "Display Order");
        assert_eq!(SchemaAnalyzer::format_label("title"), "Title");
        assert_eq!(SchemaAnalyzer::format_label("created_at"), "Created at");
    }

    #[test]
    fn test_generate_filter_fields_respects_exclusions_and_order() {
        let fields = SchemaAnalyzer::generate_filter_fields(&shows_table(), &["id", "createdAt"]);
        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "year", "difficulty", "price", "tags"]);
    }

    #[test]
    fn test_generated_fields_carry_type_details() {
        let fields = SchemaAnalyzer::generate_filter_fields(&shows_table(), &[]);
        let difficulty = fields.iter().find(|f| f.key == "difficulty").unwrap();
        assert_eq!(difficulty.enum_values.as_ref().unwrap().len(), 2);
        assert_eq!(difficulty.placeholder.as_deref(), Some("Filter by difficulty..."));

        let price = fields.iter().find(|f| f.key == "price").unwrap();
        assert_eq!((price.min, price.max), (Some(0.0), Some(10_000.0)));

        let year = fields.iter().find(|f| f.key == "year").unwrap();
        assert_eq!(year.min, Some(1900.0));

        let tags = fields.iter().find(|f| f.key == "tags").unwrap();
        assert_eq!(tags.field_type, FieldType::Relation);
        assert!(tags.operators.contains(&FilterOperator::In));
    }

    #[test]
    fn test_validate_rejects_unknown_field() {
        let schema = ResourceSchema::new("shows")
            .with_fields(SchemaAnalyzer::generate_filter_fields(&shows_table(), &[]));
        let err = schema
            .validate_conditions(&[FilterCondition::equals("secret", "x")])
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownField { .. }));
    }

    #[test]
    fn test_validate_sort_rules() {
        let schema = ResourceSchema::new("shows")
            .with_fields(vec![FilterField::new("title", "Title", FieldType::Text)])
            .with_sort_fields(["createdAt"]);

        assert!(schema
            .validate_sort(&[SortDirective::desc("createdAt"), SortDirective::asc("title")])
            .is_ok());
        assert!(matches!(
            schema.validate_sort(&[SortDirective::asc("price")]),
            Err(FilterError::UnknownSortField { .. })
        ));
        assert!(matches!(
            schema.validate_sort(&[SortDirective::asc("title"), SortDirective::desc("title")]),
            Err(FilterError::DuplicateSortField { .. })
        ));
    }

    #[test]
    fn test_effective_sort_falls_back_to_default() {
        let schema = ResourceSchema::new("shows").with_default_sort(vec![SortDirective::asc("title")]);
        let state = FilterState::default();
        assert_eq!(schema.effective_sort(&state), &[SortDirective::asc("title")]);

        let state = FilterState::default().sort_by(SortDirective::desc("year"));
        assert_eq!(schema.effective_sort(&state), &[SortDirective::desc("year")]);
    }
}
