//! Arrangements: individual charts sold on their own or as part of a show

use crate::core::entity::Filterable;
use crate::core::field::FieldValue;
use crate::core::filter::{FilterCondition, FilterOperator, SortDirective};
use crate::core::presets::FilterPreset;
use crate::core::schema::{RelationKind, ResourceSchema, SchemaAnalyzer, SchemaField, TableSchema};
use serde::{Deserialize, Serialize};

pub const RESOURCE: &str = "arrangements";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrangement {
    pub id: u32,
    pub title: String,
    /// Free-form scoring, e.g. "Marching Band" or "Full Orchestral"
    #[serde(default, rename = "type")]
    pub arrangement_type: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub composer: Option<String>,
    pub show_id: u32,
    /// Title of the parent show
    #[serde(default)]
    pub show: Option<String>,
}

impl Arrangement {
    pub fn new(id: u32, title: impl Into<String>, show_id: u32) -> Self {
        Self {
            id,
            title: title.into(),
            arrangement_type: None,
            price: None,
            composer: None,
            show_id,
            show: None,
        }
    }
}

impl Filterable for Arrangement {
    fn resource_name() -> &'static str {
        RESOURCE
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Number(f64::from(self.id))),
            "title" => Some(self.title.as_str().into()),
            "type" => Some(self.arrangement_type.as_deref().into()),
            "price" => Some(self.price.into()),
            "composer" => Some(self.composer.as_deref().into()),
            "showId" => Some(FieldValue::Number(f64::from(self.show_id))),
            "show" => Some(self.show.as_deref().into()),
            _ => None,
        }
    }
}

pub fn table() -> TableSchema {
    TableSchema::new(RESOURCE)
        .field("id", SchemaField::new("serial"))
        .field("title", SchemaField::new("text"))
        .field("type", SchemaField::new("text").nullable())
        .field("price", SchemaField::new("numeric").nullable())
        .field("composer", SchemaField::new("text").nullable())
        .field("showId", SchemaField::new("integer"))
        .relation("show", RelationKind::One, "shows")
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE)
        .with_fields(SchemaAnalyzer::generate_filter_fields(&table(), &["id", "showId"]))
        .with_search_fields(["title", "composer"])
        .with_default_sort(vec![SortDirective::asc("title")])
}

pub fn presets() -> Vec<FilterPreset> {
    vec![
        FilterPreset::new("orchestral", "Orchestral Arrangements")
            .describe("Full orchestral arrangements")
            .condition(FilterCondition::contains("type", "orchestral"))
            .sort_by(SortDirective::asc("title")),
        FilterPreset::new("marching-band", "Marching Band")
            .describe("Marching band arrangements")
            .condition(FilterCondition::contains("type", "marching"))
            .sort_by(SortDirective::asc("title")),
        FilterPreset::new("affordable-arrangements", "Budget Arrangements")
            .describe("Arrangements under $100")
            .condition(FilterCondition::new("price", FilterOperator::Lte, 100))
            .sort_by(SortDirective::asc("price")),
        FilterPreset::new("premium", "Premium Arrangements")
            .describe("High-end arrangements over $200")
            .condition(FilterCondition::new("price", FilterOperator::Gte, 200))
            .sort_by(SortDirective::desc("price")),
    ]
}
