//! Shows: complete field shows offered in the catalogue

use crate::core::entity::Filterable;
use crate::core::field::FieldValue;
use crate::core::filter::{FilterCondition, SortDirective};
use crate::core::presets::FilterPreset;
use crate::core::schema::{RelationKind, ResourceSchema, SchemaAnalyzer, SchemaField, TableSchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RESOURCE: &str = "shows";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Running time as shown on the show page, e.g. "7:30"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Show {
    pub fn new(id: u32, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            year: None,
            difficulty: None,
            duration: None,
            price: None,
            featured: false,
            display_order: 0,
            tags: Vec::new(),
            created_at,
        }
    }
}

impl Filterable for Show {
    fn resource_name() -> &'static str {
        RESOURCE
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Number(f64::from(self.id))),
            "title" => Some(self.title.as_str().into()),
            "description" => Some(self.description.as_deref().into()),
            "year" => Some(self.year.into()),
            "difficulty" => Some(self.difficulty.map(|d| d.as_str()).into()),
            "duration" => Some(self.duration.as_deref().into()),
            "price" => Some(self.price.into()),
            "featured" => Some(self.featured.into()),
            "displayOrder" => Some(self.display_order.into()),
            "tags" => Some(FieldValue::List(
                self.tags.iter().map(|t| t.as_str().into()).collect(),
            )),
            "createdAt" => Some(self.created_at.into()),
            _ => None,
        }
    }
}

/// Column layout of the shows table
pub fn table() -> TableSchema {
    TableSchema::new(RESOURCE)
        .field("id", SchemaField::new("serial"))
        .field("title", SchemaField::new("text"))
        .field("description", SchemaField::new("text").nullable())
        .field("year", SchemaField::new("smallint").nullable())
        .field(
            "difficulty",
            SchemaField::new("enum")
                .nullable()
                .with_enum_values(Difficulty::ALL.iter().map(Difficulty::as_str)),
        )
        .field("duration", SchemaField::new("text").nullable())
        .field("price", SchemaField::new("numeric").nullable())
        .field("featured", SchemaField::new("boolean"))
        .field("displayOrder", SchemaField::new("integer"))
        .field("createdAt", SchemaField::new("timestamp"))
        .relation("tags", RelationKind::Many, "tags")
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE)
        .with_fields(SchemaAnalyzer::generate_filter_fields(
            &table(),
            &["id", "description", "createdAt"],
        ))
        .with_search_fields(["title", "description"])
        .with_sort_fields(["createdAt"])
        .with_default_sort(vec![SortDirective::asc("displayOrder")])
}

pub fn presets() -> Vec<FilterPreset> {
    vec![
        FilterPreset::new("featured", "Featured")
            .describe("Editor's picks")
            .condition(FilterCondition::equals("featured", true))
            .sort_by(SortDirective::desc("createdAt")),
    ]
}
