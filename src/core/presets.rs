//! Named filter presets offered next to the filter controls

use crate::core::filter::{FilterCondition, SortDirective};
use serde::{Deserialize, Serialize};

/// Search, conditions and sort a preset applies
///
/// Page and page size are not part of a preset: applying one always starts at
/// page 1 and keeps the viewer's page size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub sort: Vec<SortDirective>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub filters: PresetFilters,
}

impl FilterPreset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            filters: PresetFilters::default(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn condition(mut self, condition: FilterCondition) -> Self {
        self.filters.conditions.push(condition);
        self
    }

    pub fn sort_by(mut self, directive: SortDirective) -> Self {
        self.filters.sort.push(directive);
        self
    }
}

/// Find a preset by id
pub fn find_preset<'a>(presets: &'a [FilterPreset], id: &str) -> Option<&'a FilterPreset> {
    presets.iter().find(|preset| preset.id == id)
}
