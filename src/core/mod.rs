//! Core module containing the filter grammar and its supporting types

pub mod entity;
pub mod error;
pub mod field;
pub mod filter;
pub mod presets;
pub mod query;
pub mod schema;
pub mod service;

pub use entity::Filterable;
pub use error::{ApiError, FilterError, ListError, StoreError};
pub use field::{FieldType, FieldValue};
pub use filter::{
    FilterCondition, FilterField, FilterOperator, Predicate, SortDirection, SortDirective,
    TypedCondition,
};
pub use presets::{FilterPreset, PresetFilters, find_preset};
pub use query::{
    ApiResponse, FilterState, FilterStatePatch, FilteredResponse, ListQuery, PaginationInfo,
};
pub use schema::{RelationKind, ResourceSchema, SchemaAnalyzer, SchemaField, TableSchema};
pub use service::ResourceStore;
