//! Generic list and schema handlers shared by every resource

use super::engine::QueryEngine;
use crate::config::ListConfig;
use crate::core::entity::Filterable;
use crate::core::error::{ApiError, FilterError};
use crate::core::filter::{FilterField, SortDirective};
use crate::core::presets::FilterPreset;
use crate::core::query::{ApiResponse, FilteredResponse, ListQuery};
use crate::core::schema::ResourceSchema;
use crate::core::service::ResourceStore;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Serialize;
use std::sync::Arc;

/// State shared by a resource's handlers
pub struct ListState<T> {
    pub store: Arc<dyn ResourceStore<T>>,
    pub schema: Arc<ResourceSchema>,
    pub presets: Arc<Vec<FilterPreset>>,
    pub config: Arc<ListConfig>,
}

impl<T> Clone for ListState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            schema: self.schema.clone(),
            presets: self.presets.clone(),
            config: self.config.clone(),
        }
    }
}

/// GET /api/{resource}
///
/// Query params: `?search=jazz&filters=[...]&sort=[...]&page=2&limit=20`
/// Returns: 200 + `{ success: true, data: { data, pagination, appliedFilters } }`,
/// or 400 + `{ success: false, error, details }` for anything malformed
pub async fn list_handler<T>(
    State(state): State<ListState<T>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<FilteredResponse<T>>>, ApiError>
where
    T: Filterable + Serialize,
{
    let Query(query) = query.map_err(|rejection| FilterError::MalformedParameter {
        param: "query".to_string(),
        message: rejection.body_text(),
    })?;

    let filter_state = query.into_filter_state(&state.config)?;
    let records = state.store.list().await?;
    let response = QueryEngine::apply(records, &state.schema, &filter_state)?;

    tracing::debug!(
        resource = %state.schema.name,
        page = response.pagination.page,
        total = response.pagination.total,
        "Served list request"
    );

    Ok(Json(ApiResponse::success(response)))
}

/// What a filter bar needs to render controls for a resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub resource: String,
    pub fields: Vec<FilterField>,
    pub search_fields: Vec<String>,
    pub sort_fields: Vec<String>,
    pub default_sort: Vec<SortDirective>,
    pub presets: Vec<FilterPreset>,
    pub default_limit: usize,
    pub allowed_limits: Vec<usize>,
}

impl ResourceMetadata {
    pub fn new(schema: &ResourceSchema, presets: &[FilterPreset], config: &ListConfig) -> Self {
        let mut sort_fields: Vec<String> = schema.fields.iter().map(|f| f.key.clone()).collect();
        for extra in &schema.sort_fields {
            if !sort_fields.contains(extra) {
                sort_fields.push(extra.clone());
            }
        }

        Self {
            resource: schema.name.clone(),
            fields: schema.fields.clone(),
            search_fields: schema.search_fields.clone(),
            sort_fields,
            default_sort: schema.default_sort.clone(),
            presets: presets.to_vec(),
            default_limit: config.default_limit,
            allowed_limits: config.allowed_limits.clone(),
        }
    }
}

/// GET /api/{resource}/filters
pub async fn metadata_handler<T>(State(state): State<ListState<T>>) -> Json<ApiResponse<ResourceMetadata>>
where
    T: Filterable,
{
    Json(ApiResponse::success(ResourceMetadata::new(
        &state.schema,
        &state.presets,
        &state.config,
    )))
}
