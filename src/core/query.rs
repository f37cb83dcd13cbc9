//! Filter state, pagination metadata and the response envelope

use crate::config::{DEFAULT_LIMIT, ListConfig};
use crate::core::error::FilterError;
use crate::core::filter::{FilterCondition, SortDirective};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Complete description of a list view's search, filters, sort and page
///
/// Conditions are ANDed and their order is irrelevant; sort order is
/// significant (first directive is the primary key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub sort: Vec<SortDirective>,
    pub page: usize,
    pub limit: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: None,
            conditions: Vec::new(),
            sort: Vec::new(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterState {
    /// Default state with the given page size
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn sort_by(mut self, directive: SortDirective) -> Self {
        self.sort.push(directive);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Number of records skipped before the current page
    ///
    /// Saturates instead of overflowing, so an absurd page is simply past the
    /// end of any result set.
    pub fn offset(&self) -> usize {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit)
    }

    /// Merge a partial update
    ///
    /// A change to `search`, `conditions` or `limit` sends the view back to the
    /// first page unless the patch sets `page` itself. Sort changes and page
    /// navigation keep the current page.
    pub fn update(&self, patch: FilterStatePatch) -> FilterState {
        let explicit_page = patch.page.is_some();
        let next = patch.overlay(self.clone());

        let narrowed = next.search != self.search
            || next.conditions != self.conditions
            || next.limit != self.limit;

        if narrowed && !explicit_page {
            FilterState { page: 1, ..next }
        } else {
            next
        }
    }
}

/// A partial filter state, where `None` means "leave as is"
///
/// `search` is doubly optional so a patch can clear the search term
/// (`Some(None)`) as well as leave it alone (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStatePatch {
    pub search: Option<Option<String>>,
    pub conditions: Option<Vec<FilterCondition>>,
    pub sort: Option<Vec<SortDirective>>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl FilterStatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(Some(term.into()));
        self
    }

    pub fn clear_search(mut self) -> Self {
        self.search = Some(None);
        self
    }

    pub fn conditions(mut self, conditions: Vec<FilterCondition>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn sort(mut self, sort: Vec<SortDirective>) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Plain shallow merge: every field the patch carries wins
    pub fn overlay(self, mut base: FilterState) -> FilterState {
        if let Some(search) = self.search {
            base.search = search;
        }
        if let Some(conditions) = self.conditions {
            base.conditions = conditions;
        }
        if let Some(sort) = self.sort {
            base.sort = sort;
        }
        if let Some(page) = self.page {
            base.page = page;
        }
        if let Some(limit) = self.limit {
            base.limit = limit;
        }
        base
    }
}

/// Raw list query parameters, as received by a list endpoint
///
/// All fields are kept as strings so malformed input becomes a descriptive
/// `400` envelope instead of an extractor rejection.
///
/// # Example
/// ```text
/// GET /api/shows?page=2&limit=10
/// GET /api/shows?search=jazz&filters=[{"field":"year","operator":"gte","value":2020}]
/// GET /api/shows?sort=[{"field":"price","direction":"desc"}]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,

    /// JSON-encoded `FilterCondition[]`
    pub filters: Option<String>,

    /// JSON-encoded `SortDirective[]`
    pub sort: Option<String>,

    pub page: Option<String>,

    pub limit: Option<String>,
}

impl ListQuery {
    /// Parse into a filter state, rejecting anything malformed
    pub fn into_filter_state(self, config: &ListConfig) -> Result<FilterState, FilterError> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| FilterError::MalformedParameter {
                    param: "page".to_string(),
                    message: format!("expected a positive integer, got '{}'", raw),
                })?,
        };

        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => config.default_limit,
            Some(raw) => {
                let limit = raw.parse::<usize>().map_err(|_| FilterError::MalformedParameter {
                    param: "limit".to_string(),
                    message: format!("expected an integer, got '{}'", raw),
                })?;
                if !config.is_allowed_limit(limit) {
                    return Err(FilterError::LimitNotAllowed {
                        limit,
                        allowed: config.allowed_limits.clone(),
                    });
                }
                limit
            }
        };

        Ok(FilterState {
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            conditions: parse_json_param("filters", self.filters.as_deref())?,
            sort: parse_json_param("sort", self.sort.as_deref())?,
            page,
            limit,
        })
    }
}

fn parse_json_param<T: serde::de::DeserializeOwned>(
    param: &str,
    raw: Option<&str>,
) -> Result<Vec<T>, FilterError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| FilterError::MalformedParameter {
            param: param.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Pagination metadata computed by the server
///
/// The derived fields are always consistent with `total` and `limit`; clients
/// render them as received and never recompute them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after search and filters)
    pub total: usize,

    pub total_pages: usize,

    pub has_next: bool,

    pub has_prev: bool,
}

impl PaginationInfo {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of results plus its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    pub pagination: PaginationInfo,

    /// The state the server actually applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<FilterState>,
}

impl<T> FilteredResponse<T> {
    pub fn new(data: Vec<T>, total: usize, state: &FilterState) -> Self {
        Self {
            data,
            pagination: PaginationInfo::new(state.page, state.limit, total),
            applied_filters: Some(state.clone()),
        }
    }
}

/// Envelope every API response is wrapped in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<D> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<D> ApiResponse<D> {
    /// Wrap a successful result in the envelope
    pub fn success(data: D) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    /// Wrap an error in the envelope
    pub fn failure(error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details,
        }
    }
}
