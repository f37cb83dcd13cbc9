//! URL ⇄ filter state codec
//!
//! The query string is the only durable representation of a list view, so it
//! has to round-trip losslessly and survive hand edits:
//!
//! - `search` is a plain parameter
//! - `filters` and `sort` are compact JSON arrays
//! - `page` and `limit` are plain integers
//!
//! Defaults (`page=1`, the default page size, empty lists, blank search) are
//! left out so the unfiltered view has a clean URL. Decoding never fails: a
//! parameter that does not parse is treated as absent.

use crate::config::ListConfig;
use crate::core::filter::{FilterCondition, SortDirective};
use crate::core::query::{FilterState, FilterStatePatch};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use url::form_urlencoded;

pub const SEARCH_PARAM: &str = "search";
pub const FILTERS_PARAM: &str = "filters";
pub const SORT_PARAM: &str = "sort";
pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";

/// Ordered, form-urlencoded query parameters
///
/// Keeps insertion order so the same state always yields the same string.
/// Repeated keys keep their first value, like `URLSearchParams::get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: IndexMap<String, String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without its leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut pairs = IndexMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            pairs
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { pairs }
    }

    /// Parse the query part of a full or relative URL
    pub fn from_url(url: &str) -> Self {
        match url.split_once('?') {
            Some((_, query)) => Self::parse(query.split('#').next().unwrap_or_default()),
            None => Self::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.pairs.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Encoder/decoder between [`FilterState`] and query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCodec {
    default_limit: usize,
    allowed_limits: Vec<usize>,
}

impl Default for UrlCodec {
    fn default() -> Self {
        Self::new(&ListConfig::default())
    }
}

impl UrlCodec {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            allowed_limits: config.allowed_limits.clone(),
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Encode a state for the address bar, omitting defaults
    pub fn encode(&self, state: &FilterState) -> SearchParams {
        self.encode_with(state, false)
    }

    /// Encode a state for an API request
    ///
    /// Same format as [`encode`](Self::encode), but `page` and `limit` are
    /// always explicit so client and server never disagree about defaults.
    pub fn encode_request(&self, state: &FilterState) -> SearchParams {
        self.encode_with(state, true)
    }

    fn encode_with(&self, state: &FilterState, explicit_paging: bool) -> SearchParams {
        let mut params = SearchParams::new();

        if let Some(search) = state.search.as_deref().filter(|s| !s.is_empty()) {
            params.set(SEARCH_PARAM, search);
        }

        if explicit_paging || state.page > 1 {
            params.set(PAGE_PARAM, state.page.max(1).to_string());
        }

        if explicit_paging || state.limit != self.default_limit {
            params.set(LIMIT_PARAM, state.limit.to_string());
        }

        if !state.conditions.is_empty() {
            set_json(&mut params, FILTERS_PARAM, &state.conditions);
        }

        if !state.sort.is_empty() {
            set_json(&mut params, SORT_PARAM, &state.sort);
        }

        params
    }

    /// Decode parameters into a full state, falling back to defaults
    pub fn decode(&self, params: &SearchParams) -> FilterState {
        self.decode_patch(params)
            .overlay(FilterState::with_limit(self.default_limit))
    }

    /// Decode only the parameters the URL actually (and validly) carries
    pub fn decode_patch(&self, params: &SearchParams) -> FilterStatePatch {
        let mut patch = FilterStatePatch::new();

        if let Some(search) = params.get(SEARCH_PARAM).filter(|s| !s.is_empty()) {
            patch.search = Some(Some(search.to_string()));
        }

        if let Some(raw) = params.get(PAGE_PARAM) {
            match raw.trim().parse::<usize>() {
                Ok(page) if page >= 1 => patch.page = Some(page),
                _ => tracing::debug!(page = raw, "Ignoring invalid page parameter"),
            }
        }

        if let Some(raw) = params.get(LIMIT_PARAM) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if self.allowed_limits.contains(&limit) => patch.limit = Some(limit),
                _ => tracing::debug!(limit = raw, "Ignoring invalid limit parameter"),
            }
        }

        if let Some(raw) = params.get(FILTERS_PARAM) {
            match serde_json::from_str::<Vec<FilterCondition>>(raw) {
                Ok(conditions) => patch.conditions = Some(conditions),
                Err(e) => tracing::warn!(error = %e, "Failed to parse filters from URL"),
            }
        }

        if let Some(raw) = params.get(SORT_PARAM) {
            match serde_json::from_str::<Vec<SortDirective>>(raw) {
                Ok(sort) => patch.sort = Some(dedup_sort(sort)),
                Err(e) => tracing::warn!(error = %e, "Failed to parse sort from URL"),
            }
        }

        patch
    }

    /// `base` alone for the default view, `base?query` otherwise
    pub fn build_url(&self, base_path: &str, state: &FilterState) -> String {
        let query = self.encode(state).to_query_string();
        if query.is_empty() {
            base_path.to_string()
        } else {
            format!("{}?{}", base_path, query)
        }
    }
}

fn set_json<T: Serialize>(params: &mut SearchParams, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => params.set(key, json),
        Err(e) => tracing::warn!(param = key, error = %e, "Failed to encode parameter"),
    }
}

/// Keep the first directive for each field
fn dedup_sort(sort: Vec<SortDirective>) -> Vec<SortDirective> {
    let mut seen = HashSet::new();
    sort.into_iter()
        .filter(|directive| seen.insert(directive.field.clone()))
        .collect()
}
