//! # Showcase Filters
//!
//! The generic filter, sort and pagination layer behind the show and
//! arrangement catalogue of a marching-band show-design site.
//!
//! ## Features
//!
//! - **Filter Grammar**: typed fields, a closed operator set, conditions and multi-key sort
//! - **URL Codec**: lossless, deterministic `FilterState` ⇄ query string encoding
//! - **State Controller**: single owner of a list view's state with debounced history sync
//! - **List Fetcher**: envelope decoding with stale-response suppression
//! - **Pagination**: page-button layout with ellipses and result ranges
//! - **List Endpoints**: an axum server that searches, filters, sorts and pages any resource
//! - **Configuration-Based**: page sizes and timings via YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use showcase::prelude::*;
//!
//! // Server: one list endpoint per resource
//! ServerBuilder::new()
//!     .register_resource(InMemoryStore::seeded(shows), show::schema(), show::presets())?
//!     .serve("127.0.0.1:3000")
//!     .await?;
//!
//! // Client: state in the URL, results from the endpoint
//! let mut controller = FilterStateController::new(&config, FilterStatePatch::new(), navigator, "/shows");
//! controller.set_search("jazz");
//! controller.settle().await;
//!
//! let fetcher: ListFetcher<Show> = ListFetcher::new(client, "/api/shows", "shows", UrlCodec::new(&config));
//! fetcher.load(controller.state()).await;
//! let view = fetcher.snapshot();
//! ```

pub mod catalog;
pub mod client;
pub mod codec;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ApiResponse, FieldType, FieldValue, FilterCondition, FilterError, FilterField,
        FilterOperator, FilterPreset, FilterState, FilterStatePatch, Filterable,
        FilteredResponse, ListError, PaginationInfo, ResourceSchema, ResourceStore,
        SchemaAnalyzer, SortDirection, SortDirective,
    };

    // === Codec ===
    pub use crate::codec::{SearchParams, UrlCodec};

    // === Client ===
    pub use crate::client::{
        FilterStateController, HttpClient, ListFetcher, ListView, NavigateOptions, Navigator,
        PageToken, PaginationView, ReqwestClient, ResultRange, page_tokens,
    };

    // === Catalogue ===
    pub use crate::catalog::{Arrangement, Difficulty, Show, arrangement, show};

    // === Storage ===
    pub use crate::storage::InMemoryStore;

    // === Config ===
    pub use crate::config::ListConfig;

    // === Server ===
    pub use crate::server::{QueryEngine, ResourceDescriptor, ResourceRegistry, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
}
