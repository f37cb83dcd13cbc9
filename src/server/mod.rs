//! Server side of the list contract
//!
//! This module provides a `ServerBuilder` that registers, for every resource:
//! - `GET /api/{resource}`: search, filter, sort and page the resource
//! - `GET /api/{resource}/filters`: the fields, presets and page sizes a filter
//!   bar renders

pub mod builder;
pub mod engine;
pub mod handler;
pub mod registry;

pub use builder::ServerBuilder;
pub use engine::QueryEngine;
pub use handler::{ListState, ResourceMetadata, list_handler, metadata_handler};
pub use registry::{ListResource, ResourceDescriptor, ResourceRegistry};
