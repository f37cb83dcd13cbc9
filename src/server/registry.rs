//! Resource registry for mounting list endpoints

use super::handler::{ListState, list_handler, metadata_handler};
use crate::config::ListConfig;
use crate::core::entity::Filterable;
use crate::core::presets::FilterPreset;
use crate::core::schema::ResourceSchema;
use crate::core::service::ResourceStore;
use axum::Router;
use axum::routing::get;
use indexmap::IndexMap;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait that describes how to build the routes of one list resource
pub trait ResourceDescriptor: Send + Sync {
    /// Plural resource name, also the URL segment (e.g. "shows")
    fn resource_name(&self) -> &str;

    /// Build the routes for this resource
    ///
    /// Should return a Router with:
    /// - GET /api/{resource}
    /// - GET /api/{resource}/filters
    fn build_routes(&self, config: Arc<ListConfig>) -> Router;
}

/// A [`ResourceDescriptor`] serving records of `T` from a store
pub struct ListResource<T> {
    store: Arc<dyn ResourceStore<T>>,
    schema: Arc<ResourceSchema>,
    presets: Arc<Vec<FilterPreset>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Filterable> ListResource<T> {
    pub fn new(store: impl ResourceStore<T> + 'static, schema: ResourceSchema) -> Self {
        Self {
            store: Arc::new(store),
            schema: Arc::new(schema),
            presets: Arc::new(Vec::new()),
            _record: PhantomData,
        }
    }

    pub fn with_presets(mut self, presets: Vec<FilterPreset>) -> Self {
        self.presets = Arc::new(presets);
        self
    }
}

impl<T> ResourceDescriptor for ListResource<T>
where
    T: Filterable + Serialize,
{
    fn resource_name(&self) -> &str {
        &self.schema.name
    }

    fn build_routes(&self, config: Arc<ListConfig>) -> Router {
        let state = ListState {
            store: self.store.clone(),
            schema: self.schema.clone(),
            presets: self.presets.clone(),
            config,
        };

        let base = format!("/api/{}", self.schema.name);
        Router::new()
            .route(&base, get(list_handler::<T>))
            .route(&format!("{}/filters", base), get(metadata_handler::<T>))
            .with_state(state)
    }
}

/// Registry for all list resources of the application
#[derive(Default)]
pub struct ResourceRegistry {
    descriptors: IndexMap<String, Box<dyn ResourceDescriptor>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; returns `false` if the name was already taken
    pub fn register(&mut self, descriptor: Box<dyn ResourceDescriptor>) -> bool {
        let name = descriptor.resource_name().to_string();
        if self.descriptors.contains_key(&name) {
            return false;
        }
        self.descriptors.insert(name, descriptor);
        true
    }

    /// Build a router with all registered resource routes
    pub fn build_routes(&self, config: Arc<ListConfig>) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                router.merge(descriptor.build_routes(config.clone()))
            })
    }

    /// Registered resource names, in registration order
    pub fn resource_names(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
