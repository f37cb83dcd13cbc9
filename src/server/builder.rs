//! ServerBuilder for fluent API to build the list API server

use super::registry::{ListResource, ResourceDescriptor, ResourceRegistry};
use crate::config::ListConfig;
use crate::core::entity::Filterable;
use crate::core::presets::FilterPreset;
use crate::core::schema::ResourceSchema;
use crate::core::service::ResourceStore;
use anyhow::{Result, bail};
use axum::http::Method;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for creating the HTTP server with one list endpoint per resource
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(ListConfig::from_yaml_file("lists.yaml")?)
///     .register_resource(show_store, shows::schema(), shows::presets())?
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: ListConfig,
    registry: ResourceRegistry,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default list configuration
    pub fn new() -> Self {
        Self {
            config: ListConfig::default(),
            registry: ResourceRegistry::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the page-size rules every list endpoint enforces
    pub fn with_config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    /// Add routes that are not list endpoints
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a resource served from `store`
    ///
    /// The schema must describe the record type, so its name has to match
    /// [`Filterable::resource_name`].
    pub fn register_resource<T>(
        self,
        store: impl ResourceStore<T> + 'static,
        schema: ResourceSchema,
        presets: Vec<FilterPreset>,
    ) -> Result<Self>
    where
        T: Filterable + Serialize,
    {
        if schema.name != T::resource_name() {
            bail!(
                "Schema '{}' does not describe {} records",
                schema.name,
                T::resource_name()
            );
        }
        self.register(Box::new(ListResource::new(store, schema).with_presets(presets)))
    }

    /// Register any resource descriptor
    pub fn register(mut self, descriptor: Box<dyn ResourceDescriptor>) -> Result<Self> {
        let name = descriptor.resource_name().to_string();
        if !self.registry.register(descriptor) {
            bail!("Resource '{}' is already registered", name);
        }
        tracing::debug!(resource = %name, "Registered list resource");
        Ok(self)
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health check routes
    /// - `GET /api/{resource}` and `GET /api/{resource}/filters` per resource
    /// - Custom routes
    pub fn build(self) -> Result<Router> {
        self.config.validate()?;
        if self.registry.is_empty() {
            bail!("No resources registered. Call .register_resource()");
        }

        let config = Arc::new(self.config);
        let mut app = health_routes().merge(self.registry.build_routes(config));

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers(Any);

        Ok(app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let resources: Vec<String> = self
            .registry
            .resource_names()
            .into_iter()
            .map(String::from)
            .collect();
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(resources = ?resources, "Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "showcase-filters"
    }))
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::storage::InMemoryStore;

    #[derive(Debug, Clone, Serialize)]
    struct Note {
        title: String,
    }

    impl Filterable for Note {
        fn resource_name() -> &'static str {
            "notes"
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            (field == "title").then(|| self.title.as_str().into())
        }
    }

    fn notes() -> ResourceSchema {
        ResourceSchema::new("notes").with_search_fields(["title"])
    }

    #[test]
    fn test_build_without_resources_fails() {
        let err = ServerBuilder::new().build().err().expect("should be Err");
        assert!(err.to_string().contains("No resources registered"));
    }

    #[test]
    fn test_duplicate_resource_fails() {
        let result = ServerBuilder::new()
            .register_resource(InMemoryStore::<Note>::new(), notes(), Vec::new())
            .expect("first registration should succeed")
            .register_resource(InMemoryStore::<Note>::new(), notes(), Vec::new());
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(err_msg.contains("already registered"));
    }

    #[test]
    fn test_schema_must_match_record_type() {
        let result = ServerBuilder::new().register_resource(
            InMemoryStore::<Note>::new(),
            ResourceSchema::new("shows"),
            Vec::new(),
        );
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert_eq!(err_msg, "Schema 'shows' does not describe notes records");
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let config = ListConfig {
            default_limit: 15,
            ..ListConfig::default()
        };
        let result = ServerBuilder::new()
            .with_config(config)
            .register_resource(InMemoryStore::<Note>::new(), notes(), Vec::new())
            .expect("register should succeed")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_with_resource_and_custom_routes() {
        let extra = Router::new().route("/version", get(|| async { "1" }));
        ServerBuilder::default()
            .with_custom_routes(extra)
            .register_resource(InMemoryStore::<Note>::new(), notes(), Vec::new())
            .expect("register should succeed")
            .build()
            .expect("build should produce a Router");
    }
}
