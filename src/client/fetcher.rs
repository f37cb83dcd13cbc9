//! Generic list fetcher
//!
//! Turns a [`FilterState`] into a `GET` against a list endpoint, unwraps the
//! response envelope and keeps a renderable [`ListView`]. Loads may overlap;
//! each one takes a request id and only the most recent request is allowed to
//! touch the view, so a slow response can never overwrite a newer one.

use crate::codec::UrlCodec;
use crate::core::error::ListError;
use crate::core::query::{ApiResponse, FilterState, FilteredResponse, PaginationInfo};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Raw HTTP response handed back by an [`HttpClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP capability the fetcher needs
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ListError>;
}

/// [`HttpClient`] backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ListError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ListError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ListError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// What a list view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationInfo>,
    pub is_loading: bool,
    pub error: Option<ListError>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> ListView<T> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Loaded successfully and nothing matched
    pub fn is_empty(&self) -> bool {
        !self.is_loading && self.error.is_none() && self.pagination.is_some() && self.items.is_empty()
    }
}

/// Outcome of a single [`ListFetcher::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the view
    Applied,
    /// A newer request was issued meanwhile; the response was dropped
    Stale,
}

pub struct ListFetcher<T> {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    resource: String,
    codec: UrlCodec,
    latest_request: Arc<AtomicU64>,
    last_state: Arc<RwLock<Option<FilterState>>>,
    view: Arc<RwLock<ListView<T>>>,
}

impl<T> Clone for ListFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            resource: self.resource.clone(),
            codec: self.codec.clone(),
            latest_request: self.latest_request.clone(),
            last_state: self.last_state.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T> ListFetcher<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a fetcher for `endpoint`; `resource` names the records in
    /// error messages ("Failed to fetch shows")
    pub fn new(
        client: Arc<dyn HttpClient>,
        endpoint: impl Into<String>,
        resource: impl Into<String>,
        codec: UrlCodec,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            resource: resource.into(),
            codec,
            latest_request: Arc::new(AtomicU64::new(0)),
            last_state: Arc::new(RwLock::new(None)),
            view: Arc::new(RwLock::new(ListView::default())),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Full request URL for a state, paging always explicit
    pub fn request_url(&self, state: &FilterState) -> String {
        let query = self.codec.encode_request(state).to_query_string();
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.endpoint, separator, query)
    }

    pub fn snapshot(&self) -> ListView<T> {
        self.view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch the page described by `state`
    pub async fn load(&self, state: &FilterState) -> LoadOutcome {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_state.write().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());

        {
            let mut view = self.view.write().unwrap_or_else(PoisonError::into_inner);
            view.is_loading = true;
            view.error = None;
        }

        let url = self.request_url(state);
        tracing::debug!(request_id, url = %url, "Fetching {}", self.resource);
        let result = self.fetch(&url).await;

        let mut view = self.view.write().unwrap_or_else(PoisonError::into_inner);
        if self.latest_request.load(Ordering::SeqCst) != request_id {
            tracing::debug!(request_id, "Dropping stale {} response", self.resource);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(response) => {
                view.items = response.data;
                view.pagination = Some(response.pagination);
                view.error = None;
            }
            Err(error) => {
                tracing::warn!(request_id, error = %error, "Failed to load {}", self.resource);
                view.items.clear();
                view.pagination = None;
                view.error = Some(error);
            }
        }
        view.is_loading = false;
        LoadOutcome::Applied
    }

    /// Re-issue the last requested state
    pub async fn retry(&self) -> Option<LoadOutcome> {
        let state = self
            .last_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        Some(self.load(&state).await)
    }

    /// Load the state a controller publishes, and again after every change
    ///
    /// Each change starts its own load, so a slow page never holds up a newer
    /// one and the older response is dropped as stale. The task ends when the
    /// publishing controller is dropped.
    pub fn follow(&self, mut states: watch::Receiver<FilterState>) -> JoinHandle<()> {
        let fetcher = self.clone();
        tokio::spawn(async move {
            loop {
                let state = states.borrow_and_update().clone();
                let loader = fetcher.clone();
                tokio::spawn(async move {
                    loader.load(&state).await;
                });

                if states.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Stopped following {} filter state", fetcher.resource);
        })
    }

    async fn fetch(&self, url: &str) -> Result<FilteredResponse<T>, ListError> {
        let response = self.client.get(url).await?;
        let envelope = serde_json::from_str::<ApiResponse<FilteredResponse<T>>>(&response.body);

        if !response.is_success() {
            return Err(match envelope {
                Ok(ApiResponse {
                    error: Some(message),
                    details,
                    ..
                }) => ListError::Server { message, details },
                _ => ListError::Status {
                    resource: self.resource.clone(),
                    status: response.status,
                },
            });
        }

        let envelope = envelope.map_err(|e| {
            tracing::debug!(error = %e, "Undecodable {} envelope", self.resource);
            self.invalid_response()
        })?;

        match envelope {
            ApiResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiResponse {
                success: false,
                error: Some(message),
                details,
                ..
            } => Err(ListError::Server { message, details }),
            _ => Err(self.invalid_response()),
        }
    }

    fn invalid_response(&self) -> ListError {
        ListError::InvalidResponse {
            resource: self.resource.clone(),
        }
    }
}
