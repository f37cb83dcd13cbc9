//! Client side of a list view: state controller, fetcher and pager layout

pub mod controller;
pub mod debounce;
pub mod fetcher;
pub mod pagination;

pub use controller::{ControllerOptions, FilterStateController, NavigateOptions, Navigator};
pub use debounce::{Debouncer, SyncState};
pub use fetcher::{HttpClient, HttpResponse, ListFetcher, ListView, LoadOutcome, ReqwestClient};
pub use pagination::{PageToken, PaginationView, ResultRange, page_tokens};
