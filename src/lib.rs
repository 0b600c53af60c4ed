//! DevCamper: bootcamp directory API over a document store.
//!
//! List routes go through the advanced-results [`QueryBuilder`]: query-string filters,
//! `select`, `sort`, `page` and `limit` become one count and one fetch, run concurrently,
//! and come back as a [`ResultEnvelope`]. The [`Api`] dispatcher wires the builder, the
//! models and the lifecycle services behind `/api/v1`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod document;
pub mod errors;
pub mod models;
pub mod query;
pub mod seed;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;

pub use api::Api;
pub use config::AppConfig;
pub use document::Document;
pub use errors::ApiError;
pub use query::{
    CancelHandle, CancelSignal, Filter, FindOptions, Pagination, QueryBuilder, QueryContext,
    QueryParams, ResultEnvelope, cancel_pair,
};
pub use store::{DocumentStore, MemoryStore};
pub use types::{DocumentId, Role};

use std::sync::Arc;

/// A dispatcher over a fresh in-memory store.
///
/// # Errors
/// `Config` if the configured token key does not parse.
pub fn in_memory(config: AppConfig) -> Result<Api<MemoryStore>, ApiError> {
    Api::new(Arc::new(MemoryStore::new()), config)
}
