//! Document store contract and the in-memory implementation.

mod collection;
mod memory;

pub use collection::Collection;
pub use memory::MemoryStore;

use crate::document::Document;
use crate::errors::ApiError;
use crate::query::{Filter, FindOptions};
use crate::types::DocumentId;
use std::future::Future;

/// Async access to named document collections.
///
/// Reads against a collection that does not exist behave as against an empty one.
/// Failures surface as `ApiError::Store` and are never retried by callers.
pub trait DocumentStore: Send + Sync {
    /// Number of documents matching `filter`, ignoring pagination.
    fn count(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> impl Future<Output = Result<Vec<Document>, ApiError>> + Send;

    fn get(
        &self,
        collection: &str,
        id: DocumentId,
    ) -> impl Future<Output = Result<Option<Document>, ApiError>> + Send;

    /// Stores a document, assigning `_id` if missing, and returns what was stored.
    fn insert(
        &self,
        collection: &str,
        doc: Document,
    ) -> impl Future<Output = Result<Document, ApiError>> + Send;

    /// Merges `changes` (null removes a field) and returns the new version.
    fn update(
        &self,
        collection: &str,
        id: DocumentId,
        changes: Document,
    ) -> impl Future<Output = Result<Option<Document>, ApiError>> + Send;

    fn delete(
        &self,
        collection: &str,
        id: DocumentId,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;

    fn delete_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;
}
