use super::{Collection, DocumentStore};
use crate::document::{Document, get_path, id_of};
use crate::errors::ApiError;
use crate::query::eval::{eval_filter, project_fields};
use crate::query::exec::{count_docs, find_docs, shape_doc};
use crate::query::{Filter, FindOptions, Populate, PopulateKind};
use crate::types::DocumentId;
use bson::Bson;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::{Future, ready};
use std::sync::Arc;

/// Process-local store. Collections are created on first write.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn collection_or_create(&self, name: &str) -> Arc<Collection> {
        if let Some(c) = self.collection(name) {
            return c;
        }
        let mut cols = self.collections.write();
        cols.entry(name.to_string()).or_insert_with(|| Arc::new(Collection::new(name))).clone()
    }

    fn find_now(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> Result<Vec<Document>, ApiError> {
        let Some(col) = self.collection(collection) else {
            return Ok(Vec::new());
        };
        let mut docs: Vec<Document> = find_docs(&col, filter, opts)
            .iter()
            .map(|d| shape_doc(d, opts.projection.as_deref(), &opts.hidden))
            .collect();
        if let Some(p) = &opts.populate {
            self.populate(&mut docs, p);
        }
        Ok(docs)
    }

    fn populate(&self, docs: &mut [Document], spec: &Populate) {
        let from = self.collection(&spec.from);
        let select = |d: &Document| {
            if spec.select.is_empty() { d.clone() } else { project_fields(d, &spec.select) }
        };
        match &spec.kind {
            PopulateKind::Ref => {
                for doc in docs.iter_mut() {
                    let Some(value) = doc.get(&spec.path) else { continue };
                    let related = match (value, &from) {
                        (Bson::ObjectId(id), Some(col)) => col.find_document(id).map(|d| select(&d)),
                        _ => None,
                    };
                    doc.insert(spec.path.clone(), related.map_or(Bson::Null, Bson::Document));
                }
            }
            PopulateKind::Reverse { foreign_field } => {
                let related = from.map(|c| c.snapshot()).unwrap_or_default();
                for doc in docs.iter_mut() {
                    let Some(id) = id_of(doc) else { continue };
                    let items: Vec<Bson> = related
                        .iter()
                        .filter(|r| get_path(r, foreign_field) == Some(&Bson::ObjectId(id)))
                        .map(|r| Bson::Document(select(r)))
                        .collect();
                    doc.insert(spec.path.clone(), items);
                }
            }
        }
    }
}

impl DocumentStore for MemoryStore {
    fn count(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send {
        let n = self.collection(collection).map_or(0, |c| count_docs(&c, filter));
        ready(Ok(n as u64))
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> impl Future<Output = Result<Vec<Document>, ApiError>> + Send {
        ready(self.find_now(collection, filter, opts))
    }

    fn get(
        &self,
        collection: &str,
        id: DocumentId,
    ) -> impl Future<Output = Result<Option<Document>, ApiError>> + Send {
        ready(Ok(self.collection(collection).and_then(|c| c.find_document(&id))))
    }

    fn insert(
        &self,
        collection: &str,
        doc: Document,
    ) -> impl Future<Output = Result<Document, ApiError>> + Send {
        ready(self.collection_or_create(collection).insert_document(doc))
    }

    fn update(
        &self,
        collection: &str,
        id: DocumentId,
        changes: Document,
    ) -> impl Future<Output = Result<Option<Document>, ApiError>> + Send {
        ready(Ok(self.collection(collection).and_then(|c| c.update_document(&id, changes))))
    }

    fn delete(
        &self,
        collection: &str,
        id: DocumentId,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send {
        ready(Ok(self.collection(collection).is_some_and(|c| c.delete_document(&id))))
    }

    fn delete_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send {
        let n = self.collection(collection).map_or(0, |c| c.delete_where(|d| eval_filter(d, filter)));
        ready(Ok(n))
    }
}
