use crate::document::{Document, ID_FIELD, id_of};
use crate::errors::ApiError;
use crate::types::DocumentId;
use bson::Bson;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A named set of documents keyed by `_id`. Iteration follows `_id` order, which for
/// generated ids is insertion order.
pub struct Collection {
    name: String,
    docs: RwLock<BTreeMap<DocumentId, Document>>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: RwLock::new(BTreeMap::new()) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Clones every document out from under the read lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    #[must_use]
    pub fn find_document(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    /// Stores the document, assigning `_id` when it has none.
    ///
    /// # Errors
    /// Returns `ApiError::Store` if `_id` is not an ObjectId, `ApiError::Duplicate` if taken.
    pub fn insert_document(&self, mut document: Document) -> Result<Document, ApiError> {
        let id = match document.get(ID_FIELD) {
            None => {
                let id = DocumentId::new();
                let mut with_id = Document::new();
                with_id.insert(ID_FIELD, id);
                for (k, v) in document {
                    with_id.insert(k, v);
                }
                document = with_id;
                id
            }
            Some(_) => id_of(&document)
                .ok_or_else(|| ApiError::Store(format!("{}: _id must be an ObjectId", self.name)))?,
        };
        {
            let mut docs = self.docs.write();
            if docs.contains_key(&id) {
                return Err(ApiError::Duplicate(ID_FIELD.into()));
            }
            docs.insert(id, document.clone());
        }
        log::info!(target: "devcamper::audit", "insert collection={} id={}", self.name, id);
        Ok(document)
    }

    /// Merges `changes` into the stored document; a `null` value removes the field.
    /// `_id` is never changed. Returns the new version, or `None` if absent.
    pub fn update_document(&self, id: &DocumentId, changes: Document) -> Option<Document> {
        let updated = {
            let mut docs = self.docs.write();
            let doc = docs.get_mut(id)?;
            for (k, v) in changes {
                if k == ID_FIELD {
                    continue;
                }
                if v == Bson::Null {
                    doc.remove(&k);
                } else {
                    doc.insert(k, v);
                }
            }
            doc.clone()
        };
        log::info!(target: "devcamper::audit", "update collection={} id={}", self.name, id);
        Some(updated)
    }

    pub fn delete_document(&self, id: &DocumentId) -> bool {
        let removed = self.docs.write().remove(id).is_some();
        if removed {
            log::info!(target: "devcamper::audit", "delete collection={} id={}", self.name, id);
        }
        removed
    }

    /// Deletes every document for which `pred` holds and returns how many went.
    pub fn delete_where(&self, pred: impl Fn(&Document) -> bool) -> u64 {
        let removed: Vec<DocumentId> = {
            let mut docs = self.docs.write();
            let ids: Vec<DocumentId> =
                docs.iter().filter(|(_, d)| pred(d)).map(|(id, _)| *id).collect();
            for id in &ids {
                docs.remove(id);
            }
            ids
        };
        for id in &removed {
            log::info!(target: "devcamper::audit", "delete collection={} id={}", self.name, id);
        }
        removed.len() as u64
    }
}
