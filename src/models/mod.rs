//! Collection schemas.

pub mod bootcamp;
pub mod course;
pub mod review;
mod schema;
pub mod user;

pub use schema::{DefaultValue, FieldDef, FieldKind, Schema};

use crate::document::{Document, id_of};
use crate::errors::ApiError;
use crate::query::{Filter, FindOptions};
use crate::store::DocumentStore;
use crate::types::DocumentId;
use bson::Bson;

pub(crate) const EMAIL_PATTERN: &str = r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$";

/// Looks up the schema of a known collection.
#[must_use]
pub fn schema_for(collection: &str) -> Option<&'static Schema> {
    [&bootcamp::SCHEMA, &course::SCHEMA, &review::SCHEMA, &user::SCHEMA]
        .into_iter()
        .find(|s| s.collection == collection)
}

/// Fails with `Duplicate` if another document already holds one of the unique values in `doc`.
///
/// # Errors
/// `ApiError::Duplicate` naming the field, or any store error.
pub async fn ensure_unique<S: DocumentStore>(
    store: &S,
    schema: &Schema,
    doc: &Document,
    except: Option<DocumentId>,
) -> Result<(), ApiError> {
    for field in schema.unique_fields() {
        let Some(value) = doc.get(field) else { continue };
        if *value == Bson::Null {
            continue;
        }
        let opts = FindOptions { limit: Some(2), ..FindOptions::default() };
        let holders = store.find(schema.collection, &Filter::eq(field, value.clone()), &opts).await?;
        if holders.iter().any(|d| except.is_none() || id_of(d) != except) {
            return Err(ApiError::Duplicate(field.to_string()));
        }
    }
    Ok(())
}
