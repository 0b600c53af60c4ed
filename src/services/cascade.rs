use crate::errors::ApiError;
use crate::query::Filter;
use crate::store::DocumentStore;
use crate::types::{BOOTCAMPS, COURSES, DocumentId, REVIEWS};

/// Removes a bootcamp together with its courses and reviews. Returns false if the
/// bootcamp did not exist.
///
/// # Errors
/// Store failures; dependents deleted before the failure stay deleted.
pub async fn delete_bootcamp<S: DocumentStore>(store: &S, id: DocumentId) -> Result<bool, ApiError> {
    let owned = Filter::eq("bootcamp", id);
    let courses = store.delete_many(COURSES, &owned).await?;
    log::info!("courses being removed from bootcamp {id}: {courses}");
    let reviews = store.delete_many(REVIEWS, &owned).await?;
    log::info!("reviews being removed from bootcamp {id}: {reviews}");
    store.delete(BOOTCAMPS, id).await
}
