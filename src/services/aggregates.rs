//! Derived bootcamp fields recomputed after course and review writes.

use crate::errors::ApiError;
use crate::query::{Filter, FindOptions};
use crate::store::DocumentStore;
use crate::types::{BOOTCAMPS, COURSES, DocumentId, REVIEWS};
use bson::{Bson, doc};

#[allow(clippy::cast_precision_loss)]
async fn numbers<S: DocumentStore>(
    store: &S,
    collection: &str,
    bootcamp: DocumentId,
    field: &str,
) -> Result<Vec<f64>, ApiError> {
    let opts = FindOptions { projection: Some(vec![field.to_string()]), ..FindOptions::default() };
    let docs = store.find(collection, &Filter::eq("bootcamp", bootcamp), &opts).await?;
    Ok(docs
        .iter()
        .filter_map(|d| match d.get(field) {
            Some(Bson::Double(f)) => Some(*f),
            Some(Bson::Int32(i)) => Some(f64::from(*i)),
            Some(Bson::Int64(i)) => Some(*i as f64),
            _ => None,
        })
        .collect())
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// `averageCost` = ceiling of the mean course tuition, 0 without courses.
///
/// # Errors
/// Store failures.
pub async fn update_average_cost<S: DocumentStore>(
    store: &S,
    bootcamp: DocumentId,
) -> Result<f64, ApiError> {
    let tuitions = numbers(store, COURSES, bootcamp, "tuition").await?;
    let cost = mean(&tuitions).map_or(0.0, f64::ceil);
    store.update(BOOTCAMPS, bootcamp, doc! {"averageCost": cost}).await?;
    log::debug!("bootcamp {bootcamp} averageCost={cost} over {} courses", tuitions.len());
    Ok(cost)
}

/// `averageRating` = mean review rating; the field is removed without reviews.
///
/// # Errors
/// Store failures.
pub async fn update_average_rating<S: DocumentStore>(
    store: &S,
    bootcamp: DocumentId,
) -> Result<Option<f64>, ApiError> {
    let ratings = numbers(store, REVIEWS, bootcamp, "rating").await?;
    let rating = mean(&ratings);
    let value = rating.map_or(Bson::Null, Bson::Double);
    store.update(BOOTCAMPS, bootcamp, doc! {"averageRating": value}).await?;
    log::debug!("bootcamp {bootcamp} averageRating={rating:?} over {} reviews", ratings.len());
    Ok(rating)
}
