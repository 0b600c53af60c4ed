use super::{Api, Call, Reply, visible, with_field};
use crate::auth::ensure_owner;
use crate::document::ID_FIELD;
use crate::errors::ApiError;
use crate::models::{bootcamp, ensure_unique};
use crate::query::{Filter, FindOptions, Populate, miles_to_radians};
use crate::services::{cascade, slugify};
use crate::store::DocumentStore;
use crate::types::{BOOTCAMPS, COURSES, Role};
use bson::Bson;
use serde_json::json;

impl<S: DocumentStore> Api<S> {
    pub(super) async fn list_bootcamps(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let env = self
            .list_query(&bootcamp::SCHEMA)
            .populate(Populate::reverse("courses", COURSES, "bootcamp", &[]))
            .build(self.store.as_ref(), &call.query, &call.ctx)
            .await?;
        Ok(Reply::envelope(&env))
    }

    pub(super) async fn get_bootcamp(&self, raw_id: &str) -> Result<Reply, ApiError> {
        let (_, doc) = self.load(BOOTCAMPS, raw_id).await?;
        Ok(Reply::data(visible(&bootcamp::SCHEMA, doc)))
    }

    pub(super) async fn create_bootcamp(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        if user.role != Role::Admin {
            let owned = self.store.count(BOOTCAMPS, &Filter::eq("user", user.id)).await?;
            if owned > 0 {
                return Err(ApiError::BadRequest(format!(
                    "The user with ID {} has already published a bootcamp",
                    user.id
                )));
            }
        }
        let body = with_field(call.json()?, "user", user.id.to_hex());
        let mut doc = bootcamp::SCHEMA.prepare_insert(&body)?;
        ensure_unique(self.store.as_ref(), &bootcamp::SCHEMA, &doc, None).await?;
        let slug = doc.get_str("name").ok().map(slugify);
        if let Some(slug) = slug {
            doc.insert("slug", slug);
        }
        let address = doc.get_str("address").ok().map(str::to_string);
        if let Some(address) = address {
            doc.insert("location", self.geocoder.geocode(&address)?.to_document());
            doc.remove("address");
        }
        let stored = self.store.insert(BOOTCAMPS, doc).await?;
        log::info!(target: "devcamper::audit", "bootcamp created by {}", user.id);
        Ok(Reply::created(visible(&bootcamp::SCHEMA, stored)))
    }

    pub(super) async fn update_bootcamp(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        let (id, existing) = self.load(BOOTCAMPS, raw_id).await?;
        ensure_owner(&user, &existing, "update this bootcamp")?;
        let mut changes = bootcamp::SCHEMA.prepare_update(&call.json()?)?;
        ensure_unique(self.store.as_ref(), &bootcamp::SCHEMA, &changes, Some(id)).await?;
        let slug = changes.get_str("name").ok().map(slugify);
        if let Some(slug) = slug {
            changes.insert("slug", slug);
        }
        let updated = self
            .store
            .update(BOOTCAMPS, id, changes)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{BOOTCAMPS} {id}")))?;
        Ok(Reply::data(visible(&bootcamp::SCHEMA, updated)))
    }

    pub(super) async fn delete_bootcamp(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        let (id, existing) = self.load(BOOTCAMPS, raw_id).await?;
        ensure_owner(&user, &existing, "delete this bootcamp")?;
        cascade::delete_bootcamp(self.store.as_ref(), id).await?;
        log::info!(target: "devcamper::audit", "bootcamp {id} deleted by {}", user.id);
        Ok(Reply::data(json!({})))
    }

    /// Bootcamps whose location lies within `distance` miles of the zipcode's center.
    pub(super) async fn bootcamps_in_radius(&self, zipcode: &str, distance: &str) -> Result<Reply, ApiError> {
        let miles = distance
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| ApiError::Query(format!("distance must be a non-negative number, got \"{distance}\"")))?;
        let place = self.geocoder.geocode(zipcode)?;
        let [lng, lat] = place
            .coordinates
            .ok_or_else(|| ApiError::BadRequest(format!("Could not locate zipcode {zipcode}")))?;
        let filter = Filter::Within {
            path: "location.coordinates".into(),
            lng,
            lat,
            radius: miles_to_radians(miles),
        };
        let opts = FindOptions { hidden: bootcamp::SCHEMA.hidden_fields(), ..FindOptions::default() };
        let found = self.store.find(BOOTCAMPS, &filter, &opts).await?;
        let data: Vec<_> = found.into_iter().map(|d| visible(&bootcamp::SCHEMA, d)).collect();
        Ok(Reply::ok(json!({"success": true, "count": data.len(), "data": data})))
    }
}

/// Populates a course or review with its bootcamp's name and description.
pub(super) fn bootcamp_summary() -> Populate {
    Populate::reference("bootcamp", BOOTCAMPS, &["name", "description"])
}

/// Id of the bootcamp a course or review belongs to.
pub(super) fn parent_of(doc: &crate::document::Document) -> Option<crate::types::DocumentId> {
    match doc.get("bootcamp") {
        Some(Bson::ObjectId(id)) => Some(*id),
        Some(Bson::Document(d)) => match d.get(ID_FIELD) {
            Some(Bson::ObjectId(id)) => Some(*id),
            _ => None,
        },
        _ => None,
    }
}
