use super::bootcamps::{bootcamp_summary, parent_of};
use super::{Api, Call, Reply, visible, with_field};
use crate::auth::ensure_owner;
use crate::errors::ApiError;
use crate::models::review;
use crate::query::Filter;
use crate::services::aggregates::update_average_rating;
use crate::store::DocumentStore;
use crate::types::{BOOTCAMPS, REVIEWS, Role, parse_id};
use serde_json::json;

impl<S: DocumentStore> Api<S> {
    pub(super) async fn list_reviews(&self, bootcamp: Option<&str>, call: &Call<'_>) -> Result<Reply, ApiError> {
        let query = self.list_query(&review::SCHEMA);
        let query = match bootcamp {
            Some(raw) => query.base_filter(Filter::eq("bootcamp", parse_id(raw)?)),
            None => query.populate(bootcamp_summary()),
        };
        let env = query.build(self.store.as_ref(), &call.query, &call.ctx).await?;
        Ok(Reply::envelope(&env))
    }

    pub(super) async fn get_review(&self, raw_id: &str) -> Result<Reply, ApiError> {
        let doc = self.fetch_one(&review::SCHEMA, parse_id(raw_id)?, Some(bootcamp_summary())).await?;
        Ok(Reply::data(visible(&review::SCHEMA, doc)))
    }

    /// One review per user and bootcamp.
    pub(super) async fn add_review(&self, raw_bootcamp: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::User, Role::Admin]).await?;
        let (bootcamp_id, _) = self.load(BOOTCAMPS, raw_bootcamp).await?;
        let mine = Filter::eq("bootcamp", bootcamp_id).and(Filter::eq("user", user.id));
        if self.store.count(REVIEWS, &mine).await? > 0 {
            return Err(ApiError::Duplicate("bootcamp, user".into()));
        }
        let body = with_field(call.json()?, "bootcamp", bootcamp_id.to_hex());
        let body = with_field(body, "user", user.id.to_hex());
        let doc = review::SCHEMA.prepare_insert(&body)?;
        let stored = self.store.insert(REVIEWS, doc).await?;
        update_average_rating(self.store.as_ref(), bootcamp_id).await?;
        Ok(Reply::created(visible(&review::SCHEMA, stored)))
    }

    pub(super) async fn update_review(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::User, Role::Admin]).await?;
        let (id, existing) = self.load(REVIEWS, raw_id).await?;
        ensure_owner(&user, &existing, "update review")?;
        let changes = review::SCHEMA.prepare_update(&call.json()?)?;
        let updated = self
            .store
            .update(REVIEWS, id, changes)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{REVIEWS} {id}")))?;
        if let Some(bootcamp) = parent_of(&updated) {
            update_average_rating(self.store.as_ref(), bootcamp).await?;
        }
        Ok(Reply::data(visible(&review::SCHEMA, updated)))
    }

    pub(super) async fn delete_review(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::User, Role::Admin]).await?;
        let (id, existing) = self.load(REVIEWS, raw_id).await?;
        ensure_owner(&user, &existing, "delete review")?;
        self.store.delete(REVIEWS, id).await?;
        if let Some(bootcamp) = parent_of(&existing) {
            update_average_rating(self.store.as_ref(), bootcamp).await?;
        }
        Ok(Reply::data(json!({})))
    }
}
