use super::bootcamps::{bootcamp_summary, parent_of};
use super::{Api, Call, Reply, visible, with_field};
use crate::auth::ensure_owner;
use crate::errors::ApiError;
use crate::models::course;
use crate::query::Filter;
use crate::services::aggregates::update_average_cost;
use crate::store::DocumentStore;
use crate::types::{BOOTCAMPS, COURSES, Role, parse_id};
use serde_json::json;

impl<S: DocumentStore> Api<S> {
    /// All courses with their bootcamp's name and description, or the courses of one bootcamp.
    pub(super) async fn list_courses(&self, bootcamp: Option<&str>, call: &Call<'_>) -> Result<Reply, ApiError> {
        let query = self.list_query(&course::SCHEMA);
        let query = match bootcamp {
            Some(raw) => query.base_filter(Filter::eq("bootcamp", parse_id(raw)?)),
            None => query.populate(bootcamp_summary()),
        };
        let env = query.build(self.store.as_ref(), &call.query, &call.ctx).await?;
        Ok(Reply::envelope(&env))
    }

    pub(super) async fn get_course(&self, raw_id: &str) -> Result<Reply, ApiError> {
        let doc = self.fetch_one(&course::SCHEMA, parse_id(raw_id)?, Some(bootcamp_summary())).await?;
        Ok(Reply::data(visible(&course::SCHEMA, doc)))
    }

    pub(super) async fn add_course(&self, raw_bootcamp: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        let (bootcamp_id, bootcamp) = self.load(BOOTCAMPS, raw_bootcamp).await?;
        ensure_owner(&user, &bootcamp, &format!("add a course to bootcamp {bootcamp_id}"))?;
        let body = with_field(call.json()?, "bootcamp", bootcamp_id.to_hex());
        let body = with_field(body, "user", user.id.to_hex());
        let doc = course::SCHEMA.prepare_insert(&body)?;
        let stored = self.store.insert(COURSES, doc).await?;
        update_average_cost(self.store.as_ref(), bootcamp_id).await?;
        Ok(Reply::created(visible(&course::SCHEMA, stored)))
    }

    pub(super) async fn update_course(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        let (id, existing) = self.load(COURSES, raw_id).await?;
        ensure_owner(&user, &existing, &format!("update course {id}"))?;
        let changes = course::SCHEMA.prepare_update(&call.json()?)?;
        let updated = self
            .store
            .update(COURSES, id, changes)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{COURSES} {id}")))?;
        if let Some(bootcamp) = parent_of(&updated) {
            update_average_cost(self.store.as_ref(), bootcamp).await?;
        }
        Ok(Reply::data(visible(&course::SCHEMA, updated)))
    }

    pub(super) async fn delete_course(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let user = self.caller(call, &[Role::Publisher, Role::Admin]).await?;
        let (id, existing) = self.load(COURSES, raw_id).await?;
        ensure_owner(&user, &existing, &format!("delete course {id}"))?;
        self.store.delete(COURSES, id).await?;
        if let Some(bootcamp) = parent_of(&existing) {
            update_average_cost(self.store.as_ref(), bootcamp).await?;
        }
        Ok(Reply::data(json!({})))
    }
}
