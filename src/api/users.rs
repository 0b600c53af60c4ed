//! Admin user management.

use super::{Api, Call, Reply, visible};
use crate::auth::hash_password;
use crate::errors::ApiError;
use crate::models::{ensure_unique, user};
use crate::store::DocumentStore;
use crate::types::{Role, USERS};
use serde_json::json;

const ADMIN: &[Role] = &[Role::Admin];

impl<S: DocumentStore> Api<S> {
    pub(super) async fn list_users(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        self.caller(call, ADMIN).await?;
        let env = self.list_query(&user::SCHEMA).build(self.store.as_ref(), &call.query, &call.ctx).await?;
        Ok(Reply::envelope(&env))
    }

    pub(super) async fn get_user(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        self.caller(call, ADMIN).await?;
        let (_, doc) = self.load(USERS, raw_id).await?;
        Ok(Reply::data(visible(&user::SCHEMA, doc)))
    }

    pub(super) async fn create_user(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let admin = self.caller(call, ADMIN).await?;
        let stored = self.insert_user(&call.json()?).await?;
        log::info!(target: "devcamper::audit", "user created by admin {}", admin.id);
        Ok(Reply::created(visible(&user::SCHEMA, stored)))
    }

    /// Admins may change anything but the password.
    pub(super) async fn update_user(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        self.caller(call, ADMIN).await?;
        let body = call.json()?;
        if body.get("password").is_some() {
            return Err(ApiError::Forbidden("Admins are not allowed to change user passwords".into()));
        }
        let (id, _) = self.load(USERS, raw_id).await?;
        let changes = user::SCHEMA.prepare_update(&body)?;
        ensure_unique(self.store.as_ref(), &user::SCHEMA, &changes, Some(id)).await?;
        let updated = self
            .store
            .update(USERS, id, changes)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{USERS} {id}")))?;
        Ok(Reply::data(visible(&user::SCHEMA, updated)))
    }

    pub(super) async fn delete_user(&self, raw_id: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let admin = self.caller(call, ADMIN).await?;
        let (id, _) = self.load(USERS, raw_id).await?;
        self.store.delete(USERS, id).await?;
        log::info!(target: "devcamper::audit", "user {id} deleted by admin {}", admin.id);
        Ok(Reply::data(json!({})))
    }

    /// Validates, checks email uniqueness, hashes the password and stores a new user.
    pub(super) async fn insert_user(&self, body: &serde_json::Value) -> Result<crate::document::Document, ApiError> {
        let mut doc = user::SCHEMA.prepare_insert(body)?;
        ensure_unique(self.store.as_ref(), &user::SCHEMA, &doc, None).await?;
        let password = doc.get_str("password").ok().map(hash_password).transpose()?;
        if let Some(hash) = password {
            doc.insert("password", hash);
        }
        self.store.insert(USERS, doc).await
    }
}
