//! Registration, login and password management.

use super::{Api, Call, Reply, visible};
use crate::auth::{hash_password, hash_reset_token, new_reset_token, verify_password};
use crate::document::{Document, id_of, now};
use crate::errors::ApiError;
use crate::models::{ensure_unique, user};
use crate::query::{CmpOp, Filter, FindOptions};
use crate::services::Message;
use crate::store::DocumentStore;
use crate::types::{DocumentId, USERS};
use bson::{Bson, doc};
use serde_json::{Value, json};

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".into())
}

fn body_str<'v>(body: &'v Value, key: &str) -> Option<&'v str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

impl<S: DocumentStore> Api<S> {
    fn token_reply(&self, user: &Document) -> Result<Reply, ApiError> {
        let id = id_of(user).ok_or_else(|| ApiError::Store("stored user has no _id".into()))?;
        Ok(Reply::token(self.signer.sign(id)?))
    }

    async fn find_user(&self, filter: &Filter) -> Result<Option<Document>, ApiError> {
        let opts = FindOptions { limit: Some(1), ..FindOptions::default() };
        Ok(self.store.find(USERS, filter, &opts).await?.into_iter().next())
    }

    /// Hashes and stores a new password, clearing any pending reset.
    async fn set_password(&self, id: DocumentId, password: &str) -> Result<Document, ApiError> {
        user::SCHEMA.prepare_update(&json!({"password": password}))?;
        let changes = doc! {
            "password": hash_password(password)?,
            "resetPasswordToken": Bson::Null,
            "resetPasswordExpire": Bson::Null,
        };
        self.store
            .update(USERS, id, changes)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{USERS} {id}")))
    }

    pub(super) async fn register(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let body = call.json()?;
        let allowed = ["name", "email", "password", "role"];
        let body: serde_json::Map<String, Value> = body
            .as_object()
            .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".into()))?
            .iter()
            .filter(|(k, _)| allowed.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let stored = self.insert_user(&Value::Object(body)).await?;
        log::info!(target: "devcamper::audit", "user registered: {}", stored.get_str("email").unwrap_or_default());
        self.token_reply(&stored)
    }

    pub(super) async fn login(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let body = call.json()?;
        let (Some(email), Some(password)) = (body_str(&body, "email"), body_str(&body, "password")) else {
            return Err(ApiError::BadRequest("Please provide an email and password".into()));
        };
        let user = self.find_user(&Filter::eq("email", email)).await?.ok_or_else(invalid_credentials)?;
        let stored = user.get_str("password").unwrap_or_default();
        if !verify_password(password, stored) {
            return Err(invalid_credentials());
        }
        self.token_reply(&user)
    }

    pub(super) async fn me(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let me = self.caller(call, &[]).await?;
        Ok(Reply::data(visible(&user::SCHEMA, me.doc)))
    }

    /// Only `name` and `email` can be changed here.
    pub(super) async fn update_details(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let me = self.caller(call, &[]).await?;
        let body = call.json()?;
        let mut fields = serde_json::Map::new();
        for key in ["name", "email"] {
            if let Some(v) = body.get(key) {
                fields.insert(key.to_string(), v.clone());
            }
        }
        let changes = user::SCHEMA.prepare_update(&Value::Object(fields))?;
        ensure_unique(self.store.as_ref(), &user::SCHEMA, &changes, Some(me.id)).await?;
        let updated = self
            .store
            .update(USERS, me.id, changes)
            .await?
            .ok_or_else(ApiError::not_authorized)?;
        Ok(Reply::data(visible(&user::SCHEMA, updated)))
    }

    pub(super) async fn update_password(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let me = self.caller(call, &[]).await?;
        let body = call.json()?;
        let current = body_str(&body, "currentPassword").unwrap_or_default();
        if !verify_password(current, me.doc.get_str("password").unwrap_or_default()) {
            return Err(ApiError::Unauthorized("Password is incorrect".into()));
        }
        let new = body_str(&body, "newPassword").unwrap_or_default();
        let updated = self.set_password(me.id, new).await?;
        self.token_reply(&updated)
    }

    /// Stores a hashed reset token and mails the raw one to the user.
    pub(super) async fn forgot_password(&self, call: &Call<'_>) -> Result<Reply, ApiError> {
        let body = call.json()?;
        let email = body_str(&body, "email").unwrap_or_default();
        let user = self
            .find_user(&Filter::eq("email", email))
            .await?
            .ok_or_else(|| ApiError::NotFound("There is no user with that email".into()))?;
        let id = id_of(&user).ok_or_else(|| ApiError::Store("stored user has no _id".into()))?;
        let reset = new_reset_token(self.config.reset_token_minutes);
        self.store
            .update(USERS, id, doc! {"resetPasswordToken": reset.hashed.clone(), "resetPasswordExpire": reset.expires})
            .await?;
        let url = format!("http://{}/api/v1/auth/resetpassword/{}", call.host, reset.token);
        let message = Message {
            to: email.to_string(),
            subject: "Password reset token".into(),
            text: format!(
                "You are receiving this email because you (or someone else) has requested the reset of a password. Please make a PUT request to: \n\n {url}"
            ),
        };
        if let Err(e) = self.mailer.send(&message) {
            log::error!("reset mail to {email} failed: {e}");
            self.store
                .update(USERS, id, doc! {"resetPasswordToken": Bson::Null, "resetPasswordExpire": Bson::Null})
                .await?;
            return Err(ApiError::Store("Email could not be sent".into()));
        }
        Ok(Reply::data(json!("Email sent")))
    }

    pub(super) async fn reset_password(&self, token: &str, call: &Call<'_>) -> Result<Reply, ApiError> {
        let pending = Filter::eq("resetPasswordToken", hash_reset_token(token)).and(Filter::Cmp {
            path: "resetPasswordExpire".into(),
            op: CmpOp::Gt,
            value: Bson::DateTime(now()),
        });
        let user = self
            .find_user(&pending)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Invalid token".into()))?;
        let id = id_of(&user).ok_or_else(|| ApiError::Store("stored user has no _id".into()))?;
        let body = call.json()?;
        let updated = self.set_password(id, body_str(&body, "password").unwrap_or_default()).await?;
        log::info!(target: "devcamper::audit", "password reset for user {id}");
        self.token_reply(&updated)
    }
}
