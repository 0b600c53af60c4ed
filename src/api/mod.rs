//! Transport-agnostic HTTP dispatcher for `/api/v1`.
//!
//! `Api::handle` takes an `http::Request` with a byte body and always answers with a JSON
//! `http::Response`; errors are rendered as `{success: false, error}` with the status of
//! their `ApiError` variant.

// Submodules for separation of concerns
mod auth;
mod bootcamps;
mod courses;
mod response;
mod reviews;
mod users;

pub use response::{Reply, error_response, json_response, visible};

use crate::auth::{CurrentUser, TokenSigner, authorize, protect};
use crate::config::AppConfig;
use crate::document::{Document, ID_FIELD};
use crate::errors::ApiError;
use crate::models::Schema;
use crate::query::{Filter, FindOptions, Populate, QueryBuilder, QueryContext, QueryParams};
use crate::services::{Geocoder, LogMailer, Mailer, OfflineGeocoder};
use crate::store::DocumentStore;
use crate::types::{DocumentId, Role, parse_id};
use http::header::{AUTHORIZATION, HOST};
use http::{Method, Request, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

const PREFIX: [&str; 2] = ["api", "v1"];

/// Request parts a handler needs.
pub(crate) struct Call<'r> {
    pub query: QueryParams,
    pub body: &'r [u8],
    pub authorization: Option<&'r str>,
    pub host: &'r str,
    pub ctx: QueryContext,
}

impl Call<'_> {
    /// The JSON body; an empty body reads as `{}`.
    pub fn json(&self) -> Result<Value, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_slice(self.body)?)
    }
}

pub struct Api<S: DocumentStore> {
    store: Arc<S>,
    signer: TokenSigner,
    geocoder: Arc<dyn Geocoder>,
    mailer: Arc<dyn Mailer>,
    config: AppConfig,
}

impl<S: DocumentStore> Api<S> {
    /// Wires the dispatcher from configuration: the token key (or a per-process one),
    /// the offline geocoder over `zipcodes` and the logging mailer.
    ///
    /// # Errors
    /// `Config` if `token_key_pem` is set but not a valid P-256 PKCS#8 key.
    pub fn new(store: Arc<S>, config: AppConfig) -> Result<Self, ApiError> {
        let signer = match &config.token_key_pem {
            Some(pem) => TokenSigner::from_pem(pem, config.token_expire_days)?,
            None => {
                log::warn!("no token key configured; tokens will not survive a restart");
                TokenSigner::ephemeral(config.token_expire_days)
            }
        };
        Ok(Self {
            geocoder: Arc::new(OfflineGeocoder::new(config.zipcodes.clone())),
            mailer: Arc::new(LogMailer::new(&config.mail_from_name, &config.mail_from_email)),
            store,
            signer,
            config,
        })
    }

    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn handle(&self, req: Request<Vec<u8>>) -> Response<Vec<u8>> {
        self.handle_with(req, QueryContext::default()).await
    }

    /// Like `handle`, with the caller's deadline and cancellation applied to list queries.
    /// A context without a timeout falls back to `query_timeout_ms`.
    pub async fn handle_with(&self, req: Request<Vec<u8>>, mut ctx: QueryContext) -> Response<Vec<u8>> {
        let started = Instant::now();
        if ctx.timeout.is_none() {
            ctx.timeout = self.config.query_timeout();
        }
        let call = Call {
            query: QueryParams::parse(req.uri().query().unwrap_or("")),
            body: req.body(),
            authorization: req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            host: req.headers().get(HOST).and_then(|v| v.to_str().ok()).unwrap_or("localhost"),
            ctx,
        };
        let path = req.uri().path();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let result = match segments.strip_prefix(&PREFIX[..]) {
            Some(rest) => self.route(req.method(), rest, &call).await,
            None => Err(ApiError::NotFound(format!("route {path}"))),
        };
        let resp = match result {
            Ok(reply) => reply.into_response(),
            Err(e) => {
                if e.status_code().is_server_error() {
                    log::error!("{} {path}: {e}", req.method());
                } else {
                    log::debug!("{} {path}: {e}", req.method());
                }
                error_response(&e)
            }
        };
        log::info!("{} {path} {} in {:?}", req.method(), resp.status().as_u16(), started.elapsed());
        resp
    }

    async fn route(&self, method: &Method, rest: &[&str], call: &Call<'_>) -> Result<Reply, ApiError> {
        match (method, rest) {
            (&Method::GET, ["bootcamps"]) => self.list_bootcamps(call).await,
            (&Method::POST, ["bootcamps"]) => self.create_bootcamp(call).await,
            (&Method::GET, ["bootcamps", "radius", zipcode, distance]) => {
                self.bootcamps_in_radius(zipcode, distance).await
            }
            (&Method::GET, ["bootcamps", id]) => self.get_bootcamp(id).await,
            (&Method::PUT, ["bootcamps", id]) => self.update_bootcamp(id, call).await,
            (&Method::DELETE, ["bootcamps", id]) => self.delete_bootcamp(id, call).await,
            (&Method::GET, ["bootcamps", id, "courses"]) => self.list_courses(Some(id), call).await,
            (&Method::POST, ["bootcamps", id, "courses"]) => self.add_course(id, call).await,
            (&Method::GET, ["bootcamps", id, "reviews"]) => self.list_reviews(Some(id), call).await,
            (&Method::POST, ["bootcamps", id, "reviews"]) => self.add_review(id, call).await,

            (&Method::GET, ["courses"]) => self.list_courses(None, call).await,
            (&Method::GET, ["courses", id]) => self.get_course(id).await,
            (&Method::PUT, ["courses", id]) => self.update_course(id, call).await,
            (&Method::DELETE, ["courses", id]) => self.delete_course(id, call).await,

            (&Method::GET, ["reviews"]) => self.list_reviews(None, call).await,
            (&Method::GET, ["reviews", id]) => self.get_review(id).await,
            (&Method::PUT, ["reviews", id]) => self.update_review(id, call).await,
            (&Method::DELETE, ["reviews", id]) => self.delete_review(id, call).await,

            (&Method::POST, ["auth", "register"]) => self.register(call).await,
            (&Method::POST, ["auth", "login"]) => self.login(call).await,
            (&Method::GET, ["auth", "me"]) => self.me(call).await,
            (&Method::PUT, ["auth", "updatedetails"]) => self.update_details(call).await,
            (&Method::PUT, ["auth", "updatepassword"]) => self.update_password(call).await,
            (&Method::POST, ["auth", "forgotpassword"]) => self.forgot_password(call).await,
            (&Method::PUT, ["auth", "resetpassword", token]) => self.reset_password(token, call).await,

            (&Method::GET, ["users"]) => self.list_users(call).await,
            (&Method::POST, ["users"]) => self.create_user(call).await,
            (&Method::GET, ["users", id]) => self.get_user(id, call).await,
            (&Method::PUT, ["users", id]) => self.update_user(id, call).await,
            (&Method::DELETE, ["users", id]) => self.delete_user(id, call).await,

            _ => Err(ApiError::NotFound(format!("route {method} /{}", rest.join("/")))),
        }
    }

    /// `protect`, then the role gate when `roles` is non-empty.
    async fn caller(&self, call: &Call<'_>, roles: &[Role]) -> Result<CurrentUser, ApiError> {
        let user = protect(self.store.as_ref(), &self.signer, call.authorization).await?;
        if !roles.is_empty() {
            authorize(&user, roles)?;
        }
        Ok(user)
    }

    fn list_query<'a>(&self, schema: &'a Schema) -> QueryBuilder<'a> {
        QueryBuilder::for_schema(schema).limits(self.config.default_limit, self.config.max_limit)
    }

    /// One document by id, shaped like a list item; `NotFound` when absent.
    async fn fetch_one(
        &self,
        schema: &Schema,
        id: DocumentId,
        populate: Option<Populate>,
    ) -> Result<Document, ApiError> {
        let opts = FindOptions {
            hidden: schema.hidden_fields(),
            limit: Some(1),
            populate,
            ..FindOptions::default()
        };
        let mut found = self.store.find(schema.collection, &Filter::eq(ID_FIELD, id), &opts).await?;
        if found.is_empty() {
            return Err(ApiError::NotFound(format!("{} {id}", schema.collection)));
        }
        Ok(found.remove(0))
    }

    /// The stored document (hidden fields included) or `NotFound`.
    async fn load(&self, collection: &str, raw_id: &str) -> Result<(DocumentId, Document), ApiError> {
        let id = parse_id(raw_id)?;
        let doc = self
            .store
            .get(collection, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{collection} {id}")))?;
        Ok((id, doc))
    }
}

/// Sets `key` on a JSON object body; other bodies are left for validation to reject.
fn with_field(mut body: Value, key: &str, value: impl Into<Value>) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.insert(key.to_string(), value.into());
    }
    body
}
