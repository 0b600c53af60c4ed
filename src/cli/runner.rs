use crate::api::Api;
use crate::auth::{generate_key_pem, hash_password};
use crate::errors::ApiError;
use crate::models::schema_for;
use crate::query::{QueryBuilder, QueryContext, QueryParams};
use crate::seed::{SeedOptions, SeedReport, import_ndjson};
use crate::store::MemoryStore;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Request;
use serde_json::Value;
use std::path::PathBuf;

use super::command::Command;
use super::util::parse_method;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Pretty,
    Compact,
}

fn render(v: &Value, mode: OutputMode) -> String {
    match mode {
        OutputMode::Pretty => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
        OutputMode::Compact => v.to_string(),
    }
}

/// Loads every `(collection, file)` pair into `store`, in order.
///
/// # Errors
/// The first file that cannot be opened or imported.
pub fn seed_store(
    store: &MemoryStore,
    seeds: &[(String, PathBuf)],
    opts: &SeedOptions,
) -> Result<SeedReport, ApiError> {
    let mut total = SeedReport::default();
    for (collection, path) in seeds {
        let file = std::fs::File::open(path)
            .map_err(|e| ApiError::BadRequest(format!("seed file {}: {e}", path.display())))?;
        let mut report = SeedReport::default();
        import_ndjson(store, collection, file, opts, &mut report)?;
        total.inserted += report.inserted;
        total.skipped += report.skipped;
    }
    Ok(total)
}

/// Runs one command and returns what the binary prints.
///
/// # Errors
/// Whatever the command fails with. A request that reaches the dispatcher never fails
/// here; its status and error body are part of the output.
pub async fn run(api: &Api<MemoryStore>, cmd: Command, mode: OutputMode) -> Result<String, ApiError> {
    match cmd {
        Command::Query { collection, params } => {
            let cfg = api.config();
            let query = match schema_for(&collection) {
                Some(schema) => QueryBuilder::for_schema(schema),
                None => QueryBuilder::new(&collection),
            };
            let mut ctx = QueryContext::default();
            if let Some(t) = cfg.query_timeout() {
                ctx = ctx.with_timeout(t);
            }
            let env = query
                .limits(cfg.default_limit, cfg.max_limit)
                .build(api.store(), &QueryParams::parse(&params), &ctx)
                .await?;
            Ok(render(&env.to_json(), mode))
        }
        Command::Request { method, path, body, token } => {
            let mut builder = Request::builder().method(parse_method(&method)?).uri(path.as_str());
            if let Some(t) = token {
                builder = builder.header(AUTHORIZATION, format!("Bearer {t}"));
            }
            if body.is_some() {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            let req = builder
                .body(body.unwrap_or_default().into_bytes())
                .map_err(|e| ApiError::BadRequest(format!("invalid request: {e}")))?;
            let resp = api.handle(req).await;
            let body: Value = serde_json::from_slice(resp.body())?;
            Ok(format!("{}\n{}", resp.status().as_u16(), render(&body, mode)))
        }
        Command::Keygen => generate_key_pem(),
        Command::HashPassword { password } => hash_password(&password),
    }
}
