//! NDJSON import into a `MemoryStore`.
//!
//! One JSON object per line. Ids and references given as hex strings become ObjectIds,
//! declared dates become BSON dates, and `createdAt` defaults to now. Seeding writes
//! directly to the store, so values outside the public write rules (an `admin` user)
//! can be loaded. Users' plain-text passwords are hashed; bootcamps get a slug and, when
//! a geocoder is supplied, a location in place of the address.

use crate::auth::{hash_password, is_phc_hash};
use crate::document::{CREATED_AT, Document, ID_FIELD, from_json, now};
use crate::errors::ApiError;
use crate::models::{FieldKind, schema_for};
use crate::services::{Geocoder, slugify};
use crate::store::MemoryStore;
use crate::types::{BOOTCAMPS, USERS};
use bson::Bson;
use bson::oid::ObjectId;
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SeedOptions {
    /// Skip unparseable lines instead of failing.
    pub skip_errors: bool,
    pub progress_every: Option<usize>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub skipped: u64,
}

/// # Errors
/// I/O failures; with `skip_errors` off, the first line that does not parse or insert,
/// as `BadRequest` naming the line.
pub fn import_ndjson<R: Read>(
    store: &MemoryStore,
    collection: &str,
    reader: R,
    opts: &SeedOptions,
    report: &mut SeedReport,
) -> Result<(), ApiError> {
    let col = store.collection_or_create(collection);
    let mut reader = BufReader::new(reader);
    let mut line_no: usize = 0;
    let mut buf = String::with_capacity(8 * 1024);
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let prepared = serde_json::from_str::<serde_json::Value>(line)
            .map_err(ApiError::from)
            .and_then(from_json)
            .and_then(|d| prepare_seed(collection, d, opts));
        match prepared.and_then(|d| col.insert_document(d)) {
            Ok(_) => {
                report.inserted += 1;
                if let Some(every) = opts.progress_every
                    && every > 0
                    && line_no % every == 0
                {
                    log::info!("imported {} records into {collection}", report.inserted);
                }
            }
            Err(e) if opts.skip_errors => {
                log::warn!("{collection} line {line_no} skipped: {e}");
                report.skipped += 1;
            }
            Err(e) => return Err(ApiError::BadRequest(format!("{collection} line {line_no}: {e}"))),
        }
    }
    log::info!(
        "seeded {collection}: {} inserted, {} skipped",
        report.inserted,
        report.skipped
    );
    Ok(())
}

fn prepare_seed(collection: &str, mut doc: Document, opts: &SeedOptions) -> Result<Document, ApiError> {
    if let Some(Bson::String(hex)) = doc.get(ID_FIELD) {
        let id = ObjectId::parse_str(hex)
            .map_err(|_| ApiError::BadRequest(format!("invalid _id \"{hex}\"")))?;
        doc.insert(ID_FIELD, id);
    }
    if let Some(schema) = schema_for(collection) {
        for f in schema.fields {
            let Some(Bson::String(raw)) = doc.get(f.name) else { continue };
            let typed = match f.kind {
                FieldKind::ObjectId => ObjectId::parse_str(raw).ok().map(Bson::ObjectId),
                FieldKind::Date => schema.coerce_filter_value(f.name, raw).ok(),
                _ => None,
            };
            if let Some(v) = typed {
                doc.insert(f.name, v);
            }
        }
    }
    if !doc.contains_key(CREATED_AT) {
        doc.insert(CREATED_AT, now());
    }
    match collection {
        USERS => {
            let plain = doc.get_str("password").ok().filter(|p| !is_phc_hash(p)).map(str::to_string);
            if let Some(pw) = plain {
                doc.insert("password", hash_password(&pw)?);
            }
        }
        BOOTCAMPS => {
            if let Some(slug) = doc.get_str("name").ok().map(slugify) {
                doc.insert("slug", slug);
            }
            let address = doc.get_str("address").ok().map(str::to_string);
            if let (Some(g), Some(address)) = (&opts.geocoder, address) {
                doc.insert("location", g.geocode(&address)?.to_document());
                doc.remove("address");
            }
        }
        _ => {}
    }
    Ok(doc)
}
