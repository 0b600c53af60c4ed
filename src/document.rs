//! Documents are plain BSON documents carrying an `_id` and a `createdAt` stamp.
//!
//! API bodies arrive and leave as JSON; the helpers here convert between the two
//! representations so that ids render as hex strings and dates as RFC 3339.

use crate::errors::ApiError;
use crate::types::DocumentId;
use bson::Bson;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

pub type Document = bson::Document;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT: &str = "createdAt";

pub(crate) const MAX_PATH_DEPTH: usize = 32;

#[must_use]
pub fn id_of(doc: &Document) -> Option<DocumentId> {
    match doc.get(ID_FIELD) {
        Some(Bson::ObjectId(id)) => Some(*id),
        _ => None,
    }
}

/// Resolves a dotted path (`location.state`) inside a document.
#[must_use]
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut depth = 0usize;
    while let Some(part) = parts.next() {
        depth += 1;
        if depth > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

#[must_use]
pub fn now() -> bson::DateTime {
    bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

#[must_use]
pub fn to_chrono(dt: bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
}

#[must_use]
pub fn from_chrono(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

/// Converts a JSON request body into a document.
///
/// # Errors
/// Returns `ApiError::BadRequest` if the value is not a JSON object.
pub fn from_json(value: Value) -> Result<Document, ApiError> {
    if !value.is_object() {
        return Err(ApiError::BadRequest("request body must be a JSON object".into()));
    }
    match Bson::try_from(value) {
        Ok(Bson::Document(d)) => Ok(d),
        Ok(_) => Err(ApiError::BadRequest("request body must be a JSON object".into())),
        Err(e) => Err(ApiError::BadRequest(format!("invalid body: {e}"))),
    }
}

#[must_use]
pub fn to_json(doc: &Document) -> Value {
    let map = doc.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect();
    Value::Object(map)
}

#[must_use]
pub fn bson_to_json(v: &Bson) -> Value {
    match v {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => to_chrono(*dt).map_or(Value::Null, |d| {
            Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))
        }),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => to_json(d),
        other => serde_json::to_value(other).unwrap_or(Value::Null),
    }
}
