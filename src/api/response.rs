use crate::document::{Document, to_json};
use crate::errors::ApiError;
use crate::models::Schema;
use crate::query::ResultEnvelope;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use serde_json::{Value, json};

/// Status plus JSON body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: StatusCode::OK, body }
    }

    /// `{success: true, data}` with 200.
    pub fn data(data: Value) -> Self {
        Self::ok(json!({"success": true, "data": data}))
    }

    /// `{success: true, data}` with 201.
    pub fn created(data: Value) -> Self {
        Self { status: StatusCode::CREATED, body: json!({"success": true, "data": data}) }
    }

    pub fn envelope(env: &ResultEnvelope) -> Self {
        Self::ok(env.to_json())
    }

    pub fn token(token: String) -> Self {
        Self::ok(json!({"success": true, "token": token}))
    }

    pub fn into_response(self) -> Response<Vec<u8>> {
        json_response(self.status, self.body.to_string())
    }
}

/// Document as returned to clients, without the schema's hidden fields.
pub fn visible(schema: &Schema, mut doc: Document) -> Value {
    for field in schema.hidden_fields() {
        doc.remove(&field);
    }
    to_json(&doc)
}

pub fn json_response(status: StatusCode, body: impl Into<Vec<u8>>) -> Response<Vec<u8>> {
    let mut resp = Response::new(body.into());
    *resp.status_mut() = status;
    resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

pub fn error_response(err: &ApiError) -> Response<Vec<u8>> {
    let body = json!({"success": false, "error": err.client_message()});
    json_response(err.status_code(), body.to_string())
}
