use crate::errors::ApiError;
use http::Method;
use std::path::PathBuf;

/// `collection=path/to/file.ndjson`
///
/// # Errors
/// `BadRequest` when either side is missing.
pub fn parse_seed_spec(s: &str) -> Result<(String, PathBuf), ApiError> {
    match s.split_once('=') {
        Some((col, path)) if !col.trim().is_empty() && !path.trim().is_empty() => {
            Ok((col.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(ApiError::BadRequest(format!("seed must be COLLECTION=FILE, got \"{s}\""))),
    }
}

/// # Errors
/// `BadRequest` for anything but GET, POST, PUT or DELETE.
pub fn parse_method(s: &str) -> Result<Method, ApiError> {
    match s.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(ApiError::BadRequest(format!("unsupported method {other}"))),
    }
}
