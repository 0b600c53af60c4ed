use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Query error: {0}")]
    Query(String),

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Duplicate field value entered: {0}")]
    Duplicate(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ApiError {
    /// Shorthand for the 401 every guard returns.
    #[must_use]
    pub fn not_authorized() -> Self {
        Self::Unauthorized("Not authorized to access this route".into())
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Query(_)
            | Self::Validation(_)
            | Self::Duplicate(_)
            | Self::BadRequest(_)
            | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // 499: client closed request
            Self::Cancelled(_) => StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
            Self::Store(_) | Self::Config(_) | Self::Crypto(_) | Self::Io(_) | Self::Toml(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to API clients. Server-side failures are not leaked verbatim.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Resource not found".into(),
            Self::Duplicate(_) => "Duplicate field value entered".into(),
            e if e.status_code().is_server_error() => "Server Error".into(),
            e => e.to_string(),
        }
    }
}
