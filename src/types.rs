use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type DocumentId = ObjectId;

pub const BOOTCAMPS: &str = "bootcamps";
pub const COURSES: &str = "courses";
pub const REVIEWS: &str = "reviews";
pub const USERS: &str = "users";

/// Access role carried by a user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Publisher => "publisher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "publisher" => Ok(Self::Publisher),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Parses a path/body id; anything that is not a 24-char hex ObjectId is treated as not found.
///
/// # Errors
/// Returns `ApiError::NotFound` when `raw` is not a valid ObjectId.
pub fn parse_id(raw: &str) -> Result<DocumentId, crate::errors::ApiError> {
    ObjectId::parse_str(raw).map_err(|_| crate::errors::ApiError::NotFound(raw.to_string()))
}
