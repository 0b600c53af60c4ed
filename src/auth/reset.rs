//! Password-reset tokens: the raw token goes to the user, only its SHA-256 is stored.

use chrono::{Duration, Utc};
use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Sent to the user.
    pub token: String,
    /// Stored as `resetPasswordToken`.
    pub hashed: String,
    /// Stored as `resetPasswordExpire`.
    pub expires: bson::DateTime,
}

#[must_use]
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[must_use]
pub fn new_reset_token(valid_minutes: u32) -> ResetToken {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let expires = Utc::now() + Duration::minutes(i64::from(valid_minutes));
    ResetToken {
        hashed: hash_reset_token(&token),
        token,
        expires: crate::document::from_chrono(expires),
    }
}
