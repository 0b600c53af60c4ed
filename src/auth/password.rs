use crate::errors::ApiError;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use p256::elliptic_curve::rand_core::OsRng;

/// Argon2id hash in PHC string form (`$argon2id$v=19$...`).
///
/// # Errors
/// `ApiError::Crypto` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Crypto(format!("argon2: {e}")))
}

/// True when `password` matches the stored PHC hash. A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[must_use]
pub fn is_phc_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}
