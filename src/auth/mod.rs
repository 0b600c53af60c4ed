//! Credentials, tokens and the authorization guards.

mod guard;
mod password;
mod reset;
mod token;

pub use guard::{CurrentUser, authorize, ensure_owner, owner_of, protect};
pub use password::{hash_password, is_phc_hash, verify_password};
pub use reset::{ResetToken, hash_reset_token, new_reset_token};
pub use token::{Claims, TokenSigner, generate_key_pem};
