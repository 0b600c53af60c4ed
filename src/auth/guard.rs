//! Authorization chain: bearer verification, role gate, ownership.

use super::token::TokenSigner;
use crate::document::{Document, get_path};
use crate::errors::ApiError;
use crate::store::DocumentStore;
use crate::types::{DocumentId, Role, USERS};
use bson::Bson;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: DocumentId,
    pub role: Role,
    pub doc: Document,
}

/// Resolves `Authorization: Bearer <token>` to the stored user.
///
/// # Errors
/// `Unauthorized` when the header is missing, the token does not verify or the user is
/// gone; store failures pass through.
pub async fn protect<S: DocumentStore>(
    store: &S,
    signer: &TokenSigner,
    authorization: Option<&str>,
) -> Result<CurrentUser, ApiError> {
    let token = authorization
        .filter(|h| h.starts_with("Bearer"))
        .and_then(|h| h.split(' ').nth(1))
        .filter(|t| !t.is_empty())
        .ok_or_else(ApiError::not_authorized)?;
    let id = signer.verify(token)?;
    let doc = store.get(USERS, id).await?.ok_or_else(ApiError::not_authorized)?;
    let role = doc.get_str("role").ok().and_then(|r| r.parse().ok()).unwrap_or(Role::User);
    Ok(CurrentUser { id, role, doc })
}

/// # Errors
/// `Forbidden` unless the caller's role is listed.
pub fn authorize(user: &CurrentUser, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )))
    }
}

/// Owner of a resource, read from its `user` field.
#[must_use]
pub fn owner_of(doc: &Document) -> Option<DocumentId> {
    match get_path(doc, "user") {
        Some(Bson::ObjectId(id)) => Some(*id),
        _ => None,
    }
}

/// # Errors
/// `Forbidden` unless the caller owns `doc` or is an admin.
pub fn ensure_owner(user: &CurrentUser, doc: &Document, action: &str) -> Result<(), ApiError> {
    if user.role == Role::Admin || owner_of(doc) == Some(user.id) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!("User {} is not authorized to {action}", user.id)))
}
