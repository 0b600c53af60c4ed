//! Signed bearer tokens.
//!
//! Wire form is `hex(claims JSON) "." hex(ECDSA P-256 signature)`; the signature covers
//! the claims bytes.

use crate::errors::ApiError;
use crate::types::DocumentId;
use chrono::{Duration, Utc};
use p256::ecdsa::{
    Signature, SigningKey, VerifyingKey,
    signature::{Signer, Verifier},
};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id (hex ObjectId).
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    signing: SigningKey,
    verifying: VerifyingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

/// A fresh P-256 private key as PKCS#8 PEM.
///
/// # Errors
/// `ApiError::Crypto` if encoding fails.
pub fn generate_key_pem() -> Result<String, ApiError> {
    use p256::elliptic_curve::rand_core::OsRng;
    let sk = SigningKey::random(&mut OsRng);
    sk.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| ApiError::Crypto(format!("PEM encode: {e}")))
}

impl TokenSigner {
    /// # Errors
    /// `ApiError::Config` if the PEM is not a P-256 PKCS#8 private key.
    pub fn from_pem(pem: &str, expire_days: u32) -> Result<Self, ApiError> {
        let signing = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| ApiError::Config(format!("token key: {e}")))?;
        Ok(Self::from_key(signing, expire_days))
    }

    /// Signer with a key that lives only as long as the process.
    #[must_use]
    pub fn ephemeral(expire_days: u32) -> Self {
        use p256::elliptic_curve::rand_core::OsRng;
        Self::from_key(SigningKey::random(&mut OsRng), expire_days)
    }

    fn from_key(signing: SigningKey, expire_days: u32) -> Self {
        let verifying = VerifyingKey::from(&signing);
        Self { signing, verifying, ttl: Duration::days(i64::from(expire_days)) }
    }

    /// # Errors
    /// `ApiError::Json` if the claims cannot be serialized.
    pub fn sign(&self, user: DocumentId) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.to_hex(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        let body = serde_json::to_vec(claims)?;
        let sig: Signature = self.signing.sign(&body);
        Ok(format!("{}.{}", hex::encode(&body), hex::encode(sig.to_bytes())))
    }

    /// Checks signature and expiry and returns the user id.
    ///
    /// # Errors
    /// `ApiError::Unauthorized` for anything malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<DocumentId, ApiError> {
        let (body_hex, sig_hex) = token.split_once('.').ok_or_else(ApiError::not_authorized)?;
        let body = hex::decode(body_hex).map_err(|_| ApiError::not_authorized())?;
        let sig_bytes = hex::decode(sig_hex).map_err(|_| ApiError::not_authorized())?;
        let sig = Signature::from_slice(&sig_bytes).map_err(|_| ApiError::not_authorized())?;
        self.verifying.verify(&body, &sig).map_err(|_| ApiError::not_authorized())?;
        let claims: Claims = serde_json::from_slice(&body).map_err(|_| ApiError::not_authorized())?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(ApiError::not_authorized());
        }
        DocumentId::parse_str(&claims.id).map_err(|_| ApiError::not_authorized())
    }
}
