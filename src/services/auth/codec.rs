//! HS256 token codec.
//!
//! Tokens are JWT compact serializations carrying only `sub`, `iat` and `exp`.
//! The codec never logs and never reads the clock itself: `verify` is handed
//! the instant to compare `exp` against.
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared HMAC secret.
///
/// Loaded once at startup and never rotated. Key material is not printable via Debug.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Claims carried by every token.
///
/// Timestamps travel as whole seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    SignatureInvalid,
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(key: &SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the caller-supplied instant in `verify`,
        // after the signature has been checked.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(&key.0),
            decoding_key: DecodingKey::from_secret(&key.0),
            validation,
        }
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, CodecError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))
    }

    /// Decode `token`, check its signature, then check `exp` against `now`.
    ///
    /// A token is expired once `now >= exp`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, CodecError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingAlgorithm => CodecError::SignatureInvalid,
                _ => CodecError::Malformed,
            })?;
        let claims = data.claims;

        if claims.subject.trim().is_empty() || claims.expires_at <= claims.issued_at {
            return Err(CodecError::Malformed);
        }
        if now.timestamp() >= claims.expires_at.timestamp() {
            return Err(CodecError::Expired(claims.expires_at));
        }

        Ok(claims)
    }
}
