//! Session token issuance and decoding
//!
//! Tokens are HS256 JWTs carrying `iss`, `sub`, `iat` and `exp`. Decoding
//! only proves the token was signed with the configured secret; issuer and
//! expiry are checked separately by [`ClaimValidator`].

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{ClaimValidator, Claims};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;

/// Issuer written into every token
pub const ISSUER: &str = "todo";

/// Lifetime of a freshly issued token
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token codec errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Secret missing or the signer failed
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Not a parseable token
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signature did not verify or the algorithm is not HS256
    #[error("token signature rejected: {0}")]
    Signature(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => TokenError::Signature(err.to_string()),
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Anything that can turn a token string into trusted claims
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;
}

/// Issues and decodes signed session tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    has_secret: bool,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            has_secret: !secret.is_empty(),
            issuer: config.issuer.clone(),
            ttl: config.token_ttl(),
            clock,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Validator expecting the issuer this codec signs with
    pub fn validator(&self) -> ClaimValidator {
        ClaimValidator::new(self.issuer.clone())
    }

    /// Sign a new token for `subject`
    ///
    /// `iat` has whole-second resolution: two tokens issued for the same
    /// subject within the same second are byte-identical.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signing("signing secret is not configured".to_string()));
        }

        let now = self.clock.now();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                TokenError::Signing(format!("token lifetime {:?} is out of range", self.ttl))
            })?;

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: Some(exp),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature and return the claims. Issuer and expiry are not
    /// checked here.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signature("signing secret is not configured".to_string()));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl TokenDecoder for TokenCodec {
    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        TokenCodec::decode(self, token)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
