use serde::{Deserialize, Serialize};

/// Authenticated subject of a request
///
/// Only ever built from the `sub` claim of a token that passed signature and
/// claim validation, or from a stored todo author when comparing ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
    /// Expiration (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Principal named by the `sub` claim, `None` when the subject is blank
    pub fn principal(&self) -> Option<Principal> {
        if self.sub.trim().is_empty() {
            None
        } else {
            Some(Principal::new(self.sub.clone()))
        }
    }
}

/// Why a decoded token is not currently usable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("unexpected issuer {actual:?}")]
    WrongIssuer { actual: String },

    #[error("token has no expiration")]
    MissingExpiration,

    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

/// Checks issuer and expiry of decoded claims
#[derive(Debug, Clone)]
pub struct ClaimValidator {
    issuer: String,
}

impl ClaimValidator {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Validate claims against `now` (unix seconds). A token expiring exactly
    /// at `now` is already expired.
    pub fn check(&self, claims: &Claims, now: i64) -> Result<(), ClaimError> {
        if claims.iss != self.issuer {
            return Err(ClaimError::WrongIssuer {
                actual: claims.iss.clone(),
            });
        }
        let exp = claims.exp.ok_or(ClaimError::MissingExpiration)?;
        if now >= exp {
            return Err(ClaimError::Expired { expired_at: exp });
        }
        Ok(())
    }

    pub fn is_valid(&self, claims: &Claims, now: i64) -> bool {
        self.check(claims, now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn claims(iss: &str, exp: Option<i64>) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            iss: iss.to_string(),
            iat: NOW - 10,
            exp,
        }
    }

    #[test]
    fn test_future_expiration_is_valid() {
        let validator = ClaimValidator::new("todo");
        assert!(validator.is_valid(&claims("todo", Some(NOW + 1)), NOW));
    }

    #[test]
    fn test_past_expiration_is_invalid() {
        let validator = ClaimValidator::new("todo");
        assert_eq!(
            validator.check(&claims("todo", Some(NOW - 1)), NOW),
            Err(ClaimError::Expired { expired_at: NOW - 1 })
        );
    }

    #[test]
    fn test_expiration_equal_to_now_is_invalid() {
        let validator = ClaimValidator::new("todo");
        assert!(!validator.is_valid(&claims("todo", Some(NOW)), NOW));
    }

    #[test]
    fn test_missing_expiration_is_invalid() {
        let validator = ClaimValidator::new("todo");
        assert_eq!(
            validator.check(&claims("todo", None), NOW),
            Err(ClaimError::MissingExpiration)
        );
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let validator = ClaimValidator::new("todo");
        for iss in ["", "Todo", "other", "todo "] {
            assert!(
                !validator.is_valid(&claims(iss, Some(NOW + 3600)), NOW),
                "issuer {iss:?} accepted"
            );
        }
    }

    #[test]
    fn test_principal_from_subject() {
        let c = claims("todo", Some(NOW + 1));
        assert_eq!(c.principal(), Some(Principal::new("user-1")));

        let blank = Claims {
            sub: "  ".to_string(),
            ..c
        };
        assert_eq!(blank.principal(), None);
    }

    #[test]
    fn test_claims_deserialize_without_exp() {
        let c: Claims = serde_json::from_str(r#"{"sub":"a","iss":"todo","iat":1}"#).unwrap();
        assert_eq!(c.exp, None);
    }

    #[test]
    fn test_claims_reject_non_string_subject() {
        let result: Result<Claims, _> =
            serde_json::from_str(r#"{"sub":42,"iss":"todo","iat":1,"exp":2}"#);
        assert!(result.is_err());
    }
}
