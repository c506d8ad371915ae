use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::{ConfigError, TokenSettings};

/// Authenticated identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Signed claims. Every field is covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// An issued token together with the claims it was built from.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub claims: Claims,
}

impl SessionToken {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.claims.exp, 0)
    }

    pub fn expires_in(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

/// Outcome of a single verification. Exactly one per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(Principal),
    Expired,
    Malformed,
    SignatureMismatch,
    WrongAudience,
    WrongIssuer,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Token expiry out of range for issue time {0}")]
    ExpiryOutOfRange(i64),
}

/// Issues and verifies HS256 session tokens.
///
/// Holds the signing keys derived once from [`TokenSettings`]; safe to share
/// across request tasks.
pub struct TokenService {
    settings: TokenSettings,
    validity: Duration,
    clock_skew_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(settings: TokenSettings) -> Result<Self, ConfigError> {
        if settings.secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if settings.issuer.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_ISSUER"));
        }
        if settings.audience.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_AUDIENCE"));
        }
        settings.validate()?;

        let validity = i64::try_from(settings.validity_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| ConfigError::Invalid {
                key: "JWT_VALIDITY_SECS",
                reason: "token validity out of range".to_string(),
            })?;
        let clock_skew_secs = i64::try_from(settings.clock_skew_secs).map_err(|_| ConfigError::Invalid {
            key: "JWT_CLOCK_SKEW_SECS",
            reason: "clock skew out of range".to_string(),
        })?;

        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());

        // The library only checks the signature and the claim shape; time,
        // issuer and audience are checked against the caller's `now`.
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            settings,
            validity,
            clock_skew_secs,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<SessionToken, TokenError> {
        let expires = now
            .checked_add_signed(self.validity)
            .ok_or(TokenError::ExpiryOutOfRange(now.timestamp()))?;
        let claims = Claims {
            sub: principal.subject.clone(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let token = encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(SessionToken { token, claims })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Verification {
        // Signature first: no claim is trusted before it is authenticated.
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        Verification::SignatureMismatch
                    }
                    _ => Verification::Malformed,
                }
            }
        };

        let now = now.timestamp();
        if now > claims.exp {
            return Verification::Expired;
        }
        if now < claims.iat.saturating_sub(self.clock_skew_secs) {
            return Verification::Malformed;
        }
        if !ct_eq(&claims.iss, &self.settings.issuer) {
            return Verification::WrongIssuer;
        }
        if !ct_eq(&claims.aud, &self.settings.audience) {
            return Verification::WrongAudience;
        }

        Verification::Valid(Principal::new(claims.sub))
    }
}

fn ct_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
