use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use super::token::Principal;

#[derive(Debug, Error)]
pub enum AuthFailure {
    /// Unknown identifier or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Source of truth for user identities. Consulted only before a token is issued.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify_credentials(&self, identifier: &str, secret: &str) -> Result<Principal, AuthFailure>;
}

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash checked when the identifier is unknown, so both failure paths pay the
/// same Argon2 cost.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("hub-api-unknown-identifier").ok());

/// Run a full password verification that can never succeed.
fn verify_against_dummy(secret: &str) {
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            verify_password(secret, hash);
        }
        None => tracing::warn!("Dummy password hash unavailable; unknown logins skip hashing"),
    }
}

/// Credential store over the `users` table.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn verify_credentials(&self, identifier: &str, secret: &str) -> Result<Principal, AuthFailure> {
        let query = r#"
            SELECT id, password_hash
            FROM users
            WHERE (username = $1 OR email = $1)
            AND deleted_at IS NULL
        "#;

        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database error looking up user '{}': {}", identifier, e);
                AuthFailure::Unavailable(e.to_string())
            })?;

        let Some(row) = row else {
            verify_against_dummy(secret);
            tracing::debug!("Login failed: unknown identifier '{}'", identifier);
            return Err(AuthFailure::InvalidCredentials);
        };

        let stored: String = row.get("password_hash");
        if !verify_password(secret, &stored) {
            tracing::debug!("Login failed: password mismatch for '{}'", identifier);
            return Err(AuthFailure::InvalidCredentials);
        }

        let id: Uuid = row.get("id");
        Ok(Principal::new(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn dummy_hash_costs_the_same_as_a_real_one() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        let real = hash_password("pw").unwrap();

        // $argon2id$v=19$m=...,t=...,p=...$salt$hash: algorithm, version and cost must match.
        let params = |phc: &str| phc.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(dummy), params(&real));
        assert!(!verify_password("pw", dummy));
        assert!(!verify_password("", dummy));
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("pw", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
