pub mod credentials;
pub mod token;

pub use credentials::{hash_password, verify_password, AuthFailure, CredentialStore, PgCredentialStore};
pub use token::{Claims, Principal, SessionToken, TokenError, TokenService, Verification};
