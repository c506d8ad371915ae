// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition. Every input is untrusted here; failures must not reveal
// whether an identifier exists.
pub mod auth;
