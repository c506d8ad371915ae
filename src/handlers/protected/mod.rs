// handlers/protected/mod.rs - Protected handlers (session token required)
//
// Routes in this tier are wrapped by `middleware::require_auth`, which places
// the verified `Principal` in request extensions.
pub mod auth;
