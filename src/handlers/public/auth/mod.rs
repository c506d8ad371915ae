// handlers/public/auth/mod.rs - Public authentication handlers
pub mod login; // POST /auth/login - verify credentials and issue a session token

pub use login::login;
