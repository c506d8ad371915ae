// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (session token required).
// System endpoints (`/`, `/health`) sit beside both tiers.
pub mod public;    // No authentication required (/auth/*)
pub mod protected; // Session token required (/api/*)
pub mod system;    // Service info and health
