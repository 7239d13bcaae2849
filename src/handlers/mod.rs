// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth + tenant scope + rate limit)
pub mod protected;
pub mod public;
