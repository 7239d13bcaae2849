// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Middleware: global only (CORS, tracing, body limit)

pub mod health;
pub mod root;

pub use health::get as health;
pub use root::get as root;
