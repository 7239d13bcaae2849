pub mod manager;
pub mod migrations;
pub mod settings_repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use migrations::{Migration, MigrationError, MigrationStatus, Migrator, MIGRATIONS};
pub use settings_repository::PgSettingsStore;
