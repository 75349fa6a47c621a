// Configuration management

pub mod app;
pub mod database;

pub use app::{AppConfig, AuthMode};
pub use database::{run_migrations, DatabaseConfig};
