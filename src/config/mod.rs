/// Database connection and schema creation
pub mod database;

/// Environment and `config.toml` settings
pub mod settings;

pub use settings::{AppConfig, Tunables};
