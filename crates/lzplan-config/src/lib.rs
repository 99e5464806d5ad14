mod raw;
mod loader;
pub mod error;

pub use loader::{load_config, parse_config, DEFAULT_CONFIG_PATH};
pub use error::ConfigError;
