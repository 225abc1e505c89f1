pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, ConfigError, MalConfig, PlexConfig, SyncOptions, parse_sections, DEFAULT_MAL_BASE_URL};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
