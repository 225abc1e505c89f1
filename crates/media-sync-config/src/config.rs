use media_sync_models::ListStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAL_BASE_URL: &str = "https://myanimelist.net";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("at least one library section is required")]
    NoSections,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub mal: MalConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct PlexConfig {
    /// `host:port` or a full base URL
    #[serde(default)]
    pub server: String,
    /// Library section keys, synced in this order
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MalConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_mal_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncOptions {
    /// Match only; never submit to the list or record titles as processed
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub list_status: ListStatus,
    #[serde(default)]
    pub comment: String,
}

fn default_mal_base_url() -> String {
    DEFAULT_MAL_BASE_URL.to_string()
}

impl Default for MalConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            base_url: default_mal_base_url(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            list_status: ListStatus::PlanToWatch,
            comment: String::new(),
        }
    }
}

/// Split a comma-separated section argument, dropping blank pieces
pub fn parse_sections(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or defaults when it does not exist yet
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the fields a sync run cannot start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mal.username.trim().is_empty() {
            return Err(ConfigError::Missing("MyAnimeList username"));
        }
        if self.mal.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("MyAnimeList base URL"));
        }
        if self.plex.server.trim().is_empty() {
            return Err(ConfigError::Missing("Plex server"));
        }
        if self.plex.sections.is_empty() {
            return Err(ConfigError::NoSections);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn configured() -> Config {
        Config {
            plex: PlexConfig {
                server: "10.1.2.3:32400".to_string(),
                sections: vec!["2".to_string(), "5".to_string()],
            },
            mal: MalConfig {
                username: "john".to_string(),
                ..MalConfig::default()
            },
            sync: SyncOptions::default(),
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        configured().save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.plex.server, "10.1.2.3:32400");
        assert_eq!(loaded.plex.sections, vec!["2", "5"]);
        assert_eq!(loaded.mal.username, "john");
        assert_eq!(loaded.sync.list_status, ListStatus::PlanToWatch);
        assert!(!loaded.sync.dry_run);
    }

    #[test]
    fn test_config_defaults_from_partial_file() {
        let config: Config = toml::from_str("[mal]\nusername = \"john\"\n").unwrap();
        assert_eq!(config.mal.base_url, DEFAULT_MAL_BASE_URL);
        assert!(config.plex.sections.is_empty());
        assert_eq!(config.sync.comment, "");
    }

    #[test]
    fn test_config_validate() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.plex.sections.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoSections));

        config.plex.sections.push("1".to_string());
        config.mal.username = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Missing("MyAnimeList username")));
    }

    #[test]
    fn test_parse_sections() {
        assert_eq!(parse_sections("1"), vec!["1"]);
        assert_eq!(parse_sections("1,2, 3"), vec!["1", "2", "3"]);
        assert_eq!(parse_sections(" , 4,,"), vec!["4"]);
        assert!(parse_sections("").is_empty());
    }
}
