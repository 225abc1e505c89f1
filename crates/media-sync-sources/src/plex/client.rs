use crate::plex::api::PlexHttpClient;
use crate::traits::{LibrarySource, WatchedSource};
use crate::SourceError;
use async_trait::async_trait;
use media_sync_models::WatchedShow;
use tracing::info;

/// Plex media server reached directly by address and token
pub struct PlexClient {
    api: PlexHttpClient,
}

impl PlexClient {
    pub fn new(server: &str, token: &str) -> Result<Self, SourceError> {
        if token.trim().is_empty() {
            return Err(SourceError::Auth("Plex token is empty".to_string()));
        }
        Ok(Self {
            api: PlexHttpClient::new(token, server)?,
        })
    }

    pub fn server_url(&self) -> &str {
        self.api.server_url()
    }

    pub async fn verify(&self) -> Result<(), SourceError> {
        self.api.verify().await?;
        info!("Connected to Plex server at {}", self.api.server_url());
        Ok(())
    }
}

#[async_trait]
impl LibrarySource for PlexClient {
    fn source_name(&self) -> &str {
        "plex"
    }

    async fn fetch_section_titles(&self, section: &str) -> Result<Vec<String>, SourceError> {
        self.api.get_section_titles(section).await
    }
}

#[async_trait]
impl WatchedSource for PlexClient {
    fn source_name(&self) -> &str {
        "plex"
    }

    async fn fetch_section_watched(&self, section: &str) -> Result<Vec<WatchedShow>, SourceError> {
        self.api.get_section_watched(section).await
    }
}
