use crate::mal::{api, auth};
use crate::traits::{CatalogSearch, ListProgress, ListUpdater};
use crate::SourceError;
use async_trait::async_trait;
use media_sync_models::{AddOutcome, CatalogEntry, ListEntry, ListStatus, UpdateOutcome};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// MyAnimeList catalog search and list updates, authenticated per request
#[derive(Clone)]
pub struct MalClient {
    client: Arc<Client>,
    base_url: String,
    username: String,
    password: String,
}

impl MalClient {
    pub fn new(base_url: &str, username: String, password: String) -> Result<Self, SourceError> {
        if username.trim().is_empty() {
            return Err(SourceError::Auth("MyAnimeList username is empty".to_string()));
        }
        Ok(Self {
            client: Arc::new(auth::create_mal_client()?),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn authenticate(&self) -> Result<(), SourceError> {
        let valid =
            api::verify_credentials(&self.client, &self.base_url, &self.username, &self.password)
                .await?;
        if !valid {
            return Err(SourceError::Auth(format!(
                "MyAnimeList rejected credentials for {}",
                self.username
            )));
        }
        info!("Authenticated to MyAnimeList as {}", self.username);
        Ok(())
    }
}

impl fmt::Debug for MalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MalClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogSearch for MalClient {
    fn source_name(&self) -> &str {
        "myanimelist"
    }

    async fn search(&self, title: &str) -> Result<Vec<CatalogEntry>, SourceError> {
        api::search_anime(&self.client, &self.base_url, &self.username, &self.password, title).await
    }
}

#[async_trait]
impl ListUpdater for MalClient {
    fn source_name(&self) -> &str {
        "myanimelist"
    }

    async fn add_to_list(
        &self,
        entry_id: u64,
        status: ListStatus,
        comment: &str,
    ) -> Result<AddOutcome, SourceError> {
        let payload = api::build_entry_payload(status, comment)?;
        api::add_anime(
            &self.client,
            &self.base_url,
            &self.username,
            &self.password,
            entry_id,
            &payload,
        )
        .await
    }
}

#[async_trait]
impl ListProgress for MalClient {
    fn source_name(&self) -> &str {
        "myanimelist"
    }

    async fn fetch_list(&self) -> Result<Vec<ListEntry>, SourceError> {
        api::fetch_user_list(&self.client, &self.base_url, &self.username).await
    }

    async fn add_with_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<AddOutcome, SourceError> {
        let payload = api::build_progress_payload(status, episodes)?;
        api::add_anime(
            &self.client,
            &self.base_url,
            &self.username,
            &self.password,
            entry_id,
            &payload,
        )
        .await
    }

    async fn update_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<UpdateOutcome, SourceError> {
        let payload = api::build_progress_payload(status, episodes)?;
        api::update_anime(
            &self.client,
            &self.base_url,
            &self.username,
            &self.password,
            entry_id,
            &payload,
        )
        .await
    }
}
