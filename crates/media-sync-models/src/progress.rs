use crate::{CatalogEntry, ListStatus};
use serde::{Deserialize, Serialize};

/// A library show with how many first-season episodes have been watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedShow {
    pub title: String,
    pub watched_episodes: u32,
}

impl WatchedShow {
    pub fn new(title: impl Into<String>, watched_episodes: u32) -> Self {
        Self {
            title: title.into(),
            watched_episodes,
        }
    }
}

/// One entry on the user's remote watch list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListEntry {
    pub id: u64,
    pub title: String,
    /// Raw synonym field, semicolon-delimited, may be empty
    #[serde(default)]
    pub synonyms: String,
    /// Episode count of the series, 0 when unknown
    #[serde(default)]
    pub episodes: u32,
    pub watched_episodes: u32,
    /// `None` when the list reports a status code we do not know
    pub status: Option<ListStatus>,
}

impl ListEntry {
    /// View the entry as a catalog candidate so titles match the same way
    pub fn as_catalog_entry(&self) -> CatalogEntry {
        CatalogEntry::new(self.id, self.title.clone())
            .with_synonyms(self.synonyms.clone())
            .with_episodes(self.episodes)
    }
}
