use crate::SourceError;
use media_sync_models::{AddOutcome, CatalogEntry, ListEntry, ListStatus, UpdateOutcome};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Phrase the list API uses when an entry is already on the user's list
pub const ALREADY_IN_LIST_MARKER: &str = "already in the list";

#[derive(Debug, Deserialize)]
struct AnimeSearchResponse {
    #[serde(rename = "entry", default)]
    entries: Vec<AnimeEntry>,
}

#[derive(Debug, Deserialize)]
struct AnimeEntry {
    id: u64,
    title: String,
    #[serde(default)]
    english: String,
    #[serde(default)]
    synonyms: String,
    #[serde(default)]
    episodes: String,
}

impl From<AnimeEntry> for CatalogEntry {
    fn from(entry: AnimeEntry) -> Self {
        CatalogEntry {
            id: entry.id,
            title: entry.title,
            english: entry.english,
            synonyms: entry.synonyms,
            episodes: lenient_count(&entry.episodes),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "anime", default)]
    anime: Vec<UserListAnime>,
}

#[derive(Debug, Deserialize)]
struct UserListAnime {
    series_animedb_id: u64,
    series_title: String,
    #[serde(default)]
    series_synonyms: String,
    #[serde(default)]
    series_episodes: String,
    #[serde(default)]
    my_watched_episodes: String,
    #[serde(default)]
    my_status: String,
}

impl From<UserListAnime> for ListEntry {
    fn from(anime: UserListAnime) -> Self {
        ListEntry {
            id: anime.series_animedb_id,
            title: anime.series_title,
            synonyms: anime.series_synonyms,
            episodes: lenient_count(&anime.series_episodes),
            watched_episodes: lenient_count(&anime.my_watched_episodes),
            status: anime.my_status.trim().parse().ok().and_then(ListStatus::from_code),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "entry")]
struct AnimeValues<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    episode: Option<u32>,
    status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments: Option<&'a str>,
}

/// Counts the API leaves blank while a series airs read as 0
fn lenient_count(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// Parse a search.xml body; an empty body means no results
pub fn parse_search_response(body: &str) -> Result<Vec<CatalogEntry>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: AnimeSearchResponse = quick_xml::de::from_str(body)
        .map_err(|e| SourceError::parse("MyAnimeList search response", e))?;
    Ok(response.entries.into_iter().map(CatalogEntry::from).collect())
}

/// Parse a malappinfo.php list body
pub fn parse_list_response(body: &str) -> Result<Vec<ListEntry>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: UserListResponse = quick_xml::de::from_str(body)
        .map_err(|e| SourceError::parse("MyAnimeList user list", e))?;
    if let Some(error) = response.error {
        return Err(SourceError::fetch("MyAnimeList user list", error.trim()));
    }
    Ok(response.anime.into_iter().map(ListEntry::from).collect())
}

fn serialize_values(values: &AnimeValues<'_>) -> Result<String, SourceError> {
    let xml = quick_xml::se::to_string(values)
        .map_err(|e| SourceError::parse("list entry payload", e))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{}", xml))
}

/// Build the `data` payload for an add request
pub fn build_entry_payload(status: ListStatus, comment: &str) -> Result<String, SourceError> {
    serialize_values(&AnimeValues {
        episode: None,
        status: status.code(),
        comments: Some(comment),
    })
}

/// Build the `data` payload carrying a watched-episode count
pub fn build_progress_payload(status: ListStatus, episodes: u32) -> Result<String, SourceError> {
    serialize_values(&AnimeValues {
        episode: Some(episodes),
        status: status.code(),
        comments: None,
    })
}

/// Classify the text the list API returned for an add request.
///
/// Only the "already in the list" phrase is recognised; a non-success
/// response without it is passed through as `Other` with the raw text.
pub fn classify_add_response(success: bool, body: &str) -> AddOutcome {
    if body.to_lowercase().contains(ALREADY_IN_LIST_MARKER) {
        AddOutcome::AlreadyPresent
    } else if success {
        AddOutcome::Added
    } else {
        AddOutcome::Other(body.trim().to_string())
    }
}

/// Classify the text the list API returned for an update request
pub fn classify_update_response(success: bool, body: &str) -> UpdateOutcome {
    if success && body.to_lowercase().contains("updated") {
        UpdateOutcome::Updated
    } else {
        UpdateOutcome::Other(body.trim().to_string())
    }
}

/// Search the catalog by free-text title
pub async fn search_anime(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
    title: &str,
) -> Result<Vec<CatalogEntry>, SourceError> {
    let url = format!("{}/api/anime/search.xml", base_url);
    let search_error = |message: String| SourceError::Search {
        title: title.to_string(),
        message,
    };

    let response = client
        .get(&url)
        .query(&[("q", title)])
        .basic_auth(username, Some(password))
        .send()
        .await
        .map_err(|e| search_error(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        debug!("MyAnimeList search: no content for '{}'", title);
        return Ok(Vec::new());
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(SourceError::Auth("MyAnimeList rejected the credentials".to_string()));
    }
    if !status.is_success() {
        return Err(search_error(format!("HTTP {}", status)));
    }

    let body = response.text().await.map_err(|e| search_error(e.to_string()))?;
    trace!("MyAnimeList search '{}': {} bytes", title, body.len());
    parse_search_response(&body)
}

/// POST a `data` payload; returns whether the status was a success and the body
async fn post_entry(
    client: &Client,
    url: &str,
    username: &str,
    password: &str,
    payload: &str,
) -> Result<(bool, String), reqwest::Error> {
    let response = client
        .post(url)
        .basic_auth(username, Some(password))
        .form(&[("data", payload)])
        .send()
        .await?;

    let success = response.status().is_success();
    let body = response.text().await?;
    Ok((success, body))
}

/// Add an entry to the user's anime list and classify the answer
pub async fn add_anime(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
    entry_id: u64,
    payload: &str,
) -> Result<AddOutcome, SourceError> {
    let url = format!("{}/api/animelist/add/{}.xml", base_url, entry_id);
    let (success, body) = post_entry(client, &url, username, password, payload)
        .await
        .map_err(|e| SourceError::Add {
            entry_id,
            message: e.to_string(),
        })?;
    Ok(classify_add_response(success, &body))
}

/// Update an entry already on the user's anime list
pub async fn update_anime(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
    entry_id: u64,
    payload: &str,
) -> Result<UpdateOutcome, SourceError> {
    let url = format!("{}/api/animelist/update/{}.xml", base_url, entry_id);
    let (success, body) = post_entry(client, &url, username, password, payload)
        .await
        .map_err(|e| SourceError::Update {
            entry_id,
            message: e.to_string(),
        })?;
    Ok(classify_update_response(success, &body))
}

/// Every anime on `username`'s list
pub async fn fetch_user_list(
    client: &Client,
    base_url: &str,
    username: &str,
) -> Result<Vec<ListEntry>, SourceError> {
    let what = "MyAnimeList user list";
    let url = format!("{}/malappinfo.php", base_url);
    let response = client
        .get(&url)
        .query(&[("u", username), ("status", "all"), ("type", "anime")])
        .send()
        .await
        .map_err(|e| SourceError::fetch(what, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::fetch(what, status));
    }

    let body = response.text().await.map_err(|e| SourceError::fetch(what, e))?;
    trace!("MyAnimeList list of {}: {} bytes", username, body.len());
    parse_list_response(&body)
}

/// Returns true when the credentials are accepted
pub async fn verify_credentials(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<bool, SourceError> {
    let url = format!("{}/api/account/verify_credentials.xml", base_url);
    let response = client
        .get(&url)
        .basic_auth(username, Some(password))
        .send()
        .await?;
    Ok(response.status().is_success())
}
