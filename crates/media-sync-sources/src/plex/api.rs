use crate::SourceError;
use media_sync_models::WatchedShow;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

const CLIENT_IDENTIFIER: &str = "plexmal-cli";

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory")]
    directory: Option<Vec<Value>>,
    #[serde(rename = "Metadata")]
    metadata: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct PlexResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

/// Accept `host:port` as well as a full URL; strip any trailing slash
pub fn normalize_server_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}

/// Season whose watched episodes are reported to the list
pub const WATCHED_SEASON: u64 = 1;

/// A show from a section listing, with the key its episodes are fetched by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowNode {
    pub rating_key: String,
    pub title: String,
    /// `viewedLeafCount` when the listing carries it
    pub viewed_leaves: Option<u64>,
}

fn parse_nodes(body: &str, what: impl Into<String>) -> Result<Vec<Value>, SourceError> {
    let response: PlexResponse =
        serde_json::from_str(body).map_err(|e| SourceError::parse(what, e))?;

    let container = response.media_container;
    Ok(container
        .directory
        .unwrap_or_default()
        .into_iter()
        .chain(container.metadata.unwrap_or_default())
        .collect())
}

/// Trimmed, non-empty, single-line title of a node
fn node_title<'a>(node: &'a Value, section: &str) -> Option<&'a str> {
    match node.get("title").and_then(|t| t.as_str()).map(str::trim) {
        Some(title) if title.contains(['\n', '\r']) => {
            warn!("Plex section {}: skipping title with a line break: {:?}", section, title);
            None
        }
        Some(title) if !title.is_empty() => Some(title),
        _ => None,
    }
}

/// Extract item titles from a section listing body.
///
/// `Directory` (shows) nodes come first, then `Metadata` nodes, each array
/// in document order. Nodes without a non-empty `title` are skipped, as are
/// titles with an embedded line break.
pub fn parse_section_titles(body: &str, section: &str) -> Result<Vec<String>, SourceError> {
    let nodes = parse_nodes(body, format!("Plex section {} listing", section))?;

    let mut titles = Vec::new();
    let mut skipped = 0;
    for node in &nodes {
        match node_title(node, section) {
            Some(title) => titles.push(title.to_string()),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Plex section {}: skipped {} nodes without a usable title", section, skipped);
    }

    Ok(titles)
}

/// Shows of a section listing that can be asked for their episodes.
///
/// Same node order as `parse_section_titles`; nodes without a `ratingKey`
/// or a usable title are left out.
pub fn parse_section_shows(body: &str, section: &str) -> Result<Vec<ShowNode>, SourceError> {
    let nodes = parse_nodes(body, format!("Plex section {} listing", section))?;

    Ok(nodes
        .iter()
        .filter_map(|node| {
            let rating_key = match node.get("ratingKey")? {
                Value::String(key) => key.clone(),
                Value::Number(key) => key.to_string(),
                _ => return None,
            };
            let title = node_title(node, section)?.to_string();
            Some(ShowNode {
                rating_key,
                title,
                viewed_leaves: node.get("viewedLeafCount").and_then(Value::as_u64),
            })
        })
        .collect())
}

/// Count the watched episodes of `season` in an `allLeaves` body
pub fn count_watched_episodes(body: &str, show: &str, season: u64) -> Result<u32, SourceError> {
    let nodes = parse_nodes(body, format!("Plex episodes of '{}'", show))?;

    let watched = nodes
        .iter()
        .filter(|episode| episode.get("parentIndex").and_then(Value::as_u64) == Some(season))
        .filter(|episode| {
            episode
                .get("viewCount")
                .and_then(Value::as_u64)
                .is_some_and(|count| count > 0)
        })
        .count();

    Ok(u32::try_from(watched).unwrap_or(u32::MAX))
}

pub struct PlexHttpClient {
    client: Client,
    server_url: String,
}

impl PlexHttpClient {
    pub fn new(token: &str, server: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(token)
                        .map_err(|_| SourceError::Auth("Invalid Plex token format".to_string()))?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            server_url: normalize_server_url(server),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Check that the server answers and accepts the token
    pub async fn verify(&self) -> Result<(), SourceError> {
        let url = format!("{}/identity", self.server_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::fetch("Plex server identity", e))?;

        match response.status() {
            status if status.is_success() => {
                debug!("Plex server reachable at {}", self.server_url);
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(SourceError::Auth("Plex rejected the token".to_string())),
            status => Err(SourceError::fetch("Plex server identity", status)),
        }
    }

    async fn get_body(&self, url: &str, what: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(what, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::fetch(what, status));
        }

        let body = response.text().await.map_err(|e| SourceError::fetch(what, e))?;
        trace!("{}: {} bytes", what, body.len());
        Ok(body)
    }

    fn section_url(&self, section: &str) -> String {
        format!(
            "{}/library/sections/{}/all",
            self.server_url,
            urlencoding::encode(section)
        )
    }

    pub async fn get_section_titles(&self, section: &str) -> Result<Vec<String>, SourceError> {
        let what = format!("Plex section {}", section);
        let body = self.get_body(&self.section_url(section), &what).await?;
        parse_section_titles(&body, section)
    }

    /// Shows in `section` with watched episodes in the first season
    pub async fn get_section_watched(&self, section: &str) -> Result<Vec<WatchedShow>, SourceError> {
        let what = format!("Plex section {}", section);
        let body = self.get_body(&self.section_url(section), &what).await?;

        let mut watched = Vec::new();
        for show in parse_section_shows(&body, section)? {
            if show.viewed_leaves == Some(0) {
                continue;
            }

            let url = format!(
                "{}/library/metadata/{}/allLeaves",
                self.server_url,
                urlencoding::encode(&show.rating_key)
            );
            let body = self
                .get_body(&url, &format!("Plex episodes of '{}'", show.title))
                .await?;
            let count = count_watched_episodes(&body, &show.title, WATCHED_SEASON)?;
            if count > 0 {
                debug!("Plex: {} watched episode(s) of '{}'", count, show.title);
                watched.push(WatchedShow::new(show.title, count));
            }
        }

        Ok(watched)
    }
}
