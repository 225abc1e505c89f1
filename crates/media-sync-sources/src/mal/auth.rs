use reqwest::Client;

const USER_AGENT: &str = concat!("plexmal/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the MyAnimeList API
pub fn create_mal_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}
