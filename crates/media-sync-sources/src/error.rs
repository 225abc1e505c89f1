use thiserror::Error;

/// Failures raised by the library, catalog, and list clients
#[derive(Debug, Error)]
pub enum SourceError {
    /// The library listing could not be retrieved (connection, auth, HTTP status)
    #[error("failed to fetch {what}: {message}")]
    Fetch { what: String, message: String },

    /// A response arrived but was not in the expected format
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// The catalog search request itself failed
    #[error("catalog search for '{title}' failed: {message}")]
    Search { title: String, message: String },

    /// The list-add request could not be delivered
    #[error("adding entry {entry_id} to list failed: {message}")]
    Add { entry_id: u64, message: String },

    /// The list-update request could not be delivered
    #[error("updating list entry {entry_id} failed: {message}")]
    Update { entry_id: u64, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SourceError {
    pub fn fetch(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch { what: what.into(), message: message.to_string() }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse { what: what.into(), message: message.to_string() }
    }
}
