pub mod error;
pub mod mal;
pub mod plex;
pub mod traits;

pub use error::SourceError;
pub use mal::MalClient;
pub use plex::PlexClient;
pub use traits::{CatalogSearch, LibrarySource, ListProgress, ListUpdater, WatchedSource};
