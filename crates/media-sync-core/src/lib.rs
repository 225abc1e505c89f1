pub mod error;
pub mod matcher;
pub mod processed;
pub mod progress;
pub mod session;
pub mod sync;

pub use error::SyncError;
pub use matcher::{match_entries, CatalogMatch, CatalogMatcher, MatchOutcome, MatchedOn};
pub use processed::ProcessedSet;
pub use progress::{progress_for, ProgressEvent, ProgressOutcome, ProgressResult, ProgressSync};
pub use session::SyncSession;
pub use sync::{SyncEvent, SyncOrchestrator, SyncResult, SyncState, TitleOutcome};
