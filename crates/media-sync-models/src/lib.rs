pub mod catalog;
pub mod outcome;
pub mod progress;
pub mod status;

pub use catalog::CatalogEntry;
pub use outcome::{AddOutcome, UpdateOutcome};
pub use progress::{ListEntry, WatchedShow};
pub use status::ListStatus;
