// Title matching between library titles and catalog search results

use media_sync_models::CatalogEntry;
use media_sync_sources::{CatalogSearch, SourceError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which name of the catalog entry equalled the input title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedOn {
    Title,
    English,
    /// The whole synonym field, when it holds a single value
    Synonym,
    /// One piece of a semicolon-delimited synonym list
    SynonymList,
}

impl fmt::Display for MatchedOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchedOn::Title => "title",
            MatchedOn::English => "english title",
            MatchedOn::Synonym => "synonym",
            MatchedOn::SynonymList => "synonym list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub entry_id: u64,
    pub matched_on: MatchedOn,
    /// The catalog's own spelling of the name that matched
    pub matched_name: String,
    /// Primary title of the matched entry
    pub entry_title: String,
    /// Episode count of the matched entry, 0 when unknown
    pub episodes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(CatalogMatch),
    /// The search returned nothing
    NoResults,
    /// The search returned entries but none of their names equalled the input
    NoMatch { candidates: usize },
}

/// Locale-independent case-insensitive equality
fn names_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn matched(entry: &CatalogEntry, matched_on: MatchedOn, name: &str) -> MatchOutcome {
    MatchOutcome::Matched(CatalogMatch {
        entry_id: entry.id,
        matched_on,
        matched_name: name.to_string(),
        entry_title: entry.title.clone(),
        episodes: entry.episodes,
    })
}

/// Pick the first entry, in catalog order, with a name equal to `input`.
///
/// Per entry the primary and English titles are compared first. The raw
/// synonym field is compared whole only when it has no delimiter; a field
/// that does contain one is split and each trimmed piece compared instead.
pub fn match_entries(input: &str, entries: &[CatalogEntry]) -> MatchOutcome {
    if entries.is_empty() {
        return MatchOutcome::NoResults;
    }

    for entry in entries {
        trace!(entry_id = entry.id, title = %entry.title, "Comparing catalog entry");

        if names_equal(&entry.title, input) {
            return matched(entry, MatchedOn::Title, &entry.title);
        }
        if names_equal(&entry.english, input) {
            return matched(entry, MatchedOn::English, &entry.english);
        }

        if !entry.has_synonym_list() {
            if names_equal(&entry.synonyms, input) {
                return matched(entry, MatchedOn::Synonym, &entry.synonyms);
            }
            continue;
        }

        if let Some(synonym) = entry.synonym_list().find(|s| names_equal(s, input)) {
            return matched(entry, MatchedOn::SynonymList, synonym);
        }
    }

    MatchOutcome::NoMatch {
        candidates: entries.len(),
    }
}

/// Searches the catalog for a title and applies `match_entries` to the results
#[derive(Clone)]
pub struct CatalogMatcher {
    catalog: Arc<dyn CatalogSearch>,
}

impl CatalogMatcher {
    pub fn new(catalog: Arc<dyn CatalogSearch>) -> Self {
        Self { catalog }
    }

    pub async fn match_title(&self, title: &str) -> Result<MatchOutcome, SourceError> {
        let entries = self.catalog.search(title).await?;
        debug!(
            catalog = self.catalog.source_name(),
            title,
            results = entries.len(),
            "Catalog search finished"
        );
        Ok(match_entries(title, &entries))
    }
}
