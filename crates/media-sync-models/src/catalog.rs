use serde::{Deserialize, Serialize};

/// Delimiter used by the catalog to pack several synonyms into one field
pub const SYNONYM_DELIMITER: char = ';';

/// One candidate returned by a catalog search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u64,
    /// Primary (usually romanized) title
    pub title: String,
    /// Alternate/localized title, empty when the catalog has none
    #[serde(default)]
    pub english: String,
    /// Raw synonym field, semicolon-delimited, may be empty
    #[serde(default)]
    pub synonyms: String,
    /// Episode count, 0 when unknown or still airing
    #[serde(default)]
    pub episodes: u32,
}

impl CatalogEntry {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            english: String::new(),
            synonyms: String::new(),
            episodes: 0,
        }
    }

    pub fn with_english(mut self, english: impl Into<String>) -> Self {
        self.english = english.into();
        self
    }

    pub fn with_synonyms(mut self, synonyms: impl Into<String>) -> Self {
        self.synonyms = synonyms.into();
        self
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = episodes;
        self
    }

    /// Whether the raw synonym field packs more than one value
    pub fn has_synonym_list(&self) -> bool {
        self.synonyms.contains(SYNONYM_DELIMITER)
    }

    /// Split the raw synonym field into trimmed pieces, in catalog order
    pub fn synonym_list(&self) -> impl Iterator<Item = &str> {
        self.synonyms.split(SYNONYM_DELIMITER).map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_list_trims_pieces() {
        let entry = CatalogEntry::new(1, "Shingeki no Kyojin").with_synonyms("A; B ;C");
        assert!(entry.has_synonym_list());
        let pieces: Vec<&str> = entry.synonym_list().collect();
        assert_eq!(pieces, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_single_synonym_is_not_a_list() {
        let entry = CatalogEntry::new(1, "Title").with_synonyms("OnlyOne");
        assert!(!entry.has_synonym_list());
    }
}
