use crate::SyncError;
use std::path::{Path, PathBuf};

/// Inputs for one sync run, validated up front
#[derive(Debug, Clone)]
pub struct SyncSession {
    user: String,
    sections: Vec<String>,
    processed_path: PathBuf,
}

impl SyncSession {
    /// `sections` are trimmed and blank entries dropped; at least one must remain
    pub fn new(
        user: &str,
        sections: Vec<String>,
        processed_path: impl Into<PathBuf>,
    ) -> Result<Self, SyncError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(SyncError::Input("user name is required".to_string()));
        }

        let sections: Vec<String> = sections
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if sections.is_empty() {
            return Err(SyncError::Input(
                "at least one library section is required".to_string(),
            ));
        }

        Ok(Self {
            user: user.to_string(),
            sections,
            processed_path: processed_path.into(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn processed_path(&self) -> &Path {
        &self.processed_path
    }
}
