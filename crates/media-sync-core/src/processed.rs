use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Titles already synced for one user, backed by an append-only file.
///
/// One title per line, no header, no escaping. The file may hold the same
/// title more than once; only containment matters.
#[derive(Debug)]
pub struct ProcessedSet {
    path: PathBuf,
    titles: HashSet<String>,
}

impl ProcessedSet {
    /// Read the record at `path`.
    ///
    /// A missing file is an empty set. An unreadable file is logged and
    /// also treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let titles = match std::fs::read_to_string(&path) {
            Ok(content) => parse_lines(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No processed cache at {:?}, starting empty", path);
                HashSet::new()
            }
            Err(e) => {
                warn!(
                    "Failed to read processed cache {:?}: {}. Treating as empty.",
                    path, e
                );
                HashSet::new()
            }
        };

        info!("Loaded {} processed titles from {:?}", titles.len(), path);
        Self { path, titles }
    }

    /// Exact, case-sensitive containment
    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    /// Whether `title` fits on one record line
    pub fn can_record(title: &str) -> bool {
        !title.contains(['\n', '\r'])
    }

    /// Durably record `title` before returning.
    ///
    /// Titles containing a line terminator are rejected with `InvalidInput`.
    pub fn append(&mut self, title: &str) -> io::Result<()> {
        if !Self::can_record(title) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "title contains a line terminator",
            ));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", title)?;
        file.sync_data()?;

        self.titles.insert(title.to_string());
        debug!("Recorded processed title '{}'", title);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

fn parse_lines(content: &str) -> HashSet<String> {
    content
        .lines()
        // files written on Windows end lines in \r\n
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
