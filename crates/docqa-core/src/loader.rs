//! Corpus loading: walks a directory tree and reads matching files as
//! [`Document`]s. Files that cannot be read or are not UTF-8 are reported in
//! the [`LoadReport`] and skipped; they never abort the pass.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::CorpusConfig;
use crate::types::Document;
use crate::{Error, Result};

#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

pub struct DocumentLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DocumentLoader {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        let extensions = extensions.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect();
        Self { root: root.into(), extensions }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(&config.path, &config.extensions)
    }

    /// Load every matching file under the root, in sorted path order.
    ///
    /// Fails only when the root itself is missing or is not a directory.
    pub fn load(&self) -> Result<LoadReport> {
        if !self.root.is_dir() {
            return Err(Error::NotFound(format!("corpus directory {}", self.root.display())));
        }
        let mut report = LoadReport::default();
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.accepts(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    let source = e.into_io_error().unwrap_or_else(|| std::io::Error::new(ErrorKind::Other, "filesystem loop"));
                    warn!(path = %path.display(), error = %source, "skipping unreadable corpus entry");
                    report.failures.push(LoadFailure { path: path.clone(), error: Error::Read { path, source } });
                }
            }
        }
        files.sort();

        for path in files {
            match self.read_document(&path) {
                Ok(doc) => {
                    debug!(id = %doc.id, bytes = doc.raw_text.len(), "loaded document");
                    report.documents.push(doc);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping document");
                    report.failures.push(LoadFailure { path, error });
                }
            }
        }
        info!(
            root = %self.root.display(),
            documents = report.documents.len(),
            failures = report.failures.len(),
            "corpus loaded"
        );
        Ok(report)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn read_document(&self, path: &Path) -> Result<Document> {
        let raw_text = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::InvalidData => Error::Encoding { path: path.to_path_buf() },
            _ => Error::Read { path: path.to_path_buf(), source },
        })?;
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let source_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source_path.clone());
        Ok(Document { id: source_path.clone(), raw_text, source_name, source_path })
    }
}
