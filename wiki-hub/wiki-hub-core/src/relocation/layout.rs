use crate::paths::SEPARATOR;
use std::path::{Path, PathBuf};

/// Canonical path of the home page. It can never be relocated.
pub const HOME_PATH: &str = "pages/home";
/// Final segment reserved for per-category home pages.
pub const HOMEPAGE_SEGMENT: &str = "homepage";
pub const DOCUMENT_FILE: &str = "document.md";

const VERSIONS_DIR: &str = "versions";
const COMMENTS_DIR: &str = "comments";
const JOURNAL_DIR: &str = ".relocations";
/// Revision history of ordinary documents lives under this prefix.
const VERSIONS_DOCUMENTS_PREFIX: &str = "documents";

/// Where the primary and secondary trees live on disk. All three trees are
/// addressed by the same canonical relative path.
#[derive(Clone, Debug)]
pub struct StorageLayout {
    root: PathBuf,
    documents_dir: String,
}

fn push_canonical(base: &Path, path: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        out.push(segment);
    }
    out
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>, documents_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            documents_dir: documents_dir.into(),
        }
    }

    pub fn documents_root(&self) -> PathBuf {
        push_canonical(&self.root, &self.documents_dir)
    }

    /// Directory of the content node at `path`.
    pub fn primary(&self, path: &str) -> PathBuf {
        push_canonical(&self.documents_root(), path)
    }

    pub fn document_file(&self, path: &str) -> PathBuf {
        self.primary(path).join(DOCUMENT_FILE)
    }

    /// Revision history directory. The home page keeps its own pair of
    /// segments; everything else sits under `documents/` unless the path
    /// already starts with it.
    pub fn versions(&self, path: &str) -> PathBuf {
        let base = self.root.join(VERSIONS_DIR);
        let prefixed = format!("{VERSIONS_DOCUMENTS_PREFIX}{SEPARATOR}");
        if path == HOME_PATH || path.starts_with(&prefixed) {
            push_canonical(&base, path)
        } else {
            push_canonical(&base.join(VERSIONS_DOCUMENTS_PREFIX), path)
        }
    }

    pub fn comments(&self, path: &str) -> PathBuf {
        push_canonical(&self.root.join(COMMENTS_DIR), path)
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.root.join(JOURNAL_DIR)
    }
}
