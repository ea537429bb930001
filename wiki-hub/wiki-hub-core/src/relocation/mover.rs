//! Directory moves for the primary tree and its secondary mirrors.

use super::layout::StorageLayout;
use crate::error::{Result, WikiError};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, Default)]
pub struct MoveOptions {
    /// Fall back to copy-then-delete when a rename crosses devices.
    pub cross_device_copy: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Primary,
    Versions,
    Comments,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Primary => "primary",
            StoreKind::Versions => "versions",
            StoreKind::Comments => "comments",
        }
    }
}

/// A non-fatal failure observed after the primary move succeeded.
#[derive(Clone, Debug, Serialize)]
pub struct RelocationWarning {
    pub store: StoreKind,
    pub from: PathBuf,
    pub to: PathBuf,
    pub error: String,
}

impl fmt::Display for RelocationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} store not relocated from {} to {}: {}",
            self.store.as_str(),
            self.from.display(),
            self.to.display(),
            self.error
        )
    }
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Why a single directory move failed.
#[derive(Debug)]
enum DirMoveError {
    CreateParent(io::Error),
    Rename(io::Error),
    Copy(io::Error),
}

impl fmt::Display for DirMoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirMoveError::CreateParent(e) => write!(f, "failed to create target directory: {e}"),
            DirMoveError::Rename(e) => write!(f, "rename failed: {e}"),
            DirMoveError::Copy(e) => write!(f, "copy across devices failed: {e}"),
        }
    }
}

impl From<DirMoveError> for WikiError {
    fn from(err: DirMoveError) -> Self {
        match err {
            DirMoveError::CreateParent(e) => WikiError::internal("Failed to create target directory", e),
            // a concurrent relocation consumed the source
            DirMoveError::Rename(e) if e.kind() == io::ErrorKind::NotFound => {
                WikiError::NotFound("Source document or category not found".to_string())
            }
            // a concurrent relocation claimed the target
            DirMoveError::Rename(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::DirectoryNotEmpty
                ) =>
            {
                WikiError::Conflict("A document already exists at the target location".to_string())
            }
            DirMoveError::Rename(e) => WikiError::internal("Failed to move", e),
            DirMoveError::Copy(e) => WikiError::internal("Failed to copy across devices", e),
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Copy `from` next to `to` under a hidden name, then swap it in with a
/// same-device rename so the target never appears half-written. Returns the
/// error from removing the old tree, if that last step failed.
fn copy_across_devices(from: &Path, to: &Path) -> Result<Option<String>, DirMoveError> {
    copy_then_remove(from, to, |dir| std::fs::remove_dir_all(dir))
}

fn copy_then_remove<F>(from: &Path, to: &Path, remove: F) -> Result<Option<String>, DirMoveError>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let parent = to.parent().unwrap_or(Path::new("."));
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(format!(".{name}.relocating-{}", Uuid::new_v4()));

    if let Err(e) = copy_tree(from, &staging) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(DirMoveError::Copy(e));
    }
    if let Err(e) = std::fs::rename(&staging, to) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(DirMoveError::Rename(e));
    }
    Ok(remove(from).err().map(|e| e.to_string()))
}

fn leftover_message(error: &str) -> String {
    format!("copied, but the old directory could not be removed: {error}")
}

/// Create `dir` and any missing ancestors. Returns the topmost directory
/// that had to be created, if any.
fn create_parents(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut created = None;
    let mut cursor = Some(dir);
    while let Some(p) = cursor {
        if p.as_os_str().is_empty() || p.exists() {
            break;
        }
        created = Some(p.to_path_buf());
        cursor = p.parent();
    }
    std::fs::create_dir_all(dir)?;
    Ok(created)
}

/// Undo [`create_parents`]: remove `dir` and its ancestors up to `topmost`
/// while they are still empty.
fn remove_created_parents(dir: &Path, topmost: &Path) {
    let mut cursor = Some(dir);
    while let Some(p) = cursor {
        if std::fs::remove_dir(p).is_err() || p == topmost {
            break;
        }
        cursor = p.parent();
    }
}

/// Move one directory, creating the target's parents first. Parents created
/// here are removed again if the move fails.
fn relocate_dir(
    from: &Path,
    to: &Path,
    options: MoveOptions,
) -> Result<Option<String>, DirMoveError> {
    let parent = to.parent().filter(|p| !p.as_os_str().is_empty());
    let created = match parent {
        Some(parent) => create_parents(parent).map_err(DirMoveError::CreateParent)?,
        None => None,
    };
    let result = match std::fs::rename(from, to) {
        Ok(()) => Ok(None),
        Err(e) if is_cross_device(&e) && options.cross_device_copy => {
            debug!(from = %from.display(), to = %to.display(), "rename crosses devices, copying");
            copy_across_devices(from, to)
        }
        Err(e) => Err(DirMoveError::Rename(e)),
    };
    if result.is_err() {
        if let (Some(parent), Some(topmost)) = (parent, created.as_deref()) {
            remove_created_parents(parent, topmost);
        }
    }
    result
}

/// Move the primary content node. Errors leave the source in place.
pub fn move_primary(
    full_source: &Path,
    full_target: &Path,
    options: MoveOptions,
) -> Result<Vec<RelocationWarning>> {
    let leftover = relocate_dir(full_source, full_target, options)?;
    info!(from = %full_source.display(), to = %full_target.display(), "moved document");
    Ok(leftover
        .map(|error| RelocationWarning {
            store: StoreKind::Primary,
            from: full_source.to_path_buf(),
            to: full_target.to_path_buf(),
            error: leftover_message(&error),
        })
        .into_iter()
        .collect())
}

fn mirror_one(
    store: StoreKind,
    from: PathBuf,
    to: PathBuf,
    options: MoveOptions,
) -> Option<RelocationWarning> {
    if !from.exists() {
        debug!(store = store.as_str(), from = %from.display(), "no secondary tree to move");
        return None;
    }
    let error = match relocate_dir(&from, &to, options) {
        Ok(None) => return None,
        Ok(Some(leftover)) => leftover_message(&leftover),
        Err(e) => e.to_string(),
    };
    warn!(
        store = store.as_str(),
        from = %from.display(),
        to = %to.display(),
        %error,
        "secondary store did not follow relocation"
    );
    Some(RelocationWarning {
        store,
        from,
        to,
        error,
    })
}

/// Move revision history and comment threads after the primary node.
/// Each store is attempted independently; failures come back as warnings.
pub fn mirror_secondary(
    layout: &StorageLayout,
    old_path: &str,
    new_path: &str,
    options: MoveOptions,
) -> Vec<RelocationWarning> {
    [
        (
            StoreKind::Versions,
            layout.versions(old_path),
            layout.versions(new_path),
        ),
        (
            StoreKind::Comments,
            layout.comments(old_path),
            layout.comments(new_path),
        ),
    ]
    .into_iter()
    .filter_map(|(store, from, to)| mirror_one(store, from, to, options))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(root: &Path) -> PathBuf {
        let dir = root.join("src/notes");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("document.md"), "body").unwrap();
        std::fs::write(dir.join("nested/document.md"), "child").unwrap();
        dir
    }

    fn staging_left(dir: &Path) -> bool {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().contains(".relocating-"))
    }

    #[test]
    fn copy_swaps_tree_into_place() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tree(tmp.path());
        let dest_parent = tmp.path().join("dst");
        std::fs::create_dir_all(&dest_parent).unwrap();
        let to = dest_parent.join("notes");

        let leftover = copy_across_devices(&from, &to).unwrap();
        assert_eq!(leftover, None);
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(to.join("document.md")).unwrap(), "body");
        assert_eq!(
            std::fs::read_to_string(to.join("nested/document.md")).unwrap(),
            "child"
        );
        assert!(!staging_left(&dest_parent));
    }

    #[cfg(unix)]
    #[test]
    fn failed_copy_keeps_source_and_drops_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tree(tmp.path());
        // copying a dangling link fails part way through the walk
        std::os::unix::fs::symlink(tmp.path().join("missing"), from.join("broken")).unwrap();
        let dest_parent = tmp.path().join("dst");
        std::fs::create_dir_all(&dest_parent).unwrap();
        let to = dest_parent.join("notes");

        let err = copy_across_devices(&from, &to).unwrap_err();
        assert!(matches!(err, DirMoveError::Copy(_)));
        assert!(from.join("document.md").exists());
        assert!(from.join("nested/document.md").exists());
        assert!(!to.exists());
        assert!(!staging_left(&dest_parent));
    }

    #[test]
    fn undeletable_source_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tree(tmp.path());
        let to = tmp.path().join("notes");

        let leftover = copy_then_remove(&from, &to, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        })
        .unwrap()
        .unwrap();
        assert!(leftover.contains("read-only"));
        assert!(from.exists());
        assert!(to.join("document.md").exists());
        assert!(leftover_message(&leftover).starts_with("copied, but"));
    }

    #[test]
    fn failed_rename_removes_created_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("gone");
        let to = tmp.path().join("a/b/c/notes");

        let err = relocate_dir(&from, &to, MoveOptions::default()).unwrap_err();
        assert!(matches!(err, DirMoveError::Rename(_)));
        assert!(!tmp.path().join("a").exists());
    }

    #[test]
    fn failed_rename_keeps_existing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("a/keep")).unwrap();
        let from = tmp.path().join("gone");
        let to = tmp.path().join("a/b/notes");

        relocate_dir(&from, &to, MoveOptions::default()).unwrap_err();
        assert!(tmp.path().join("a/keep").exists());
        assert!(!tmp.path().join("a/b").exists());
    }
}
