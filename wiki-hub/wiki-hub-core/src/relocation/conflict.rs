use super::layout::DOCUMENT_FILE;
use crate::error::{Result, WikiError};
use std::path::Path;

/// Check that `full_target` is free to receive `full_source`.
///
/// An existing document at the target is a conflict, except when the new
/// slug differs from the old one only by case and the node also changes
/// parent. A same-directory case-only rename lands here only on a
/// case-insensitive filesystem, where source and target are the same entry,
/// so it stays a conflict. A non-empty category without a document is
/// always a conflict.
pub fn check_target(
    full_source: &Path,
    full_target: &Path,
    source_slug: &str,
    new_slug: Option<&str>,
) -> Result<()> {
    if full_source == full_target {
        return Ok(());
    }

    if full_target.join(DOCUMENT_FILE).exists() {
        let case_only = new_slug.is_some_and(|slug| slug.to_lowercase() == source_slug.to_lowercase());
        let same_parent = full_source.parent() == full_target.parent();
        if !case_only || same_parent {
            return Err(WikiError::Conflict(
                "A document already exists at the target location".to_string(),
            ));
        }
        return Ok(());
    }

    match std::fs::metadata(full_target) {
        Ok(meta) if meta.is_dir() => {
            let occupied = std::fs::read_dir(full_target)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);
            if occupied {
                return Err(WikiError::Conflict(
                    "Target directory already exists and is not empty".to_string(),
                ));
            }
            Ok(())
        }
        Ok(_) => Err(WikiError::Conflict(
            "A file already exists at the target location".to_string(),
        )),
        Err(_) => Ok(()),
    }
}
