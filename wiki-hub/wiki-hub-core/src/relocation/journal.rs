//! Markers for relocations in flight.
//!
//! A marker is written before the primary move and removed once the
//! secondary stores have been handled. A marker that survives a crash tells
//! the startup sweep which secondary trees may have been left behind.

use super::layout::StorageLayout;
use super::mover::{mirror_secondary, MoveOptions, RelocationWarning};
use crate::error::{Result, WikiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRelocation {
    pub id: Uuid,
    pub old_path: String,
    pub new_path: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct RelocationJournal {
    dir: PathBuf,
}

impl RelocationJournal {
    pub fn new(layout: &StorageLayout) -> Self {
        Self {
            dir: layout.journal_dir(),
        }
    }

    fn marker_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a marker for `old_path -> new_path`.
    pub fn begin(&self, old_path: &str, new_path: &str) -> Result<PendingRelocation> {
        let marker = PendingRelocation {
            id: Uuid::new_v4(),
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
            started_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&marker)
            .map_err(|e| WikiError::internal("Failed to encode relocation marker", e))?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| WikiError::internal("Failed to create relocation journal", e))?;
        let tmp = self.dir.join(format!(".{}.tmp", marker.id));
        std::fs::write(&tmp, bytes)
            .and_then(|_| std::fs::rename(&tmp, self.marker_path(marker.id)))
            .map_err(|e| WikiError::internal("Failed to write relocation marker", e))?;
        Ok(marker)
    }

    pub fn complete(&self, marker: &PendingRelocation) {
        if let Err(e) = std::fs::remove_file(self.marker_path(marker.id)) {
            warn!(id = %marker.id, error = %e, "could not clear relocation marker");
        }
    }

    /// Markers left on disk, with the ones that could not be decoded.
    pub fn pending(&self) -> (Vec<PendingRelocation>, Vec<PathBuf>) {
        let mut markers = Vec::new();
        let mut unreadable = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return (markers, unreadable);
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let decoded = std::fs::read(&path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<PendingRelocation>(&bytes).ok());
            match decoded {
                Some(marker) => markers.push(marker),
                None => unreadable.push(path),
            }
        }
        markers.sort_by_key(|m| m.started_at);
        (markers, unreadable)
    }
}

#[derive(Debug, Default)]
pub struct RecoveryReport {
    /// Markers whose primary move had happened; secondary stores replayed.
    pub replayed: usize,
    /// Markers whose primary move never happened.
    pub discarded: usize,
    pub unreadable: usize,
    pub warnings: Vec<RelocationWarning>,
}

/// Finish relocations interrupted by a crash. Run before serving requests.
pub fn recover_pending(layout: &StorageLayout, options: MoveOptions) -> RecoveryReport {
    let journal = RelocationJournal::new(layout);
    let (markers, unreadable) = journal.pending();
    let mut report = RecoveryReport {
        unreadable: unreadable.len(),
        ..Default::default()
    };
    for path in unreadable {
        warn!(path = %path.display(), "discarding unreadable relocation marker");
        let _ = std::fs::remove_file(&path);
    }
    for marker in markers {
        let moved = layout.primary(&marker.new_path).exists() && !layout.primary(&marker.old_path).exists();
        if moved {
            info!(from = %marker.old_path, to = %marker.new_path, "replaying secondary relocation");
            report
                .warnings
                .extend(mirror_secondary(layout, &marker.old_path, &marker.new_path, options));
            report.replayed += 1;
        } else {
            report.discarded += 1;
        }
        journal.complete(&marker);
    }
    report
}
