//! Renaming and moving documents and categories.
//!
//! A relocation is planned from the request alone, checked against the
//! primary tree, and then executed as a single directory rename. Revision
//! history and comment threads follow on a best-effort basis: once the
//! primary node has moved the call succeeds, and secondary failures are
//! reported as warnings.

mod conflict;
mod journal;
mod layout;
mod mover;
mod plan;

pub use conflict::check_target;
pub use journal::{recover_pending, PendingRelocation, RecoveryReport, RelocationJournal};
pub use layout::{StorageLayout, DOCUMENT_FILE, HOMEPAGE_SEGMENT, HOME_PATH};
pub use mover::{mirror_secondary, move_primary, MoveOptions, RelocationWarning, StoreKind};
pub use plan::{plan, OperationKind, RelocationPlan, RelocationRequest};

use crate::error::{Result, WikiError};
use crate::paths;

#[derive(Debug)]
pub struct RelocationOutcome {
    pub plan: RelocationPlan,
    pub warnings: Vec<RelocationWarning>,
}

#[derive(Clone, Debug)]
pub struct Relocator {
    layout: StorageLayout,
    options: MoveOptions,
    journal: RelocationJournal,
}

impl Relocator {
    pub fn new(layout: StorageLayout, options: MoveOptions) -> Self {
        let journal = RelocationJournal::new(&layout);
        Self {
            layout,
            options,
            journal,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Plan, check and execute a relocation. Rejections happen before
    /// anything on disk changes.
    pub fn relocate(&self, request: &RelocationRequest) -> Result<RelocationOutcome> {
        let plan = plan(request)?;
        let full_source = self.layout.primary(&plan.source);
        let full_target = self.layout.primary(&plan.target);

        match std::fs::metadata(&full_source) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WikiError::NotFound(
                    "Source document or category not found".to_string(),
                ));
            }
            Err(e) => return Err(WikiError::internal("Error accessing source", e)),
        }

        check_target(
            &full_source,
            &full_target,
            paths::slug(&plan.source),
            plan.new_slug.as_deref(),
        )?;

        let marker = self.journal.begin(&plan.source, &plan.target)?;
        let mut warnings = match move_primary(&full_source, &full_target, self.options) {
            Ok(warnings) => warnings,
            Err(e) => {
                self.journal.complete(&marker);
                return Err(e);
            }
        };
        warnings.extend(mirror_secondary(
            &self.layout,
            &plan.source,
            &plan.target,
            self.options,
        ));
        self.journal.complete(&marker);

        Ok(RelocationOutcome { plan, warnings })
    }
}
