use super::layout::{HOMEPAGE_SEGMENT, HOME_PATH};
use crate::error::{Result, WikiError};
use crate::paths::{self, normalize};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of a relocation call. Only `source_path` is mandatory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelocationRequest {
    pub source_path: String,
    pub target_path: String,
    pub new_slug: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OperationKind {
    /// Same parent, new slug.
    Rename,
    /// New parent, same slug.
    Move,
    MoveAndRename,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelocationPlan {
    pub kind: OperationKind,
    pub source: String,
    pub target: String,
    pub new_slug: Option<String>,
}

/// Where the node should end up, before it is turned into a path.
enum Intent<'a> {
    Rename { slug: &'a str },
    Move { parent: &'a str },
    MoveAndRename { parent: &'a str, slug: &'a str },
}

fn is_home(path: &str) -> bool {
    path.is_empty()
        || path.to_lowercase() == HOME_PATH
        || paths::slug(path) == HOMEPAGE_SEGMENT
}

fn validate_slug(slug: &str) -> Result<()> {
    if slug.contains('/') || slug.contains('\\') || slug == "." || slug == ".." {
        return Err(WikiError::validation(
            "New slug must be a single path segment",
        ));
    }
    Ok(())
}

fn classify<'a>(source: &'a str, target: &'a str, new_slug: &'a str) -> Option<Intent<'a>> {
    let rename = (!new_slug.is_empty()).then_some(new_slug);
    // an empty target with nothing to rename means "move to the root",
    // which is only meaningful for nodes that are not already there
    let destination = if !target.is_empty() {
        Some(target)
    } else if rename.is_none() && !paths::parent(source).is_empty() {
        Some("")
    } else {
        None
    };
    match (rename, destination) {
        (Some(slug), None) => Some(Intent::Rename { slug }),
        (None, Some(parent)) => Some(Intent::Move { parent }),
        (Some(slug), Some(parent)) => Some(Intent::MoveAndRename { parent, slug }),
        (None, None) => None,
    }
}

/// Turn a request into a plan. Nothing on disk is consulted.
pub fn plan(request: &RelocationRequest) -> Result<RelocationPlan> {
    if request.source_path.is_empty() {
        return Err(WikiError::validation("Source path is required"));
    }
    let source = normalize(&request.source_path);
    let target = normalize(&request.target_path);
    let new_slug = request.new_slug.as_str();

    if is_home(&source) {
        return Err(WikiError::validation("Cannot move or rename the home page"));
    }
    if target.to_lowercase() == HOME_PATH {
        return Err(WikiError::validation(
            "Cannot move or rename to the home page location",
        ));
    }
    validate_slug(new_slug)?;

    let intent = classify(&source, &target, new_slug).ok_or_else(|| {
        WikiError::validation("Either target path or new slug must be provided")
    })?;
    let (kind, resolved) = match intent {
        Intent::Rename { slug } => (
            OperationKind::Rename,
            paths::join(paths::parent(&source), slug),
        ),
        Intent::Move { parent } => (
            OperationKind::Move,
            paths::join(parent, paths::slug(&source)),
        ),
        Intent::MoveAndRename { parent, slug } => {
            (OperationKind::MoveAndRename, paths::join(parent, slug))
        }
    };
    debug!(?kind, %source, %resolved, "classified relocation");

    if resolved.to_lowercase() == HOME_PATH {
        return Err(WikiError::validation(
            "Cannot move or rename to the home page location",
        ));
    }
    if resolved == source {
        return Err(WikiError::validation("Source and target paths are the same"));
    }
    if resolved.starts_with(&format!("{source}/")) {
        return Err(WikiError::validation(
            "Cannot move a category into itself",
        ));
    }

    Ok(RelocationPlan {
        kind,
        source,
        target: resolved,
        new_slug: (!new_slug.is_empty()).then(|| new_slug.to_string()),
    })
}
