//! Structural validation for create and update intents.
//!
//! These checks are pure: no I/O, deterministic, side-effect free. They run
//! before any store call so a rejected intent never touches persisted state.

use super::node::{CreateNodeInput, NodeKind, NodeUpdate};
use thiserror::Error;

/// Maximum title length, counted in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Invariant violations detected before a write
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is required")]
    EmptyTitle,

    #[error("title is {length} characters long, maximum is {max}")]
    TitleTooLong { length: usize, max: usize },

    #[error("folder cannot have content")]
    FolderContent,

    #[error("cannot update content of a folder")]
    FolderContentUpdate,

    #[error("parent {parent_id} is not a folder")]
    ParentNotFolder { parent_id: String },
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            length,
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

/// Validate a create-intent.
///
/// An empty content string on a folder counts as "not provided".
pub fn validate_create(input: &CreateNodeInput) -> Result<(), ValidationError> {
    validate_title(&input.title)?;

    if input.kind == NodeKind::Folder && input.content.as_deref().is_some_and(|c| !c.is_empty()) {
        return Err(ValidationError::FolderContent);
    }

    Ok(())
}

/// Validate an update-intent against the kind of the stored node
pub fn validate_update(update: &NodeUpdate, existing_kind: NodeKind) -> Result<(), ValidationError> {
    if update.content.is_some() && existing_kind == NodeKind::Folder {
        return Err(ValidationError::FolderContentUpdate);
    }

    if let Some(title) = &update.title {
        validate_title(title)?;
    }

    Ok(())
}
