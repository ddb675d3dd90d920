//! Service Layer Error Types
//!
//! Error kinds returned by `NodeService`. Validation, not-found and cycle
//! errors are detected before any write; persistence and store errors are
//! internal failures the caller should not blame on the request.

use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum NodeServiceError {
    /// Node absent, or owned by someone else
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// Structural invariant violated by the request
    #[error("Node validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Moving the node under the parent would create a cycle
    #[error("Circular reference: cannot move node {node_id} under {parent_id}")]
    CircularReference { node_id: String, parent_id: String },

    /// The store returned no row for a write that should have succeeded
    #[error("Persistence failure: {context}")]
    PersistenceFailure { context: String },

    /// The store itself failed
    #[error("Store operation failed: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl NodeServiceError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn circular_reference(node_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::CircularReference {
            node_id: node_id.into(),
            parent_id: parent_id.into(),
        }
    }

    pub fn persistence_failure(context: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            context: context.into(),
        }
    }

    /// True for errors caused by the request (4xx-equivalent), false for
    /// internal failures (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Validation(_) | Self::CircularReference { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(NodeServiceError::not_found("n1").is_client_error());
        assert!(NodeServiceError::from(ValidationError::EmptyTitle).is_client_error());
        assert!(NodeServiceError::circular_reference("a", "b").is_client_error());

        assert!(!NodeServiceError::persistence_failure("no row").is_client_error());
        assert!(!NodeServiceError::from(anyhow::anyhow!("disk full")).is_client_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NodeServiceError::not_found("n1").to_string(),
            "Node not found: n1"
        );
        assert_eq!(
            NodeServiceError::circular_reference("a", "b").to_string(),
            "Circular reference: cannot move node a under b"
        );
        assert_eq!(
            NodeServiceError::from(ValidationError::FolderContent).to_string(),
            "Node validation failed: folder cannot have content"
        );
    }
}
