//! NodeStore Trait - Persistence Abstraction
//!
//! `NodeStore` is the only contract between the tree engine and whatever
//! persists node records. `NodeService` talks to `Arc<dyn NodeStore>`, so the
//! libsql backend (`TursoStore`) and the in-process backend (`MemoryStore`)
//! are interchangeable.
//!
//! # Design Decisions
//!
//! 1. **Owner-scoped**: every method takes the owner; a record owned by someone
//!    else is indistinguishable from a missing one
//! 2. **Async-first**: embedded and networked backends share one interface
//! 3. **Error Handling**: `anyhow::Result`, with the caller adding context
//! 4. **Store-side invariants**: subtree cascade on delete belongs to the store
//!
//! # Examples
//!
//! ```rust,no_run
//! use doctree_core::db::{MemoryStore, NodeStore};
//! use doctree_core::models::CreateNodeInput;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let folder = store
//!     .insert(CreateNodeInput::folder("Projects").into_new_node("alice"))
//!     .await?;
//! let roots = store.list_children("alice", None).await?;
//! assert_eq!(roots[0].id, folder.id);
//! # Ok(())
//! # }
//! ```

use crate::models::{NewNode, Node, NodePatch};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node persistence operations
///
/// Implementations must be `Send + Sync` so a store can be shared across tasks.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// All nodes of an owner.
    ///
    /// Ordered globally by `(parent_id ASC, kind ASC, title ASC)` with root-level
    /// nodes first. This is not grouped per parent; the tree builder keeps this
    /// order within each child list.
    async fn list_all(&self, owner: &str) -> Result<Vec<Node>>;

    /// Direct children of `parent_id` (`None` = root level), ordered by
    /// `(kind ASC, title ASC)` so files list before folders.
    async fn list_children(&self, owner: &str, parent_id: Option<&str>) -> Result<Vec<Node>>;

    /// Get node by ID
    ///
    /// # Returns
    ///
    /// - `Ok(Some(node))` if the node exists for this owner
    /// - `Ok(None)` if it doesn't exist or belongs to another owner
    /// - `Err(_)` if the store failed
    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Option<Node>>;

    /// Insert a new node.
    ///
    /// The store assigns the id and both timestamps and returns the stored record.
    async fn insert(&self, node: NewNode) -> Result<Node>;

    /// Merge a patch into an existing node.
    ///
    /// Only the fields present in the patch change; `updated_at` always advances.
    /// Content is ignored for folders.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(node))` with the updated record
    /// - `Ok(None)` if `(id, owner)` matched no row
    async fn update_partial(&self, owner: &str, id: &str, patch: NodePatch)
        -> Result<Option<Node>>;

    /// Delete a node and its entire subtree
    ///
    /// # Cascade Delete Semantics
    ///
    /// Removing a folder removes every descendant as well, atomically. The core
    /// issues exactly one call and relies on the store for the cascade.
    ///
    /// # Returns
    ///
    /// `true` if a row was removed, `false` if `(id, owner)` matched nothing
    async fn delete(&self, owner: &str, id: &str) -> Result<bool>;

    /// Is `candidate_id` reachable from `ancestor_id` by following children zero
    /// or more times?
    ///
    /// Transitive-closure helper backing the store-side cycle check. Returns
    /// `false` when the ancestor does not exist for the owner.
    async fn is_descendant(&self, owner: &str, ancestor_id: &str, candidate_id: &str)
        -> Result<bool>;
}
