//! Node Service - Validated Tree Mutations
//!
//! This module provides the business logic layer between callers and a
//! [`NodeStore`]:
//!
//! - CRUD operations (create, get, update, delete)
//! - Hierarchy management (move_node, list_children, tree, node_path)
//! - Cycle detection, in memory or through the store's closure query
//!
//! # Owner Scoping
//!
//! Every operation takes the owner explicitly. A node owned by someone else is
//! reported as `NotFound`, never as a permission error.
//!
//! # Concurrency
//!
//! Mutations hold a per-owner lock (see [`OwnerLocks`]) from the first read to
//! the write, so the fetch, cycle check and update of a move behave as one
//! step with respect to other mutations on the same `NodeService`.

use crate::config::{CycleCheckStrategy, DocTreeConfig};
use crate::db::{DatabaseService, NodeStore, TursoStore};
use crate::models::{
    validate_create, validate_update, CreateNodeInput, Node, NodePatch, NodeUpdate,
    ValidationError,
};
use crate::services::error::NodeServiceError;
use crate::services::owner_lock::OwnerLocks;
use crate::tree::{self, build_forest, Forest};
use anyhow::Context;
use std::sync::Arc;

/// Core service for document tree operations
pub struct NodeService {
    store: Arc<dyn NodeStore>,
    cycle_check: CycleCheckStrategy,
    locks: OwnerLocks,
}

impl NodeService {
    /// Create a service over any store, using the in-memory cycle check.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use doctree_core::db::MemoryStore;
    /// # use doctree_core::models::CreateNodeInput;
    /// # use doctree_core::services::NodeService;
    /// # use std::sync::Arc;
    /// # tokio_test::block_on(async {
    /// let service = NodeService::new(Arc::new(MemoryStore::new()));
    /// let folder = service.create("alice", CreateNodeInput::folder("Projects")).await?;
    /// let doc = service
    ///     .create("alice", CreateNodeInput::file("plan.md", "").with_parent(folder.id.clone()))
    ///     .await?;
    /// assert_eq!(service.node_path("alice", &doc.id).await?, "Projects/plan.md");
    /// # Ok::<(), doctree_core::services::NodeServiceError>(())
    /// # }).unwrap();
    /// ```
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            cycle_check: CycleCheckStrategy::default(),
            locks: OwnerLocks::new(),
        }
    }

    /// Select the cycle check strategy
    pub fn with_cycle_check(mut self, strategy: CycleCheckStrategy) -> Self {
        self.cycle_check = strategy;
        self
    }

    /// Open the libsql database named by `config` and build a service over it
    pub async fn open(config: &DocTreeConfig) -> anyhow::Result<Self> {
        config.validate().map_err(|e| anyhow::anyhow!(e))?;

        let db = DatabaseService::with_busy_timeout(
            config.database_path.clone(),
            config.busy_timeout_ms,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })?;

        tracing::info!(
            "Document tree service ready (database: {}, cycle check: {})",
            config.database_path.display(),
            config.cycle_check
        );

        Ok(Self::new(Arc::new(TursoStore::new(Arc::new(db)))).with_cycle_check(config.cycle_check))
    }

    pub fn cycle_check(&self) -> CycleCheckStrategy {
        self.cycle_check
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    //
    // READ OPERATIONS
    //

    /// Get a node, `NotFound` if it is absent or owned by someone else
    pub async fn get(&self, owner: &str, id: &str) -> Result<Node, NodeServiceError> {
        self.store
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| NodeServiceError::not_found(id))
    }

    /// All of an owner's nodes, ordered `(parent, kind, title)`
    pub async fn list_all(&self, owner: &str) -> Result<Vec<Node>, NodeServiceError> {
        Ok(self.store.list_all(owner).await?)
    }

    /// Folder listing: files first, then folders, each by title.
    ///
    /// `None` lists the root level. A parent that does not exist for the owner
    /// is `NotFound`.
    pub async fn list_children(
        &self,
        owner: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<Node>, NodeServiceError> {
        if let Some(parent_id) = parent_id {
            self.get(owner, parent_id).await?;
        }
        Ok(self.store.list_children(owner, parent_id).await?)
    }

    /// Build the owner's forest from a fresh snapshot.
    ///
    /// Records whose parent chain does not reach a root are left out of the
    /// forest and listed in [`Forest::detached`].
    pub async fn tree(&self, owner: &str) -> Result<Forest, NodeServiceError> {
        let nodes = self.store.list_all(owner).await?;
        let total = nodes.len();
        let forest = build_forest(nodes);

        if !forest.detached().is_empty() {
            tracing::warn!(
                "Omitting {} of {} nodes for owner {} from tree view: parent chain does not reach a root ({:?})",
                forest.detached().len(),
                total,
                owner,
                forest.detached()
            );
        }
        tracing::debug!("Built tree for owner {} with {} nodes", owner, forest.len());

        Ok(forest)
    }

    /// Slash-joined titles from the root to the node, e.g. `"Projects/plan.md"`.
    ///
    /// A node that exists but is detached from the roots has no path and is
    /// reported as `NotFound`.
    pub async fn node_path(&self, owner: &str, id: &str) -> Result<String, NodeServiceError> {
        let forest = self.tree(owner).await?;
        forest
            .path_of(id)
            .ok_or_else(|| NodeServiceError::not_found(id))
    }

    /// Would moving `node_id` under `candidate_parent_id` create a cycle?
    ///
    /// Uses the configured strategy. Both strategies agree: `None` is never a
    /// cycle, the node itself always is, otherwise the candidate must be one of
    /// the node's descendants.
    pub async fn would_create_cycle(
        &self,
        owner: &str,
        node_id: &str,
        candidate_parent_id: Option<&str>,
    ) -> Result<bool, NodeServiceError> {
        let candidate = match candidate_parent_id {
            None => return Ok(false),
            Some(candidate) if candidate == node_id => return Ok(true),
            Some(candidate) => candidate,
        };

        match self.cycle_check {
            CycleCheckStrategy::InMemory => {
                let forest = build_forest(self.store.list_all(owner).await?);
                Ok(tree::would_create_cycle(&forest, node_id, Some(candidate)))
            }
            CycleCheckStrategy::StoreClosure => {
                Ok(self.store.is_descendant(owner, node_id, candidate).await?)
            }
        }
    }

    //
    // WRITE OPERATIONS
    //

    /// Create a node.
    ///
    /// Runs the structural validator, then checks that the parent (if any) is a
    /// folder owned by `owner`.
    pub async fn create(
        &self,
        owner: &str,
        input: CreateNodeInput,
    ) -> Result<Node, NodeServiceError> {
        validate_create(&input)?;

        let _guard = self.locks.acquire(owner).await;

        if let Some(parent_id) = input.parent_id.as_deref() {
            self.ensure_folder(owner, parent_id).await?;
        }

        let node = self.store.insert(input.into_new_node(owner)).await?;
        tracing::info!(
            "Created {} '{}' ({}) for owner {}",
            node.kind(),
            node.title,
            node.id,
            owner
        );
        Ok(node)
    }

    /// Apply a partial update.
    ///
    /// Unspecified fields are left alone. A parent change goes through the same
    /// cycle and parent checks as [`move_node`](Self::move_node); a parent equal to
    /// the current one is ignored. An update that changes nothing returns the
    /// stored record without touching `updated_at`.
    pub async fn update(
        &self,
        owner: &str,
        id: &str,
        update: NodeUpdate,
    ) -> Result<Node, NodeServiceError> {
        let _guard = self.locks.acquire(owner).await;

        let existing = self.get(owner, id).await?;
        validate_update(&update, existing.kind())?;

        let mut patch = NodePatch::from(update);
        if patch.parent_id.as_ref() == Some(&existing.parent_id) {
            patch.parent_id = None;
        }
        if patch.is_empty() {
            tracing::debug!("Update of node {} changes nothing", id);
            return Ok(existing);
        }

        if let Some(new_parent) = &patch.parent_id {
            self.check_reparent(owner, id, new_parent.as_deref()).await?;
        }

        let updated = self
            .store
            .update_partial(owner, id, patch)
            .await?
            .ok_or_else(|| {
                NodeServiceError::persistence_failure(format!(
                    "update of node {} returned no row",
                    id
                ))
            })?;

        tracing::info!("Updated node {} for owner {}", id, owner);
        Ok(updated)
    }

    /// Move a node under a new parent (`None` = root level).
    ///
    /// Moving to the current parent is a no-op returning the stored record.
    /// Fails with `CircularReference` when the new parent is the node itself or
    /// one of its descendants; the stored parent is left unchanged.
    pub async fn move_node(
        &self,
        owner: &str,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Node, NodeServiceError> {
        let _guard = self.locks.acquire(owner).await;

        let existing = self.get(owner, id).await?;
        if existing.parent_id.as_deref() == new_parent_id {
            tracing::debug!("Node {} already under {:?}, nothing to move", id, new_parent_id);
            return Ok(existing);
        }

        self.check_reparent(owner, id, new_parent_id).await?;

        let moved = self
            .store
            .update_partial(owner, id, NodePatch::reparent(new_parent_id))
            .await?
            .ok_or_else(|| {
                NodeServiceError::persistence_failure(format!(
                    "move of node {} returned no row",
                    id
                ))
            })?;

        tracing::info!(
            "Moved node {} from {:?} to {:?} for owner {}",
            id,
            existing.parent_id,
            new_parent_id,
            owner
        );
        Ok(moved)
    }

    /// Delete a node together with its subtree.
    ///
    /// The cascade happens inside the store; this issues a single delete.
    pub async fn delete(&self, owner: &str, id: &str) -> Result<(), NodeServiceError> {
        let _guard = self.locks.acquire(owner).await;

        if !self.store.delete(owner, id).await? {
            return Err(NodeServiceError::not_found(id));
        }

        tracing::info!("Deleted node {} and its subtree for owner {}", id, owner);
        Ok(())
    }

    //
    // HELPERS
    //

    /// Cycle check followed by the parent check. Caller holds the owner lock.
    async fn check_reparent(
        &self,
        owner: &str,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), NodeServiceError> {
        if self.would_create_cycle(owner, id, new_parent_id).await? {
            let parent_id = new_parent_id.unwrap_or_default();
            tracing::warn!(
                "Rejected move of node {} under {} for owner {}: would create a cycle",
                id,
                parent_id,
                owner
            );
            return Err(NodeServiceError::circular_reference(id, parent_id));
        }

        if let Some(parent_id) = new_parent_id {
            self.ensure_folder(owner, parent_id).await?;
        }
        Ok(())
    }

    async fn ensure_folder(&self, owner: &str, parent_id: &str) -> Result<(), NodeServiceError> {
        let parent = self.get(owner, parent_id).await?;
        if !parent.is_folder() {
            return Err(ValidationError::ParentNotFolder {
                parent_id: parent_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
