//! MemoryStore - in-process NodeStore
//!
//! A `HashMap` behind a mutex, with the same ordering and cascade semantics as
//! `TursoStore`. Useful for tests and for embedding the engine without a
//! database file.

use crate::db::node_store::NodeStore;
use crate::models::{NewNode, Node, NodePatch};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: Mutex<HashMap<String, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, keeping their ids and timestamps.
    ///
    /// No validation is performed, so fixtures can describe states the service
    /// would never produce (dangling parents, for instance).
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let map = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        Self {
            nodes: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Node>>> {
        self.nodes
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire node map lock: {}", e))
    }

    fn sort_children(nodes: &mut [Node]) {
        nodes.sort_by(|a, b| {
            (a.kind(), &a.title, &a.id).cmp(&(b.kind(), &b.title, &b.id))
        });
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn list_all(&self, owner: &str) -> Result<Vec<Node>> {
        let nodes = self.lock()?;
        let mut result: Vec<Node> = nodes
            .values()
            .filter(|n| n.owner == owner)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            (&a.parent_id, a.kind(), &a.title, &a.id).cmp(&(&b.parent_id, b.kind(), &b.title, &b.id))
        });
        Ok(result)
    }

    async fn list_children(&self, owner: &str, parent_id: Option<&str>) -> Result<Vec<Node>> {
        let nodes = self.lock()?;
        let mut result: Vec<Node> = nodes
            .values()
            .filter(|n| n.owner == owner && n.parent_id.as_deref() == parent_id)
            .cloned()
            .collect();
        Self::sort_children(&mut result);
        Ok(result)
    }

    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Option<Node>> {
        let nodes = self.lock()?;
        Ok(nodes.get(id).filter(|n| n.owner == owner).cloned())
    }

    async fn insert(&self, node: NewNode) -> Result<Node> {
        let now = Utc::now();
        let created = Node {
            id: uuid::Uuid::new_v4().to_string(),
            owner: node.owner,
            title: node.title,
            body: node.body,
            parent_id: node.parent_id,
            created_at: now,
            updated_at: now,
        };

        let mut nodes = self.lock()?;
        if let Some(parent_id) = &created.parent_id {
            if !nodes.contains_key(parent_id) {
                anyhow::bail!("Parent node {} does not exist", parent_id);
            }
        }
        nodes.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_partial(
        &self,
        owner: &str,
        id: &str,
        patch: NodePatch,
    ) -> Result<Option<Node>> {
        let mut nodes = self.lock()?;
        match nodes.get_mut(id).filter(|n| n.owner == owner) {
            Some(node) => {
                patch.apply_to(node, Utc::now());
                Ok(Some(node.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<bool> {
        let mut nodes = self.lock()?;
        if !nodes.get(id).is_some_and(|n| n.owner == owner) {
            return Ok(false);
        }

        // Breadth-first over the parent pointers, same reach as the FK cascade
        let mut doomed = vec![id.to_string()];
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            for child in nodes
                .values()
                .filter(|n| n.parent_id.as_deref() == Some(current.as_str()))
            {
                doomed.push(child.id.clone());
                queue.push_back(child.id.clone());
            }
        }

        for doomed_id in doomed {
            nodes.remove(&doomed_id);
        }
        Ok(true)
    }

    async fn is_descendant(
        &self,
        owner: &str,
        ancestor_id: &str,
        candidate_id: &str,
    ) -> Result<bool> {
        let nodes = self.lock()?;
        if !nodes.get(ancestor_id).is_some_and(|n| n.owner == owner) {
            return Ok(false);
        }

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in nodes.values().filter(|n| n.owner == owner) {
            if let Some(parent) = node.parent_id.as_deref() {
                children.entry(parent).or_default().push(node.id.as_str());
            }
        }

        let mut visited = std::collections::HashSet::new();
        let mut queue = VecDeque::from([ancestor_id]);
        while let Some(current) = queue.pop_front() {
            if current == candidate_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(kids) = children.get(current) {
                queue.extend(kids.iter().copied());
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateNodeInput;

    #[test]
    fn test_insert_and_scoped_get() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let created = store
                .insert(CreateNodeInput::file("Doc", "text").into_new_node("alice"))
                .await
                .unwrap();

            assert_eq!(
                store.get_by_id("alice", &created.id).await.unwrap(),
                Some(created.clone())
            );
            assert_eq!(store.get_by_id("bob", &created.id).await.unwrap(), None);
        });
    }

    #[test]
    fn test_insert_with_missing_parent_fails() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let result = store
                .insert(
                    CreateNodeInput::file("Doc", "")
                        .with_parent("ghost")
                        .into_new_node("alice"),
                )
                .await;
            assert!(result.is_err());
        });
    }

    #[tokio::test]
    async fn test_ordering_matches_sql_store() {
        let store = MemoryStore::new();
        let b = store
            .insert(CreateNodeInput::folder("B").into_new_node("alice"))
            .await
            .unwrap();
        store
            .insert(CreateNodeInput::folder("A").into_new_node("alice"))
            .await
            .unwrap();
        store
            .insert(CreateNodeInput::file("Z", "").into_new_node("alice"))
            .await
            .unwrap();
        store
            .insert(
                CreateNodeInput::file("child", "")
                    .with_parent(b.id.clone())
                    .into_new_node("alice"),
            )
            .await
            .unwrap();

        let roots: Vec<String> = store
            .list_children("alice", None)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(roots, vec!["Z", "A", "B"]);

        let all: Vec<String> = store
            .list_all("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(all, vec!["Z", "A", "B", "child"]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryStore::new();
        let top = store
            .insert(CreateNodeInput::folder("Top").into_new_node("alice"))
            .await
            .unwrap();
        let inner = store
            .insert(
                CreateNodeInput::folder("Inner")
                    .with_parent(top.id.clone())
                    .into_new_node("alice"),
            )
            .await
            .unwrap();
        store
            .insert(
                CreateNodeInput::file("Leaf", "")
                    .with_parent(inner.id.clone())
                    .into_new_node("alice"),
            )
            .await
            .unwrap();

        assert!(!store.delete("bob", &top.id).await.unwrap());
        assert!(store.delete("alice", &top.id).await.unwrap());
        assert!(store.list_all("alice").await.unwrap().is_empty());
        assert!(!store.delete("alice", &top.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_partial_merges_fields() {
        let store = MemoryStore::new();
        let file = store
            .insert(CreateNodeInput::file("Doc", "v1").into_new_node("alice"))
            .await
            .unwrap();

        let patch = NodePatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = store
            .update_partial("alice", &file.id, patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.content(), Some("v1"));
        assert!(updated.updated_at >= file.updated_at);

        assert!(store
            .update_partial("alice", "missing", NodePatch::reparent(None))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_is_descendant_zero_or_more_steps() {
        let store = MemoryStore::new();
        let f1 = store
            .insert(CreateNodeInput::folder("F1").into_new_node("alice"))
            .await
            .unwrap();
        let f2 = store
            .insert(
                CreateNodeInput::folder("F2")
                    .with_parent(f1.id.clone())
                    .into_new_node("alice"),
            )
            .await
            .unwrap();

        assert!(store.is_descendant("alice", &f1.id, &f1.id).await.unwrap());
        assert!(store.is_descendant("alice", &f1.id, &f2.id).await.unwrap());
        assert!(!store.is_descendant("alice", &f2.id, &f1.id).await.unwrap());
        assert!(!store.is_descendant("bob", &f1.id, &f2.id).await.unwrap());
    }
}
