//! TursoStore - NodeStore Implementation for Turso/libsql Backend
//!
//! Persists owner-scoped file/folder records in the `nodes` table created by
//! [`DatabaseService`]. Subtree deletion is delegated to the
//! `ON DELETE CASCADE` foreign key, and the transitive-closure question behind
//! the store-side cycle check is answered with a recursive CTE.
//!
//! # Examples
//!
//! ```rust,no_run
//! use doctree_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let roots = store.list_children("alice", None).await?;
//!     println!("{} root nodes", roots.len());
//!     Ok(())
//! }
//! ```

use crate::db::node_store::NodeStore;
use crate::db::DatabaseService;
use crate::models::{NewNode, Node, NodeBody, NodeKind, NodePatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::{params, Row};
use std::sync::Arc;

/// Column list matching `row_to_node`
const NODE_COLUMNS: &str =
    "id, owner_id, kind, title, content, parent_id, created_at, updated_at";

/// NodeStore backed by an embedded libsql database
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// Rows written by this store use RFC3339 with microseconds. Rows written by
    /// hand (e.g. `CURRENT_TIMESTAMP`) use "YYYY-MM-DD HH:MM:SS".
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    fn format_timestamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Convert libsql::Row to Node model
    ///
    /// # Row Format
    ///
    /// Expected columns (in order), see `NODE_COLUMNS`:
    /// - id (TEXT)
    /// - owner_id (TEXT)
    /// - kind (TEXT, 'file' | 'folder')
    /// - title (TEXT)
    /// - content (TEXT, NULL for folders)
    /// - parent_id (TEXT, nullable)
    /// - created_at (TEXT)
    /// - updated_at (TEXT)
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let owner: String = row.get(1).context("Failed to get owner_id")?;
        let kind_str: String = row.get(2).context("Failed to get kind")?;
        let title: String = row.get(3).context("Failed to get title")?;
        let content: Option<String> = row.get(4).context("Failed to get content")?;
        let parent_id: Option<String> = row.get(5).context("Failed to get parent_id")?;
        let created_at_str: String = row.get(6).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(7).context("Failed to get updated_at")?;

        let kind = kind_str
            .parse::<NodeKind>()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("Invalid kind on node {}", id))?;

        let created_at =
            Self::parse_timestamp(&created_at_str).context("Failed to parse created_at")?;
        let updated_at =
            Self::parse_timestamp(&updated_at_str).context("Failed to parse updated_at")?;

        Ok(Node {
            id,
            owner,
            title,
            body: NodeBody::from_parts(kind, content),
            parent_id,
            created_at,
            updated_at,
        })
    }

    async fn collect_nodes(mut rows: libsql::Rows) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read row")? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn connection(&self) -> Result<libsql::Connection> {
        self.db
            .connect_with_timeout()
            .await
            .context("Failed to open database connection")
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn list_all(&self, owner: &str) -> Result<Vec<Node>> {
        let conn = self.connection().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM nodes WHERE owner_id = ?1
                     ORDER BY parent_id ASC, kind ASC, title ASC, id ASC",
                    NODE_COLUMNS
                ),
                params![owner],
            )
            .await
            .context("Failed to list nodes")?;

        Self::collect_nodes(rows).await
    }

    async fn list_children(&self, owner: &str, parent_id: Option<&str>) -> Result<Vec<Node>> {
        let conn = self.connection().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM nodes WHERE owner_id = ?1 AND parent_id IS ?2
                     ORDER BY kind ASC, title ASC, id ASC",
                    NODE_COLUMNS
                ),
                (owner, parent_id),
            )
            .await
            .context("Failed to list children")?;

        Self::collect_nodes(rows).await
    }

    async fn get_by_id(&self, owner: &str, id: &str) -> Result<Option<Node>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM nodes WHERE id = ?1 AND owner_id = ?2",
                    NODE_COLUMNS
                ),
                (id, owner),
            )
            .await
            .context("Failed to get node")?;

        match rows.next().await.context("Failed to read row")? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, node: NewNode) -> Result<Node> {
        let conn = self.connection().await?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Self::format_timestamp(Utc::now());
        let kind = node.body.kind();
        let content = match node.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Folder => None,
        };

        let mut rows = conn
            .query(
                &format!(
                    "INSERT INTO nodes ({})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     RETURNING {}",
                    NODE_COLUMNS, NODE_COLUMNS
                ),
                (
                    id.as_str(),
                    node.owner.as_str(),
                    kind.as_str(),
                    node.title.as_str(),
                    content,
                    node.parent_id.as_deref(),
                    now.as_str(),
                    now.as_str(),
                ),
            )
            .await
            .context("Failed to insert node")?;

        let row = rows
            .next()
            .await
            .context("Failed to read inserted node")?
            .ok_or_else(|| anyhow::anyhow!("Node not found after creation"))?;
        Self::row_to_node(&row)
    }

    async fn update_partial(
        &self,
        owner: &str,
        id: &str,
        patch: NodePatch,
    ) -> Result<Option<Node>> {
        let conn = self.connection().await?;
        let now = Self::format_timestamp(Utc::now());
        let (reparent, new_parent) = match patch.parent_id {
            Some(parent) => (1i64, parent),
            None => (0i64, None),
        };

        let mut rows = conn
            .query(
                &format!(
                    "UPDATE nodes SET
                        title = COALESCE(?1, title),
                        content = CASE WHEN kind = 'file' THEN COALESCE(?2, content) ELSE content END,
                        parent_id = CASE WHEN ?3 THEN ?4 ELSE parent_id END,
                        updated_at = ?5
                     WHERE id = ?6 AND owner_id = ?7
                     RETURNING {}",
                    NODE_COLUMNS
                ),
                (
                    patch.title,
                    patch.content,
                    reparent,
                    new_parent,
                    now.as_str(),
                    id,
                    owner,
                ),
            )
            .await
            .context("Failed to update node")?;

        match rows.next().await.context("Failed to read updated node")? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<bool> {
        let conn = self.connection().await?;
        // Descendants go with the row through ON DELETE CASCADE
        let rows_affected = conn
            .execute(
                "DELETE FROM nodes WHERE id = ?1 AND owner_id = ?2",
                (id, owner),
            )
            .await
            .context("Failed to delete node")?;

        Ok(rows_affected > 0)
    }

    async fn is_descendant(
        &self,
        owner: &str,
        ancestor_id: &str,
        candidate_id: &str,
    ) -> Result<bool> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "WITH RECURSIVE subtree(id) AS (
                    SELECT id FROM nodes WHERE id = ?1 AND owner_id = ?3
                    UNION
                    SELECT n.id FROM nodes n
                    JOIN subtree s ON n.parent_id = s.id
                    WHERE n.owner_id = ?3
                 )
                 SELECT EXISTS (SELECT 1 FROM subtree WHERE id = ?2)",
                (ancestor_id, candidate_id, owner),
            )
            .await
            .context("Failed to query descendants")?;

        let row = rows
            .next()
            .await
            .context("Failed to read descendant check")?
            .ok_or_else(|| anyhow::anyhow!("Descendant check returned no rows"))?;
        let found: i64 = row.get(0).context("Failed to get descendant flag")?;
        Ok(found != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateNodeInput;
    use tempfile::TempDir;

    async fn create_test_store() -> Result<(TursoStore, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await?);
        Ok((TursoStore::new(db), temp_dir))
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = TursoStore::parse_timestamp("2024-03-01T10:20:30.123456Z").unwrap();
        assert_eq!(rfc.timestamp_subsec_micros(), 123456);

        let sqlite = TursoStore::parse_timestamp("2024-03-01 10:20:30").unwrap();
        assert_eq!(sqlite.timestamp(), rfc.timestamp());

        assert!(TursoStore::parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_insert_and_get_node() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let created = store
            .insert(CreateNodeInput::file("Notes", "hello").into_new_node("alice"))
            .await?;
        assert_eq!(created.title, "Notes");
        assert_eq!(created.content(), Some("hello"));
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get_by_id("alice", &created.id).await?;
        assert_eq!(fetched, Some(created.clone()));

        // Other owners can't see it
        assert!(store.get_by_id("bob", &created.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_folder_round_trips_without_content() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let folder = store
            .insert(CreateNodeInput::folder("Projects").into_new_node("alice"))
            .await?;
        assert!(folder.is_folder());
        assert_eq!(folder.content(), None);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_partial() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let folder = store
            .insert(CreateNodeInput::folder("F").into_new_node("alice"))
            .await?;
        let file = store
            .insert(CreateNodeInput::file("Doc", "v1").into_new_node("alice"))
            .await?;

        let patch = NodePatch {
            content: Some("v2".to_string()),
            parent_id: Some(Some(folder.id.clone())),
            ..Default::default()
        };
        let updated = store
            .update_partial("alice", &file.id, patch)
            .await?
            .unwrap();
        assert_eq!(updated.title, "Doc");
        assert_eq!(updated.content(), Some("v2"));
        assert_eq!(updated.parent_id.as_deref(), Some(folder.id.as_str()));
        assert!(updated.updated_at >= file.updated_at);
        assert_eq!(updated.created_at, file.created_at);

        let to_root = store
            .update_partial("alice", &file.id, NodePatch::reparent(None))
            .await?
            .unwrap();
        assert_eq!(to_root.parent_id, None);
        assert_eq!(to_root.content(), Some("v2"));

        // Content on a folder is ignored
        let patch = NodePatch {
            content: Some("nope".to_string()),
            ..Default::default()
        };
        let still_folder = store
            .update_partial("alice", &folder.id, patch)
            .await?
            .unwrap();
        assert_eq!(still_folder.content(), None);

        assert!(store
            .update_partial("bob", &file.id, NodePatch::reparent(None))
            .await?
            .is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subtree() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let top = store
            .insert(CreateNodeInput::folder("Top").into_new_node("alice"))
            .await?;
        let inner = store
            .insert(
                CreateNodeInput::folder("Inner")
                    .with_parent(top.id.clone())
                    .into_new_node("alice"),
            )
            .await?;
        let leaf = store
            .insert(
                CreateNodeInput::file("Leaf", "")
                    .with_parent(inner.id.clone())
                    .into_new_node("alice"),
            )
            .await?;
        let keep = store
            .insert(CreateNodeInput::file("Keep", "").into_new_node("alice"))
            .await?;

        assert!(!store.delete("bob", &top.id).await?);
        assert!(store.delete("alice", &top.id).await?);

        let remaining = store.list_all("alice").await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
        assert!(store.get_by_id("alice", &leaf.id).await?.is_none());

        assert!(!store.delete("alice", &top.id).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_ordering() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let b_folder = store
            .insert(CreateNodeInput::folder("B").into_new_node("alice"))
            .await?;
        store
            .insert(CreateNodeInput::folder("A").into_new_node("alice"))
            .await?;
        store
            .insert(CreateNodeInput::file("Z", "").into_new_node("alice"))
            .await?;
        store
            .insert(
                CreateNodeInput::file("child", "")
                    .with_parent(b_folder.id.clone())
                    .into_new_node("alice"),
            )
            .await?;
        store
            .insert(CreateNodeInput::file("other", "").into_new_node("bob"))
            .await?;

        let roots: Vec<String> = store
            .list_children("alice", None)
            .await?
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(roots, vec!["Z", "A", "B"]);

        let all: Vec<String> = store
            .list_all("alice")
            .await?
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(all, vec!["Z", "A", "B", "child"]);

        let children = store.list_children("alice", Some(&b_folder.id)).await?;
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].title, "child");

        Ok(())
    }

    #[tokio::test]
    async fn test_is_descendant() -> Result<()> {
        let (store, _temp_dir) = create_test_store().await?;

        let f1 = store
            .insert(CreateNodeInput::folder("F1").into_new_node("alice"))
            .await?;
        let f2 = store
            .insert(
                CreateNodeInput::folder("F2")
                    .with_parent(f1.id.clone())
                    .into_new_node("alice"),
            )
            .await?;
        let d1 = store
            .insert(
                CreateNodeInput::file("D1", "")
                    .with_parent(f2.id.clone())
                    .into_new_node("alice"),
            )
            .await?;

        assert!(store.is_descendant("alice", &f1.id, &d1.id).await?);
        assert!(store.is_descendant("alice", &f1.id, &f1.id).await?);
        assert!(!store.is_descendant("alice", &d1.id, &f1.id).await?);
        assert!(!store.is_descendant("bob", &f1.id, &d1.id).await?);
        assert!(!store.is_descendant("alice", "missing", "missing").await?);

        Ok(())
    }
}
