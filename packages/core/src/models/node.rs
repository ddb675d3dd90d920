//! Node Data Structures
//!
//! This module defines the `Node` record stored in the flat `nodes` table and the
//! input/patch types used to create and mutate it.
//!
//! # Architecture
//!
//! - **Single entity**: every file and folder is a `Node` row with a `parent_id` pointer
//! - **Kind-specific payload**: `NodeBody` carries `content` for files only, so a folder
//!   with content cannot be represented at all
//! - **Owner-scoped**: every node carries its `owner`; lookups are always `(id, owner)`
//!
//! # Examples
//!
//! ```rust
//! use doctree_core::models::{CreateNodeInput, NodeKind};
//!
//! let folder = CreateNodeInput::folder("Notes");
//! assert_eq!(folder.kind, NodeKind::Folder);
//!
//! let file = CreateNodeInput::file("todo.md", "- [ ] write tests").with_parent("folder-id");
//! assert_eq!(file.parent_id.as_deref(), Some("folder-id"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminant of a node.
///
/// Variant order matches the store's `kind ASC` ordering on the lowercase
/// names: files sort before folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    /// Column value used by the stores
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Folder => "folder",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeKind::File),
            "folder" => Ok(NodeKind::Folder),
            other => Err(format!("unknown node kind '{}'", other)),
        }
    }
}

/// Kind-specific payload of a node.
///
/// Serialized flattened into the node as `{"kind": "file", "content": "..."}`
/// or `{"kind": "folder"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBody {
    /// A text document; content may be empty
    File { content: String },
    /// A container for other nodes; never carries content
    Folder,
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::File { .. } => NodeKind::File,
            NodeBody::Folder => NodeKind::Folder,
        }
    }

    /// Rebuild a body from the stored `(kind, content)` column pair.
    ///
    /// A file row with a NULL content column is read back as an empty document;
    /// any content stored against a folder row is dropped.
    pub fn from_parts(kind: NodeKind, content: Option<String>) -> Self {
        match kind {
            NodeKind::File => NodeBody::File {
                content: content.unwrap_or_default(),
            },
            NodeKind::Folder => NodeBody::Folder,
        }
    }
}

/// A file or folder record in the hierarchy.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4, assigned by the store)
/// - `owner`: Owning principal; every query is filtered by it
/// - `title`: Display name, 1..=255 characters
/// - `body`: File content or folder marker
/// - `parent_id`: Containing folder, `None` for root-level nodes
/// - `created_at` / `updated_at`: UTC timestamps, `updated_at` advances on every write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub owner: String,

    pub title: String,

    #[serde(flatten)]
    pub body: NodeBody,

    pub parent_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// File content, `None` for folders
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Folder => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.body, NodeBody::Folder)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Create-intent payload, as received from a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeInput {
    pub kind: NodeKind,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl CreateNodeInput {
    pub fn file(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::File,
            title: title.into(),
            content: Some(content.into()),
            parent_id: None,
        }
    }

    pub fn folder(title: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Folder,
            title: title.into(),
            content: None,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Convert a validated input into the record handed to the store.
    ///
    /// Folders never keep content; files without content become empty documents.
    pub fn into_new_node(self, owner: impl Into<String>) -> NewNode {
        NewNode {
            owner: owner.into(),
            title: self.title,
            body: NodeBody::from_parts(self.kind, self.content),
            parent_id: self.parent_id,
        }
    }
}

/// Insert record passed to `NodeStore::insert`.
///
/// The store assigns `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub owner: String,
    pub title: String,
    pub body: NodeBody,
    pub parent_id: Option<String>,
}

/// Accept both `"id"` and `null` for a present field, mapping to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (move to root)
/// - "value" → Some(Some("value"))
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Update-intent payload (PATCH semantics)
///
/// All fields are optional; only supplied fields are changed.
///
/// `parent_id` uses the double-Option pattern:
/// - `None`: leave the parent alone
/// - `Some(None)`: move the node to the root level
/// - `Some(Some(id))`: move the node under folder `id`
///
/// # Examples
///
/// ```rust
/// # use doctree_core::models::NodeUpdate;
/// let rename = NodeUpdate::new().with_title("Renamed");
/// assert!(!rename.is_empty());
///
/// let to_root = NodeUpdate::new().with_parent(None);
/// assert_eq!(to_root.parent_id, Some(None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent_id = Some(parent_id.map(str::to_string));
        self
    }

    /// Check if the update requests any change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.parent_id.is_none()
    }
}

/// Field-by-field patch applied by `NodeStore::update_partial`.
///
/// Same shape as `NodeUpdate`, but only ever built by the service after
/// validation, so the store can merge it without further checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub parent_id: Option<Option<String>>,
}

impl NodePatch {
    /// Patch that only changes the parent
    pub fn reparent(parent_id: Option<&str>) -> Self {
        Self {
            parent_id: Some(parent_id.map(str::to_string)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.parent_id.is_none()
    }

    /// Merge the patch into a node in place, stamping `updated_at`.
    ///
    /// Content is only applied to files; the service rejects content updates on
    /// folders before a patch is ever built.
    pub fn apply_to(&self, node: &mut Node, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            node.title = title.clone();
        }
        if let (Some(new_content), NodeBody::File { content }) = (&self.content, &mut node.body) {
            *content = new_content.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            node.parent_id = parent_id.clone();
        }
        node.updated_at = now;
    }
}

impl From<NodeUpdate> for NodePatch {
    fn from(update: NodeUpdate) -> Self {
        Self {
            title: update.title,
            content: update.content,
            parent_id: update.parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_file() -> Node {
        let now = Utc::now();
        Node {
            id: "d1".to_string(),
            owner: "alice".to_string(),
            title: "readme.md".to_string(),
            body: NodeBody::File {
                content: "# hello".to_string(),
            },
            parent_id: Some("f1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_kind_ordering_matches_store_ordering() {
        assert!(NodeKind::File < NodeKind::Folder);
        assert!(NodeKind::File.as_str() < NodeKind::Folder.as_str());
    }

    #[test]
    fn test_kind_round_trips_through_column_value() {
        for kind in [NodeKind::File, NodeKind::Folder] {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
        assert!("document".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_folder_body_drops_content() {
        let body = NodeBody::from_parts(NodeKind::Folder, Some("stray".to_string()));
        assert_eq!(body, NodeBody::Folder);

        let body = NodeBody::from_parts(NodeKind::File, None);
        assert_eq!(
            body,
            NodeBody::File {
                content: String::new()
            }
        );
    }

    #[test]
    fn test_node_serializes_flattened_body() {
        let node = sample_file();
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["kind"], json!("file"));
        assert_eq!(value["content"], json!("# hello"));
        assert_eq!(value["parentId"], json!("f1"));

        let mut folder = node.clone();
        folder.body = NodeBody::Folder;
        let value = serde_json::to_value(&folder).unwrap();
        assert_eq!(value["kind"], json!("folder"));
        assert!(value.get("content").is_none());

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, folder);
    }

    #[test]
    fn test_node_update_distinguishes_missing_and_null_parent() {
        let update: NodeUpdate = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(update.parent_id, None);

        let update: NodeUpdate = serde_json::from_value(json!({"parentId": null})).unwrap();
        assert_eq!(update.parent_id, Some(None));

        let update: NodeUpdate = serde_json::from_value(json!({"parentId": "f2"})).unwrap();
        assert_eq!(update.parent_id, Some(Some("f2".to_string())));
    }

    #[test]
    fn test_create_input_into_new_node() {
        let new_node = CreateNodeInput::folder("Notes")
            .with_parent("root-folder")
            .into_new_node("alice");
        assert_eq!(new_node.owner, "alice");
        assert_eq!(new_node.body, NodeBody::Folder);
        assert_eq!(new_node.parent_id.as_deref(), Some("root-folder"));

        let mut input = CreateNodeInput::file("a.md", "");
        input.content = None;
        let new_node = input.into_new_node("alice");
        assert_eq!(
            new_node.body,
            NodeBody::File {
                content: String::new()
            }
        );
    }

    #[test]
    fn test_patch_apply_merges_supplied_fields() {
        let mut node = sample_file();
        let original_created = node.created_at;
        let later = node.updated_at + chrono::Duration::seconds(5);

        let patch = NodePatch {
            content: Some("new body".to_string()),
            parent_id: Some(None),
            ..Default::default()
        };
        patch.apply_to(&mut node, later);

        assert_eq!(node.title, "readme.md");
        assert_eq!(node.content(), Some("new body"));
        assert!(node.is_root());
        assert_eq!(node.created_at, original_created);
        assert_eq!(node.updated_at, later);
    }
}
