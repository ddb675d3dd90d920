//! Forest reconstruction from flat parent-pointer records.
//!
//! The forest is an arena: one entry per input record, in input order, with
//! index-based child lists. Because every entry is attached to at most one
//! parent and only roots start a traversal, the structure is acyclic by
//! construction even if the stored records are not.
//!
//! # Unreachable records
//!
//! A record whose `parent_id` does not resolve to a folder in the input (missing
//! parent, or a parent that is a file), and every record below it, is omitted
//! from all tree views. The omitted ids are kept in [`Forest::detached`] so callers
//! can report them; building never fails.
//!
//! # Ordering
//!
//! Siblings keep input order. Callers that want folder-listing order should pass
//! records already sorted, e.g. `NodeStore::list_all` output.

use crate::models::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    parent: Option<usize>,
    children: Vec<usize>,
    reachable: bool,
}

/// Nested, serializable view of one node and its subtree.
///
/// `children` is present for folders (possibly empty) and absent for files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Root-level nodes of one owner together with their nested descendants
#[derive(Debug, Clone, Default)]
pub struct Forest {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
    detached: Vec<String>,
}

/// Build a forest from flat records.
///
/// # Examples
///
/// ```rust
/// # use doctree_core::models::{Node, NodeBody};
/// # use doctree_core::tree::build_forest;
/// # use chrono::Utc;
/// # fn node(id: &str, parent: Option<&str>, body: NodeBody) -> Node {
/// #     let now = Utc::now();
/// #     Node { id: id.into(), owner: "o".into(), title: id.into(), body,
/// #            parent_id: parent.map(Into::into), created_at: now, updated_at: now }
/// # }
/// let forest = build_forest(vec![
///     node("docs", None, NodeBody::Folder),
///     node("readme", Some("docs"), NodeBody::File { content: String::new() }),
///     node("lost", Some("gone"), NodeBody::Folder),
/// ]);
/// assert_eq!(forest.roots().count(), 1);
/// assert_eq!(forest.path_of("readme").as_deref(), Some("docs/readme"));
/// assert_eq!(forest.detached(), ["lost".to_string()]);
/// ```
pub fn build_forest(nodes: impl IntoIterator<Item = Node>) -> Forest {
    let mut entries: Vec<Entry> = nodes
        .into_iter()
        .map(|node| Entry {
            node,
            parent: None,
            children: Vec::new(),
            reachable: false,
        })
        .collect();

    // First occurrence of an id wins the lookup slot
    let mut index = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        index.entry(entry.node.id.clone()).or_insert(i);
    }

    let mut roots = Vec::new();
    for i in 0..entries.len() {
        let parent_idx = match entries[i].node.parent_id.as_deref() {
            None => {
                roots.push(i);
                continue;
            }
            Some(parent_id) => match index.get(parent_id) {
                Some(&p) if p != i && entries[p].node.is_folder() => p,
                _ => continue,
            },
        };
        entries[parent_idx].children.push(i);
        entries[i].parent = Some(parent_idx);
    }

    let mut forest = Forest {
        entries,
        index,
        roots,
        detached: Vec::new(),
    };

    for i in forest.preorder() {
        forest.entries[i].reachable = true;
    }
    forest.detached = forest
        .entries
        .iter()
        .filter(|e| !e.reachable)
        .map(|e| e.node.id.clone())
        .collect();

    forest
}

impl Forest {
    /// Indices of reachable entries in pre-order (folder before its children)
    fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.entries.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.entries[i].children.iter().rev().copied());
        }
        order
    }

    fn reachable_index(&self, id: &str) -> Option<usize> {
        self.index
            .get(id)
            .copied()
            .filter(|&i| self.entries[i].reachable)
    }

    /// Root-level nodes in input order
    pub fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
        self.roots.iter().map(move |&i| &self.entries[i].node)
    }

    /// Look up a node that is part of the forest
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.reachable_index(id).map(|i| &self.entries[i].node)
    }

    /// Direct children of a node in the forest, empty for files and unknown ids
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.reachable_index(id)
            .map(|i| {
                self.entries[i]
                    .children
                    .iter()
                    .map(|&c| &self.entries[c].node)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of nodes reachable from the roots
    pub fn len(&self) -> usize {
        self.entries.len() - self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of input records omitted from the forest, in input order
    pub fn detached(&self) -> &[String] {
        &self.detached
    }

    /// Pre-order flattening: roots in order, each folder before its children
    pub fn flatten(&self) -> Vec<Node> {
        self.preorder()
            .into_iter()
            .map(|i| self.entries[i].node.clone())
            .collect()
    }

    /// Proper descendants of `id` in pre-order.
    ///
    /// Walks the arena, so this also answers for records that are detached
    /// from the roots but still have children of their own.
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        // Detached entries can form parent loops, so track visits
        let mut seen = vec![false; self.entries.len()];
        seen[start] = true;
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.entries[start].children.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut seen[i], true) {
                continue;
            }
            out.push(self.entries[i].node.id.clone());
            stack.extend(self.entries[i].children.iter().rev().copied());
        }
        out
    }

    /// True if `candidate` is reachable from `ancestor` by following children
    /// zero or more times. Unknown ancestors have no descendants.
    pub fn contains_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        let Some(&start) = self.index.get(ancestor) else {
            return false;
        };
        if ancestor == candidate {
            return true;
        }

        let mut seen = vec![false; self.entries.len()];
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for &c in &self.entries[i].children {
                if self.entries[c].node.id == candidate {
                    return true;
                }
                if !std::mem::replace(&mut seen[c], true) {
                    stack.push(c);
                }
            }
        }
        false
    }

    /// Slash-joined titles from the root down to `id`, e.g. `"Projects/2024/plan.md"`
    pub fn path_of(&self, id: &str) -> Option<String> {
        let mut current = self.reachable_index(id);
        let mut titles = Vec::new();
        while let Some(i) = current {
            titles.push(self.entries[i].node.title.as_str());
            current = self.entries[i].parent;
        }

        if titles.is_empty() {
            return None;
        }
        titles.reverse();
        Some(titles.join("/"))
    }

    /// Nested view of the whole forest.
    ///
    /// Built bottom-up from the reversed pre-order so deep hierarchies do not
    /// recurse on the call stack.
    pub fn to_tree(&self) -> Vec<TreeNode> {
        let mut built: Vec<Option<TreeNode>> = (0..self.entries.len()).map(|_| None).collect();

        for i in self.preorder().into_iter().rev() {
            let entry = &self.entries[i];
            let children = if entry.node.is_folder() {
                Some(
                    entry
                        .children
                        .iter()
                        .filter_map(|&c| built[c].take())
                        .collect(),
                )
            } else {
                None
            };
            built[i] = Some(TreeNode {
                node: entry.node.clone(),
                children,
            });
        }

        self.roots.iter().filter_map(|&r| built[r].take()).collect()
    }
}
