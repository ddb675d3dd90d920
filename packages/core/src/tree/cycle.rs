//! In-memory cycle guard.
//!
//! Moving `node_id` under `candidate_parent_id` creates a cycle exactly when the
//! candidate is the node itself or one of its descendants. This is the canonical
//! check; `NodeStore::is_descendant` answers the same question inside the store
//! and must agree with it.

use super::forest::Forest;

/// Would re-parenting `node_id` under `candidate_parent_id` create a cycle?
///
/// - `None` (move to root) is never a cycle
/// - a node can never be its own parent
/// - otherwise, true iff the candidate is a descendant of `node_id`
pub fn would_create_cycle(
    forest: &Forest,
    node_id: &str,
    candidate_parent_id: Option<&str>,
) -> bool {
    match candidate_parent_id {
        None => false,
        Some(candidate) if candidate == node_id => true,
        Some(candidate) => forest.contains_descendant(node_id, candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, NodeBody};
    use crate::tree::build_forest;
    use chrono::Utc;

    fn node(id: &str, parent: Option<&str>, folder: bool) -> Node {
        let now = Utc::now();
        Node {
            id: id.to_string(),
            owner: "alice".to_string(),
            title: id.to_string(),
            body: if folder {
                NodeBody::Folder
            } else {
                NodeBody::File {
                    content: String::new(),
                }
            },
            parent_id: parent.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn fixture() -> Forest {
        build_forest(vec![
            node("f1", None, true),
            node("f2", Some("f1"), true),
            node("d1", Some("f2"), false),
            node("other", None, true),
        ])
    }

    #[test]
    fn test_root_is_never_a_cycle() {
        let forest = fixture();
        for id in ["f1", "f2", "d1", "other", "unknown"] {
            assert!(!would_create_cycle(&forest, id, None));
        }
    }

    #[test]
    fn test_self_parent_is_always_a_cycle() {
        let forest = fixture();
        for id in ["f1", "d1", "unknown"] {
            assert!(would_create_cycle(&forest, id, Some(id)));
        }
    }

    #[test]
    fn test_descendant_parent_is_a_cycle() {
        let forest = fixture();
        assert!(would_create_cycle(&forest, "f1", Some("f2")));
        assert!(would_create_cycle(&forest, "f1", Some("d1")));
    }

    #[test]
    fn test_unrelated_or_ancestor_parent_is_safe() {
        let forest = fixture();
        assert!(!would_create_cycle(&forest, "f2", Some("other")));
        assert!(!would_create_cycle(&forest, "d1", Some("f1")));
        assert!(!would_create_cycle(&forest, "f2", Some("f1")));
        assert!(!would_create_cycle(&forest, "other", Some("f2")));
    }
}
