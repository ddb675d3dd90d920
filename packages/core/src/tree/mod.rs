//! Tree Layer
//!
//! Materializes the nested view of an owner's nodes and answers ancestry
//! questions over it:
//!
//! - [`build_forest`] - arena-backed forest from flat parent-pointer records
//! - [`would_create_cycle`] - canonical in-memory cycle guard for moves

mod cycle;
mod forest;

pub use cycle::would_create_cycle;
pub use forest::{build_forest, Forest, TreeNode};
