//! DocTree Core
//!
//! Owner-scoped file/folder hierarchies stored as flat parent-pointer records.
//!
//! # Architecture
//!
//! - **Flat storage**: each node row carries its `parent_id`; the nested view is
//!   rebuilt per request from a fresh snapshot
//! - **Arena forest**: index-based child lists, acyclic by construction
//! - **Guarded moves**: cycle check and parent check before every re-parenting,
//!   under a per-owner lock
//! - **libsql/Turso**: embedded SQLite-compatible database with cascading deletes
//!
//! # Modules
//!
//! - [`models`] - Node records, create/update intents and validation
//! - [`tree`] - Forest construction and the in-memory cycle guard
//! - [`db`] - `NodeStore` trait with libsql and in-memory backends
//! - [`services`] - `NodeService`, the mutation orchestrator
//! - [`config`] - Environment-driven configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use config::{CycleCheckStrategy, DocTreeConfig};
pub use db::{MemoryStore, NodeStore, TursoStore};
pub use models::*;
pub use services::*;
pub use tree::{build_forest, would_create_cycle, Forest, TreeNode};
