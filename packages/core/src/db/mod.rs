//! Database Layer
//!
//! Persistence for document trees:
//!
//! - [`DatabaseService`] - libsql connection management and schema setup
//! - [`NodeStore`] - the persistence contract the service layer depends on
//! - [`TursoStore`] - `NodeStore` over the embedded libsql database
//! - [`MemoryStore`] - `NodeStore` over an in-process map
//!
//! Every store call is scoped to an owner. Deleting a node removes its whole
//! subtree inside the store.

mod database;
mod error;
mod memory_store;
mod node_store;
mod turso_store;

pub use database::{DatabaseService, DEFAULT_BUSY_TIMEOUT_MS};
pub use error::DatabaseError;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
pub use turso_store::TursoStore;
