//! Business Services
//!
//! - `NodeService` - validated create/update/move/delete and tree reads
//! - `OwnerLocks` - per-owner serialization of check-then-write mutations
//!
//! Services coordinate between the tree engine and a `NodeStore`, enforcing
//! the hierarchy rules before anything is written.

pub mod error;
pub mod node_service;
pub mod owner_lock;

pub use error::NodeServiceError;
pub use node_service::NodeService;
pub use owner_lock::OwnerLocks;
