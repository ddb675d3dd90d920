//! Data Models
//!
//! - `Node` - the single file/folder record, with its kind-specific `NodeBody`
//! - Intent payloads (`CreateNodeInput`, `NodeUpdate`) and the store-facing
//!   records (`NewNode`, `NodePatch`)
//! - Pure validators for create and update intents

mod node;
mod validation;

pub use node::{CreateNodeInput, NewNode, Node, NodeBody, NodeKind, NodePatch, NodeUpdate};
pub use validation::{validate_create, validate_update, ValidationError, MAX_TITLE_LENGTH};
