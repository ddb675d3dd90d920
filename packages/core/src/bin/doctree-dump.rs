//! Tree Dump Binary
//!
//! Prints one owner's document tree as pretty JSON, for inspecting a database
//! by hand.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin doctree-dump -- alice
//!
//! # Against a specific database, with debug logging
//! DOCTREE_DB_PATH=./data/doctree.db RUST_LOG=debug cargo run --bin doctree-dump -- alice
//! ```
//!
//! # Environment Variables
//!
//! - `DOCTREE_DB_PATH`: database file (default: ~/.doctree/database/doctree.db)
//! - `DOCTREE_BUSY_TIMEOUT_MS`: SQLite busy timeout (default: 5000)
//! - `DOCTREE_CYCLE_CHECK`: `memory` or `store` (default: memory)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! Logs go to stderr so stdout stays valid JSON.

use std::env;

use doctree_core::{DocTreeConfig, NodeService, TreeNode};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeDump {
    owner: String,
    node_count: usize,
    roots: Vec<TreeNode>,
    detached: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let owner = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: doctree-dump <owner>"))?;

    let config = DocTreeConfig::from_env()?;
    tracing::info!("Database: {}", config.database_path.display());

    let service = NodeService::open(&config).await?;
    let forest = service.tree(&owner).await?;

    let dump = TreeDump {
        owner,
        node_count: forest.len(),
        roots: forest.to_tree(),
        detached: forest.detached().to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
