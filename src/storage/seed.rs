//! The built-in dataset used when nothing has been persisted yet.

use serde::Deserialize;

use crate::domain::{hierarchy::Forest, tables::SupportingTables};

const SEED: &str = include_str!("seed.json");

/// The initial contents of a fresh workspace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    /// The definition tree.
    pub definitions: Forest,
    /// The supporting tables referenced by the seeded definitions.
    #[serde(default)]
    pub supporting_tables: SupportingTables,
}

/// Parses the built-in dataset.
///
/// # Errors
///
/// Fails only if the embedded document is malformed.
pub fn seed() -> Result<Seed, serde_json::Error> {
    serde_json::from_str(SEED)
}
