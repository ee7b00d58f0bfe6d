//! Healthcare Data Dictionary Wiki
//!
//! Definitions of data elements are kept in a hierarchy of modules. Every
//! edit to the tree is copy-on-write, views are pure projections of the tree,
//! and the history of each definition can be compared with a word-aware diff.

pub mod domain;
pub use domain::{
    Config, Content, Definition, DefinitionId, DefinitionStore, Filters, StoreError,
};

/// Persistence and the workspace that ties the domain together.
pub mod storage;
pub use storage::{JsonDirectory, KeyValueStore, MemoryStore, Workspace, WorkspaceError};
