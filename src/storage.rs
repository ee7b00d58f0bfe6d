pub mod kv;
pub mod seed;
pub mod workspace;

pub use kv::{JsonDirectory, KeyValueStore, MemoryStore, StorageError};
pub use seed::seed;
pub use workspace::{Edited, Workspace, WorkspaceError};
