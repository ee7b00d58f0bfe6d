//! Domain models for the definition wiki.
//!
//! This module contains the definition tree and the pure algorithms that
//! operate on it: tree primitives, the diff engine, view projection, and the
//! revision and notification models.

/// Definition nodes and their editable content.
pub mod definition;
pub use definition::{Attachment, Content, Definition, DefinitionId, Note};

pub mod hierarchy;
pub use hierarchy::{Forest, Hierarchy};

pub mod diff;

pub mod store;
pub use store::{Deletion, DefinitionStore, StoreError, Update};

pub mod projection;
pub use projection::{Filters, ProjectedNode};

pub mod revision;
pub use revision::{Comparison, Revision, RevisionNote};

pub mod notification;
pub use notification::{Notification, NotificationLog};

/// The set of bookmarked definitions.
pub mod bookmarks;
pub use bookmarks::Bookmarks;

pub mod tables;
pub use tables::{SupportingTable, SupportingTables};

pub mod assist;

mod config;
pub use config::Config;
