use std::{convert::Infallible, fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::revision::Revision;

/// Opaque, stable identifier of a definition.
///
/// Seeded definitions use dotted identifiers (`1.1.1`); definitions created at
/// runtime receive a fresh UUID, so an identifier is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(String);

impl DefinitionId {
    /// Generates a fresh, globally unique identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DefinitionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DefinitionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for DefinitionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file attached to a definition. Opaque to the tree algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Display name of the attachment.
    pub name: String,
    /// Where the attachment can be fetched from.
    #[serde(default)]
    pub url: String,
}

/// A free-text note left on a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Who wrote the note.
    pub author: String,
    /// When the note was written.
    pub date: DateTime<Utc>,
    /// The note body.
    pub text: String,
}

/// The editable content of a definition.
///
/// Everything a user can change through an edit lives here; identity,
/// history, the archive flag and the children do not. A [`Revision`] snapshot
/// is a full copy of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Display name.
    pub name: String,
    /// Classification, also used as a grouping key when inserting.
    #[serde(default)]
    pub module: String,
    /// Search keywords. Display order is preserved.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Rich-text description.
    #[serde(default)]
    pub description: String,
    /// Rich-text technical details.
    #[serde(default)]
    pub technical_details: String,
    /// Rich-text usage examples.
    #[serde(default, alias = "usageExamples")]
    pub examples: String,
    /// Rich-text usage guidance.
    #[serde(default)]
    pub usage: String,
    /// Identifiers of related definitions. Dangling ids are tolerated.
    #[serde(default)]
    pub related_definitions: Vec<DefinitionId>,
    /// Identifiers of supporting tables referenced by this definition.
    #[serde(default)]
    pub supporting_tables: Vec<String>,
    /// Attached files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Notes left by readers.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Content {
    /// Content with just a name and module set.
    #[must_use]
    pub fn named(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            ..Self::default()
        }
    }

    /// Whether the name or any keyword contains `needle`.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches_name_or_keyword(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .keywords
                .iter()
                .any(|keyword| keyword.to_lowercase().contains(needle))
    }

    /// Iterates the rich-text bodies in display order.
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        [
            self.description.as_str(),
            self.technical_details.as_str(),
            self.examples.as_str(),
            self.usage.as_str(),
        ]
        .into_iter()
    }
}

/// A node in the definition tree.
///
/// A node with children is conventionally a module; a node without children
/// is a terminal concept. Children are held behind [`Arc`] so that rewriting
/// one branch shares every untouched subtree with the previous tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Stable identifier.
    pub id: DefinitionId,
    /// Editable content.
    #[serde(flatten)]
    pub content: Content,
    /// History, oldest first by creation.
    #[serde(default)]
    pub revisions: Vec<Revision>,
    /// Soft-delete flag. Does not cascade to children.
    #[serde(default)]
    pub is_archived: bool,
    /// Child definitions; empty for leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Definition>>,
}

impl Definition {
    /// A fresh, unarchived leaf with no history.
    #[must_use]
    pub const fn new(id: DefinitionId, content: Content) -> Self {
        Self {
            id,
            content,
            revisions: Vec::new(),
            is_archived: false,
            children: Vec::new(),
        }
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.content.name
    }

    /// Whether this node is a module container.
    #[must_use]
    pub fn is_module(&self) -> bool {
        !self.children.is_empty()
    }
}
