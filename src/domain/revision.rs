//! Revision history and side-by-side revision comparison.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    definition::Content,
    diff::{self, Span},
};

/// An immutable historical record of a definition.
///
/// The snapshot is self-contained: a full copy of the content at the time the
/// revision was recorded, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Human change reference, e.g. a ticket number.
    pub ticket_id: String,
    /// When the change was made.
    pub date: NaiveDate,
    /// Author label.
    pub developer: String,
    /// What changed, in the author's words.
    pub description: String,
    /// The content as of this revision.
    pub snapshot: Content,
}

/// Change metadata supplied when recording a new revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionNote {
    /// Human change reference.
    pub ticket_id: String,
    /// When the change was made.
    pub date: NaiveDate,
    /// Author label.
    pub developer: String,
    /// What changed.
    pub description: String,
}

impl RevisionNote {
    /// Builds the revision record for `snapshot`.
    #[must_use]
    pub fn into_revision(self, snapshot: Content) -> Revision {
        Revision {
            ticket_id: self.ticket_id,
            date: self.date,
            developer: self.developer,
            description: self.description,
            snapshot,
        }
    }
}

/// A rich-text field compared between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The description body.
    Description,
    /// The technical details body.
    TechnicalDetails,
    /// The usage examples body.
    Examples,
    /// The usage body.
    Usage,
}

impl Field {
    /// Every compared field, in display order.
    pub const ALL: [Self; 4] = [
        Self::Description,
        Self::TechnicalDetails,
        Self::Examples,
        Self::Usage,
    ];

    /// Reads this field from a snapshot.
    #[must_use]
    pub fn get(self, content: &Content) -> &str {
        match self {
            Self::Description => &content.description,
            Self::TechnicalDetails => &content.technical_details,
            Self::Examples => &content.examples,
            Self::Usage => &content.usage,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Description => "Description",
            Self::TechnicalDetails => "Technical Details",
            Self::Examples => "Examples",
            Self::Usage => "Usage",
        })
    }
}

/// The diff of one field between two revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    /// Which field.
    pub field: Field,
    /// The diff from the older to the newer snapshot.
    pub spans: Vec<Span>,
}

/// Two revisions ordered by date, with the diff of every field that differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison<'a> {
    /// The earlier revision.
    pub older: &'a Revision,
    /// The later revision.
    pub newer: &'a Revision,
    /// Diffs of the changed fields; identical fields are omitted.
    pub fields: Vec<FieldDiff>,
}

/// Compares two revisions, oldest first regardless of the order given.
///
/// Revisions with the same date keep the order they were passed in.
#[must_use]
pub fn compare<'a>(first: &'a Revision, second: &'a Revision) -> Comparison<'a> {
    let (older, newer) = if second.date < first.date {
        (second, first)
    } else {
        (first, second)
    };

    let fields = Field::ALL
        .into_iter()
        .filter_map(|field| {
            let before = field.get(&older.snapshot);
            let after = field.get(&newer.snapshot);
            (before != after).then(|| FieldDiff {
                field,
                spans: diff::diff(before, after),
            })
        })
        .collect();

    Comparison {
        older,
        newer,
        fields,
    }
}
