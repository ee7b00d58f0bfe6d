//! Supporting tables referenced from rich-text bodies.
//!
//! A body refers to a table with an inline marker such as
//! `{{table:place-of-service}}`. Resolution is a plain id lookup; tables are
//! not part of the definition tree.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*table:([A-Za-z0-9_.-]+)\s*\}\}").expect("marker pattern is valid")
});

/// A named, independent tabular dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingTable {
    /// Identifier used by inline markers.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Rows, each with one cell per header.
    pub rows: Vec<Vec<String>>,
}

/// Table ids referenced by markers in `body`, in order of appearance.
pub fn referenced_ids(body: &str) -> impl Iterator<Item = &str> {
    MARKER
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|id| id.as_str())
}

/// The outcome of resolving the markers in a body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolved<'a> {
    /// Tables that were found.
    pub tables: Vec<&'a SupportingTable>,
    /// Marker ids with no matching table.
    pub unresolved: Vec<String>,
}

/// All supporting tables, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportingTables(BTreeMap<String, SupportingTable>);

impl SupportingTables {
    /// Looks up a table.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SupportingTable> {
        self.0.get(id)
    }

    /// Adds or replaces a table, returning the previous one.
    pub fn insert(&mut self, table: SupportingTable) -> Option<SupportingTable> {
        self.0.insert(table.id.clone(), table)
    }

    /// Iterates tables in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SupportingTable> {
        self.0.values()
    }

    /// Resolves every marker in `body`. Unknown ids are reported, not fatal.
    #[must_use]
    pub fn resolve(&self, body: &str) -> Resolved<'_> {
        let mut resolved = Resolved::default();
        for id in referenced_ids(body) {
            match self.0.get(id) {
                Some(table) => resolved.tables.push(table),
                None => resolved.unresolved.push(id.to_string()),
            }
        }
        resolved
    }
}

impl FromIterator<SupportingTable> for SupportingTables {
    fn from_iter<T: IntoIterator<Item = SupportingTable>>(iter: T) -> Self {
        Self(iter.into_iter().map(|t| (t.id.clone(), t)).collect())
    }
}

impl Serialize for SupportingTables {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for SupportingTables {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<SupportingTable>::deserialize(deserializer).map(|tables| tables.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str) -> SupportingTable {
        SupportingTable {
            id: id.to_string(),
            name: id.to_uppercase(),
            headers: vec!["Code".to_string(), "Meaning".to_string()],
            rows: vec![vec!["11".to_string(), "Office".to_string()]],
        }
    }

    #[test]
    fn finds_markers_in_order() {
        let body = "<p>See {{table:pos}} and {{ table:status-codes }}.</p>";
        let ids: Vec<_> = referenced_ids(body).collect();
        assert_eq!(ids, ["pos", "status-codes"]);
    }

    #[test]
    fn resolve_reports_unknown_ids() {
        let tables: SupportingTables = [table("pos")].into_iter().collect();

        let resolved = tables.resolve("{{table:pos}} {{table:missing}}");

        assert_eq!(resolved.tables.len(), 1);
        assert_eq!(resolved.tables[0].id, "pos");
        assert_eq!(resolved.unresolved, ["missing"]);
    }

    #[test]
    fn serializes_as_list() {
        let tables: SupportingTables = [table("b"), table("a")].into_iter().collect();
        let json = serde_json::to_value(&tables).unwrap();
        assert_eq!(json[0]["id"], "a");

        let back: SupportingTables = serde_json::from_value(json).unwrap();
        assert_eq!(back, tables);
    }
}
