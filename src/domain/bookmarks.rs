use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::definition::DefinitionId;

/// The set of bookmarked definitions.
///
/// Bookmarks live outside the tree; a bookmark on a deleted id is harmless
/// but the workspace removes them when it deletes definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmarks(BTreeSet<DefinitionId>);

impl Bookmarks {
    /// Whether `id` is bookmarked.
    #[must_use]
    pub fn contains(&self, id: &DefinitionId) -> bool {
        self.0.contains(id)
    }

    /// Bookmarks `id`, returning `false` if it already was.
    pub fn add(&mut self, id: DefinitionId) -> bool {
        self.0.insert(id)
    }

    /// Removes the bookmark on `id`, returning `false` if there was none.
    pub fn remove(&mut self, id: &DefinitionId) -> bool {
        self.0.remove(id)
    }

    /// Flips the bookmark on `id` and returns the new state.
    pub fn toggle(&mut self, id: DefinitionId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    /// Iterates the bookmarked ids in order.
    pub fn iter(&self) -> impl Iterator<Item = &DefinitionId> {
        self.0.iter()
    }

    /// Number of bookmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is bookmarked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DefinitionId> for Bookmarks {
    fn from_iter<T: IntoIterator<Item = DefinitionId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
