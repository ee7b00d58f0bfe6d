//! The visible tree, derived from the authoritative tree and the current
//! filter state.
//!
//! Projection never mutates its input. The stages run in a fixed order and
//! each one keeps the ancestors of anything it keeps:
//!
//! 1. name/keyword search
//! 2. archived filtering
//! 3. bookmark annotation
//! 4. bookmarked-only filtering

use std::sync::Arc;

use crate::domain::{
    definition::{Definition, DefinitionId},
    hierarchy::{Hierarchy, filter_preserving_ancestors},
};

/// The current filter state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive search over names and keywords. Blank disables it.
    pub query: String,
    /// Whether archived definitions are shown.
    pub show_archived: bool,
    /// Whether only bookmarked definitions (and their ancestors) are shown.
    pub show_bookmarked: bool,
}

/// A visible node, annotated with its bookmark state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedNode {
    /// The definition's data.
    pub definition: Arc<Definition>,
    /// Whether the definition is bookmarked.
    pub bookmarked: bool,
    /// The visible children.
    pub children: Vec<ProjectedNode>,
}

impl ProjectedNode {
    /// Shorthand for the definition's id.
    #[must_use]
    pub fn id(&self) -> &DefinitionId {
        &self.definition.id
    }
}

impl Hierarchy for ProjectedNode {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn with_children(&self, children: Vec<Self>) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            bookmarked: self.bookmarked,
            children,
        }
    }
}

/// Projects the visible tree.
pub fn project<B>(forest: &[Arc<Definition>], filters: &Filters, is_bookmarked: B) -> Vec<ProjectedNode>
where
    B: Fn(&DefinitionId) -> bool,
{
    let needle = filters.query.to_lowercase();
    let searched = if needle.trim().is_empty() {
        forest.to_vec()
    } else {
        filter_preserving_ancestors(forest, &|node: &Arc<Definition>| {
            node.content.matches_name_or_keyword(&needle)
        })
    };

    let visible = if filters.show_archived {
        searched
    } else {
        filter_preserving_ancestors(&searched, &|node: &Arc<Definition>| !node.is_archived)
    };

    let annotated = annotate(&visible, &is_bookmarked);

    if filters.show_bookmarked {
        filter_preserving_ancestors(&annotated, &|node: &ProjectedNode| node.bookmarked)
    } else {
        annotated
    }
}

fn annotate<B>(nodes: &[Arc<Definition>], is_bookmarked: &B) -> Vec<ProjectedNode>
where
    B: Fn(&DefinitionId) -> bool,
{
    nodes
        .iter()
        .map(|node| ProjectedNode {
            definition: Arc::clone(node),
            bookmarked: is_bookmarked(&node.id),
            children: annotate(&node.children, is_bookmarked),
        })
        .collect()
}
