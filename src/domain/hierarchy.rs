//! Recursive primitives over the definition forest.
//!
//! Every rewrite is copy-on-write: the nodes on the path to a change are
//! shallow-copied and every other subtree is shared with the input, so a
//! caller can detect an untouched subtree with [`Arc::ptr_eq`].

use std::sync::Arc;

use crate::domain::definition::{Definition, DefinitionId};

/// An ordered sequence of top-level nodes.
pub type Forest = Vec<Arc<Definition>>;

/// A node type that owns an ordered list of children of its own type.
///
/// The filtering and traversal primitives are written against this trait so
/// that they apply equally to the authoritative tree and to projected views.
pub trait Hierarchy: Clone {
    /// The node's children, in display order.
    fn children(&self) -> &[Self];

    /// A shallow copy of this node with its children replaced.
    #[must_use]
    fn with_children(&self, children: Vec<Self>) -> Self;
}

impl Hierarchy for Arc<Definition> {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn with_children(&self, children: Vec<Self>) -> Self {
        let mut node = Definition::clone(self);
        node.children = children;
        Self::new(node)
    }
}

/// Pre-order iterator over a forest: parents before children, siblings in
/// order.
pub struct PreOrder<'a, N> {
    stack: Vec<std::slice::Iter<'a, N>>,
}

impl<'a, N: Hierarchy> Iterator for PreOrder<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            if let Some(node) = level.next() {
                self.stack.push(node.children().iter());
                return Some(node);
            }
            self.stack.pop();
        }
    }
}

/// Walks `nodes` depth-first, parents before children.
pub fn pre_order<N: Hierarchy>(nodes: &[N]) -> PreOrder<'_, N> {
    PreOrder {
        stack: vec![nodes.iter()],
    }
}

/// Flattens `nodes` into pre-order.
#[must_use]
pub fn flatten<N: Hierarchy>(nodes: &[N]) -> Vec<N> {
    pre_order(nodes).cloned().collect()
}

/// Keeps a node if it satisfies `keep` or if at least one of its descendants
/// survives.
///
/// Children are resolved before their parent's keep/drop decision, so every
/// ancestor of a surviving node survives as well.
#[must_use]
pub fn filter_preserving_ancestors<N, F>(nodes: &[N], keep: &F) -> Vec<N>
where
    N: Hierarchy,
    F: Fn(&N) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| {
            if node.children().is_empty() {
                return keep(node).then(|| node.clone());
            }
            let children = filter_preserving_ancestors(node.children(), keep);
            (keep(node) || !children.is_empty()).then(|| node.with_children(children))
        })
        .collect()
}

/// Finds the first node with the given id in a depth-first, pre-order walk.
#[must_use]
pub fn find<'a>(nodes: &'a [Arc<Definition>], id: &DefinitionId) -> Option<&'a Arc<Definition>> {
    pre_order(nodes).find(|node| node.id == *id)
}

/// Finds the first node with the given name in a depth-first, pre-order walk.
#[must_use]
pub fn find_by_name<'a>(nodes: &'a [Arc<Definition>], name: &str) -> Option<&'a Arc<Definition>> {
    pre_order(nodes).find(|node| node.content.name == name)
}

/// Where a node sits in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    /// The parent node, or `None` for a top-level node.
    pub parent: Option<&'a Arc<Definition>>,
    /// The node's index among its siblings.
    pub index: usize,
}

/// Locates the node with the given id.
#[must_use]
pub fn locate<'a>(nodes: &'a [Arc<Definition>], id: &DefinitionId) -> Option<Location<'a>> {
    fn search<'a>(
        parent: Option<&'a Arc<Definition>>,
        nodes: &'a [Arc<Definition>],
        id: &DefinitionId,
    ) -> Option<Location<'a>> {
        nodes.iter().enumerate().find_map(|(index, node)| {
            if node.id == *id {
                Some(Location { parent, index })
            } else {
                search(Some(node), &node.children, id)
            }
        })
    }

    search(None, nodes, id)
}

/// Replaces the node with the given id by `f(node)`.
///
/// Ancestors of the node are shallow-copied; everything else is shared with
/// `nodes`. Returns `None` if no node has the id.
pub fn transform<F>(nodes: &[Arc<Definition>], id: &DefinitionId, f: F) -> Option<Forest>
where
    F: FnOnce(&Arc<Definition>) -> Arc<Definition>,
{
    fn rewrite<F>(nodes: &[Arc<Definition>], id: &DefinitionId, f: F) -> Result<Forest, F>
    where
        F: FnOnce(&Arc<Definition>) -> Arc<Definition>,
    {
        let mut f = f;
        for (index, node) in nodes.iter().enumerate() {
            let replacement = if node.id == *id {
                f(node)
            } else {
                match rewrite(&node.children, id, f) {
                    Ok(children) => node.with_children(children),
                    Err(unused) => {
                        f = unused;
                        continue;
                    }
                }
            };
            let mut out = nodes.to_vec();
            out[index] = replacement;
            return Ok(out);
        }
        Err(f)
    }

    rewrite(nodes, id, f).ok()
}

/// Replaces every node satisfying `matches` by `f(node)` in a single rewrite.
///
/// A matching node is handed to `f` after its own descendants have been
/// rewritten. Returns `None` if nothing matched.
pub fn transform_matching<M, F>(nodes: &[Arc<Definition>], matches: &M, f: &F) -> Option<Forest>
where
    M: Fn(&Definition) -> bool,
    F: Fn(&Arc<Definition>) -> Arc<Definition>,
{
    let mut changed = false;
    let out = nodes
        .iter()
        .map(|node| {
            let rebuilt = transform_matching(&node.children, matches, f)
                .map(|children| node.with_children(children));
            let next = if matches(&**node) {
                Some(f(rebuilt.as_ref().unwrap_or(node)))
            } else {
                rebuilt
            };
            next.map_or_else(
                || Arc::clone(node),
                |replacement| {
                    changed = true;
                    replacement
                },
            )
        })
        .collect();
    changed.then_some(out)
}

/// Removes the node with the given id, together with its descendants.
///
/// Returns the new forest and the removed subtree, or `None` if no node has
/// the id.
#[must_use]
pub fn remove(nodes: &[Arc<Definition>], id: &DefinitionId) -> Option<(Forest, Arc<Definition>)> {
    if let Some(index) = nodes.iter().position(|node| node.id == *id) {
        let mut out = nodes.to_vec();
        let removed = out.remove(index);
        return Some((out, removed));
    }

    nodes.iter().enumerate().find_map(|(index, node)| {
        let (children, removed) = remove(&node.children, id)?;
        let mut out = nodes.to_vec();
        out[index] = node.with_children(children);
        Some((out, removed))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::definition::Content;

    pub(crate) fn leaf(id: &str, name: &str) -> Arc<Definition> {
        Arc::new(Definition::new(id.into(), Content::named(name, "")))
    }

    pub(crate) fn module(id: &str, name: &str, children: Vec<Arc<Definition>>) -> Arc<Definition> {
        let mut node = Definition::new(id.into(), Content::named(name, name));
        node.children = children;
        Arc::new(node)
    }

    /// ```text
    /// 1 Authorizations
    /// ├── 1.1 Auth Decision Date
    /// └── 1.2 Auth Status
    /// 2 Provider
    /// └── 2.1 Contracts
    ///     └── 2.1.1 Contracted Rates
    /// ```
    pub(crate) fn sample() -> Forest {
        vec![
            module(
                "1",
                "Authorizations",
                vec![leaf("1.1", "Auth Decision Date"), leaf("1.2", "Auth Status")],
            ),
            module(
                "2",
                "Provider",
                vec![module("2.1", "Contracts", vec![leaf("2.1.1", "Contracted Rates")])],
            ),
        ]
    }

    fn ids<N: Hierarchy>(nodes: &[N], id: impl Fn(&N) -> &str) -> Vec<String> {
        pre_order(nodes).map(|n| id(n).to_string()).collect()
    }

    #[test]
    fn pre_order_visits_parents_before_children() {
        let forest = sample();
        assert_eq!(
            ids(&forest, |n| n.id.as_str()),
            ["1", "1.1", "1.2", "2", "2.1", "2.1.1"]
        );
    }

    #[test]
    fn find_descends_into_children() {
        let forest = sample();
        let found = find(&forest, &"2.1.1".into()).unwrap();
        assert_eq!(found.name(), "Contracted Rates");
        assert!(find(&forest, &"9".into()).is_none());
    }

    #[test]
    fn locate_reports_parent_and_index() {
        let forest = sample();

        let location = locate(&forest, &"1.2".into()).unwrap();
        assert_eq!(location.parent.unwrap().id.as_str(), "1");
        assert_eq!(location.index, 1);

        let top = locate(&forest, &"2".into()).unwrap();
        assert!(top.parent.is_none());
        assert_eq!(top.index, 1);
    }

    #[test]
    fn transform_shares_untouched_subtrees() {
        let forest = sample();

        let rewritten = transform(&forest, &"2.1.1".into(), |node| {
            let mut node = Definition::clone(node);
            node.content.name = "Rates".to_string();
            Arc::new(node)
        })
        .unwrap();

        assert!(Arc::ptr_eq(&forest[0], &rewritten[0]));
        assert!(!Arc::ptr_eq(&forest[1], &rewritten[1]));
        assert_eq!(find(&rewritten, &"2.1.1".into()).unwrap().name(), "Rates");
        assert_eq!(find(&forest, &"2.1.1".into()).unwrap().name(), "Contracted Rates");
    }

    #[test]
    fn transform_of_missing_id_is_none() {
        let forest = sample();
        assert!(transform(&forest, &"missing".into(), Arc::clone).is_none());
    }

    #[test]
    fn transform_matching_rewrites_each_match_once() {
        let forest = sample();
        let rewritten = transform_matching(
            &forest,
            &|node: &Definition| node.id.as_str().ends_with(".1"),
            &|node: &Arc<Definition>| {
                let mut node = Definition::clone(node);
                node.is_archived = true;
                Arc::new(node)
            },
        )
        .unwrap();

        let archived: Vec<_> = pre_order(&rewritten)
            .filter(|node| node.is_archived)
            .map(|node| node.id.as_str().to_string())
            .collect();
        assert_eq!(archived, ["1.1", "2.1", "2.1.1"]);
        assert!(find(&rewritten, &"2.1".into()).unwrap().children[0].is_archived);
    }

    #[test]
    fn remove_takes_descendants() {
        let forest = sample();
        let (rest, removed) = remove(&forest, &"2.1".into()).unwrap();

        assert_eq!(removed.children.len(), 1);
        assert_eq!(ids(&rest, |n| n.id.as_str()), ["1", "1.1", "1.2", "2"]);
        assert!(Arc::ptr_eq(&forest[0], &rest[0]));
    }

    #[test]
    fn filter_keeps_ancestors_of_matches() {
        let forest = sample();
        let filtered =
            filter_preserving_ancestors(&forest, &|node: &Arc<Definition>| node.name() == "Contracted Rates");

        assert_eq!(ids(&filtered, |n| n.id.as_str()), ["2", "2.1", "2.1.1"]);
        // the input is untouched
        assert_eq!(flatten(&forest).len(), 6);
    }

    #[test]
    fn filter_drops_unmatched_modules() {
        let forest = sample();
        let filtered = filter_preserving_ancestors(&forest, &|_: &Arc<Definition>| false);
        assert!(filtered.is_empty());
    }
}
