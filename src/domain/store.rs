//! The authoritative definition tree and its mutation contract.
//!
//! The [`DefinitionStore`] knows nothing about persistence, bookmarks or
//! notifications. Every operation is all-or-nothing: the new tree is built
//! completely before it replaces the old one, and a failed operation leaves
//! the tree exactly as it was.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use non_empty_string::NonEmptyString;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    definition::{Content, Definition, DefinitionId},
    hierarchy::{self, Forest, PreOrder},
    revision::RevisionNote,
};

/// Errors raised by store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The target id does not resolve.
    #[error("definition {0} not found")]
    NotFound(DefinitionId),

    /// A tree offered for reconciliation repeats ids.
    #[error("definition tree is corrupt: duplicate ids {}", join(.duplicates))]
    CorruptState {
        /// Every id that appears more than once.
        duplicates: Vec<DefinitionId>,
    },

    /// The request was rejected before touching the tree.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

fn join(ids: &[DefinitionId]) -> String {
    ids.iter()
        .map(DefinitionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The result of a successful update.
#[derive(Debug, Clone)]
pub struct Update {
    /// The node as it was before the update.
    pub previous: Arc<Definition>,
    /// The node as it is now.
    pub current: Arc<Definition>,
}

/// The result of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    /// The deleted node and all of its descendants, in pre-order.
    pub removed: Vec<DefinitionId>,
    /// How many `relatedDefinitions` entries pointing at removed nodes were
    /// dropped from the definitions that remain.
    pub unlinked_references: usize,
}

/// Owns the definition forest.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    forest: Forest,
}

impl DefinitionStore {
    /// Creates a store from an initial forest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptState`] if the forest repeats an id.
    pub fn new(forest: Forest) -> Result<Self, StoreError> {
        let mut store = Self::default();
        store.reconcile(forest)?;
        Ok(store)
    }

    /// The top-level nodes.
    #[must_use]
    pub fn forest(&self) -> &[Arc<Definition>] {
        &self.forest
    }

    /// A cheap copy of the current tree that later mutations will not affect.
    #[must_use]
    pub fn snapshot(&self) -> Forest {
        self.forest.clone()
    }

    /// Walks every definition in pre-order.
    pub fn iter(&self) -> PreOrder<'_, Arc<Definition>> {
        hierarchy::pre_order(&self.forest)
    }

    /// Every definition in pre-order.
    #[must_use]
    pub fn flatten(&self) -> Forest {
        hierarchy::flatten(&self.forest)
    }

    /// The total number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the store holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Finds a definition by id.
    #[must_use]
    pub fn find(&self, id: &DefinitionId) -> Option<&Arc<Definition>> {
        hierarchy::find(&self.forest, id)
    }

    /// Finds the first definition with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Definition>> {
        hierarchy::find_by_name(&self.forest, name)
    }

    /// The parent of a definition, or `None` for top-level or unknown ids.
    #[must_use]
    pub fn parent_of(&self, id: &DefinitionId) -> Option<&Arc<Definition>> {
        hierarchy::locate(&self.forest, id).and_then(|location| location.parent)
    }

    /// Accepts a persisted tree as the new authoritative state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptState`] if any id appears twice; the
    /// current tree is kept.
    pub fn reconcile(&mut self, forest: Forest) -> Result<(), StoreError> {
        let duplicates = duplicate_ids(&forest);
        if !duplicates.is_empty() {
            return Err(StoreError::CorruptState { duplicates });
        }
        self.forest = forest;
        Ok(())
    }

    /// Replaces the content of a definition.
    ///
    /// Identity, revisions, archive flag and children are preserved. The name
    /// is stored trimmed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ValidationFailed`] if the new name is blank
    /// - [`StoreError::NotFound`] if the id does not resolve
    #[instrument(level = "debug", skip(self, content))]
    pub fn update(&mut self, id: &DefinitionId, mut content: Content) -> Result<Update, StoreError> {
        content.name = validate_name(&content.name)?.as_str().to_string();
        let previous = Arc::clone(self.require(id)?);

        let mut next = Definition::clone(&previous);
        next.content = content;
        let current = Arc::new(next);

        let forest = hierarchy::transform(&self.forest, id, |_| Arc::clone(&current))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.forest = forest;

        tracing::debug!("updated definition {id}");
        Ok(Update { previous, current })
    }

    /// Appends a revision snapshotting the definition's current content.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    #[instrument(level = "debug", skip(self, note))]
    pub fn record_revision(&mut self, id: &DefinitionId, note: RevisionNote) -> Result<(), StoreError> {
        let forest = hierarchy::transform(&self.forest, id, |node| {
            let mut node = Definition::clone(node);
            let revision = note.into_revision(node.content.clone());
            node.revisions.push(revision);
            Arc::new(node)
        })
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.forest = forest;
        Ok(())
    }

    /// Inserts a new definition under the module called `parent_module`.
    ///
    /// A top-level node with that name is preferred, then any node with that
    /// name. The new definition is prepended to the module's children. If no
    /// such node exists, a new top-level module is created to hold it.
    ///
    /// An empty `module` field on the content is filled in with
    /// `parent_module`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ValidationFailed`] if either name is blank.
    #[instrument(level = "debug", skip(self, content))]
    pub fn create(
        &mut self,
        parent_module: &str,
        mut content: Content,
    ) -> Result<DefinitionId, StoreError> {
        let module_name = validate_name(parent_module)?;
        let parent_module = module_name.as_str();
        content.name = validate_name(&content.name)?.as_str().to_string();
        if content.module.trim().is_empty() {
            content.module = parent_module.to_string();
        }

        let id = DefinitionId::generate();
        let node = Arc::new(Definition::new(id.clone(), content));

        let parent = self
            .forest
            .iter()
            .find(|top| top.content.name == parent_module)
            .or_else(|| self.find_by_name(parent_module))
            .map(|parent| parent.id.clone());

        let forest = if let Some(parent_id) = parent {
            hierarchy::transform(&self.forest, &parent_id, |parent| {
                let mut parent = Definition::clone(parent);
                parent.children.insert(0, node);
                Arc::new(parent)
            })
            .ok_or(StoreError::NotFound(parent_id))?
        } else {
            tracing::debug!("creating module '{parent_module}'");
            let mut module = Definition::new(
                DefinitionId::generate(),
                Content::named(parent_module, parent_module),
            );
            module.children.push(node);
            let mut forest = self.forest.clone();
            forest.push(Arc::new(module));
            forest
        };
        self.forest = forest;

        tracing::debug!("created definition {id}");
        Ok(id)
    }

    /// Copies a definition's content under a fresh id.
    ///
    /// The copy is named `"<name> (Copy)"`, has no children and no history,
    /// and is placed directly after the original under the same parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    #[instrument(level = "debug", skip(self))]
    pub fn duplicate(&mut self, id: &DefinitionId) -> Result<DefinitionId, StoreError> {
        let location =
            hierarchy::locate(&self.forest, id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let original = self.require(id)?;

        let mut content = original.content.clone();
        content.name = format!("{} (Copy)", content.name);
        let copy_id = DefinitionId::generate();
        let copy = Arc::new(Definition::new(copy_id.clone(), content));
        let index = location.index + 1;

        let forest = match location.parent {
            Some(parent) => {
                let parent_id = parent.id.clone();
                hierarchy::transform(&self.forest, &parent_id, |parent| {
                    let mut parent = Definition::clone(parent);
                    parent.children.insert(index, copy);
                    Arc::new(parent)
                })
                .ok_or(StoreError::NotFound(parent_id))?
            }
            None => {
                let mut forest = self.forest.clone();
                forest.insert(index, copy);
                forest
            }
        };
        self.forest = forest;

        Ok(copy_id)
    }

    /// Sets the archive flag on exactly one definition.
    ///
    /// Children are not affected. Returns `false` if the flag already had the
    /// requested value, in which case the tree is not rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    #[instrument(level = "debug", skip(self))]
    pub fn archive(&mut self, id: &DefinitionId, archived: bool) -> Result<bool, StoreError> {
        if self.require(id)?.is_archived == archived {
            return Ok(false);
        }
        let forest = hierarchy::transform(&self.forest, id, |node| with_archived(node, archived))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.forest = forest;
        Ok(true)
    }

    /// Sets the archive flag on every listed definition in one rewrite.
    ///
    /// Returns the number of definitions whose flag changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for the first id that does not
    /// resolve; nothing is archived in that case.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn bulk_archive<'a, I>(&mut self, ids: I, archived: bool) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = &'a DefinitionId>,
    {
        let ids: HashSet<&DefinitionId> = ids.into_iter().collect();
        if let Some(missing) = ids.iter().find(|id| self.find(id).is_none()) {
            return Err(StoreError::NotFound((*missing).clone()));
        }

        let targets = |node: &Definition| node.is_archived != archived && ids.contains(&node.id);
        let changed = self.iter().filter(|node| targets(node)).count();
        if let Some(forest) =
            hierarchy::transform_matching(&self.forest, &targets, &|node: &Arc<Definition>| {
                with_archived(node, archived)
            })
        {
            self.forest = forest;
        }
        Ok(changed)
    }

    /// Removes a definition and all of its descendants.
    ///
    /// References to any removed id are dropped from the `relatedDefinitions`
    /// of the definitions that remain.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: &DefinitionId) -> Result<Deletion, StoreError> {
        let (forest, removed) =
            hierarchy::remove(&self.forest, id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let removed: Vec<DefinitionId> = hierarchy::pre_order(std::slice::from_ref(&removed))
            .map(|node| node.id.clone())
            .collect();
        let gone: HashSet<&DefinitionId> = removed.iter().collect();

        let dangling = |node: &Definition| {
            node.content
                .related_definitions
                .iter()
                .any(|related| gone.contains(related))
        };
        let unlinked_references = hierarchy::pre_order(&forest)
            .flat_map(|node| &node.content.related_definitions)
            .filter(|related| gone.contains(related))
            .count();
        let forest = hierarchy::transform_matching(&forest, &dangling, &|node: &Arc<Definition>| {
            let mut node = Definition::clone(node);
            node.content
                .related_definitions
                .retain(|related| !gone.contains(related));
            Arc::new(node)
        })
        .unwrap_or(forest);
        self.forest = forest;

        tracing::debug!(
            "deleted {} definition(s), unlinked {unlinked_references} reference(s)",
            removed.len()
        );
        Ok(Deletion {
            removed,
            unlinked_references,
        })
    }

    /// Adds `other` to the related definitions of `id`.
    ///
    /// Returns `false` if they were already related.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ValidationFailed`] when relating a definition to itself
    /// - [`StoreError::NotFound`] if either id does not resolve
    pub fn relate(&mut self, id: &DefinitionId, other: &DefinitionId) -> Result<bool, StoreError> {
        if id == other {
            return Err(StoreError::ValidationFailed(format!(
                "definition {id} cannot be related to itself"
            )));
        }
        self.require(other)?;
        if self.require(id)?.content.related_definitions.contains(other) {
            return Ok(false);
        }
        let forest = hierarchy::transform(&self.forest, id, |node| {
            let mut node = Definition::clone(node);
            node.content.related_definitions.push(other.clone());
            Arc::new(node)
        })
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.forest = forest;
        Ok(true)
    }

    /// Removes `other` from the related definitions of `id`.
    ///
    /// `other` need not exist, so dangling references can be cleared.
    /// Returns `false` if they were not related.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` does not resolve.
    pub fn unrelate(&mut self, id: &DefinitionId, other: &DefinitionId) -> Result<bool, StoreError> {
        if !self.require(id)?.content.related_definitions.contains(other) {
            return Ok(false);
        }
        let forest = hierarchy::transform(&self.forest, id, |node| {
            let mut node = Definition::clone(node);
            node.content.related_definitions.retain(|related| related != other);
            Arc::new(node)
        })
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.forest = forest;
        Ok(true)
    }

    /// Full-text search over names, keywords and every rich-text body.
    ///
    /// Matching is a case-insensitive substring test; results are in
    /// pre-order. A blank query matches nothing.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Arc<Definition>> {
        let needle = query.to_lowercase();
        if needle.trim().is_empty() {
            return Vec::new();
        }
        self.iter()
            .filter(|node| {
                node.content.matches_name_or_keyword(&needle)
                    || node
                        .content
                        .bodies()
                        .any(|body| body.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// The selected definitions in pre-order, for export.
    #[must_use]
    pub fn select(&self, ids: &BTreeSet<DefinitionId>) -> Vec<Arc<Definition>> {
        self.iter()
            .filter(|node| ids.contains(&node.id))
            .cloned()
            .collect()
    }

    fn require(&self, id: &DefinitionId) -> Result<&Arc<Definition>, StoreError> {
        self.find(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

fn with_archived(node: &Arc<Definition>, archived: bool) -> Arc<Definition> {
    let mut node = Definition::clone(node);
    node.is_archived = archived;
    Arc::new(node)
}

fn validate_name(name: &str) -> Result<NonEmptyString, StoreError> {
    NonEmptyString::new(name.trim().to_string())
        .map_err(|_| StoreError::ValidationFailed("name must not be empty".to_string()))
}

/// Every id that appears more than once, in order of first repetition.
#[must_use]
pub fn duplicate_ids(forest: &[Arc<Definition>]) -> Vec<DefinitionId> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for node in hierarchy::pre_order(forest) {
        if !seen.insert(&node.id) && !duplicates.contains(&node.id) {
            duplicates.push(node.id.clone());
        }
    }
    duplicates
}
