//! A persisted definition workspace.
//!
//! The [`Workspace`] owns the authoritative [`DefinitionStore`] together with
//! the state kept outside the tree (bookmarks, notifications and supporting
//! tables), and reads and writes all of it through a [`KeyValueStore`].
//!
//! Mutations change the in-memory state only; call [`Workspace::flush`] to
//! persist them.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    domain::{
        Bookmarks, Comparison, Config, Content, Definition, DefinitionId, DefinitionStore,
        Deletion, Filters, NotificationLog, ProjectedNode, RevisionNote, StoreError,
        SupportingTable, SupportingTables, Update,
        assist::{self, DraftSource, SuggestionRequest, SuggestionSource},
        hierarchy::Forest,
        notification, projection, revision,
        tables::Resolved,
    },
    storage::{
        kv::{JsonDirectory, KeyValueStore, StorageError},
        seed,
    },
};

const DEFINITIONS: &str = "definitions";
const NOTIFICATIONS: &str = "notifications";
const BOOKMARKS: &str = "bookmarks";
const SUPPORTING_TABLES: &str = "supportingTables";

/// Errors raised by workspace operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// A tree operation was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A document could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A revision index is out of range.
    #[error("definition {id} has no revision {index}")]
    RevisionNotFound {
        /// The definition.
        id: DefinitionId,
        /// The requested index.
        index: usize,
    },

    /// An assist service failed.
    #[error("assist service failed: {0}")]
    Assist(Box<dyn std::error::Error + Send + Sync>),
}

/// The outcome of [`Workspace::update`].
#[derive(Debug, Clone)]
pub struct Edited {
    /// The node before and after the change.
    pub update: Update,
    /// The notification recorded for a bookmarked definition, if any.
    pub notification: Option<Uuid>,
}

/// A definition store with its surrounding state and persistence.
#[derive(Debug)]
pub struct Workspace<K> {
    backend: K,
    config: Config,
    store: DefinitionStore,
    bookmarks: Bookmarks,
    notifications: NotificationLog,
    tables: SupportingTables,
}

impl Workspace<JsonDirectory> {
    /// Opens the workspace stored in `root`.
    ///
    /// The configuration is read from `config.toml` in the same directory;
    /// a missing or invalid file falls back to the defaults.
    ///
    /// # Errors
    ///
    /// See [`Workspace::open`].
    pub fn open_dir(root: PathBuf) -> Result<Self, WorkspaceError> {
        let config = load_config(&root);
        Self::open(JsonDirectory::new(root), config)
    }
}

impl<K: KeyValueStore> Workspace<K> {
    /// Loads a workspace from `backend`.
    ///
    /// Documents that have never been written are initialised from the
    /// built-in seed. A persisted tree that repeats ids is discarded in
    /// favour of the seed.
    ///
    /// # Errors
    ///
    /// Returns an error if a document cannot be read or is malformed.
    pub fn open(backend: K, config: Config) -> Result<Self, WorkspaceError> {
        let seed = seed::seed().map_err(|source| StorageError::Json {
            key: "seed".to_string(),
            source,
        })?;

        let store = match load::<Forest>(&backend, DEFINITIONS)? {
            None => {
                tracing::debug!("no persisted definitions, using the seed");
                DefinitionStore::new(seed.definitions)?
            }
            Some(forest) => match DefinitionStore::new(forest) {
                Ok(store) => store,
                Err(StoreError::CorruptState { duplicates }) => {
                    tracing::warn!(
                        "persisted definitions repeat {} id(s), falling back to the seed",
                        duplicates.len()
                    );
                    DefinitionStore::new(seed.definitions)?
                }
                Err(e) => return Err(e.into()),
            },
        };

        let bookmarks = load(&backend, BOOKMARKS)?.unwrap_or_default();
        let notifications = load(&backend, NOTIFICATIONS)?.unwrap_or_default();
        let tables = load(&backend, SUPPORTING_TABLES)?.unwrap_or(seed.supporting_tables);

        Ok(Self {
            backend,
            config,
            store,
            bookmarks,
            notifications,
            tables,
        })
    }

    /// Writes every document to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if any document cannot be written. Documents written
    /// before the failure stay written.
    pub fn flush(&mut self) -> Result<(), WorkspaceError> {
        save(&mut self.backend, DEFINITIONS, self.store.forest())?;
        save(&mut self.backend, NOTIFICATIONS, &self.notifications)?;
        save(&mut self.backend, BOOKMARKS, &self.bookmarks)?;
        save(&mut self.backend, SUPPORTING_TABLES, &self.tables)?;
        tracing::debug!("flushed workspace ({} definitions)", self.store.len());
        Ok(())
    }

    /// Consumes the workspace, returning its backend. Unflushed changes are
    /// lost.
    pub fn into_backend(self) -> K {
        self.backend
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The authoritative definition store.
    #[must_use]
    pub const fn store(&self) -> &DefinitionStore {
        &self.store
    }

    /// The bookmarked definitions.
    #[must_use]
    pub const fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    /// The notification log, newest first.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    /// The supporting tables.
    #[must_use]
    pub const fn tables(&self) -> &SupportingTables {
        &self.tables
    }

    /// Finds a definition by id.
    #[must_use]
    pub fn find(&self, id: &DefinitionId) -> Option<&Arc<Definition>> {
        self.store.find(id)
    }

    /// Replaces the content of a definition.
    ///
    /// If the definition is bookmarked, a notification is recorded and its id
    /// returned alongside the update.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::update`].
    pub fn update(&mut self, id: &DefinitionId, content: Content) -> Result<Edited, WorkspaceError> {
        let update = self.store.update(id, content)?;
        let notification =
            notification::for_update(&update.previous, &update.current, self.bookmarks.contains(id))
                .map(|notification| {
                    tracing::info!("{}", notification.message);
                    let recorded = notification.id;
                    self.notifications
                        .push(notification, self.config.notification_limit());
                    recorded
                });
        Ok(Edited {
            update,
            notification,
        })
    }

    /// Replaces the content of a definition and records the change as a new
    /// revision.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::update`].
    pub fn update_with_revision(
        &mut self,
        id: &DefinitionId,
        content: Content,
        note: RevisionNote,
    ) -> Result<Edited, WorkspaceError> {
        let edited = self.update(id, content)?;
        self.store.record_revision(id, note)?;
        Ok(edited)
    }

    /// Change metadata stamped with today's date and the configured
    /// developer.
    #[must_use]
    pub fn revision_note(&self, ticket_id: &str, description: &str) -> RevisionNote {
        RevisionNote {
            ticket_id: ticket_id.to_string(),
            date: Utc::now().date_naive(),
            developer: self.config.developer.clone(),
            description: description.to_string(),
        }
    }

    /// Inserts a new definition under the module called `parent_module`.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::create`].
    pub fn create(
        &mut self,
        parent_module: &str,
        content: Content,
    ) -> Result<DefinitionId, WorkspaceError> {
        let id = self.store.create(parent_module, content)?;
        tracing::info!("Added definition: {id}");
        Ok(id)
    }

    /// Drafts a definition from `source_text` and inserts it under
    /// `parent_module`.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft service fails or the draft is rejected
    /// by [`DefinitionStore::create`].
    pub fn apply_draft<D: DraftSource>(
        &mut self,
        drafts: &D,
        parent_module: &str,
        source_text: &str,
    ) -> Result<DefinitionId, WorkspaceError> {
        let draft = drafts
            .draft(source_text)
            .map_err(|e| WorkspaceError::Assist(Box::new(e)))?;
        self.create(parent_module, draft.into())
    }

    /// Copies a definition next to the original.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::duplicate`].
    pub fn duplicate(&mut self, id: &DefinitionId) -> Result<DefinitionId, WorkspaceError> {
        Ok(self.store.duplicate(id)?)
    }

    /// Sets the archive flag on one definition.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::archive`].
    pub fn archive(&mut self, id: &DefinitionId, archived: bool) -> Result<bool, WorkspaceError> {
        Ok(self.store.archive(id, archived)?)
    }

    /// Sets the archive flag on several definitions at once.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::bulk_archive`].
    pub fn bulk_archive(
        &mut self,
        ids: &[DefinitionId],
        archived: bool,
    ) -> Result<usize, WorkspaceError> {
        Ok(self.store.bulk_archive(ids, archived)?)
    }

    /// Removes a definition and its descendants, along with their bookmarks.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::delete`].
    pub fn delete(&mut self, id: &DefinitionId) -> Result<Deletion, WorkspaceError> {
        let deletion = self.store.delete(id)?;
        let unbookmarked = deletion
            .removed
            .iter()
            .filter(|removed| self.bookmarks.remove(removed))
            .count();
        if unbookmarked > 0 {
            tracing::debug!("removed {unbookmarked} bookmark(s) of deleted definitions");
        }
        Ok(deletion)
    }

    /// Relates two definitions.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::relate`].
    pub fn relate(&mut self, id: &DefinitionId, other: &DefinitionId) -> Result<bool, WorkspaceError> {
        Ok(self.store.relate(id, other)?)
    }

    /// Removes a relation between two definitions.
    ///
    /// # Errors
    ///
    /// See [`DefinitionStore::unrelate`].
    pub fn unrelate(
        &mut self,
        id: &DefinitionId,
        other: &DefinitionId,
    ) -> Result<bool, WorkspaceError> {
        Ok(self.store.unrelate(id, other)?)
    }

    /// Flips the bookmark on a definition and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    pub fn toggle_bookmark(&mut self, id: &DefinitionId) -> Result<bool, WorkspaceError> {
        if self.store.find(id).is_none() {
            return Err(StoreError::NotFound(id.clone()).into());
        }
        Ok(self.bookmarks.toggle(id.clone()))
    }

    /// Marks one notification as read.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        self.notifications.mark_read(id)
    }

    /// Marks every notification as read.
    pub fn mark_all_read(&mut self) -> usize {
        self.notifications.mark_all_read()
    }

    /// Removes every notification.
    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// The filter state a fresh view starts with.
    #[must_use]
    pub fn default_filters(&self) -> Filters {
        Filters {
            show_archived: self.config.show_archived,
            ..Filters::default()
        }
    }

    /// Projects the visible tree.
    #[must_use]
    pub fn project(&self, filters: &Filters) -> Vec<ProjectedNode> {
        projection::project(self.store.forest(), filters, |id| self.bookmarks.contains(id))
    }

    /// Full-text search.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Arc<Definition>> {
        self.store.search(query)
    }

    /// The selected definitions, in pre-order.
    #[must_use]
    pub fn export(&self, ids: &BTreeSet<DefinitionId>) -> Vec<Arc<Definition>> {
        self.store.select(ids)
    }

    /// Compares two revisions of a definition by index.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not resolve or either index is out of
    /// range.
    pub fn compare_revisions(
        &self,
        id: &DefinitionId,
        first: usize,
        second: usize,
    ) -> Result<Comparison<'_>, WorkspaceError> {
        let definition = self
            .store
            .find(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let nth = |index: usize| {
            definition
                .revisions
                .get(index)
                .ok_or_else(|| WorkspaceError::RevisionNotFound {
                    id: id.clone(),
                    index,
                })
        };
        Ok(revision::compare(nth(first)?, nth(second)?))
    }

    /// Asks `source` for related definitions and resolves its answer to ids.
    ///
    /// The returned ids are not yet related; see [`Workspace::relate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not resolve or the service fails.
    pub fn suggest_related<S: SuggestionSource>(
        &self,
        source: &S,
        id: &DefinitionId,
    ) -> Result<Vec<DefinitionId>, WorkspaceError> {
        let target = self
            .store
            .find(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let names = source
            .suggest(&SuggestionRequest::from(target.as_ref()))
            .map_err(|e| WorkspaceError::Assist(Box::new(e)))?;
        Ok(assist::resolve_suggestions(&self.store, target, &names))
    }

    /// Adds or replaces a supporting table.
    pub fn insert_table(&mut self, table: SupportingTable) -> Option<SupportingTable> {
        self.tables.insert(table)
    }

    /// Resolves the table markers in every rich-text body of a definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id does not resolve.
    pub fn resolve_tables(&self, id: &DefinitionId) -> Result<Resolved<'_>, WorkspaceError> {
        let definition = self
            .store
            .find(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let bodies: Vec<&str> = definition.content.bodies().collect();
        Ok(self.tables.resolve(&bodies.join("\n")))
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join("config.toml");
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn load<T: DeserializeOwned>(backend: &impl KeyValueStore, key: &str) -> Result<Option<T>, StorageError> {
    backend
        .get(key)?
        .map(|value| {
            serde_json::from_value(value).map_err(|source| StorageError::Json {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

fn save<T: Serialize + ?Sized>(
    backend: &mut impl KeyValueStore,
    key: &str,
    document: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(document).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })?;
    backend.set(key, &value)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde_json::json;
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::{hierarchy::pre_order, store::duplicate_ids},
        storage::MemoryStore,
    };

    fn workspace() -> Workspace<MemoryStore> {
        Workspace::open(MemoryStore::new(), Config::default()).unwrap()
    }

    fn visible_ids(nodes: &[ProjectedNode]) -> Vec<&str> {
        pre_order(nodes).map(|node| node.id().as_str()).collect()
    }

    fn with_description(workspace: &Workspace<MemoryStore>, id: &str, text: &str) -> Content {
        let mut content = workspace.find(&id.into()).unwrap().content.clone();
        content.description = text.to_string();
        content
    }

    #[test]
    fn fresh_workspace_uses_seed() {
        let workspace = workspace();
        assert_eq!(workspace.store().len(), 9);
        assert!(workspace.tables().get("place-of-service").is_some());
        assert!(workspace.bookmarks().is_empty());
        assert!(workspace.notifications().is_empty());
    }

    #[test]
    fn bookmarked_description_update_notifies_once() {
        let mut workspace = workspace();
        workspace.toggle_bookmark(&"1.1.1".into()).unwrap();
        let content = with_description(&workspace, "1.1.1", "<p>When the decision was issued.</p>");

        workspace.update(&"1.1.1".into(), content).unwrap();

        assert_eq!(workspace.notifications().len(), 1);
        let notification = workspace.notifications().iter().next().unwrap();
        assert!(
            notification
                .message
                .starts_with("The description of \"Auth Decision Date\"")
        );
        assert!(!notification.read);
        assert_eq!(workspace.notifications().unread_count(), 1);
    }

    #[test]
    fn bookmarked_update_without_description_change_uses_generic_message() {
        let mut workspace = workspace();
        workspace.toggle_bookmark(&"2.2".into()).unwrap();
        let mut content = workspace.find(&"2.2".into()).unwrap().content.clone();
        content.keywords.push("nucc".to_string());

        workspace.update(&"2.2".into(), content).unwrap();

        let notification = workspace.notifications().iter().next().unwrap();
        assert_eq!(notification.message, "Definition \"Provider Specialty\" was updated.");
    }

    #[test]
    fn unbookmarked_update_is_silent() {
        let mut workspace = workspace();
        let content = with_description(&workspace, "1.1.2", "changed");

        workspace.update(&"1.1.2".into(), content).unwrap();

        assert!(workspace.notifications().is_empty());
    }

    #[test]
    fn notification_log_respects_limit() {
        let mut config = Config::default();
        config.set_notification_limit(2);
        let mut workspace = Workspace::open(MemoryStore::new(), config).unwrap();
        workspace.toggle_bookmark(&"3.1".into()).unwrap();

        for text in ["a", "b", "c"] {
            let content = with_description(&workspace, "3.1", text);
            workspace.update(&"3.1".into(), content).unwrap();
        }

        assert_eq!(workspace.notifications().len(), 2);
        assert_eq!(workspace.mark_all_read(), 2);
        assert_eq!(workspace.notifications().unread_count(), 0);
        workspace.clear_notifications();
        assert!(workspace.notifications().is_empty());
    }

    #[test]
    fn update_reports_notification_when_full_log_evicts() {
        let mut config = Config::default();
        config.set_notification_limit(1);
        let mut workspace = Workspace::open(MemoryStore::new(), config).unwrap();
        workspace.toggle_bookmark(&"3.1".into()).unwrap();

        for text in ["a", "b"] {
            let content = with_description(&workspace, "3.1", text);
            let edited = workspace.update(&"3.1".into(), content).unwrap();

            let newest = workspace.notifications().iter().next().unwrap().id;
            assert_eq!(edited.notification, Some(newest));
            assert_eq!(workspace.notifications().unread_count(), 1);
        }

        let content = with_description(&workspace, "1.1.2", "quiet");
        let edited = workspace.update(&"1.1.2".into(), content).unwrap();
        assert_eq!(edited.notification, None);
    }

    #[test]
    fn mark_read_targets_one_notification() {
        let mut workspace = workspace();
        workspace.toggle_bookmark(&"3.1".into()).unwrap();
        for text in ["a", "b"] {
            let content = with_description(&workspace, "3.1", text);
            workspace.update(&"3.1".into(), content).unwrap();
        }
        let newest = workspace.notifications().iter().next().unwrap().id;

        assert!(workspace.mark_read(newest));
        assert!(!workspace.mark_read(Uuid::new_v4()));
        assert_eq!(workspace.notifications().unread_count(), 1);
    }

    #[test]
    fn duplicate_places_copy_after_original() {
        let mut workspace = workspace();

        let copy = workspace.duplicate(&"1.1.1".into()).unwrap();

        let module = workspace.find(&"1".into()).unwrap();
        let ids: Vec<_> = module.children.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["1.1.1".into(), copy.clone(), "1.1.2".into()]);
        assert_eq!(
            workspace.find(&copy).unwrap().name(),
            "Auth Decision Date (Copy)"
        );
    }

    #[test]
    fn archived_module_stays_visible_through_live_children() {
        let mut workspace = workspace();
        assert!(workspace.archive(&"1".into(), true).unwrap());

        let module = workspace.find(&"1".into()).unwrap();
        assert!(module.is_archived);
        assert!(module.children.iter().all(|child| !child.is_archived));

        let projected = workspace.project(&workspace.default_filters());
        assert!(visible_ids(&projected).contains(&"1"));
        assert!(visible_ids(&projected).contains(&"1.1.1"));
    }

    #[test]
    fn archived_leaf_is_hidden_by_default() {
        let mut workspace = workspace();
        workspace.archive(&"1.1.2".into(), true).unwrap();

        let projected = workspace.project(&workspace.default_filters());

        assert!(!visible_ids(&projected).contains(&"1.1.2"));
    }

    #[test]
    fn config_can_show_archived_by_default() {
        let mut config = Config::default();
        config.show_archived = true;
        let mut workspace = Workspace::open(MemoryStore::new(), config).unwrap();
        workspace.archive(&"1.1.2".into(), true).unwrap();

        let projected = workspace.project(&workspace.default_filters());

        assert!(visible_ids(&projected).contains(&"1.1.2"));
    }

    #[test]
    fn rate_search_shows_provider_branch_only() {
        let workspace = workspace();
        let filters = Filters {
            query: "rate".to_string(),
            ..Filters::default()
        };

        let projected = workspace.project(&filters);

        assert_eq!(visible_ids(&projected), ["2", "2.1", "2.1.1"]);
        let names: Vec<_> = pre_order(&projected).map(|n| n.definition.name()).collect();
        assert_eq!(names, ["Provider", "Provider Contracts", "Contracted Rates"]);
    }

    #[test]
    fn bookmarked_only_view() {
        let mut workspace = workspace();
        workspace.toggle_bookmark(&"3.1".into()).unwrap();
        let filters = Filters {
            show_bookmarked: true,
            ..Filters::default()
        };

        assert_eq!(visible_ids(&workspace.project(&filters)), ["3", "3.1"]);
    }

    #[test]
    fn toggle_bookmark_rejects_unknown_ids() {
        let mut workspace = workspace();
        assert!(matches!(
            workspace.toggle_bookmark(&"nope".into()),
            Err(WorkspaceError::Store(StoreError::NotFound(_)))
        ));
        assert!(workspace.toggle_bookmark(&"2".into()).unwrap());
        assert!(!workspace.toggle_bookmark(&"2".into()).unwrap());
    }

    #[test]
    fn delete_drops_bookmarks_of_removed_nodes() {
        let mut workspace = workspace();
        workspace.toggle_bookmark(&"2.1.1".into()).unwrap();
        workspace.toggle_bookmark(&"2.2".into()).unwrap();

        let deletion = workspace.delete(&"2.1".into()).unwrap();

        assert_eq!(deletion.removed, vec!["2.1".into(), "2.1.1".into()]);
        let bookmarked: Vec<_> = workspace.bookmarks().iter().cloned().collect();
        assert_eq!(bookmarked, vec!["2.2".into()]);
    }

    #[test]
    fn ids_stay_unique_across_operations() {
        let mut workspace = workspace();

        let created = workspace
            .create("Claims", Content::named("Claim Status", ""))
            .unwrap();
        workspace.duplicate(&created).unwrap();
        workspace.duplicate(&"2".into()).unwrap();
        workspace
            .create("Pharmacy", Content::named("NDC", ""))
            .unwrap();
        workspace.archive(&"3".into(), true).unwrap();
        workspace.delete(&"2.1".into()).unwrap();
        workspace.duplicate(&"1.1.1".into()).unwrap();

        assert!(duplicate_ids(workspace.store().forest()).is_empty());
        assert_eq!(workspace.store().len(), 13);
    }

    #[test]
    fn ids_stay_unique_across_random_operations() {
        let mut workspace = workspace();
        let mut state: u64 = 7;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) as usize
        };

        for step in 0..400 {
            let nodes = workspace.store().flatten();
            if nodes.is_empty() {
                workspace
                    .create("Claims", Content::named(format!("Node {step}"), ""))
                    .unwrap();
                continue;
            }
            let target = nodes[next() % nodes.len()].id.clone();

            match next() % 6 {
                0 => {
                    let parent = nodes[next() % nodes.len()].name().to_string();
                    workspace
                        .create(&parent, Content::named(format!("Node {step}"), ""))
                        .unwrap();
                }
                1 | 2 => {
                    workspace.duplicate(&target).unwrap();
                }
                3 => {
                    workspace.archive(&target, next() % 2 == 0).unwrap();
                }
                4 => {
                    let other = nodes[next() % nodes.len()].id.clone();
                    workspace.bulk_archive(&[target, other], true).unwrap();
                }
                _ => {
                    workspace.delete(&target).unwrap();
                }
            }

            assert!(
                duplicate_ids(workspace.store().forest()).is_empty(),
                "duplicate id after step {step}"
            );
        }
    }

    #[test]
    fn update_with_revision_appends_history() {
        let mut workspace = workspace();
        let content = with_description(&workspace, "1.1.1", "<p>Updated</p>");
        let note = workspace.revision_note("DD-200", "Reworded");

        workspace
            .update_with_revision(&"1.1.1".into(), content, note)
            .unwrap();

        let revisions = &workspace.find(&"1.1.1".into()).unwrap().revisions;
        assert_eq!(revisions.len(), 3);
        assert_eq!(revisions[2].developer, "unknown");
        assert_eq!(revisions[2].snapshot.description, "<p>Updated</p>");
    }

    #[test_case(0, 1 ; "in order")]
    #[test_case(1, 0 ; "reversed")]
    fn compare_seeded_revisions(first: usize, second: usize) {
        let workspace = workspace();

        let comparison = workspace
            .compare_revisions(&"1.1.1".into(), first, second)
            .unwrap();

        assert_eq!(comparison.older.ticket_id, "DD-101");
        assert_eq!(comparison.newer.ticket_id, "DD-142");
        let fields: Vec<_> = comparison.fields.iter().map(|f| f.field).collect();
        assert_eq!(
            fields,
            [revision::Field::Description, revision::Field::Usage]
        );
    }

    #[test]
    fn compare_reports_missing_revision() {
        let workspace = workspace();
        assert!(matches!(
            workspace.compare_revisions(&"1.1.1".into(), 0, 7),
            Err(WorkspaceError::RevisionNotFound { index: 7, .. })
        ));
        assert!(matches!(
            workspace.compare_revisions(&"nope".into(), 0, 1),
            Err(WorkspaceError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn resolve_tables_reports_known_and_unknown() {
        let mut workspace = workspace();
        let content = with_description(&workspace, "3.1", "<p>{{table:missing}}</p>");
        workspace.update(&"3.1".into(), content).unwrap();

        let resolved = workspace.resolve_tables(&"3.1".into()).unwrap();

        assert_eq!(resolved.tables.len(), 1);
        assert_eq!(resolved.tables[0].id, "place-of-service");
        assert_eq!(resolved.unresolved, ["missing"]);
    }

    #[test]
    fn export_selects_in_tree_order() {
        let workspace = workspace();
        let ids: BTreeSet<DefinitionId> = ["3.1".into(), "1.1.1".into()].into();

        let exported: Vec<_> = workspace.export(&ids).iter().map(|d| d.id.clone()).collect();

        assert_eq!(exported, vec!["1.1.1".into(), "3.1".into()]);
    }

    struct FixedSuggestions(Vec<&'static str>);

    impl SuggestionSource for FixedSuggestions {
        type Error = Infallible;

        fn suggest(&self, _request: &SuggestionRequest) -> Result<Vec<String>, Infallible> {
            Ok(self.0.iter().map(ToString::to_string).collect())
        }
    }

    #[test]
    fn suggestions_resolve_to_unrelated_ids() {
        let workspace = workspace();
        let source = FixedSuggestions(vec!["Auth Status", "Place of Service", "Unknown"]);

        let ids = workspace.suggest_related(&source, &"1.1.1".into()).unwrap();

        // Auth Status is already related in the seed
        assert_eq!(ids, vec!["3.1".into()]);
    }

    struct EchoDraft;

    impl DraftSource for EchoDraft {
        type Error = Infallible;

        fn draft(&self, source: &str) -> Result<assist::Draft, Infallible> {
            Ok(assist::Draft {
                name: source.to_string(),
                description: format!("<p>{source}</p>"),
                keywords: Vec::new(),
            })
        }
    }

    #[test]
    fn draft_is_created_under_module() {
        let mut workspace = workspace();

        let id = workspace
            .apply_draft(&EchoDraft, "Claims", "Claim Frequency Code")
            .unwrap();

        assert_eq!(workspace.store().parent_of(&id).unwrap().id.as_str(), "3");
        assert_eq!(workspace.find(&id).unwrap().content.module, "Claims");
    }

    #[test]
    fn flush_and_reopen_preserves_state() {
        let tmp = TempDir::new().unwrap();
        let mut workspace = Workspace::open_dir(tmp.path().to_path_buf()).unwrap();
        workspace.toggle_bookmark(&"2.1.1".into()).unwrap();
        let content = with_description_dir(&workspace, "2.1.1");
        workspace.update(&"2.1.1".into(), content).unwrap();
        workspace.archive(&"2.2".into(), true).unwrap();
        workspace.flush().unwrap();

        let reopened = Workspace::open_dir(tmp.path().to_path_buf()).unwrap();

        assert_eq!(reopened.store().forest(), workspace.store().forest());
        assert_eq!(reopened.bookmarks(), workspace.bookmarks());
        assert_eq!(reopened.notifications(), workspace.notifications());
        assert_eq!(reopened.tables(), workspace.tables());
        assert!(tmp.path().join("supportingTables.json").exists());
    }

    fn with_description_dir(workspace: &Workspace<JsonDirectory>, id: &str) -> Content {
        let mut content = workspace.find(&id.into()).unwrap().content.clone();
        content.description = "<p>Negotiated amounts.</p>".to_string();
        content
    }

    #[test]
    fn open_dir_reads_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "_version = \"1\"\ndeveloper = \"analyst\"\n",
        )
        .unwrap();

        let workspace = Workspace::open_dir(tmp.path().to_path_buf()).unwrap();

        assert_eq!(workspace.config().developer, "analyst");
    }

    #[test]
    fn corrupt_tree_falls_back_to_seed() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                DEFINITIONS,
                &json!([
                    {"id": "x", "name": "A", "children": [{"id": "y", "name": "B"}]},
                    {"id": "y", "name": "C"}
                ]),
            )
            .unwrap();

        let workspace = Workspace::open(backend, Config::default()).unwrap();

        assert_eq!(workspace.store().len(), 9);
        assert!(workspace.find(&"x".into()).is_none());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let mut backend = MemoryStore::new();
        backend.set(BOOKMARKS, &json!({"not": "a list"})).unwrap();

        let error = Workspace::open(backend, Config::default()).unwrap_err();

        assert!(matches!(
            error,
            WorkspaceError::Storage(StorageError::Json { ref key, .. }) if key == BOOKMARKS
        ));
    }

    #[test]
    fn unflushed_changes_are_not_persisted() {
        let mut workspace = workspace();
        workspace.flush().unwrap();
        workspace.delete(&"3".into()).unwrap();

        let reopened = Workspace::open(workspace.into_backend(), Config::default()).unwrap();

        assert!(reopened.find(&"3".into()).is_some());
    }
}
