//! Change notifications for bookmarked definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    definition::{Definition, DefinitionId},
    diff,
};

/// A record that a bookmarked definition was updated.
///
/// The definition's name is copied in so the notification still reads well
/// after the definition is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique identifier.
    pub id: Uuid,
    /// The updated definition.
    pub definition_id: DefinitionId,
    /// The definition's name at the time of the update.
    pub definition_name: String,
    /// Human-readable message.
    pub message: String,
    /// When the update happened.
    pub date: DateTime<Utc>,
    /// Whether the user has seen it.
    #[serde(default)]
    pub read: bool,
}

/// Builds the message announcing an update from `previous` to `current`.
///
/// The description is compared with the diff engine so that the decision
/// agrees with what a revision comparison would show.
#[must_use]
pub fn update_message(previous: &Definition, current: &Definition) -> String {
    let name = current.name();
    if diff::has_changed(&previous.content.description, &current.content.description) {
        format!("The description of \"{name}\" was updated.")
    } else {
        format!("Definition \"{name}\" was updated.")
    }
}

/// Decides whether an update is notification-worthy and, if it is, builds
/// the notification.
#[must_use]
pub fn for_update(
    previous: &Definition,
    current: &Definition,
    bookmarked: bool,
) -> Option<Notification> {
    bookmarked.then(|| Notification {
        id: Uuid::new_v4(),
        definition_id: current.id.clone(),
        definition_name: current.name().to_string(),
        message: update_message(previous, current),
        date: Utc::now(),
        read: false,
    })
}

/// Notifications, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog(Vec<Notification>);

impl NotificationLog {
    /// Builds a log from notifications already ordered newest first.
    #[must_use]
    pub const fn new(notifications: Vec<Notification>) -> Self {
        Self(notifications)
    }

    /// Records a notification as the most recent, keeping at most `limit`.
    pub fn push(&mut self, notification: Notification, limit: usize) {
        self.0.insert(0, notification);
        self.0.truncate(limit);
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.0.iter()
    }

    /// The number of notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no notifications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.0.iter().filter(|n| !n.read).count()
    }

    /// Marks one notification as read.
    ///
    /// Returns `false` if no notification has the id.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        self.0
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.read = true)
            .is_some()
    }

    /// Marks every notification as read, returning how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        self.0
            .iter_mut()
            .filter(|n| !n.read)
            .map(|n| n.read = true)
            .count()
    }

    /// Removes every notification.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}
