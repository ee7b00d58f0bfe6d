use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for a definition workspace.
///
/// This struct holds settings that control the defaults applied when editing
/// and viewing definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Author label recorded on new revisions.
    pub developer: String,

    /// Whether archived definitions are shown by default.
    pub show_archived: bool,

    /// The maximum number of notifications retained.
    ///
    /// When a new notification would exceed the limit, the oldest is
    /// discarded.
    notification_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            developer: default_developer(),
            show_archived: false,
            notification_limit: default_notification_limit(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the maximum number of notifications retained.
    #[must_use]
    pub const fn notification_limit(&self) -> usize {
        self.notification_limit
    }

    /// Sets the maximum number of notifications retained.
    ///
    /// A limit of zero is raised to one.
    pub fn set_notification_limit(&mut self, limit: usize) {
        self.notification_limit = limit.max(1);
    }
}

fn default_developer() -> String {
    "unknown".to_string()
}

const fn default_notification_limit() -> usize {
    100
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_developer")]
        developer: String,

        #[serde(default)]
        show_archived: bool,

        /// The maximum number of notifications retained.
        #[serde(default = "default_notification_limit")]
        notification_limit: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                developer,
                show_archived,
                notification_limit,
            } => Self {
                developer,
                show_archived,
                notification_limit: notification_limit.max(1),
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            developer: config.developer,
            show_archived: config.show_archived,
            notification_limit: config.notification_limit,
        }
    }
}
