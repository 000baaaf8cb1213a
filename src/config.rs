//! Server configuration
//!
//! Settings come from three places, later ones overriding earlier ones:
//! command line defaults, LSP `initializationOptions`, and the `cfxNatives`
//! section of `workspace/didChangeConfiguration`. Client payloads are partial;
//! fields they omit keep their current value.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::resources::index::DEFAULT_GAME;

/// Section name clients use for this server's settings.
pub const SETTINGS_SECTION: &str = "cfxNatives";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Complete natives as call snippets with parameter placeholders.
    pub insert_parentheses: bool,
    /// Game assumed for files outside any resource, or resources declaring none.
    pub default_game: String,
    /// Extra directories searched for `natives.<game>.json`.
    pub natives_dirs: Vec<PathBuf>,
    /// Cap on completion items per request; `None` is unlimited.
    pub max_completion_items: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            insert_parentheses: false,
            default_game: DEFAULT_GAME.to_string(),
            natives_dirs: Vec::new(),
            max_completion_items: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    insert_parentheses: Option<bool>,
    default_game: Option<String>,
    natives_dirs: Option<Vec<PathBuf>>,
    max_completion_items: Option<usize>,
}

impl ServerConfig {
    /// Overlay the fields present in a client payload.
    ///
    /// Accepts either the bare settings object or one wrapped in a
    /// `cfxNatives` key. Malformed payloads are logged and ignored.
    pub fn merged_with(&self, value: &Value) -> ServerConfig {
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        if section.is_null() {
            return self.clone();
        }

        let partial = match PartialConfig::deserialize(section) {
            Ok(partial) => partial,
            Err(e) => {
                warn!("Ignoring malformed {} settings: {}", SETTINGS_SECTION, e);
                return self.clone();
            }
        };

        let mut merged = self.clone();
        if let Some(insert_parentheses) = partial.insert_parentheses {
            merged.insert_parentheses = insert_parentheses;
        }
        if let Some(default_game) = partial.default_game.filter(|game| !game.trim().is_empty()) {
            merged.default_game = default_game.trim().to_string();
        }
        if let Some(natives_dirs) = partial.natives_dirs {
            merged.natives_dirs = natives_dirs;
        }
        if partial.max_completion_items.is_some() {
            merged.max_completion_items = partial.max_completion_items.filter(|max| *max > 0);
        }
        merged
    }
}
