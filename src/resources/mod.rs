//! Resource discovery and script classification
//!
//! A workspace contains resources: directories holding an `fxmanifest.lua`
//! (or legacy `__resource.lua`). Each manifest lists client, server and shared
//! script patterns, and optionally the game(s) it targets. The
//! [`ResourceIndex`] expands those patterns into concrete files so that any
//! open document can be classified in O(1).

pub mod events;
pub mod fs;
pub mod index;
pub mod manifest;
pub mod paths;

use std::fmt;

pub use events::WorkspaceEvent;
pub use fs::{LocalFs, WorkspaceFs};
pub use index::{Resource, ResourceIndex};
pub use manifest::{GameDeclaration, Manifest, parse_manifest_text};

/// Execution context of a script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptType {
    Client,
    Server,
    Shared,
    #[default]
    Unknown,
}

impl ScriptType {
    /// Categories in manifest claim order; a later category overrides an earlier one.
    pub const CLAIM_ORDER: [ScriptType; 3] = [ScriptType::Client, ScriptType::Server, ScriptType::Shared];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Client => "client",
            ScriptType::Server => "server",
            ScriptType::Shared => "shared",
            ScriptType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
