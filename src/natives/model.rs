//! Native descriptor data model
//!
//! Mirrors the JSON shape of the `natives.<game>.json` data feed. Descriptors
//! are immutable once loaded and shared as `Arc<NativeDescriptor>`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The return type token meaning "returns nothing".
pub const VOID: &str = "void";

/// Execution context a native (or a script) belongs to.
///
/// Unrecognized feed values fold into `Shared` instead of failing the whole file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Apiset {
    Client,
    Server,
    #[default]
    Shared,
}

impl Apiset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Apiset::Client => "client",
            Apiset::Server => "server",
            Apiset::Shared => "shared",
        }
    }
}

impl From<String> for Apiset {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "client" => Apiset::Client,
            "server" => Apiset::Server,
            _ => Apiset::Shared,
        }
    }
}

impl From<Apiset> for String {
    fn from(value: Apiset) -> Self {
        value.as_str().to_string()
    }
}

/// One parameter of a native.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
        }
    }
}

/// A usage example attached to a native.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub lang: String,
    pub code: String,
}

/// A callable primitive exposed by the game scripting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDescriptor {
    pub name: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub apiset: Apiset,
    #[serde(default)]
    pub game_support: String,
    #[serde(default)]
    pub docs_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_rpc: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
}

fn default_return_type() -> String {
    VOID.to_string()
}

impl NativeDescriptor {
    /// Minimal descriptor, mostly useful for tests and benches.
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: String::new(),
            params,
            return_type: return_type.into(),
            description: String::new(),
            namespace: String::new(),
            apiset: Apiset::default(),
            game_support: String::new(),
            docs_url: String::new(),
            is_rpc: None,
            examples: Vec::new(),
            cname: None,
        }
    }

    /// True when the return type is the void marker (or missing altogether).
    pub fn returns_void(&self) -> bool {
        let trimmed = self.return_type.trim();
        trimmed.is_empty() || trimmed == VOID
    }

    pub fn is_rpc(&self) -> bool {
        self.is_rpc.unwrap_or(false)
    }
}

/// Natives of one game, split by execution context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizedNatives {
    #[serde(default)]
    pub client: Vec<Arc<NativeDescriptor>>,
    #[serde(default)]
    pub server: Vec<Arc<NativeDescriptor>>,
    #[serde(default)]
    pub shared: Vec<Arc<NativeDescriptor>>,
}

impl OrganizedNatives {
    pub fn is_empty(&self) -> bool {
        self.client.is_empty() && self.server.is_empty() && self.shared.is_empty()
    }

    pub fn len(&self) -> usize {
        self.client.len() + self.server.len() + self.shared.len()
    }

    /// Iterates every bucket in client, server, shared order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<NativeDescriptor>> {
        self.client.iter().chain(self.server.iter()).chain(self.shared.iter())
    }

    pub fn find(&self, name: &str) -> Option<&Arc<NativeDescriptor>> {
        self.iter().find(|native| native.name == name)
    }
}
