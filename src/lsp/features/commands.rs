//! `workspace/executeCommand` commands

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tower_lsp::lsp_types::Url;

use crate::natives::signature::{render_compact, render_plain};
use crate::natives::{Apiset, NativeDescriptor, ScriptLanguage};

/// Lists the natives visible to a document.
pub const LIST_NATIVES: &str = "cfxNatives.listNatives";
/// Flips the `insertParentheses` setting.
pub const TOGGLE_INSERT_PARENTHESES: &str = "cfxNatives.toggleInsertParentheses";

pub fn all_commands() -> Vec<String> {
    vec![LIST_NATIVES.to_string(), TOGGLE_INSERT_PARENTHESES.to_string()]
}

/// One row of the natives listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeListing {
    pub name: String,
    pub namespace: String,
    pub apiset: Apiset,
    pub signature: String,
}

/// Document URI from the first argument, given either as a string or as `{ "uri": ... }`.
pub fn uri_argument(arguments: &[Value]) -> Option<Url> {
    let first = arguments.first()?;
    let raw = first
        .as_str()
        .or_else(|| first.get("uri").and_then(Value::as_str))?;
    Url::parse(raw).ok()
}

/// Listing rows sorted by namespace, then name.
pub fn native_listing(
    natives: &[Arc<NativeDescriptor>],
    language: Option<ScriptLanguage>,
) -> Vec<NativeListing> {
    let mut rows: Vec<NativeListing> = natives
        .iter()
        .map(|native| NativeListing {
            name: native.name.clone(),
            namespace: native.namespace.clone(),
            apiset: native.apiset,
            signature: match language {
                Some(language) => render_compact(native, language),
                None => render_plain(native),
            },
        })
        .collect();

    rows.sort_by(|a, b| a.namespace.cmp(&b.namespace).then_with(|| a.name.cmp(&b.name)));
    rows
}
