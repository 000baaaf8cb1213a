//! Native completion
//!
//! Candidates come from the catalog, scoped to the script type and games of
//! the completed file. [`ranking`] filters and orders them; this module turns
//! the ranked list into LSP items.
//!
//! Completion is suppressed while the cursor sits inside an unclosed native
//! call anywhere earlier in the document (signature help takes over there).

pub mod ranking;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, Documentation, InsertTextFormat,
    MarkupContent, MarkupKind,
};

use super::markdown::native_markdown;
use crate::natives::signature::{render_for, snippet};
use crate::natives::{NativeDescriptor, ScriptLanguage};

pub use ranking::{MatchMode, ScoredMatch, SearchQuery, match_score, rank};

static INSIDE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z_]+\s*\([^)]*$").unwrap_or_else(|e| panic!("invalid call regex: {}", e)));

/// True when `text_before` (document start to cursor) ends inside an open `NAME(` call.
pub fn is_inside_call(text_before: &str) -> bool {
    INSIDE_CALL.is_match(text_before)
}

/// Everything about the cursor and settings that shapes the items.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    /// Current line up to the cursor.
    pub line_prefix: &'a str,
    /// Document text up to the cursor.
    pub text_before: &'a str,
    pub language: Option<ScriptLanguage>,
    /// Code fence tag for documentation blocks.
    pub fence: &'a str,
    pub insert_parentheses: bool,
    pub max_results: Option<usize>,
}

fn completion_item(
    native: &NativeDescriptor,
    order: usize,
    request: &CompletionRequest<'_>,
) -> CompletionItem {
    let (insert_text, insert_text_format) = if request.insert_parentheses {
        (snippet(native, request.language), InsertTextFormat::SNIPPET)
    } else {
        (native.name.clone(), InsertTextFormat::PLAIN_TEXT)
    };

    let description = if native.namespace.is_empty() {
        native.apiset.as_str().to_string()
    } else {
        format!("{} ({})", native.namespace, native.apiset.as_str())
    };

    CompletionItem {
        label: native.name.clone(),
        label_details: Some(CompletionItemLabelDetails {
            detail: None,
            description: Some(description),
        }),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(render_for(native, request.language)),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: native_markdown(native, request.language, request.fence),
        })),
        // keep the ranked order; clients sort by sort_text
        sort_text: Some(format!("{:05}", order)),
        filter_text: Some(native.name.clone()),
        insert_text: Some(insert_text),
        insert_text_format: Some(insert_text_format),
        ..Default::default()
    }
}

/// Ranked completion items for `request` out of `candidates`.
///
/// Empty when the cursor is inside an open native call.
pub fn completion_items(
    candidates: &[Arc<NativeDescriptor>],
    request: &CompletionRequest<'_>,
) -> Vec<CompletionItem> {
    if is_inside_call(request.text_before) {
        return Vec::new();
    }

    let query = SearchQuery::from_line_prefix(request.line_prefix);
    rank(candidates, &query, request.max_results)
        .iter()
        .enumerate()
        .map(|(index, scored)| completion_item(&scored.native, index, request))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natives::{Apiset, Parameter};

    fn candidates() -> Vec<Arc<NativeDescriptor>> {
        let mut coords = NativeDescriptor::new(
            "SET_ENTITY_COORDS",
            vec![Parameter::new("entity", "Entity"), Parameter::new("x", "float")],
            "void",
        );
        coords.namespace = "ENTITY".to_string();
        coords.apiset = Apiset::Client;
        vec![
            Arc::new(NativeDescriptor::new("GET_ENTITY_COORDS", vec![], "Vector3")),
            Arc::new(coords),
            Arc::new(NativeDescriptor::new("SET_PED_ARMOUR", vec![], "void")),
        ]
    }

    fn request<'a>(line_prefix: &'a str, text_before: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            line_prefix,
            text_before,
            language: Some(ScriptLanguage::Lua),
            fence: "lua",
            insert_parentheses: false,
            max_results: None,
        }
    }

    #[test]
    fn test_is_inside_call() {
        assert!(is_inside_call("SET_ENTITY_COORDS(ped, "));
        assert!(is_inside_call("SET_ENTITY_COORDS(\n    ped,\n    "));
        assert!(!is_inside_call("SET_ENTITY_COORDS(ped, 1.0)\nlocal x = "));
        assert!(!is_inside_call("print(x"));
    }

    #[test]
    fn test_items_are_ranked_plain_text() {
        let items = completion_items(&candidates(), &request("SET_E", "SET_E"));

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.label, "SET_ENTITY_COORDS");
        assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(item.insert_text.as_deref(), Some("SET_ENTITY_COORDS"));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::PLAIN_TEXT));
        assert_eq!(item.sort_text.as_deref(), Some("00000"));
        assert_eq!(
            item.detail.as_deref(),
            Some("function SET_ENTITY_COORDS(entity: integer, x: number) -> void")
        );
        assert_eq!(
            item.label_details.as_ref().and_then(|d| d.description.as_deref()),
            Some("ENTITY (client)")
        );
    }

    #[test]
    fn test_snippet_insert() {
        let mut req = request("SET_ENTITY", "SET_ENTITY");
        req.insert_parentheses = true;
        let items = completion_items(&candidates(), &req);

        assert_eq!(items[0].insert_text.as_deref(), Some("SET_ENTITY_COORDS(${1:entity}, ${2:x})"));
        assert_eq!(items[0].insert_text_format, Some(InsertTextFormat::SNIPPET));
    }

    #[test]
    fn test_sub_word_mode_after_assignment() {
        let items = completion_items(&candidates(), &request("local c = COORDS", "local c = COORDS"));
        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["GET_ENTITY_COORDS", "SET_ENTITY_COORDS"]);
        assert_eq!(items[1].sort_text.as_deref(), Some("00001"));
    }

    #[test]
    fn test_suppressed_inside_call() {
        let text = "SET_ENTITY_COORDS(GET_";
        assert!(completion_items(&candidates(), &request("GET_", text)).is_empty());
    }

    #[test]
    fn test_max_results_cap() {
        let mut req = request("", "");
        req.max_results = Some(2);
        assert_eq!(completion_items(&candidates(), &req).len(), 2);
    }
}
