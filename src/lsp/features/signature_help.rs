//! Signature help for native calls
//!
//! Triggered on `(`, `,` and space. The innermost unclosed `NAME(args` before
//! the cursor names the native; the active parameter is the number of commas
//! in `args`.

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{
    Documentation, MarkupContent, MarkupKind, ParameterInformation, ParameterLabel, SignatureHelp,
    SignatureInformation,
};

use super::markdown::format_description;
use crate::natives::signature::signature_help_label;
use crate::natives::{NativeDescriptor, ScriptLanguage};

static OPEN_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z_][A-Z0-9_]*)\s*\(([^()]*)$").unwrap_or_else(|e| panic!("invalid call regex: {}", e))
});

/// The native call the cursor is inside of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub name: String,
    pub active_parameter: u32,
}

/// Parse the text between line start and cursor.
pub fn call_context(line_prefix: &str) -> Option<CallContext> {
    let captures = OPEN_CALL.captures(line_prefix)?;
    let name = captures.get(1)?.as_str().to_string();
    let args = captures.get(2).map_or("", |m| m.as_str());
    Some(CallContext {
        name,
        active_parameter: args.matches(',').count() as u32,
    })
}

/// Single-signature help for `native`.
pub fn native_signature_help(
    native: &NativeDescriptor,
    language: Option<ScriptLanguage>,
    active_parameter: u32,
) -> SignatureHelp {
    let label = signature_help_label(native, language);

    let parameters = native
        .params
        .iter()
        .zip(label.parameters)
        .map(|(param, offsets)| ParameterInformation {
            label: ParameterLabel::LabelOffsets(offsets),
            documentation: param.description.clone().map(Documentation::String),
        })
        .collect();

    let description = format_description(&native.description);
    let documentation = (!description.is_empty()).then(|| {
        Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: description,
        })
    });

    SignatureHelp {
        signatures: vec![SignatureInformation {
            label: label.label,
            documentation,
            parameters: Some(parameters),
            active_parameter: Some(active_parameter),
        }],
        active_signature: Some(0),
        active_parameter: Some(active_parameter),
    }
}
