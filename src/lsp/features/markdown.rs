//! Markdown documentation shared by hover and completion
//!
//! Layout:
//!
//! ```text
//! <signature code block>
//! `namespace` | `apiset` | `RPC` | `game_support`
//! [Documentation](docs_url)
//! <description, fenced blocks preserved>
//! Examples:
//! <first example for the document's language family>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::natives::signature::render_for;
use crate::natives::{NativeDescriptor, ScriptLanguage};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:(\w+)\n)?([\s\S]*?)```").unwrap_or_else(|e| panic!("invalid fence regex: {}", e))
});

/// Wrap `code` in a fence longer than any backtick run it contains.
pub fn code_block(code: &str, lang: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat((longest + 1).max(3));
    format!("{}{}\n{}\n{}", fence, lang, code, fence)
}

/// Description text with its fenced blocks re-emitted as standalone code blocks.
/// Inline code spans stay inline.
pub fn format_description(description: &str) -> String {
    let mut parts = Vec::new();
    let mut last = 0;

    for captures in FENCED_BLOCK.captures_iter(description) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let before = description[last..whole.start()].trim();
        if !before.is_empty() {
            parts.push(before.to_string());
        }
        let lang = captures.get(1).map_or("", |m| m.as_str());
        let code = captures.get(2).map_or("", |m| m.as_str()).trim();
        parts.push(code_block(code, lang));
        last = whole.end();
    }

    let rest = description[last..].trim();
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts.join("\n\n")
}

/// `` `namespace` | `apiset` | `RPC` | `game_support` ``, skipping empty fields.
fn meta_line(native: &NativeDescriptor) -> String {
    let mut fields = Vec::new();
    if !native.namespace.is_empty() {
        fields.push(format!("`{}`", native.namespace));
    }
    fields.push(format!("`{}`", native.apiset.as_str()));
    if native.is_rpc() {
        fields.push("`RPC`".to_string());
    }
    if !native.game_support.is_empty() {
        fields.push(format!("`{}`", native.game_support));
    }
    fields.join(" | ")
}

/// Full markdown documentation of `native` for a document in `language`.
///
/// # Arguments
/// * `native` - The native to document
/// * `language` - Resolved document language, `None` for the plain rendering
/// * `fence` - Code fence tag, normally the document's language id
pub fn native_markdown(native: &NativeDescriptor, language: Option<ScriptLanguage>, fence: &str) -> String {
    let mut sections = vec![code_block(&render_for(native, language), fence), meta_line(native)];

    if !native.docs_url.is_empty() {
        sections.push(format!("[Documentation]({})", native.docs_url));
    }

    let description = format_description(&native.description);
    if !description.is_empty() {
        sections.push(description);
    }

    let example = language.and_then(|language| {
        native
            .examples
            .iter()
            .find(|example| language.accepts_example(&example.lang))
    });
    if let Some(example) = example {
        sections.push("Examples:".to_string());
        sections.push(code_block(example.code.trim(), fence));
    }

    sections.join("\n\n")
}
