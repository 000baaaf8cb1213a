//! Native hover
//!
//! The word under the cursor (`[A-Za-z0-9_]+`) is looked up by exact name
//! across the games of the hovered file; a hit renders the native's markdown
//! documentation over the word's range.

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};

use super::markdown::native_markdown;
use crate::natives::{NativeDescriptor, ScriptLanguage};

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").unwrap_or_else(|e| panic!("invalid word regex: {}", e)));

/// A word on a line, with UTF-16 column bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAt {
    pub word: String,
    pub start: u32,
    pub end: u32,
}

impl WordAt {
    pub fn range(&self, line: u32) -> Range {
        Range {
            start: Position { line, character: self.start },
            end: Position { line, character: self.end },
        }
    }
}

fn utf16_column(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].encode_utf16().count() as u32
}

/// The word touching UTF-16 column `character`, if any.
///
/// A cursor directly after the last character of a word still counts as on it.
pub fn word_at(line: &str, character: u32) -> Option<WordAt> {
    WORD.find_iter(line).find_map(|m| {
        let start = utf16_column(line, m.start());
        let end = utf16_column(line, m.end());
        (start <= character && character <= end).then(|| WordAt {
            word: m.as_str().to_string(),
            start,
            end,
        })
    })
}

/// Hover card for `native`, anchored on `range`.
pub fn native_hover(
    native: &NativeDescriptor,
    language: Option<ScriptLanguage>,
    fence: &str,
    range: Range,
) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: native_markdown(native, language, fence),
        }),
        range: Some(range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_at_cursor() {
        let line = "local ped = PLAYER_PED_ID()";
        let word = word_at(line, 14).unwrap();
        assert_eq!(word.word, "PLAYER_PED_ID");
        assert_eq!((word.start, word.end), (12, 25));

        // touching the end of a word
        assert_eq!(word_at(line, 25).unwrap().word, "PLAYER_PED_ID");
        // on the `=` between spaces
        assert_eq!(word_at(line, 10), None);
    }

    #[test]
    fn test_word_at_includes_digits_and_lowercase() {
        assert_eq!(word_at("x = GetHashKey2(a)", 6).unwrap().word, "GetHashKey2");
        assert_eq!(word_at("", 0), None);
    }

    #[test]
    fn test_word_at_uses_utf16_columns() {
        // the emoji occupies columns 1 and 2
        let word = word_at("\"😀\" WAIT", 6).unwrap();
        assert_eq!(word.word, "WAIT");
        assert_eq!((word.start, word.end), (5, 9));
    }

    #[test]
    fn test_native_hover_is_markdown() {
        let native = NativeDescriptor::new("WAIT", vec![], "void");
        let range = WordAt { word: "WAIT".to_string(), start: 0, end: 4 }.range(3);
        let hover = native_hover(&native, Some(ScriptLanguage::Lua), "lua", range);

        let HoverContents::Markup(content) = hover.contents else {
            panic!("expected markup hover");
        };
        assert_eq!(content.kind, MarkupKind::Markdown);
        assert!(content.value.starts_with("```lua\nfunction WAIT() -> void\n```"));
        assert_eq!(hover.range, Some(range));
    }
}
