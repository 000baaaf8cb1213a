use std::path::PathBuf;

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

use crate::natives::ScriptLanguage;

/// Mutable part of an open document.
#[derive(Debug)]
pub struct LspDocumentState {
    pub text: Rope,
    pub version: i32,
}

/// An open text document.
#[derive(Debug)]
pub struct LspDocument {
    pub uri: Url,
    /// Local path, when the URI is a `file://` URI.
    pub path: Option<PathBuf>,
    /// Language id as sent by the client; also used as the markdown fence tag.
    pub language_id: String,
    pub language: Option<ScriptLanguage>,
    pub state: RwLock<LspDocumentState>,
}

/// Chars in `line`, excluding its terminator.
fn line_content_len(text: &Rope, line: usize) -> usize {
    let slice = text.line(line);
    let mut len = slice.len_chars();
    while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
        len -= 1;
    }
    len
}

/// Converts an LSP position (UTF-16 code units) to a char index in the rope,
/// clamped to the end of the addressed line.
fn position_to_char(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }

    let line_start = text.line_to_char(line);
    let line_end = line_start + line_content_len(text, line);
    let start_cu = text.char_to_utf16_cu(line_start);
    let end_cu = text.char_to_utf16_cu(line_end);
    let target_cu = (start_cu + position.character as usize).min(end_cu);
    text.utf16_cu_to_char(target_cu)
}

impl LspDocumentState {
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            text: Rope::from_str(text),
            version,
        }
    }

    /// Applies content changes in order. Fails without touching the text if
    /// `version` is not newer than the current one.
    pub fn apply(&mut self, changes: &[TextDocumentContentChangeEvent], version: i32) -> Result<(), String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = position_to_char(&range.start, &self.text);
                    let end = position_to_char(&range.end, &self.text).max(start);
                    self.text.remove(start..end);
                    self.text.insert(start, &change.text);
                }
                None => self.text = Rope::from_str(&change.text),
            }
        }
        self.version = version;
        Ok(())
    }

    /// Text of `position.line` up to the cursor.
    pub fn line_prefix(&self, position: &Position) -> String {
        let line = position.line as usize;
        if line >= self.text.len_lines() {
            return String::new();
        }
        let start = self.text.line_to_char(line);
        let cursor = position_to_char(position, &self.text);
        self.text.slice(start..cursor).to_string()
    }

    /// Whole line `line` without its terminator.
    pub fn line(&self, line: usize) -> String {
        if line >= self.text.len_lines() {
            return String::new();
        }
        self.text
            .line(line)
            .to_string()
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }

    /// Everything from the start of the document to the cursor.
    pub fn text_before(&self, position: &Position) -> String {
        let cursor = position_to_char(position, &self.text);
        self.text.slice(..cursor).to_string()
    }
}

impl LspDocument {
    pub fn new(uri: Url, language_id: impl Into<String>, text: &str, version: i32) -> Self {
        let language_id = language_id.into();
        Self {
            path: uri.to_file_path().ok(),
            language: ScriptLanguage::from_language_id(&language_id),
            language_id,
            uri,
            state: RwLock::new(LspDocumentState::new(text, version)),
        }
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document; `false` when the version was stale.
    pub async fn apply(&self, changes: &[TextDocumentContentChangeEvent], version: i32) -> bool {
        self.state.write().await.apply(changes, version).is_ok()
    }
}
