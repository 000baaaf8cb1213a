//! Target scripting languages
//!
//! Language ids arrive as free-form strings (LSP `languageId`, example `lang`
//! tags). They are resolved once at the boundary into [`ScriptLanguage`];
//! anything unrecognized stays `None` and callers use the plain rendering.

use std::fmt;

/// Languages natives can be rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    Lua,
    JavaScript,
    TypeScript,
    CSharp,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 4] = [
        ScriptLanguage::Lua,
        ScriptLanguage::JavaScript,
        ScriptLanguage::TypeScript,
        ScriptLanguage::CSharp,
    ];

    /// Resolve an LSP language id or file-extension style tag.
    pub fn from_language_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "lua" => Some(ScriptLanguage::Lua),
            "javascript" | "js" => Some(ScriptLanguage::JavaScript),
            "typescript" | "ts" => Some(ScriptLanguage::TypeScript),
            "csharp" | "cs" => Some(ScriptLanguage::CSharp),
            _ => None,
        }
    }

    /// The LSP language id, also used as the markdown code fence tag.
    pub fn language_id(&self) -> &'static str {
        match self {
            ScriptLanguage::Lua => "lua",
            ScriptLanguage::JavaScript => "javascript",
            ScriptLanguage::TypeScript => "typescript",
            ScriptLanguage::CSharp => "csharp",
        }
    }

    /// JavaScript and TypeScript share examples and type tables.
    pub fn is_js_family(&self) -> bool {
        matches!(self, ScriptLanguage::JavaScript | ScriptLanguage::TypeScript)
    }

    /// Whether an example tagged `tag` can be shown in a document of this language.
    pub fn accepts_example(&self, tag: &str) -> bool {
        match ScriptLanguage::from_language_id(tag) {
            Some(other) => other == *self || (self.is_js_family() && other.is_js_family()),
            None => false,
        }
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language_id())
    }
}
