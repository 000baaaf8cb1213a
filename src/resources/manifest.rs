//! Resource manifest parsing
//!
//! Manifests (`fxmanifest.lua`, legacy `__resource.lua`) are Lua files, but
//! only a handful of directive forms matter here, so they are recognized with
//! regular expressions rather than a Lua parser:
//!
//! ```lua
//! client_script 'client/main.lua'        -- single form
//! client_scripts { 'a.lua', "b/*.lua" }  -- block form
//! server_scripts({ 'server/*.lua' })     -- call syntax
//! game 'gta5'
//! games { 'gta5', 'rdr3' }
//! ```
//!
//! Directives are only recognized at the start of a statement (line start or
//! after `;`), and comments are stripped first, so commented-out entries and
//! prose inside `description '...'` never leak into the script lists.
//! Parsing never fails: unrecognized text is ignored.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::ScriptType;

/// The game(s) a manifest declares support for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameDeclaration {
    Single(String),
    Multiple(Vec<String>),
}

impl GameDeclaration {
    pub fn games(&self) -> Vec<String> {
        match self {
            GameDeclaration::Single(game) => vec![game.clone()],
            GameDeclaration::Multiple(games) => games.clone(),
        }
    }
}

/// Parsed manifest. Script entries are raw patterns, relative to the manifest directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub path: PathBuf,
    pub client_scripts: Vec<String>,
    pub server_scripts: Vec<String>,
    pub shared_scripts: Vec<String>,
    pub game: Option<GameDeclaration>,
}

impl Manifest {
    /// Directory containing the manifest.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Declared games, empty when the manifest declares none.
    pub fn games(&self) -> Vec<String> {
        self.game.as_ref().map(GameDeclaration::games).unwrap_or_default()
    }

    pub fn patterns(&self, script_type: ScriptType) -> &[String] {
        match script_type {
            ScriptType::Client => &self.client_scripts,
            ScriptType::Server => &self.server_scripts,
            ScriptType::Shared => &self.shared_scripts,
            ScriptType::Unknown => &[],
        }
    }
}

const STATEMENT_START: &str = r"(?m)(?:^|;)[ \t]*";

struct Directive {
    block: Regex,
    single: Regex,
}

impl Directive {
    fn new(keyword: &str) -> Self {
        let block = format!(r"{}{}s?\s*\(?\s*\{{([^}}]*)\}}", STATEMENT_START, keyword);
        let single = format!(r#"{}{}s?\s*\(?\s*['"]([^'"\r\n]+)['"]"#, STATEMENT_START, keyword);
        Self {
            block: Regex::new(&block).unwrap_or_else(|e| panic!("invalid block regex for {}: {}", keyword, e)),
            single: Regex::new(&single).unwrap_or_else(|e| panic!("invalid single regex for {}: {}", keyword, e)),
        }
    }

    /// Block entries first, then single entries, each in source order.
    fn entries(&self, text: &str) -> Vec<String> {
        let mut entries = Vec::new();
        for captures in self.block.captures_iter(text) {
            entries.extend(split_block(&captures[1]));
        }
        for captures in self.single.captures_iter(text) {
            entries.push(captures[1].trim().to_string());
        }
        entries.retain(|entry| !entry.is_empty());
        entries
    }
}

static CLIENT: Lazy<Directive> = Lazy::new(|| Directive::new("client_script"));
static SERVER: Lazy<Directive> = Lazy::new(|| Directive::new("server_script"));
static SHARED: Lazy<Directive> = Lazy::new(|| Directive::new("shared_script"));
static GAMES: Lazy<Directive> = Lazy::new(|| Directive::new("game"));

static GAME_SINGLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"{}game\s*\(?\s*['"]([^'"\r\n]+)['"]"#, STATEMENT_START))
        .unwrap_or_else(|e| panic!("invalid game regex: {}", e))
});

/// Split a `{ ... }` block body on commas and strip one layer of quotes per entry.
fn split_block(body: &str) -> Vec<String> {
    body.split(',')
        .map(|entry| unquote(entry.trim()).trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn unquote(entry: &str) -> &str {
    for quote in ['\'', '"'] {
        if entry.len() >= 2 && entry.starts_with(quote) && entry.ends_with(quote) {
            return &entry[1..entry.len() - 1];
        }
    }
    entry
}

/// Remove Lua comments (`-- line` and `--[[ block ]]`, including `--[==[ ]==]`)
/// while leaving string literals intact. Newlines are preserved so statement
/// anchors keep working.
pub fn strip_lua_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == q || c == '\n' {
                quote = None;
            }
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            quote = Some(c);
            out.push(c);
            i += 1;
            continue;
        }

        if c == '-' && chars.get(i + 1) == Some(&'-') {
            i += 2;
            if let Some(level) = long_bracket_level(&chars, i) {
                i = skip_long_bracket(&chars, i + level + 2, level, &mut out);
            } else {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// `[[` is level 0, `[=[` level 1 and so on.
fn long_bracket_level(chars: &[char], start: usize) -> Option<usize> {
    if chars.get(start) != Some(&'[') {
        return None;
    }
    let mut level = 0;
    while chars.get(start + 1 + level) == Some(&'=') {
        level += 1;
    }
    (chars.get(start + 1 + level) == Some(&'[')).then_some(level)
}

/// Skip to just past the matching `]=*]`, keeping newlines. Returns the new index.
fn skip_long_bracket(chars: &[char], mut i: usize, level: usize, out: &mut String) -> usize {
    while i < chars.len() {
        if chars[i] == ']'
            && (1..=level).all(|offset| chars.get(i + offset) == Some(&'='))
            && chars.get(i + level + 1) == Some(&']')
        {
            return i + level + 2;
        }
        if chars[i] == '\n' {
            out.push('\n');
        }
        i += 1;
    }
    i
}

/// Parse manifest `text` read from `path`.
pub fn parse_manifest_text(path: &Path, text: &str) -> Manifest {
    let text = strip_lua_comments(text);

    let game = GAME_SINGLE
        .captures(&text)
        .map(|captures| GameDeclaration::Single(captures[1].trim().to_string()))
        .or_else(|| {
            let games = GAMES.entries(&text);
            (!games.is_empty()).then_some(GameDeclaration::Multiple(games))
        });

    Manifest {
        path: path.to_path_buf(),
        client_scripts: CLIENT.entries(&text),
        server_scripts: SERVER.entries(&text),
        shared_scripts: SHARED.entries(&text),
        game,
    }
}
