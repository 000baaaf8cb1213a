//! Native type token translation
//!
//! Native descriptors carry C-style type tokens (`int`, `float`, `Entity`,
//! `Vector3`, `char*`, ...). Each target language has its own table per
//! position, because return values are described differently from arguments
//! (C# returns `Entity` handles but takes plain `int`s).
//!
//! Lookup strips one trailing pointer marker and looks up the base type. Tokens
//! missing from a table pass through unchanged. Pointers render exactly like
//! their base type in every language.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::language::ScriptLanguage;

/// Where a type token appears in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypePosition {
    Param,
    Return,
}

/// JavaScript and TypeScript share one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TableFamily {
    Lua,
    Js,
    CSharp,
}

impl From<ScriptLanguage> for TableFamily {
    fn from(language: ScriptLanguage) -> Self {
        match language {
            ScriptLanguage::Lua => TableFamily::Lua,
            ScriptLanguage::JavaScript | ScriptLanguage::TypeScript => TableFamily::Js,
            ScriptLanguage::CSharp => TableFamily::CSharp,
        }
    }
}

const LUA_PARAM: &[(&str, &str)] = &[
    ("int", "integer"),
    ("float", "number"),
    ("bool", "boolean"),
    ("char*", "string"),
    ("char", "string"),
    ("Vehicle", "integer"),
    ("Entity", "integer"),
    ("Ped", "integer"),
    ("Vector3", "vector3"),
    ("Vector4", "vector4"),
    ("Vector2", "vector2"),
    ("Object", "integer"),
    ("Hash", "integer"),
    ("BOOL", "boolean"),
    ("Cam", "integer"),
    ("Camera", "integer"),
];

const LUA_RETURN: &[(&str, &str)] = &[
    ("int", "integer"),
    ("float", "number"),
    ("bool", "boolean"),
    ("char*", "string"),
    ("char", "string"),
    ("Vector3", "vector3"),
    ("Vector4", "vector4"),
    ("Vector2", "vector2"),
    ("Vehicle", "integer"),
    ("Entity", "integer"),
    ("Ped", "integer"),
    ("void", "void"),
    ("Cam", "integer"),
    ("Camera", "integer"),
];

const JS_PARAM: &[(&str, &str)] = &[
    ("int", "number"),
    ("float", "number"),
    ("bool", "boolean"),
    ("char*", "string"),
    ("char", "string"),
    ("Vehicle", "number"),
    ("Entity", "number"),
    ("Ped", "number"),
    ("Vector3", "[number, number, number]"),
    ("Vector4", "[number, number, number, number]"),
    ("Vector2", "[number, number]"),
    ("Object", "number"),
    ("Hash", "number"),
    ("BOOL", "boolean"),
    ("Cam", "number"),
    ("Camera", "number"),
];

const JS_RETURN: &[(&str, &str)] = &[
    ("int", "number"),
    ("float", "number"),
    ("bool", "boolean"),
    ("char*", "string"),
    ("char", "string"),
    ("Vector3", "[number, number, number]"),
    ("Vector4", "[number, number, number, number]"),
    ("Vector2", "[number, number]"),
    ("Vehicle", "number"),
    ("Entity", "number"),
    ("Ped", "number"),
    ("void", "void"),
    ("Cam", "number"),
    ("Camera", "number"),
];

const CSHARP_PARAM: &[(&str, &str)] = &[
    ("int", "int"),
    ("float", "float"),
    ("bool", "bool"),
    ("char*", "string"),
    ("char", "string"),
    ("Vehicle", "int"),
    ("Entity", "int"),
    ("Ped", "int"),
    ("Vector3", "Vector3"),
    ("Vector4", "Vector4"),
    ("Vector2", "Vector2"),
    ("Object", "Object"),
    ("Hash", "uint"),
    ("BOOL", "bool"),
    ("Cam", "int"),
    ("Camera", "int"),
];

const CSHARP_RETURN: &[(&str, &str)] = &[
    ("int", "int"),
    ("float", "float"),
    ("bool", "bool"),
    ("char*", "string"),
    ("char", "string"),
    ("Vector3", "Vector3"),
    ("Vector4", "Vector4"),
    ("Vector2", "Vector2"),
    ("Vehicle", "Vehicle"),
    ("Entity", "Entity"),
    ("Ped", "Ped"),
    ("void", "void"),
    ("Cam", "int"),
    ("Camera", "int"),
];

type Table = HashMap<&'static str, &'static str>;

static TYPE_TABLES: Lazy<HashMap<(TableFamily, TypePosition), Table>> = Lazy::new(|| {
    let entries: [((TableFamily, TypePosition), &[(&str, &str)]); 6] = [
        ((TableFamily::Lua, TypePosition::Param), LUA_PARAM),
        ((TableFamily::Lua, TypePosition::Return), LUA_RETURN),
        ((TableFamily::Js, TypePosition::Param), JS_PARAM),
        ((TableFamily::Js, TypePosition::Return), JS_RETURN),
        ((TableFamily::CSharp, TypePosition::Param), CSHARP_PARAM),
        ((TableFamily::CSharp, TypePosition::Return), CSHARP_RETURN),
    ];

    entries
        .into_iter()
        .map(|(key, pairs)| (key, pairs.iter().copied().collect()))
        .collect()
});

/// Strip surrounding whitespace and one trailing pointer marker.
pub fn base_type(token: &str) -> &str {
    let token = token.trim();
    token.strip_suffix('*').map(str::trim_end).unwrap_or(token)
}

/// Translate a native type token for `language` at `position`.
pub fn map_type(token: &str, language: ScriptLanguage, position: TypePosition) -> String {
    let base = base_type(token);
    TYPE_TABLES
        .get(&(TableFamily::from(language), position))
        .and_then(|table| table.get(base))
        .map(|mapped| (*mapped).to_string())
        .unwrap_or_else(|| base.to_string())
}
