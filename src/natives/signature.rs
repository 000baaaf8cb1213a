//! Language-idiomatic native signatures
//!
//! Composes [`map_type`] output into the per-language templates:
//!
//! ```text
//! C#          void SET_ENTITY_COORDS(int entity, float x)
//! Lua         function SET_ENTITY_COORDS(entity: integer, x: number) -> void
//! JS / TS     function SET_ENTITY_COORDS(entity: number, x: number): void
//! (unknown)   SET_ENTITY_COORDS(entity: Entity, x: float)
//! ```
//!
//! Rendering never fails; an empty name or parameter list still yields a
//! syntactically shaped string.

use super::language::ScriptLanguage;
use super::model::{NativeDescriptor, Parameter, VOID};
use super::type_mapper::{TypePosition, base_type, map_type};

fn param_type(param: &Parameter, language: ScriptLanguage) -> String {
    map_type(&param.type_name, language, TypePosition::Param)
}

fn format_param(param: &Parameter, language: ScriptLanguage) -> String {
    let ty = param_type(param, language);
    match language {
        ScriptLanguage::CSharp => format!("{} {}", ty, param.name),
        _ => format!("{}: {}", param.name, ty),
    }
}

fn format_params(native: &NativeDescriptor, language: ScriptLanguage) -> String {
    native
        .params
        .iter()
        .map(|param| format_param(param, language))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mapped return type, `void` when the native returns nothing.
fn return_type(native: &NativeDescriptor, language: ScriptLanguage) -> String {
    if native.returns_void() {
        VOID.to_string()
    } else {
        map_type(&native.return_type, language, TypePosition::Return)
    }
}

/// Full signature used in hover and completion documentation.
pub fn render(native: &NativeDescriptor, language: ScriptLanguage) -> String {
    let params = format_params(native, language);
    let returns = return_type(native, language);

    match language {
        ScriptLanguage::Lua => format!("function {}({}) -> {}", native.name, params, returns),
        ScriptLanguage::JavaScript | ScriptLanguage::TypeScript => {
            format!("function {}({}): {}", native.name, params, returns)
        }
        ScriptLanguage::CSharp => format!("{} {}({})", returns, native.name, params),
    }
}

/// Terse form used for listings: Lua shows parameter names only, JS drops `function`.
pub fn render_compact(native: &NativeDescriptor, language: ScriptLanguage) -> String {
    let returns = return_type(native, language);

    match language {
        ScriptLanguage::Lua => {
            let names = native
                .params
                .iter()
                .map(|param| param.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("function {}({}) -> {}", native.name, names, returns)
        }
        ScriptLanguage::JavaScript | ScriptLanguage::TypeScript => {
            format!("{}({}): {}", native.name, format_params(native, language), returns)
        }
        ScriptLanguage::CSharp => render(native, language),
    }
}

/// Signature for documents in a language without a type table.
pub fn render_plain(native: &NativeDescriptor) -> String {
    let params = native
        .params
        .iter()
        .map(|param| format!("{}: {}", param.name, base_type(&param.type_name)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", native.name, params)
}

/// Dispatch on an optional language resolved at the LSP boundary.
pub fn render_for(native: &NativeDescriptor, language: Option<ScriptLanguage>) -> String {
    match language {
        Some(language) => render(native, language),
        None => render_plain(native),
    }
}

/// A signature-help label and the UTF-16 offsets of each parameter within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureLabel {
    pub label: String,
    pub parameters: Vec<[u32; 2]>,
}

fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// `NAME(name: type, ...) -> ret` for every language, with parameter offsets.
pub fn signature_help_label(
    native: &NativeDescriptor,
    language: Option<ScriptLanguage>,
) -> SignatureLabel {
    let mut label = format!("{}(", native.name);
    let mut parameters = Vec::with_capacity(native.params.len());

    for (index, param) in native.params.iter().enumerate() {
        if index > 0 {
            label.push_str(", ");
        }
        let ty = match language {
            Some(language) => param_type(param, language),
            None => base_type(&param.type_name).to_string(),
        };
        let start = utf16_len(&label);
        label.push_str(&format!("{}: {}", param.name, ty));
        parameters.push([start, utf16_len(&label)]);
    }

    let returns = match language {
        Some(language) => return_type(native, language),
        None if native.returns_void() => VOID.to_string(),
        None => base_type(&native.return_type).to_string(),
    };
    label.push_str(&format!(") -> {}", returns));

    SignatureLabel { label, parameters }
}

fn escape_snippet(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Insert snippet with one tab stop per parameter: `NAME(${1:a}, ${2:b})`.
pub fn snippet(native: &NativeDescriptor, language: Option<ScriptLanguage>) -> String {
    let stops = native
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let placeholder = match language {
                Some(ScriptLanguage::CSharp) => {
                    format!("{} {}", param_type(param, ScriptLanguage::CSharp), param.name)
                }
                _ => param.name.clone(),
            };
            format!("${{{}:{}}}", index + 1, escape_snippet(&placeholder))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", native.name, stops)
}
