//! Identifier derivation shared by every compiler.
//!
//! All three artifacts name things through this module, so a definition,
//! field or operation gets the same identifier in the DTO, server and
//! client files.
//!
//! ## Rules
//!
//! - Words split on non-alphanumerics and CamelCase boundaries
//!   ("userID" -> ["user", "ID"], "HTTPServer" -> ["HTTP", "Server"])
//! - Leading digits get an underscore prefix ("2fa" -> "_2fa")
//! - Rust keywords become raw identifiers (`type` -> `r#type`); the few that
//!   cannot be raw get a trailing underscore (`self` -> `self_`)

use apiforge_define::{ApiModel, BuildConfig, PathMethodModel};
use proc_macro2::{Ident, Span};

use crate::parser::extract_path_params;

/// Keywords that need `r#` in identifier position (2024 edition).
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "false", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NON_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Local names used inside generated handlers and client methods.
///
/// Parameters whose snake-case name lands on one of these are bound with a
/// `_param` suffix instead.
pub const RESERVED_BINDINGS: &[&str] = &[
    "server",
    "path_params",
    "query_params",
    "headers",
    "body_bytes",
    "body_object",
    "form_fields",
    "body",
    "response",
    "request",
    "url",
    "query",
    "form",
    "payload",
    "raw",
    "callback",
    "client",
    "value",
];

/// Splits a name into words on separators and CamelCase boundaries.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::naming::split_words;
///
/// assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
/// assert_eq!(split_words("get-user_byID"), vec!["get", "user", "by", "ID"]);
/// assert_eq!(split_words("pet store"), vec!["pet", "store"]);
/// ```
pub fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for chunk in s.split(|c: char| !c.is_alphanumeric()) {
        if chunk.is_empty() {
            continue;
        }
        let chars: Vec<(usize, char)> = chunk.char_indices().collect();
        let mut word_start = 0;
        for i in 1..chars.len() {
            let (idx, current) = chars[i];
            let prev = chars[i - 1].1;

            // "ollamaNext" -> "ollama", "Next"; "HTTPClient" -> "HTTP", "Client"
            let is_new_word = current.is_uppercase()
                && (prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].1.is_lowercase() && prev.is_uppercase()));

            if is_new_word {
                words.push(&chunk[word_start..idx]);
                word_start = idx;
            }
        }
        words.push(&chunk[word_start..]);
    }
    words
}

/// Converts a name to snake_case.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("getUserById"), "get_user_by_id");
/// assert_eq!(to_snake_case("Pet Store"), "pet_store");
/// assert_eq!(to_snake_case("2fa"), "_2fa");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let joined = split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    guard_leading_digit(joined)
}

/// Converts a name to PascalCase.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("pet_store"), "PetStore");
/// assert_eq!(to_pascal_case("User"), "User");
/// assert_eq!(to_pascal_case("HTTPServer"), "HttpServer");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    let joined: String = split_words(s)
        .iter()
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    guard_leading_digit(joined)
}

fn guard_leading_digit(s: String) -> String {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{s}")
    } else {
        s
    }
}

/// Builds an identifier, escaping keywords.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::naming::ident;
///
/// assert_eq!(ident("name").to_string(), "name");
/// assert_eq!(ident("type").to_string(), "r#type");
/// assert_eq!(ident("self").to_string(), "self_");
/// ```
pub fn ident(name: &str) -> Ident {
    let name = if name.is_empty() { "_unnamed" } else { name };
    if NON_RAW.contains(&name) {
        Ident::new(&format!("{name}_"), Span::call_site())
    } else if KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

/// Field identifier for a property wire name.
pub fn field_ident(property: &str) -> Ident {
    ident(&to_snake_case(property))
}

/// Type identifier for a definition name.
pub fn type_ident(definition: &str) -> Ident {
    ident(&to_pascal_case(definition))
}

/// Snake-case binding name for a parameter, avoiding generated locals.
pub fn binding_name(parameter: &str) -> String {
    let snake = to_snake_case(parameter);
    if RESERVED_BINDINGS.contains(&snake.as_str()) {
        format!("{snake}_param")
    } else {
        snake
    }
}

/// Binding identifier for a parameter.
pub fn binding_ident(parameter: &str) -> Ident {
    ident(&binding_name(parameter))
}

/// Method name for an operation.
///
/// Uses `operation_id` when present; otherwise the lowercased verb followed
/// by the path segments, with placeholders rendered as `by_{name}`.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{HttpMethod, PathMethodModel};
/// use apiforge_gen::naming::operation_name;
///
/// let op = PathMethodModel::new(HttpMethod::Get, "/users/{id}/posts");
/// assert_eq!(operation_name(&op), "get_users_by_id_posts");
///
/// let op = PathMethodModel::new(HttpMethod::Post, "/users").with_operation_id("createUser");
/// assert_eq!(operation_name(&op), "create_user");
/// ```
pub fn operation_name(op: &PathMethodModel) -> String {
    if let Some(id) = op.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return to_snake_case(id);
    }

    let params = extract_path_params(&op.path);
    let mut parts = vec![op.method.to_string().to_lowercase()];
    for segment in op.path.split('/').filter(|s| !s.is_empty()) {
        let placeholder = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .filter(|name| params.contains(name));
        match placeholder {
            Some(name) => parts.push(format!("by_{}", to_snake_case(name))),
            None => parts.push(to_snake_case(segment)),
        }
    }
    if parts.len() == 1 {
        parts.push("root".to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts.join("_")
}

/// Method identifier for an operation.
pub fn operation_ident(op: &PathMethodModel) -> Ident {
    ident(&operation_name(op))
}

/// Route registration function name for a tag (`register_{tag}`).
pub fn register_fn_name(tag: &str) -> String {
    format!("register_{}", to_snake_case(tag))
}

/// Registration function for operations that carry no tag.
pub const DEFAULT_REGISTER_FN: &str = "register_default";

fn title_base(model: &ApiModel) -> String {
    let base = to_pascal_case(&model.info.title);
    if base.is_empty() { "Api".to_string() } else { base }
}

/// Server type name: the configured override or `{Title}Server`.
pub fn server_name(model: &ApiModel, config: &BuildConfig) -> String {
    config
        .server_name
        .clone()
        .unwrap_or_else(|| format!("{}Server", title_base(model)))
}

/// Client type name: the configured override or `{Title}Client`.
pub fn client_name(model: &ApiModel, config: &BuildConfig) -> String {
    config
        .client_name
        .clone()
        .unwrap_or_else(|| format!("{}Client", title_base(model)))
}

/// Parses a configured module path (`crate::dto`) into a path.
pub fn module_path(path: &str) -> syn::Path {
    let segments = path.split("::").map(|segment| match segment {
        "crate" | "self" | "super" => Ident::new(segment, Span::call_site()),
        other => ident(other),
    });
    syn::Path {
        leading_colon: None,
        segments: segments.map(syn::PathSegment::from).collect(),
    }
}
