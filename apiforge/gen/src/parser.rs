//! Path template handling.
//!
//! Extracts parameter names from URL path templates that use `{param}` syntax
//! and rewrites templates into the forms the server and client artifacts need.

/// Extracts parameter names from a path template.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::parser::extract_path_params;
///
/// assert_eq!(extract_path_params("/models"), vec![] as Vec<&str>);
/// assert_eq!(extract_path_params("/models/{model}"), vec!["model"]);
/// assert_eq!(
///     extract_path_params("/threads/{thread_id}/messages/{message_id}"),
///     vec!["thread_id", "message_id"]
/// );
/// ```
pub fn extract_path_params(path: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut pos = 0;

    for (idx, c) in path.char_indices() {
        if c == '{' {
            pos = idx + 1; // Start after '{'
        } else if c == '}' && pos > 0 {
            let param = &path[pos..idx];
            if !param.is_empty() {
                params.push(param);
            }
            pos = 0;
        }
    }

    params
}

/// Substitutes path parameters with their values.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::parser::substitute_path_params;
///
/// let path = substitute_path_params(
///     "/models/{model}",
///     &[("model", "gpt-4")]
/// );
/// assert_eq!(path, "/models/gpt-4");
/// ```
pub fn substitute_path_params(path: &str, params: &[(&str, &str)]) -> String {
    let mut result = path.to_string();
    for (name, value) in params {
        let placeholder = format!("{{{}}}", name);
        result = result.replace(&placeholder, value);
    }
    result
}

/// Rewrites a template into axum 0.7 route syntax (`{id}` -> `:id`).
///
/// ## Examples
///
/// ```
/// use apiforge_gen::parser::to_axum_path;
///
/// assert_eq!(to_axum_path("/users/{id}/posts/{post_id}"), "/users/:id/posts/:post_id");
/// assert_eq!(to_axum_path("/health"), "/health");
/// ```
pub fn to_axum_path(path: &str) -> String {
    let params = extract_path_params(path);
    let captures: Vec<String> = params.iter().map(|name| format!(":{name}")).collect();
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .zip(&captures)
        .map(|(name, capture)| (*name, capture.as_str()))
        .collect();
    substitute_path_params(path, &pairs)
}

/// The route a template matches, with placeholder names erased.
///
/// The router keys captures by position, so two templates with the same
/// shape but different placeholder names cannot both be mounted.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::parser::route_shape;
///
/// assert_eq!(route_shape("/users/{id}"), route_shape("/users/{name}"));
/// assert_eq!(route_shape("/users/{id}/posts"), "/users/:_/posts");
/// ```
pub fn route_shape(path: &str) -> String {
    let params = extract_path_params(path);
    let pairs: Vec<(&str, &str)> = params.iter().map(|name| (*name, ":_")).collect();
    substitute_path_params(path, &pairs)
}

/// Rewrites a template into a `format!` string with one `{}` per placeholder,
/// prefixed by a `{}` for the endpoint.
///
/// Returns the format string and the placeholder names in order.
///
/// ## Examples
///
/// ```
/// use apiforge_gen::parser::to_format_template;
///
/// let (template, params) = to_format_template("/users/{id}");
/// assert_eq!(template, "{}/users/{}");
/// assert_eq!(params, vec!["id"]);
/// ```
pub fn to_format_template(path: &str) -> (String, Vec<&str>) {
    let params = extract_path_params(path);
    let pairs: Vec<(&str, &str)> = params.iter().map(|name| (*name, "{}")).collect();
    (format!("{{}}{}", substitute_path_params(path, &pairs)), params)
}
