//! Documentation comments for generated items.
//!
//! Item docs are rendered as plain lines by [`render`], cleaned by
//! [`strip`] and turned into `#[doc]` attributes by [`doc_attrs`].
//! [`ModuleDocBuilder`] produces the `#![doc]` header of each artifact.

use std::collections::BTreeMap;

use apiforge_define::{ApiModel, HttpMethod};
use proc_macro2::TokenStream;
use quote::quote;

use crate::naming::operation_name;

/// Renders an item comment as lines.
///
/// The title has its line breaks removed. The description, parameter list
/// (`` * `name` - description ``) and `Returns:` line follow, each separated
/// by one blank line. The result is passed through [`strip`].
///
/// ## Examples
///
/// ```
/// use apiforge_gen::codegen::docs::render;
///
/// assert_eq!(render("Get User", "", &[], None), vec!["Get User"]);
///
/// let lines = render(
///     "Find pets",
///     "Searches the store.",
///     &[("limit".to_string(), "max results".to_string())],
///     Some("list<Pet>"),
/// );
/// assert_eq!(
///     lines,
///     vec![
///         "Find pets",
///         "",
///         "Searches the store.",
///         "",
///         "* `limit` - max results",
///         "",
///         "Returns: list<Pet>",
///     ]
/// );
/// ```
pub fn render(
    title: &str,
    description: &str,
    params: &[(String, String)],
    returns: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![title.replace(['\r', '\n'], " ").trim().to_string()];
    lines.push(String::new());
    lines.extend(description.lines().map(|l| l.trim_end().to_string()));
    lines.push(String::new());
    for (name, desc) in params {
        lines.push(if desc.trim().is_empty() {
            format!("* `{name}`")
        } else {
            format!("* `{name}` - {}", desc.replace(['\r', '\n'], " ").trim())
        });
    }
    lines.push(String::new());
    if let Some(returns) = returns.filter(|r| !r.trim().is_empty()) {
        lines.push(format!("Returns: {}", returns.trim()));
    }
    strip(lines)
}

/// Drops leading and trailing blank lines and collapses blank runs to one.
///
/// Applying it twice gives the same result as applying it once.
pub fn strip(lines: Vec<String>) -> Vec<String> {
    let blank = |l: &String| l.trim().is_empty();
    let start = lines.iter().position(|l| !blank(l));
    let end = lines.iter().rposition(|l| !blank(l));
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };

    let mut out: Vec<String> = Vec::with_capacity(end - start + 1);
    for line in &lines[start..=end] {
        let previous_blank = out.last().is_some_and(blank);
        if blank(line) {
            if !previous_blank {
                out.push(String::new());
            }
        } else {
            out.push(line.clone());
        }
    }
    out
}

/// Turns doc lines into `#[doc = " ..."]` attributes.
pub fn doc_attrs(lines: &[String]) -> TokenStream {
    let attrs = lines.iter().map(|line| {
        let text = if line.is_empty() {
            String::new()
        } else {
            format!(" {line}")
        };
        quote! { #[doc = #text] }
    });
    quote! { #(#attrs)* }
}

/// Which artifact a module header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Dto,
    Server,
    Client,
    Application,
}

/// Builds the module-level documentation of a generated artifact.
///
/// Sections:
/// - Introduction from the model title and description
/// - Security schemes used by the model (server and client only)
/// - Operations grouped by HTTP method (server and client only)
pub struct ModuleDocBuilder<'a> {
    model: &'a ApiModel,
    kind: ModuleKind,
}

impl<'a> ModuleDocBuilder<'a> {
    pub fn new(model: &'a ApiModel, kind: ModuleKind) -> Self {
        Self { model, kind }
    }

    /// Builds the `#![doc = ...]` attributes.
    pub fn build(&self) -> TokenStream {
        let mut sections = vec![self.intro_paragraph()];
        if matches!(self.kind, ModuleKind::Server | ModuleKind::Client) {
            sections.push(self.security_section());
            sections.push(self.operations_section());
        }
        // One attribute per line keeps the output as `//!` comments.
        let attrs = sections
            .iter()
            .flat_map(|section| section.split('\n'))
            .map(|line| quote! { #![doc = #line] });
        quote! { #(#attrs)* }
    }

    fn intro_paragraph(&self) -> String {
        let title = if self.model.info.title.trim().is_empty() {
            "the API"
        } else {
            self.model.info.title.trim()
        };
        let what = match self.kind {
            ModuleKind::Dto => "Data transfer objects",
            ModuleKind::Server => "Server routes",
            ModuleKind::Client => "Client SDK",
            ModuleKind::Application => "Application router",
        };
        let mut intro = format!(" {what} for {title}");
        if !self.model.info.version.trim().is_empty() {
            intro.push_str(&format!(" (version {})", self.model.info.version.trim()));
        }
        intro.push('.');
        let description = self.model.info.description.trim();
        if !description.is_empty() {
            for line in description.lines() {
                intro.push_str(&format!("\n {}", line.trim_end()));
            }
        }
        intro
    }

    fn security_section(&self) -> String {
        let mut schemes: Vec<&str> = Vec::new();
        for op in self.model.operations() {
            for req in &op.security {
                if !schemes.contains(&req.name.as_str()) {
                    schemes.push(&req.name);
                }
            }
        }
        if schemes.is_empty() {
            return "\n ## Authentication\n\n No operation requires authentication.".to_string();
        }
        let list = schemes
            .iter()
            .map(|s| format!("`{s}`"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("\n ## Authentication\n\n Operations may require: {list}.")
    }

    /// Groups operations by HTTP method.
    fn categorize_operations(&self) -> BTreeMap<HttpMethod, Vec<(String, String)>> {
        let mut categories: BTreeMap<HttpMethod, Vec<(String, String)>> = BTreeMap::new();
        for op in self.model.operations() {
            let label = op.summary.trim().replace(['\r', '\n'], " ");
            categories
                .entry(op.method)
                .or_default()
                .push((operation_name(op), format!("{} {}{}", op.method, op.path, dash(&label))));
        }
        categories
    }

    fn operations_section(&self) -> String {
        let categories = self.categorize_operations();
        if categories.is_empty() {
            return "\n ## Operations\n\n No operations defined.".to_string();
        }

        let mut lines = vec![String::new(), " ## Operations".to_string(), String::new()];
        for (method, ops) in &categories {
            lines.push(format!(" **{method}**:"));
            for (name, desc) in ops {
                lines.push(format!(" - `{name}` - {desc}"));
            }
            lines.push(String::new());
        }
        lines.pop();
        lines.join("\n")
    }
}

fn dash(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!(": {label}")
    }
}
