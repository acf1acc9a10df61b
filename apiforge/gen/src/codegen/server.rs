//! Server route generation.
//!
//! Emits a `{Title}Server<A: Authenticator>` type, one free axum handler per
//! operation and one `register_{tag}` function per tag. Each operation is
//! mounted exactly once: the route table keys operations by
//! `(method, path)` and the first tag in model order claims it.
//!
//! Handlers run in a fixed order:
//!
//! 1. Authentication gate, when the operation declares security
//! 2. Request body decoding
//! 3. Parameter binding in declaration order
//! 4. Rule checks
//! 5. Defaults for absent optional parameters
//! 6. Placeholder response encoded as JSON, or `204 No Content`

use std::collections::{BTreeSet, HashSet};

use apiforge_define::{ApiModel, HttpMethod, Location, OperationKey, PathMethodModel};
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use super::docs::{doc_attrs, render, strip};
use super::rules::{self, Violation};
use super::types::{Category, MappedType, Shape, TypeMapper};
use super::{BoundParam, Context, bind_parameters};
use crate::errors::GeneratorError;
use crate::naming::{DEFAULT_REGISTER_FN, ident, operation_name, register_fn_name, server_name};
use crate::parser::{extract_path_params, to_axum_path};

/// Operations mounted by one registration function.
#[derive(Debug)]
pub struct RouteGroup<'m> {
    /// Registration function name (`register_users`).
    pub function: String,
    /// Tag the group was built from; `None` for untagged operations.
    pub tag: Option<String>,
    /// Tag description from the model.
    pub description: Option<String>,
    /// Operations in model order.
    pub operations: Vec<&'m PathMethodModel>,
}

/// Partitions operations into registration functions.
///
/// Tags are visited in model order (declared tags first, then tags only
/// referenced by operations). Within a tag, operations follow path and verb
/// order. An operation already mounted under an earlier tag is skipped, so
/// every `(method, path)` appears exactly once. Untagged operations go to
/// `register_default`. Tags whose function names coincide share one group.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{ApiModel, HttpMethod, PathMethodModel, PathModel, Tag};
/// use apiforge_gen::codegen::route_table;
///
/// let model = ApiModel::new("Shop")
///     .with_tag(Tag::new("admin"))
///     .with_tag(Tag::new("users"))
///     .with_route(PathModel::new("/users").with_method(
///         PathMethodModel::new(HttpMethod::Get, "/users").with_tag("users").with_tag("admin"),
///     ));
///
/// let groups = route_table(&model);
/// assert_eq!(groups[0].function, "register_admin");
/// assert_eq!(groups[0].operations.len(), 1);
/// assert!(groups[1].operations.is_empty());
/// ```
pub fn route_table(model: &ApiModel) -> Vec<RouteGroup<'_>> {
    let mut tags: Vec<&str> = model.tags.iter().map(|t| t.name.as_str()).collect();
    for op in model.operations() {
        for tag in &op.tags {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
    }

    let mut groups: Vec<RouteGroup<'_>> = Vec::new();
    let mut seen: BTreeSet<OperationKey> = BTreeSet::new();

    for tag in tags {
        let description = model
            .tags
            .iter()
            .find(|t| t.name == tag)
            .and_then(|t| t.description.clone());
        let index = group_index(&mut groups, register_fn_name(tag), Some(tag), description);
        for op in model.operations().filter(|op| op.has_tag(tag)) {
            if seen.insert(op.key()) {
                groups[index].operations.push(op);
            }
        }
    }

    let untagged: Vec<&PathMethodModel> = model
        .operations()
        .filter(|op| op.tags.is_empty())
        .filter(|op| seen.insert(op.key()))
        .collect();
    if !untagged.is_empty() {
        let index = group_index(&mut groups, DEFAULT_REGISTER_FN.to_string(), None, None);
        groups[index].operations.extend(untagged);
    }
    groups
}

fn group_index(
    groups: &mut Vec<RouteGroup<'_>>,
    function: String,
    tag: Option<&str>,
    description: Option<String>,
) -> usize {
    if let Some(index) = groups.iter().position(|g| g.function == function) {
        return index;
    }
    groups.push(RouteGroup {
        function,
        tag: tag.map(str::to_string),
        description,
        operations: Vec::new(),
    });
    groups.len() - 1
}

/// Imports needed by the generated file.
#[derive(Default)]
struct Usage {
    methods: BTreeSet<HttpMethod>,
    path: bool,
    query: bool,
    headers: bool,
    bytes: bool,
    params: bool,
    json: bool,
    no_content: bool,
    dto: bool,
}

/// Handler function name for an operation.
pub fn handler_ident(op: &PathMethodModel) -> Ident {
    ident(&format!("{}_handler", operation_name(op)))
}

/// Generates the server artifact.
pub fn generate_server(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let mapper = ctx.qualified_mapper();
    let server = ident(&server_name(ctx.model, ctx.config));
    let groups = route_table(ctx.model);

    let mut usage = Usage::default();
    let mut handlers = Vec::new();
    let mut registers = Vec::new();

    for group in &groups {
        let mut routes = Vec::new();
        for op in &group.operations {
            handlers.push(generate_handler(ctx, &mapper, &server, op, &mut usage)?);
            let method = method_fn(op.method);
            let handler = handler_ident(op);
            let path = to_axum_path(&op.path);
            usage.methods.insert(op.method);
            routes.push(quote! { .route(#path, #method(#handler::<A>)) });
        }

        let function = ident(&group.function);
        let doc = match (&group.tag, &group.description) {
            (Some(tag), Some(description)) if !description.trim().is_empty() => {
                format!(" Mounts the operations tagged `{tag}`: {}", description.trim())
            }
            (Some(tag), _) => format!(" Mounts the operations tagged `{tag}`."),
            (None, _) => " Mounts the operations that carry no tag.".to_string(),
        };
        registers.push(quote! {
            #[doc = #doc]
            pub fn #function(router: Router<Arc<Self>>) -> Router<Arc<Self>> {
                router #(#routes)*
            }
        });
    }

    let struct_docs = server_docs(ctx.model);
    let imports = imports(ctx, &usage, !groups.is_empty());

    Ok(quote! {
        #imports

        #struct_docs
        pub struct #server<A: Authenticator> {
            /// Decides whether a request satisfies an operation's security.
            pub authenticator: A,
        }

        impl<A: Authenticator> #server<A> {
            /// Creates a server using `authenticator` for secured operations.
            pub fn new(authenticator: A) -> Self {
                Self { authenticator }
            }

            #(#registers)*
        }

        #(#handlers)*
    })
}

fn server_docs(model: &ApiModel) -> TokenStream {
    let title = if model.info.title.trim().is_empty() {
        "Server routes.".to_string()
    } else {
        format!("Server routes for {}.", model.info.title.trim())
    };
    let mut lines = render(&title, &model.info.description, &[], None);
    lines.push(String::new());
    lines.push(
        "Handlers bind and validate parameters, then answer with the default value of the response type."
            .to_string(),
    );
    doc_attrs(&strip(lines))
}

fn method_fn(method: HttpMethod) -> Ident {
    Ident::new(&method.to_string().to_lowercase(), Span::call_site())
}

fn imports(ctx: &Context<'_>, usage: &Usage, has_groups: bool) -> TokenStream {
    let rt = &ctx.rt;
    let mut out = Vec::new();

    if usage.path || usage.query {
        out.push(quote! { use std::collections::HashMap; });
    }
    if has_groups {
        out.push(quote! { use std::sync::Arc; });
    }

    if !usage.methods.is_empty() {
        let mut extract = vec![quote! { State }];
        if usage.path {
            extract.push(quote! { Path });
        }
        if usage.query {
            extract.push(quote! { Query });
        }
        out.push(quote! { use #rt::axum::extract::{#(#extract),*}; });

        let mut http = Vec::new();
        if usage.headers {
            http.push(quote! { HeaderMap });
        }
        if usage.no_content {
            http.push(quote! { StatusCode });
        }
        if !http.is_empty() {
            out.push(quote! { use #rt::axum::http::{#(#http),*}; });
        }
        out.push(quote! { use #rt::axum::response::{IntoResponse, Response}; });

        let methods = usage.methods.iter().map(|m| method_fn(*m));
        out.push(quote! { use #rt::axum::routing::{#(#methods),*}; });
    }
    if has_groups {
        out.push(quote! { use #rt::axum::Router; });
    }
    if usage.json {
        out.push(quote! { use #rt::axum::Json; });
    }
    if usage.bytes {
        out.push(quote! { use #rt::bytes::Bytes; });
    }

    let mut server_items = Vec::new();
    if usage.params {
        server_items.push(quote! { params });
    }
    if !usage.methods.is_empty() {
        server_items.push(quote! { ApiError });
    }
    server_items.push(quote! { Authenticator });
    out.push(quote! { use #rt::server::{#(#server_items),*}; });

    if usage.json {
        out.push(quote! { use #rt::Codec; });
    }
    if usage.dto {
        out.push(ctx.dto_import());
    }
    quote! { #(#out)* }
}

fn location_str(location: Location) -> String {
    location.to_string()
}

/// `true` when the value is read with `FromParam` rather than its codec.
fn is_text(mapped: &MappedType) -> bool {
    mapped.category != Category::Structured
}

fn lookup(bound: &BoundParam<'_>, usage: &mut Usage) -> TokenStream {
    let name = bound.param.name.as_str();
    let text = is_text(&bound.mapped);
    match bound.param.location {
        Location::Path if text => quote! { params::path(&path_params, #name)? },
        Location::Path => quote! { params::path_object(&path_params, #name)? },
        Location::Query if text => quote! { params::query(&query_params, #name)? },
        Location::Query => quote! { params::query_object(&query_params, #name)? },
        Location::Header => {
            usage.headers = true;
            if text {
                quote! { params::header(&headers, #name)? }
            } else {
                quote! { params::header_object(&headers, #name)? }
            }
        }
        Location::Form if text => quote! { params::form(&form_fields, #name)? },
        Location::Form => quote! { params::form_object(&form_fields, #name)? },
        Location::Body => quote! { params::body(&body_object, #name)? },
    }
}

fn uses_dto(mapped: &MappedType) -> bool {
    mapped.reference.is_some()
}

fn generate_handler(
    ctx: &Context<'_>,
    mapper: &TypeMapper<'_>,
    server: &Ident,
    op: &PathMethodModel,
    usage: &mut Usage,
) -> Result<TokenStream, GeneratorError> {
    tracing::debug!(operation = %op.key(), "compiling handler");
    let rt = &ctx.rt;
    let key = op.key().to_string();
    let bound = bind_parameters(mapper, op)?;

    let has_placeholders = !extract_path_params(&op.path).is_empty();
    let has_query = bound.iter().any(|b| b.param.location == Location::Query);
    let has_headers = !op.security.is_empty() || bound.iter().any(|b| b.param.location == Location::Header);
    let reads_body = op.reads_body();

    usage.path |= has_placeholders;
    usage.query |= has_query;
    usage.headers |= has_headers;
    usage.bytes |= reads_body;

    // Extractors
    let state_binding = if op.security.is_empty() {
        quote! { _server }
    } else {
        quote! { server }
    };
    let mut args = vec![quote! { State(#state_binding): State<Arc<#server<A>>> }];
    if has_placeholders {
        args.push(quote! { Path(path_params): Path<HashMap<String, String>> });
    }
    if has_query {
        args.push(quote! { Query(query_params): Query<HashMap<String, String>> });
    }
    if has_headers {
        args.push(quote! { headers: HeaderMap });
    }
    if reads_body {
        args.push(quote! { body_bytes: Bytes });
    }

    let mut body = Vec::new();

    // 1. Authentication
    if !op.security.is_empty() {
        let schemes = op.security.iter().map(|s| s.name.as_str());
        body.push(quote! {
            server.authenticator.authenticate(&[#(#schemes),*], &headers)?;
        });
    }

    // 2. Request body
    if let Some(request_body) = &op.request_body {
        let mapped = mapper.resolve(request_body, &format!("{key} request body"))?;
        usage.params = true;
        usage.dto |= uses_dto(&mapped);
        let ty = &mapped.ty;
        body.push(quote! { let body: #ty = params::request_body(&body_bytes)?; });
    }
    if bound.iter().any(|b| b.param.location == Location::Body) {
        body.push(quote! { let body_object = params::body_object(&body_bytes)?; });
    }
    if bound.iter().any(|b| b.param.location == Location::Form) {
        body.push(quote! { let form_fields = params::form_fields(&body_bytes); });
    }

    // 3. Binding
    for b in &bound {
        usage.params = true;
        usage.dto |= uses_dto(&b.mapped);
        let binding = &b.binding;
        let name = b.param.name.as_str();
        let location = location_str(b.param.location);
        let lookup = lookup(b, usage);
        if b.param.required {
            let ty = &b.mapped.ty;
            body.push(quote! {
                let #binding: #ty = params::required(#lookup, #name, #location)?;
            });
        } else {
            let ty = b.mapped.optional_ty();
            body.push(quote! { let #binding: #ty = #lookup; });
        }
    }

    // 4. Rules
    for b in &bound {
        let binding = &b.binding;
        if let Some(rule) = b.param.effective_rule() {
            rules::check(&rule, &b.mapped, &b.param.ty.describe(), &b.context)?;
            body.push(rules::guard(
                &rule,
                &b.param.name,
                quote! { #binding },
                b.param.required,
                rt,
                Violation::Parameter,
            ));
        }
        if let Some(rule) = b.param.element_rule() {
            rules::check_elements(&rule, &b.mapped, &b.param.ty.describe(), &b.context)?;
            body.push(rules::guard_elements(
                &rule,
                &b.param.name,
                quote! { #binding },
                b.param.required,
                rt,
                Violation::Parameter,
            ));
        }
    }

    // 5. Defaults
    for b in bound.iter().filter(|b| !b.param.required) {
        let binding = &b.binding;
        let default = ctx.mapper.default_expr(&b.mapped, b.param.default.as_ref(), &b.context)?;
        if b.param.default.is_some() && b.mapped.is_structured() {
            tracing::warn!(parameter = %b.param.name, operation = %key, "structured parameter default replaced by Default");
        }
        match default {
            Some(expr) => body.push(quote! { let #binding = #binding.unwrap_or_else(|| #expr); }),
            None => body.push(quote! { let #binding = #binding.unwrap_or_default(); }),
        }
    }

    // 6. Response
    let response = match &op.response {
        Some(ty) => Some(mapper.resolve(ty, &format!("{key} response"))?),
        None => None,
    };
    match response.filter(|m| !(m.category == Category::Unit && m.shape == Shape::Single)) {
        Some(mapped) => {
            usage.json = true;
            usage.dto |= uses_dto(&mapped);
            let ty = &mapped.ty;
            body.push(quote! {
                let response: #ty = Default::default();
                Ok(Json(response.encode()).into_response())
            });
        }
        None => {
            usage.no_content = true;
            body.push(quote! { Ok(StatusCode::NO_CONTENT.into_response()) });
        }
    }

    let docs = handler_docs(op, &bound);
    let handler = handler_ident(op);
    let allow = (!bound.is_empty() || op.request_body.is_some()).then(|| quote! { #[allow(unused_variables)] });

    Ok(quote! {
        #docs
        #allow
        async fn #handler<A: Authenticator>(#(#args),*) -> Result<Response, ApiError> {
            #(#body)*
        }
    })
}

fn handler_docs(op: &PathMethodModel, bound: &[BoundParam<'_>]) -> TokenStream {
    let route = format!("`{} {}`", op.method, op.path);
    let title = if op.summary.trim().is_empty() {
        route.clone()
    } else {
        op.summary.clone()
    };
    let params: Vec<(String, String)> = bound
        .iter()
        .map(|b| {
            let mut desc = b.param.location.to_string();
            if !b.param.required {
                desc.push_str(", optional");
            }
            if let Some(text) = b.param.description.as_deref().filter(|t| !t.trim().is_empty()) {
                desc.push_str(": ");
                desc.push_str(text.trim());
            }
            (b.param.name.clone(), desc)
        })
        .collect();
    let returns = op
        .response_description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| op.response.as_ref().map(|r| r.describe()));

    let mut lines = render(&title, &op.description, &params, returns.as_deref());
    if title != route {
        lines.push(String::new());
        lines.push(format!("Route: {route}"));
    }
    if !op.errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        let mut statuses = HashSet::new();
        for error in &op.errors {
            if statuses.insert(error.status) {
                lines.push(format!("* `{}` - {}", error.status, error.description.trim()));
            }
        }
    }
    doc_attrs(&strip(lines))
}
