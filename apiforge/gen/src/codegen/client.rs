//! Client SDK generation.
//!
//! Emits a `{Title}Client` holding the endpoint, a `reqwest::Client`, a
//! shared `CodecRegistry` and a `Dispatcher`. Every operation gets two
//! methods:
//!
//! - `{name}_async(&self, ...) -> Result<T, ClientError>`
//! - `{name}(&self, ..., callback)`, which runs the async method on the
//!   dispatcher's runtime and hands the `Result` to `callback` exactly once

use apiforge_define::{ApiModel, Location, PathMethodModel, TypeRef};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::docs::{doc_attrs, render, strip};
use super::types::{Category, MappedType, Shape, TypeMapper};
use super::{BoundParam, Context, bind_parameters};
use crate::errors::GeneratorError;
use crate::naming::{client_name, ident, operation_name, type_ident};
use crate::parser::to_format_template;

/// A codec the client constructor registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecRegistration {
    /// Definition name.
    pub definition: String,
    /// `true` for the `Vec<T>` codec.
    pub list: bool,
}

/// Codecs the generated client registers, in first-use order.
///
/// Every definition referenced by an operation's parameters, request body
/// or response is registered once. Definitions that appear in list form also
/// get a list codec.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{ApiModel, Definition, HttpMethod, PathMethodModel, PathModel, TypeRef};
/// use apiforge_gen::codegen::codec_registrations;
///
/// let model = ApiModel::new("Shop")
///     .with_definition(Definition::new("Item"))
///     .with_route(PathModel::new("/items").with_method(
///         PathMethodModel::new(HttpMethod::Get, "/items")
///             .with_response(TypeRef::list_of(TypeRef::reference("Item"))),
///     ));
///
/// let registrations = codec_registrations(&model);
/// assert_eq!(registrations.len(), 2);
/// assert!(!registrations[0].list);
/// assert!(registrations[1].list);
/// ```
pub fn codec_registrations(model: &ApiModel) -> Vec<CodecRegistration> {
    let mut out: Vec<CodecRegistration> = Vec::new();
    let mut add = |ty: &TypeRef| {
        let Some(name) = ty.element().referenced_name() else {
            return;
        };
        let mut wanted = vec![false];
        if ty.is_list() {
            wanted.push(true);
        }
        for list in wanted {
            if !out.iter().any(|r| r.definition == name && r.list == list) {
                out.push(CodecRegistration {
                    definition: name.to_string(),
                    list,
                });
            }
        }
    };
    for op in model.operations() {
        for param in &op.parameters {
            add(&param.ty);
        }
        if let Some(body) = &op.request_body {
            add(body);
        }
        if let Some(response) = &op.response {
            add(response);
        }
    }
    out
}

/// Imports needed by the generated file.
#[derive(Default)]
struct Usage {
    operations: bool,
    codec: bool,
    payload: bool,
    dto: bool,
}

/// Generates the client artifact.
pub fn generate_client(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let mapper = ctx.qualified_mapper();
    let client = ident(&client_name(ctx.model, ctx.config));
    let mut usage = Usage::default();

    let mut methods = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for op in ctx.model.operations() {
        if !seen.insert(op.key()) {
            continue;
        }
        usage.operations = true;
        methods.push(generate_operation(&mapper, op, &mut usage)?);
    }

    let registrations = codec_registrations(ctx.model);
    usage.dto |= !registrations.is_empty();
    let register_calls = registrations.iter().map(|r| {
        let ty = type_ident(&r.definition);
        if r.list {
            quote! { codecs.register_list::<dto::#ty>(); }
        } else {
            quote! { codecs.register::<dto::#ty>(); }
        }
    });
    let codecs_binding = if registrations.is_empty() {
        quote! { let codecs = CodecRegistry::new(); }
    } else {
        quote! { let mut codecs = CodecRegistry::new(); }
    };

    let docs = client_docs(ctx.model);
    let imports = imports(ctx, &usage);

    Ok(quote! {
        #imports

        #docs
        #[derive(Clone)]
        pub struct #client {
            endpoint: String,
            http: reqwest::Client,
            codecs: Arc<CodecRegistry>,
            dispatcher: Dispatcher,
        }

        impl #client {
            /// Creates a client for the service at `endpoint`.
            ///
            /// Callback methods run on `dispatcher`'s runtime and deliver
            /// their results through it.
            pub fn new(endpoint: impl Into<String>, dispatcher: Dispatcher) -> Self {
                #codecs_binding
                #(#register_calls)*
                Self {
                    endpoint: endpoint.into().trim_end_matches('/').to_string(),
                    http: reqwest::Client::new(),
                    codecs: Arc::new(codecs),
                    dispatcher,
                }
            }

            /// Replaces the HTTP client, e.g. to configure timeouts or TLS.
            pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
                self.http = http;
                self
            }

            /// The service endpoint requests are sent to.
            pub fn endpoint(&self) -> &str {
                &self.endpoint
            }

            #(#methods)*
        }
    })
}

fn client_docs(model: &ApiModel) -> TokenStream {
    let title = if model.info.title.trim().is_empty() {
        "Client SDK.".to_string()
    } else {
        format!("Client SDK for {}.", model.info.title.trim())
    };
    let mut lines = render(&title, &model.info.description, &[], None);
    lines.push(String::new());
    lines.push(
        "Calls cannot be cancelled once dispatched, and no timeout applies beyond what the \
         underlying `reqwest::Client` enforces."
            .to_string(),
    );
    doc_attrs(&strip(lines))
}

fn imports(ctx: &Context<'_>, usage: &Usage) -> TokenStream {
    let rt = &ctx.rt;
    let mut out = vec![quote! { use std::sync::Arc; }];

    if usage.operations {
        out.push(quote! { use #rt::client::{self, ClientError, Dispatcher}; });
    } else {
        out.push(quote! { use #rt::client::Dispatcher; });
    }
    if usage.payload {
        out.push(quote! { use #rt::codec::field; });
        out.push(quote! { use #rt::serde_json::{Map, Value}; });
    }
    out.push(quote! { use #rt::reqwest; });
    if usage.codec {
        out.push(quote! { use #rt::{Codec, CodecRegistry}; });
    } else {
        out.push(quote! { use #rt::CodecRegistry; });
    }
    if usage.dto {
        out.push(ctx.dto_import());
    }
    quote! { #(#out)* }
}

/// Text rendering of a value for path, query, header and form slots.
///
/// `place` names the value for method calls; `reference` borrows it.
fn text_expr(mapped: &MappedType, place: TokenStream, reference: TokenStream) -> TokenStream {
    match (mapped.category, mapped.shape) {
        (Category::Unit, _) => quote! { String::new() },
        (Category::Structured, _) => quote! { client::json_text(#reference) },
        (_, Shape::List) => quote! { client::join_list(#reference) },
        (_, Shape::Single) => quote! { #place.to_string() },
    }
}

/// Text of a required parameter (owned binding) or of `value` inside an
/// `if let Some(value) = &binding` block.
fn param_text(b: &BoundParam<'_>, inside_some: bool) -> TokenStream {
    if inside_some {
        text_expr(&b.mapped, quote! { value }, quote! { value })
    } else {
        let binding = &b.binding;
        text_expr(&b.mapped, quote! { #binding }, quote! { &#binding })
    }
}

fn method_ident(method: apiforge_define::HttpMethod) -> Ident {
    format_ident!("{}", method.to_string())
}

fn generate_operation(
    mapper: &TypeMapper<'_>,
    op: &PathMethodModel,
    usage: &mut Usage,
) -> Result<TokenStream, GeneratorError> {
    tracing::debug!(operation = %op.key(), "compiling client method");
    let key = op.key().to_string();
    let bound = bind_parameters(mapper, op)?;
    for b in &bound {
        usage.dto |= b.mapped.reference.is_some();
    }

    // Signature
    let mut args = Vec::new();
    let mut forwards = Vec::new();
    for b in &bound {
        let binding = &b.binding;
        let ty = if b.param.required {
            b.mapped.ty.clone()
        } else {
            b.mapped.optional_ty()
        };
        args.push(quote! { #binding: #ty });
        forwards.push(quote! { #binding });
    }
    let request_body = match &op.request_body {
        Some(ty) => Some(mapper.resolve(ty, &format!("{key} request body"))?),
        None => None,
    };
    if let Some(mapped) = &request_body {
        usage.codec = true;
        usage.dto |= mapped.reference.is_some();
        let ty = &mapped.ty;
        args.push(quote! { body: #ty });
        forwards.push(quote! { body });
    }

    let response = match &op.response {
        Some(ty) => Some(mapper.resolve(ty, &format!("{key} response"))?),
        None => None,
    };
    let output = match &response {
        Some(mapped) => {
            usage.dto |= mapped.reference.is_some();
            mapped.ty.clone()
        }
        None => quote! { () },
    };

    let mut body = Vec::new();

    // URL
    let (template, placeholders) = to_format_template(&op.path);
    let path_values = placeholders.iter().map(|name| {
        match bound
            .iter()
            .find(|b| b.param.location == Location::Path && b.param.name == *name)
        {
            Some(b) => {
                let text = param_text(b, false);
                quote! { client::path_segment(&#text) }
            }
            None => quote! { "" },
        }
    });
    body.push(quote! { let url = format!(#template, self.endpoint #(, #path_values)*); });

    let method = method_ident(op.method);
    body.push(quote! { let request = self.http.request(reqwest::Method::#method, url); });

    // Query and form pairs
    for (location, local) in [(Location::Query, quote! { query }), (Location::Form, quote! { form })] {
        let entries: Vec<&BoundParam<'_>> = bound.iter().filter(|b| b.param.location == location).collect();
        if entries.is_empty() {
            continue;
        }
        body.push(quote! { let mut #local: Vec<(&str, String)> = Vec::new(); });
        for b in entries {
            let name = b.param.name.as_str();
            let binding = &b.binding;
            if b.param.required {
                let text = param_text(b, false);
                body.push(quote! { #local.push((#name, #text)); });
            } else {
                let text = param_text(b, true);
                body.push(quote! {
                    if let Some(value) = &#binding {
                        #local.push((#name, #text));
                    }
                });
            }
        }
        body.push(match location {
            Location::Query => quote! { let request = request.query(&query); },
            _ => quote! { let request = request.form(&form); },
        });
    }

    // Headers
    for b in bound.iter().filter(|b| b.param.location == Location::Header) {
        let name = b.param.name.as_str();
        let binding = &b.binding;
        if b.param.required {
            let text = param_text(b, false);
            body.push(quote! { let request = request.header(#name, #text); });
        } else {
            let text = param_text(b, true);
            body.push(quote! {
                let request = match &#binding {
                    Some(value) => request.header(#name, #text),
                    None => request,
                };
            });
        }
    }

    // JSON body
    let body_params: Vec<&BoundParam<'_>> = bound.iter().filter(|b| b.param.location == Location::Body).collect();
    if !body_params.is_empty() {
        usage.payload = true;
        body.push(quote! { let mut payload = Map::new(); });
        for b in body_params {
            let name = b.param.name.as_str();
            let binding = &b.binding;
            if b.param.required {
                body.push(quote! { field::put(&mut payload, #name, &#binding); });
            } else {
                body.push(quote! { field::put_opt(&mut payload, #name, &#binding); });
            }
        }
        body.push(quote! { let request = request.json(&Value::Object(payload)); });
    }
    if request_body.is_some() {
        body.push(quote! { let request = request.json(&body.encode()); });
    }

    // Response
    body.push(decode_response(response.as_ref(), usage));

    let name = operation_name(op);
    let async_ident = ident(&format!("{name}_async"));
    let callback_ident = ident(&name);
    let docs = method_docs(op, &bound, response.is_some());

    Ok(quote! {
        #docs
        pub async fn #async_ident(&self #(, #args)*) -> Result<#output, ClientError> {
            #(#body)*
        }

        #docs
        ///
        /// Runs on the dispatcher's runtime; `callback` receives the result
        /// exactly once through the configured delivery.
        pub fn #callback_ident(
            &self,
            #(#args,)*
            callback: impl FnOnce(Result<#output, ClientError>) + Send + 'static,
        ) {
            let client = self.clone();
            self.dispatcher.dispatch(
                async move { client.#async_ident(#(#forwards),*).await },
                callback,
            );
        }
    })
}

fn decode_response(response: Option<&MappedType>, usage: &mut Usage) -> TokenStream {
    let send = quote! { client::ensure_success(request.send().await?).await? };
    let mapped = match response {
        Some(mapped) if !(mapped.category == Category::Unit && mapped.shape == Shape::Single) => mapped,
        _ => {
            return quote! {
                #send;
                Ok(())
            };
        }
    };
    let element = &mapped.element;
    let decode = match (mapped.category, mapped.shape) {
        (Category::Structured, Shape::Single) => quote! {
            let raw = client::read_json(response).await?;
            Ok(self.codecs.decode::<#element>(&raw)?)
        },
        (Category::Structured, Shape::List) => quote! {
            let raw = client::read_text(response).await?;
            Ok(self.codecs.decode_list::<#element>(&raw)?)
        },
        (_, Shape::List) => quote! {
            let raw = client::read_text(response).await?;
            client::decode_raw_list::<#element>(&raw)
        },
        (_, Shape::Single) => {
            usage.codec = true;
            quote! {
                let raw = client::read_json(response).await?;
                Ok(<#element as Codec>::decode(&raw)?)
            }
        }
    };
    quote! {
        let response = #send;
        #decode
    }
}

fn method_docs(op: &PathMethodModel, bound: &[BoundParam<'_>], has_response: bool) -> TokenStream {
    let title = if op.summary.trim().is_empty() {
        format!("`{} {}`", op.method, op.path)
    } else {
        op.summary.clone()
    };
    let mut params: Vec<(String, String)> = bound
        .iter()
        .map(|b| {
            let desc = b.param.description.clone().unwrap_or_default();
            (b.binding.to_string(), desc)
        })
        .collect();
    if op.request_body.is_some() {
        params.push(("body".to_string(), "request body".to_string()));
    }
    let returns = if has_response {
        op.response_description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| op.response.as_ref().map(|r| r.describe()))
    } else {
        None
    };
    doc_attrs(&render(&title, &op.description, &params, returns.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{petstore_model, user_model};
    use apiforge_define::{BuildConfig, Definition, HttpMethod, Parameter, PathModel, Property};

    fn generate(model: &ApiModel) -> String {
        let config = BuildConfig::default();
        let ctx = Context::new(model, &config);
        let tokens = generate_client(&ctx).unwrap();
        let file: syn::File = syn::parse2(tokens).expect("generated client should parse");
        prettyplease::unparse(&file)
    }

    #[test]
    fn registrations_cover_params_bodies_and_responses() {
        let model = user_model()
            .with_definition(Definition::new("Query").with_property(Property::required("q", TypeRef::string())))
            .with_definition(Definition::new("Unused"))
            .with_route(
                PathModel::new("/users")
                    .with_method(
                        PathMethodModel::new(HttpMethod::Get, "/users")
                            .with_parameter(Parameter::query("filter", TypeRef::reference("Query")).optional())
                            .with_response(TypeRef::list_of(TypeRef::reference("User"))),
                    )
                    .with_method(
                        PathMethodModel::new(HttpMethod::Post, "/users")
                            .with_request_body(TypeRef::reference("User"))
                            .with_response(TypeRef::reference("User")),
                    ),
            );
        let regs = codec_registrations(&model);
        let rendered: Vec<(String, bool)> = regs.into_iter().map(|r| (r.definition, r.list)).collect();
        assert_eq!(
            rendered,
            vec![
                ("Query".to_string(), false),
                ("User".to_string(), false),
                ("User".to_string(), true),
            ]
        );
    }

    #[test]
    fn client_registers_codecs_in_constructor() {
        let code = generate(&petstore_model());
        assert!(code.contains("let mut codecs = CodecRegistry::new();"));
        assert!(code.contains("codecs.register::<dto::Pet>();"));
        assert!(code.contains("codecs.register_list::<dto::Pet>();"));
        assert!(code.contains("use crate::dto;"));
    }

    #[test]
    fn path_and_query_building() {
        let code = generate(&petstore_model());
        assert!(code.contains("pub async fn get_pet_async(&self, pet_id: i64) -> Result<dto::Pet, ClientError>"));
        assert!(code.contains("\"{}/pets/{}\""));
        assert!(code.contains("client::path_segment(&pet_id.to_string())"));
        assert!(code.contains("if let Some(value) = &limit {"));
        assert!(code.contains("query.push((\"limit\", value.to_string()));"));
        assert!(code.contains("let request = request.query(&query);"));
    }

    #[test]
    fn list_response_reads_raw_text() {
        let code = generate(&petstore_model());
        assert!(code.contains("let raw = client::read_text(response).await?;"));
        assert!(code.contains("self.codecs.decode_list::<dto::Pet>(&raw)?"));
    }

    #[test]
    fn request_body_is_encoded() {
        let code = generate(&petstore_model());
        assert!(code.contains("let request = request.json(&body.encode());"));
        assert!(code.contains("use apiforge_runtime::{Codec, CodecRegistry};"));
    }

    #[test]
    fn callback_variant_dispatches() {
        let code = generate(&petstore_model());
        assert!(code.contains("pub fn get_pet("));
        assert!(code.contains("callback: impl FnOnce(Result<dto::Pet, ClientError>) + Send + 'static"));
        assert!(code.contains("let client = self.clone();"));
        assert!(code.contains("client.get_pet_async(pet_id).await"));
    }

    #[test]
    fn void_response_only_checks_status() {
        let code = generate(&petstore_model());
        assert!(code.contains("pub async fn delete_pet_async(&self, pet_id: i64) -> Result<(), ClientError>"));
        assert!(code.contains("Ok(())"));
    }

    #[test]
    fn header_and_body_parameters() {
        let model = ApiModel::new("T").with_route(
            PathModel::new("/notes").with_method(
                PathMethodModel::new(HttpMethod::Put, "/notes")
                    .with_parameter(Parameter::header("X-Trace", TypeRef::string()).optional())
                    .with_parameter(Parameter::body("text", TypeRef::string()))
                    .with_response(TypeRef::int()),
            ),
        );
        let code = generate(&model);
        assert!(code.contains("Some(value) => request.header(\"X-Trace\", value.to_string()),"));
        assert!(code.contains("field::put(&mut payload, \"text\", &text);"));
        assert!(code.contains("request.json(&Value::Object(payload))"));
        assert!(code.contains("<i64 as Codec>::decode(&raw)?"));
        assert!(code.contains("reqwest::Method::PUT"));
    }

    #[test]
    fn empty_model_has_constructor_only() {
        let code = generate(&ApiModel::new("Quiet"));
        assert!(code.contains("pub struct QuietClient"));
        assert!(code.contains("let codecs = CodecRegistry::new();"));
        assert!(!code.contains("ClientError"));
        assert!(!code.contains("use crate::dto"));
    }
}
