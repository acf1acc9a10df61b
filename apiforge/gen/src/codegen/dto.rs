//! Data transfer object generation.
//!
//! Every definition becomes a plain struct with a keyed JSON codec:
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Default, PartialEq)]
//! pub struct User {
//!     pub id: i64,
//!     pub name: Option<String>,
//! }
//!
//! impl Codec for User {
//!     fn decode(value: &Value) -> Result<Self, DecodeError> {
//!         let object = field::expect_object(value, "User")?;
//!         Ok(Self {
//!             id: field::integer(object, "User", "id")?,
//!             name: field::string_opt(object, "User", "name")?,
//!         })
//!     }
//!     // ...
//! }
//! ```
//!
//! Definitions carrying rules also get a `validate` method, which `decode`
//! calls before returning.

use apiforge_define::{Definition, Property};
use proc_macro2::TokenStream;
use quote::quote;

use super::Context;
use super::docs::{doc_attrs, render};
use super::rules::{self, Violation};
use super::types::{Category, MappedType, Shape};
use crate::errors::GeneratorError;
use crate::naming::{field_ident, type_ident};

/// Marker added to the docs of definitions inferred from inline schemas.
pub const SYNTHETIC_TAG: &str = "Implementation detail: inferred from an inline schema.";

/// Generates the DTO artifact: imports and one item group per definition.
pub fn generate_dtos(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let items = ctx
        .model
        .definitions
        .iter()
        .map(|def| generate_definition(ctx, def))
        .collect::<Result<Vec<_>, _>>()?;

    if items.is_empty() {
        return Ok(TokenStream::new());
    }

    let rt = &ctx.rt;
    let validation_import = ctx
        .model
        .definitions
        .iter()
        .any(Definition::has_rules)
        .then(|| quote! { use #rt::ValidationError; });

    Ok(quote! {
        use #rt::codec::field;
        use #rt::serde_json::{Map, Value};
        use #rt::{Codec, DecodeError};
        #validation_import

        #(#items)*
    })
}

struct Field<'p> {
    property: &'p Property,
    ident: proc_macro2::Ident,
    mapped: MappedType,
}

/// Generates the struct, validator and codec for one definition.
pub fn generate_definition(ctx: &Context<'_>, def: &Definition) -> Result<TokenStream, GeneratorError> {
    tracing::debug!(definition = %def.name, properties = def.properties.len(), "compiling definition");

    let fields = def
        .properties
        .iter()
        .map(|property| {
            let context = format!("{}.{}", def.name, property.name);
            let mapped = ctx.mapper.resolve_field(&def.name, &property.ty, &context)?;
            Ok(Field {
                property,
                ident: field_ident(&property.name),
                mapped,
            })
        })
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    let name = type_ident(&def.name);
    let docs = struct_docs(def);
    let field_defs = fields
        .iter()
        .map(|f| field_definition(ctx, &def.name, f))
        .collect::<Result<Vec<_>, _>>()?;
    let validate = validate_method(ctx, &def.name, &fields)?;
    let codec = codec_impl(def, &fields, validate.is_some());

    let validate_impl = validate.map(|body| {
        quote! {
            impl #name {
                /// Checks every field rule in declaration order.
                pub fn validate(&self) -> Result<(), ValidationError> {
                    #body
                    Ok(())
                }
            }
        }
    });

    Ok(quote! {
        #docs
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct #name {
            #(#field_defs)*
        }

        #validate_impl

        #codec
    })
}

fn struct_docs(def: &Definition) -> TokenStream {
    let description = def.description.as_deref().unwrap_or("");
    let mut lines = render(description.lines().next().unwrap_or(""), rest_lines(description), &[], None);
    if def.synthetic {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(SYNTHETIC_TAG.to_string());
    }
    doc_attrs(&lines)
}

/// Everything after the first line of `text`.
fn rest_lines(text: &str) -> &str {
    text.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
}

fn field_definition(ctx: &Context<'_>, owner: &str, field: &Field<'_>) -> Result<TokenStream, GeneratorError> {
    let property = field.property;
    let context = format!("{owner}.{}", property.name);

    let mut notes = Vec::new();
    if let Some(rule) = property.effective_rule() {
        notes.push(format!("Must be {rule}."));
    }
    if let Some(rule) = property.element_rule() {
        notes.push(format!("Every element must be {rule}."));
    }
    if let Some(default) = ctx
        .mapper
        .default_expr(&field.mapped, property.default.as_ref(), &context)?
        .and(property.default.as_ref())
    {
        notes.push(format!("Model default: `{default}`."));
    }
    let description = property.description.as_deref().unwrap_or("");
    let mut lines = render(description.lines().next().unwrap_or(""), rest_lines(description), &[], None);
    if !notes.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(notes.join(" "));
    }
    let docs = doc_attrs(&lines);

    let ident = &field.ident;
    let ty = if property.required {
        field.mapped.ty.clone()
    } else {
        field.mapped.optional_ty()
    };
    Ok(quote! {
        #docs
        pub #ident: #ty,
    })
}

fn validate_method(
    ctx: &Context<'_>,
    owner: &str,
    fields: &[Field<'_>],
) -> Result<Option<TokenStream>, GeneratorError> {
    let mut checks = Vec::new();
    for field in fields {
        let property = field.property;
        let context = format!("{owner}.{}", property.name);
        let ident = &field.ident;
        if let Some(rule) = property.effective_rule() {
            rules::check(&rule, &field.mapped, &property.ty.describe(), &context)?;
            checks.push(rules::guard(
                &rule,
                &property.name,
                quote! { self.#ident },
                property.required,
                &ctx.rt,
                Violation::Field,
            ));
        }
        if let Some(rule) = property.element_rule() {
            rules::check_elements(&rule, &field.mapped, &property.ty.describe(), &context)?;
            checks.push(rules::guard_elements(
                &rule,
                &property.name,
                quote! { self.#ident },
                property.required,
                &ctx.rt,
                Violation::Field,
            ));
        }
    }
    if checks.is_empty() {
        Ok(None)
    } else {
        Ok(Some(quote! { #(#checks)* }))
    }
}

/// The `field::` accessor reading a value of this shape and category.
fn accessor(mapped: &MappedType, required: bool) -> proc_macro2::Ident {
    let base = match (mapped.shape, mapped.category) {
        (Shape::List, _) => "list",
        (Shape::Single, Category::Structured) => "object",
        (Shape::Single, Category::Boolean) => "boolean",
        (Shape::Single, Category::Integer) => "integer",
        (Shape::Single, Category::Float) => "float",
        (Shape::Single, Category::StringLike) => "string",
        (Shape::Single, Category::Unit) => "unit",
    };
    let name = if required {
        base.to_string()
    } else {
        format!("{base}_opt")
    };
    proc_macro2::Ident::new(&name, proc_macro2::Span::call_site())
}

fn codec_impl(def: &Definition, fields: &[Field<'_>], validates: bool) -> TokenStream {
    let name = type_ident(&def.name);
    let owner = def.name.as_str();

    let reads = fields.iter().map(|f| {
        let ident = &f.ident;
        let key = f.property.name.as_str();
        let accessor = accessor(&f.mapped, f.property.required);
        quote! { #ident: field::#accessor(object, #owner, #key)?, }
    });
    let writes = fields.iter().map(|f| {
        let ident = &f.ident;
        let key = f.property.name.as_str();
        if f.property.required {
            quote! { field::put(&mut object, #key, &self.#ident); }
        } else {
            quote! { field::put_opt(&mut object, #key, &self.#ident); }
        }
    });

    let decode_body = match (fields.is_empty(), validates) {
        (true, _) => quote! {
            field::expect_object(value, #owner)?;
            Ok(Self {})
        },
        (false, false) => quote! {
            let object = field::expect_object(value, #owner)?;
            Ok(Self {
                #(#reads)*
            })
        },
        (false, true) => quote! {
            let object = field::expect_object(value, #owner)?;
            let decoded = Self {
                #(#reads)*
            };
            decoded.validate()?;
            Ok(decoded)
        },
    };
    let encode_body = if fields.is_empty() {
        quote! { Value::Object(Map::new()) }
    } else {
        quote! {
            let mut object = Map::new();
            #(#writes)*
            Value::Object(object)
        }
    };

    quote! {
        impl Codec for #name {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                #decode_body
            }

            fn encode(&self) -> Value {
                #encode_body
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ruled_model, user_model};
    use apiforge_define::{ApiModel, BuildConfig, Rule, TypeRef};

    fn generate(model: &ApiModel) -> Result<String, GeneratorError> {
        let config = BuildConfig::default();
        let ctx = Context::new(model, &config);
        let tokens = generate_dtos(&ctx)?;
        let file: syn::File = syn::parse2(tokens).expect("generated DTOs should parse");
        Ok(prettyplease::unparse(&file))
    }

    #[test]
    fn user_struct_has_required_and_optional_fields() {
        let code = generate(&user_model()).unwrap();
        assert!(code.contains("#[derive(Debug, Clone, Default, PartialEq)]"));
        assert!(code.contains("pub struct User {"));
        assert!(code.contains("pub id: i64,"));
        assert!(code.contains("pub name: Option<String>,"));
        assert!(code.contains("field::integer(object, \"User\", \"id\")?"));
        assert!(code.contains("field::string_opt(object, \"User\", \"name\")?"));
        assert!(code.contains("field::put(&mut object, \"id\", &self.id);"));
        assert!(code.contains("field::put_opt(&mut object, \"name\", &self.name);"));
    }

    #[test]
    fn no_validate_without_rules() {
        let code = generate(&user_model()).unwrap();
        assert!(!code.contains("fn validate"));
        assert!(!code.contains("ValidationError"));
    }

    #[test]
    fn rules_generate_validate_called_from_decode() {
        let code = generate(&ruled_model()).unwrap();
        assert!(code.contains("use apiforge_runtime::ValidationError;"));
        assert!(code.contains("pub fn validate(&self) -> Result<(), ValidationError>"));
        assert!(code.contains("decoded.validate()?;"));
        assert!(code.contains("apiforge_runtime::rules::in_range(value, Some(1f64), None)"));
        assert!(code.contains("if let Some(value) = &self.nickname"));
    }

    #[test]
    fn keyword_fields_are_raw_but_wire_keys_are_not() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("Item").with_property(Property::required("type", TypeRef::string())),
        );
        let code = generate(&model).unwrap();
        assert!(code.contains("pub r#type: String,"));
        assert!(code.contains("field::string(object, \"Item\", \"type\")?"));
    }

    #[test]
    fn list_and_reference_fields_use_structured_accessors() {
        let model = user_model().with_definition(
            Definition::new("Team")
                .with_property(Property::required("members", TypeRef::list_of(TypeRef::reference("User"))))
                .with_property(Property::optional("lead", TypeRef::reference("User"))),
        );
        let code = generate(&model).unwrap();
        assert!(code.contains("pub members: Vec<User>,"));
        assert!(code.contains("field::list(object, \"Team\", \"members\")?"));
        assert!(code.contains("pub lead: Option<User>,"));
        assert!(code.contains("field::object_opt(object, \"Team\", \"lead\")?"));
    }

    #[test]
    fn synthetic_definition_is_tagged() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("InlineBody")
                .synthetic()
                .with_property(Property::required("ok", TypeRef::bool())),
        );
        let code = generate(&model).unwrap();
        assert!(code.contains(SYNTHETIC_TAG));
        assert!(code.contains("pub struct InlineBody"));
    }

    #[test]
    fn empty_definition_compiles() {
        let model = ApiModel::new("T").with_definition(Definition::new("Ping"));
        let code = generate(&model).unwrap();
        assert!(code.contains("pub struct Ping {}"));
        assert!(code.contains("Value::Object(Map::new())"));
    }

    #[test]
    fn rule_mismatch_names_the_field() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("User")
                .with_property(Property::required("name", TypeRef::string()).with_rule(Rule::range(Some(1.0), None))),
        );
        let err = generate(&model).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::RuleMismatch { ref context, .. } if context == "User.name"
        ));
    }

    #[test]
    fn element_rules_check_every_element() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("Tags").with_property(Property::optional(
                "codes",
                TypeRef::list_of(TypeRef::string().with_rule(Rule::pattern("^[A-Z]+$"))),
            )),
        );
        let code = generate(&model).unwrap();
        assert!(code.contains("pub fn validate(&self)"));
        assert!(code.contains("if let Some(value) = &self.codes"));
        assert!(code.contains("for value in value.iter()"));
        assert!(code.contains("rules::matches(value, \"^[A-Z]+$\")"));
        assert!(code.contains("Every element must be"));
    }

    #[test]
    fn element_rule_mismatch_fails() {
        let model = ApiModel::new("T").with_definition(Definition::new("Tags").with_property(
            Property::required("codes", TypeRef::list_of(TypeRef::string().with_rule(Rule::range(None, Some(3.0))))),
        ));
        let err = generate(&model).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::RuleMismatch { ref context, .. } if context == "Tags.codes[]"
        ));
    }

    #[test]
    fn nested_list_field_fails() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("Grid")
                .with_property(Property::required("cells", TypeRef::list_of(TypeRef::list_of(TypeRef::int())))),
        );
        let err = generate(&model).unwrap_err();
        assert!(matches!(err, GeneratorError::NestedList { .. }));
    }

    #[test]
    fn no_definitions_no_imports() {
        let code = generate(&ApiModel::new("T")).unwrap();
        assert!(code.trim().is_empty());
    }
}
