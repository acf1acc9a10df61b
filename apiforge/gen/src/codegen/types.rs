//! Type mapping from abstract schema types to Rust types.
//!
//! Every compiler resolves types through [`TypeMapper`], so a field, a
//! parameter and a response of the same abstract type get the same Rust type
//! and the same codec category in all three artifacts.
//!
//! | Abstract | Rust | Category |
//! |----------|------|----------|
//! | bool | `bool` | Boolean |
//! | int | `i64` | Integer |
//! | float | `f64` | Float |
//! | string, date | `String` | StringLike |
//! | unit | `()` | Unit |
//! | reference `X` | `X` | Structured |
//! | list of `T` | `Vec<T>` | category of `T`, shape List |

use std::collections::HashSet;

use apiforge_define::{ApiModel, Primitive, TypeRef};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use serde_json::Value;

use crate::errors::GeneratorError;
use crate::naming::type_ident;

/// How a value is read and written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Boolean,
    Integer,
    Float,
    /// Strings and dates.
    StringLike,
    /// References to definitions.
    Structured,
    Unit,
}

impl Category {
    /// `true` for integer and float.
    pub fn is_numeric(self) -> bool {
        matches!(self, Category::Integer | Category::Float)
    }

    /// `true` for everything that can be parsed from parameter text.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Category::Structured)
    }
}

/// Single value or list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    List,
}

/// A resolved type.
#[derive(Debug, Clone)]
pub struct MappedType {
    /// The full Rust type (`Vec<User>`, `i64`, `Box<Node>`).
    pub ty: TokenStream,
    /// The element type for lists, otherwise the same as `ty`.
    pub element: TokenStream,
    /// Codec category of the (element) type.
    pub category: Category,
    /// Single or list.
    pub shape: Shape,
    /// Referenced definition name when the (element) type is structured.
    pub reference: Option<String>,
    /// Whether `ty` is boxed to break a recursive cycle.
    pub boxed: bool,
}

impl MappedType {
    /// `true` for lists.
    pub fn is_list(&self) -> bool {
        self.shape == Shape::List
    }

    /// `true` for structured singles and lists of structured values.
    pub fn is_structured(&self) -> bool {
        self.category == Category::Structured
    }

    /// `Option<ty>`.
    pub fn optional_ty(&self) -> TokenStream {
        let ty = &self.ty;
        quote! { Option<#ty> }
    }

    fn boxed(mut self) -> Self {
        let ty = &self.ty;
        self.ty = quote! { Box<#ty> };
        self.element = self.ty.clone();
        self.boxed = true;
        self
    }
}

/// Resolves [`TypeRef`]s against one model.
#[derive(Clone)]
pub struct TypeMapper<'a> {
    model: &'a ApiModel,
    qualifier: Option<proc_macro2::Ident>,
}

impl<'a> TypeMapper<'a> {
    /// Creates a mapper over `model`.
    pub fn new(model: &'a ApiModel) -> Self {
        Self {
            model,
            qualifier: None,
        }
    }

    /// A mapper that names definitions through `module` (`dto::User`).
    ///
    /// Server and client artifacts refer to DTOs this way so a definition
    /// named like a framework type cannot shadow it.
    pub fn qualified(&self, module: &str) -> Self {
        Self {
            model: self.model,
            qualifier: Some(proc_macro2::Ident::new(module, proc_macro2::Span::call_site())),
        }
    }

    /// Maps `ty` to a Rust type.
    ///
    /// `context` names where the type appears and is carried into errors.
    ///
    /// ## Errors
    ///
    /// - [`GeneratorError::NestedList`] for a list of lists
    /// - [`GeneratorError::UnresolvedReference`] for an unknown definition
    pub fn resolve(&self, ty: &TypeRef, context: &str) -> Result<MappedType, GeneratorError> {
        match ty {
            TypeRef::Primitive { primitive, .. } => Ok(primitive_type(*primitive)),
            TypeRef::Reference { name, .. } => self.reference_type(name, context),
            TypeRef::List { items, .. } => {
                if items.is_list() {
                    return Err(GeneratorError::NestedList {
                        context: context.to_string(),
                        schema: ty.describe(),
                    });
                }
                let element = self.resolve(items, context)?;
                let inner = &element.ty;
                Ok(MappedType {
                    ty: quote! { Vec<#inner> },
                    element: element.ty.clone(),
                    category: element.category,
                    shape: Shape::List,
                    reference: element.reference,
                    boxed: false,
                })
            }
        }
    }

    /// Maps the type of a field of `owner`, boxing direct references that
    /// lead back to `owner`.
    pub fn resolve_field(
        &self,
        owner: &str,
        ty: &TypeRef,
        context: &str,
    ) -> Result<MappedType, GeneratorError> {
        let mapped = self.resolve(ty, context)?;
        if self.needs_box(owner, ty) {
            Ok(mapped.boxed())
        } else {
            Ok(mapped)
        }
    }

    fn reference_type(&self, name: &str, context: &str) -> Result<MappedType, GeneratorError> {
        if self.model.definition(name).is_none() {
            return Err(GeneratorError::UnresolvedReference {
                context: context.to_string(),
                name: name.to_string(),
            });
        }
        let ident = type_ident(name);
        let ty = match &self.qualifier {
            Some(module) => quote! { #module::#ident },
            None => quote! { #ident },
        };
        Ok(MappedType {
            element: ty.clone(),
            ty,
            category: Category::Structured,
            shape: Shape::Single,
            reference: Some(name.to_string()),
            boxed: false,
        })
    }

    /// Whether a field of `owner` with type `ty` must be boxed.
    ///
    /// True when `ty` is a direct (non-list) reference from which `owner` is
    /// reachable through direct references. Lists already add indirection.
    pub fn needs_box(&self, owner: &str, ty: &TypeRef) -> bool {
        let Some(start) = ty.referenced_name() else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(name) = stack.pop() {
            if name == owner {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(def) = self.model.definition(name) {
                stack.extend(def.properties.iter().filter_map(|p| p.ty.referenced_name()));
            }
        }
        false
    }

    /// Renders a typed expression for a model default value.
    ///
    /// Returns `Ok(None)` when there is no default, or when the type is
    /// structured (those fall back to `Default::default()`).
    ///
    /// ## Errors
    ///
    /// Returns [`GeneratorError::InvalidDefault`] when the value does not fit.
    pub fn default_expr(
        &self,
        mapped: &MappedType,
        default: Option<&Value>,
        context: &str,
    ) -> Result<Option<TokenStream>, GeneratorError> {
        let Some(default) = default else {
            return Ok(None);
        };
        if mapped.is_structured() {
            tracing::warn!(context, "default on structured type ignored; using Default");
            return Ok(None);
        }
        match mapped.shape {
            Shape::Single => scalar_literal(mapped.category, default, context).map(Some),
            Shape::List => {
                let items = match default {
                    Value::Array(items) => items,
                    other => {
                        return Err(invalid_default(context, format!("expected a list, got {other}")));
                    }
                };
                let items = items
                    .iter()
                    .map(|item| scalar_literal(mapped.category, item, context))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(quote! { vec![#(#items),*] }))
            }
        }
    }
}

fn primitive_type(primitive: Primitive) -> MappedType {
    let (ty, category) = match primitive {
        Primitive::Bool => (quote! { bool }, Category::Boolean),
        Primitive::Int => (quote! { i64 }, Category::Integer),
        Primitive::Float => (quote! { f64 }, Category::Float),
        Primitive::String | Primitive::Date => (quote! { String }, Category::StringLike),
        Primitive::Unit => (quote! { () }, Category::Unit),
    };
    MappedType {
        element: ty.clone(),
        ty,
        category,
        shape: Shape::Single,
        reference: None,
        boxed: false,
    }
}

fn invalid_default(context: &str, reason: String) -> GeneratorError {
    GeneratorError::InvalidDefault {
        context: context.to_string(),
        reason,
    }
}

fn scalar_literal(
    category: Category,
    value: &Value,
    context: &str,
) -> Result<TokenStream, GeneratorError> {
    match (category, value) {
        (Category::Boolean, Value::Bool(b)) => Ok(quote! { #b }),
        (Category::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Ok(quote! { true }),
            "false" => Ok(quote! { false }),
            _ => Err(invalid_default(context, format!("{s:?} is not a boolean"))),
        },
        (Category::Integer, Value::Number(n)) => n
            .as_i64()
            .map(|i| {
                let lit = Literal::i64_suffixed(i);
                quote! { #lit }
            })
            .ok_or_else(|| invalid_default(context, format!("{n} is not an integer"))),
        (Category::Integer, Value::String(s)) => s
            .parse::<i64>()
            .map(|i| {
                let lit = Literal::i64_suffixed(i);
                quote! { #lit }
            })
            .map_err(|_| invalid_default(context, format!("{s:?} is not an integer"))),
        (Category::Float, Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| {
                let lit = Literal::f64_suffixed(f);
                quote! { #lit }
            })
            .ok_or_else(|| invalid_default(context, format!("{n} is not a float"))),
        (Category::Float, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| {
                let lit = Literal::f64_suffixed(f);
                quote! { #lit }
            })
            .ok_or_else(|| invalid_default(context, format!("{s:?} is not a float"))),
        (Category::StringLike, Value::String(s)) => Ok(quote! { String::from(#s) }),
        (Category::StringLike, Value::Number(_) | Value::Bool(_)) => {
            let text = value.to_string();
            Ok(quote! { String::from(#text) })
        }
        (Category::Unit, Value::Null) => Ok(quote! { () }),
        (category, other) => Err(invalid_default(
            context,
            format!("{other} does not fit a {category:?} value"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::user_model;
    use apiforge_define::{Definition, Property};
    use serde_json::json;

    #[test]
    fn primitives_map_to_rust_types() {
        let model = ApiModel::new("T");
        let mapper = TypeMapper::new(&model);
        let cases = [
            (TypeRef::bool(), "bool", Category::Boolean),
            (TypeRef::int(), "i64", Category::Integer),
            (TypeRef::float(), "f64", Category::Float),
            (TypeRef::string(), "String", Category::StringLike),
            (TypeRef::date(), "String", Category::StringLike),
            (TypeRef::unit(), "()", Category::Unit),
        ];
        for (ty, rust, category) in cases {
            let mapped = mapper.resolve(&ty, "t").unwrap();
            assert_eq!(mapped.ty.to_string(), rust);
            assert_eq!(mapped.category, category);
            assert_eq!(mapped.shape, Shape::Single);
        }
    }

    #[test]
    fn list_of_reference_is_structured_list() {
        let model = user_model();
        let mapper = TypeMapper::new(&model);
        let mapped = mapper
            .resolve(&TypeRef::list_of(TypeRef::reference("User")), "users")
            .unwrap();
        assert_eq!(mapped.ty.to_string(), "Vec < User >");
        assert_eq!(mapped.element.to_string(), "User");
        assert!(mapped.is_list());
        assert!(mapped.is_structured());
        assert_eq!(mapped.reference.as_deref(), Some("User"));
    }

    #[test]
    fn qualified_mapper_prefixes_references() {
        let model = user_model();
        let mapper = TypeMapper::new(&model).qualified("dto");
        let mapped = mapper
            .resolve(&TypeRef::list_of(TypeRef::reference("User")), "users")
            .unwrap();
        assert_eq!(mapped.ty.to_string(), "Vec < dto :: User >");
        assert_eq!(mapper.resolve(&TypeRef::int(), "n").unwrap().ty.to_string(), "i64");
    }

    #[test]
    fn nested_list_is_rejected_with_context() {
        let model = ApiModel::new("T");
        let mapper = TypeMapper::new(&model);
        let err = mapper
            .resolve(&TypeRef::list_of(TypeRef::list_of(TypeRef::int())), "Grid.cells")
            .unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::NestedList { ref context, ref schema }
                if context == "Grid.cells" && schema == "list<list<int>>"
        ));
    }

    #[test]
    fn unresolved_reference_is_rejected() {
        let model = ApiModel::new("T");
        let mapper = TypeMapper::new(&model);
        let err = mapper.resolve(&TypeRef::reference("Ghost"), "Pet.owner").unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::UnresolvedReference { ref name, .. } if name == "Ghost"
        ));
    }

    #[test]
    fn self_reference_is_boxed_but_list_is_not() {
        let model = ApiModel::new("T").with_definition(
            Definition::new("Node")
                .with_property(Property::optional("parent", TypeRef::reference("Node")))
                .with_property(Property::required("children", TypeRef::list_of(TypeRef::reference("Node")))),
        );
        let mapper = TypeMapper::new(&model);

        let parent = mapper
            .resolve_field("Node", &TypeRef::reference("Node"), "Node.parent")
            .unwrap();
        assert!(parent.boxed);
        assert_eq!(parent.ty.to_string(), "Box < Node >");

        let children = mapper
            .resolve_field("Node", &TypeRef::list_of(TypeRef::reference("Node")), "Node.children")
            .unwrap();
        assert!(!children.boxed);
    }

    #[test]
    fn mutual_recursion_is_boxed() {
        let model = ApiModel::new("T")
            .with_definition(Definition::new("A").with_property(Property::optional("b", TypeRef::reference("B"))))
            .with_definition(Definition::new("B").with_property(Property::optional("a", TypeRef::reference("A"))));
        let mapper = TypeMapper::new(&model);
        assert!(mapper.needs_box("A", &TypeRef::reference("B")));
        assert!(!mapper.needs_box("A", &TypeRef::int()));
    }

    #[test]
    fn default_expr_renders_typed_literals() {
        let model = ApiModel::new("T");
        let mapper = TypeMapper::new(&model);
        let int = mapper.resolve(&TypeRef::int(), "limit").unwrap();
        let expr = mapper.default_expr(&int, Some(&json!(20)), "limit").unwrap().unwrap();
        assert_eq!(expr.to_string(), "20i64");

        let text = mapper.resolve(&TypeRef::string(), "sort").unwrap();
        let expr = mapper.default_expr(&text, Some(&json!("asc")), "sort").unwrap().unwrap();
        assert_eq!(expr.to_string(), "String :: from (\"asc\")");

        let list = mapper.resolve(&TypeRef::list_of(TypeRef::bool()), "flags").unwrap();
        let expr = mapper.default_expr(&list, Some(&json!([true])), "flags").unwrap().unwrap();
        assert_eq!(expr.to_string(), "vec ! [true]");

        assert!(mapper.default_expr(&int, None, "limit").unwrap().is_none());
    }

    #[test]
    fn default_expr_rejects_mismatch() {
        let model = ApiModel::new("T");
        let mapper = TypeMapper::new(&model);
        let int = mapper.resolve(&TypeRef::int(), "limit").unwrap();
        let err = mapper.default_expr(&int, Some(&json!("lots")), "limit").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidDefault { ref context, .. } if context == "limit"));
    }

    #[test]
    fn structured_default_falls_back() {
        let model = user_model();
        let mapper = TypeMapper::new(&model);
        let user = mapper.resolve(&TypeRef::reference("User"), "owner").unwrap();
        assert!(mapper.default_expr(&user, Some(&json!({"id": 1})), "owner").unwrap().is_none());
    }
}
