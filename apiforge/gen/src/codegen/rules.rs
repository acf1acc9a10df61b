//! Validation rule compilation.
//!
//! A rule compiles to a boolean predicate over a binding named `value`, which
//! holds a reference to the checked value. [`guard`] wraps the predicate so
//! it is skipped for absent optional values and turns a failure into the
//! right typed error.

use apiforge_define::Rule;
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use regex::Regex;

use super::types::{Category, MappedType, Shape};
use crate::errors::GeneratorError;

/// How a failed predicate is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `ValidationError` from a DTO `validate` method.
    Field,
    /// `ApiError` from a server handler.
    Parameter,
}

/// Checks that `rule` can apply to `mapped`, recursing into `All`.
///
/// ## Errors
///
/// - [`GeneratorError::RuleMismatch`] for an incompatible type
/// - [`GeneratorError::InvalidPattern`] for a regex that does not compile
/// - [`GeneratorError::InvalidRule`] for unsatisfiable or non-finite bounds
pub fn check(rule: &Rule, mapped: &MappedType, ty: &str, context: &str) -> Result<(), GeneratorError> {
    let single = mapped.shape == Shape::Single;
    let fits = match rule {
        Rule::Range { .. } => single && mapped.category.is_numeric(),
        Rule::Length { .. } | Rule::NonEmpty => {
            mapped.shape == Shape::List || mapped.category == Category::StringLike
        }
        Rule::Pattern { .. } => single && mapped.category == Category::StringLike,
        Rule::OneOf { .. } => {
            single && !matches!(mapped.category, Category::Structured | Category::Unit)
        }
        Rule::All { rules } => {
            for nested in rules {
                check(nested, mapped, ty, context)?;
            }
            true
        }
    };
    if !fits {
        return Err(GeneratorError::RuleMismatch {
            context: context.to_string(),
            rule: rule.to_string(),
            ty: ty.to_string(),
        });
    }

    let invalid = |reason: String| GeneratorError::InvalidRule {
        context: context.to_string(),
        reason,
    };
    match rule {
        Rule::Range { min, max } => {
            if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
                return Err(invalid("range bounds must be finite".to_string()));
            }
            if let (Some(min), Some(max)) = (min, max)
                && min > max
            {
                return Err(invalid(format!("range minimum {min} exceeds maximum {max}")));
            }
        }
        Rule::Length {
            min: Some(min),
            max: Some(max),
        } if min > max => {
            return Err(invalid(format!("length minimum {min} exceeds maximum {max}")));
        }
        Rule::Pattern { pattern } => {
            Regex::new(pattern).map_err(|e| GeneratorError::InvalidPattern {
                context: context.to_string(),
                reason: e.to_string(),
            })?;
        }
        Rule::OneOf { values } if values.is_empty() => {
            return Err(invalid("one_of needs at least one value".to_string()));
        }
        _ => {}
    }
    Ok(())
}

/// Checks a rule carried on a list's element type against that element.
pub fn check_elements(rule: &Rule, mapped: &MappedType, ty: &str, context: &str) -> Result<(), GeneratorError> {
    let element = MappedType {
        ty: mapped.element.clone(),
        shape: Shape::Single,
        boxed: false,
        ..mapped.clone()
    };
    let element_ty = ty
        .strip_prefix("list<")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(ty);
    check(rule, &element, element_ty, &format!("{context}[]"))
}

/// Compiles `rule` into a predicate over `value`.
///
/// Call [`check`] first; this function assumes the rule fits the type.
///
/// ## Examples
///
/// ```
/// use apiforge_define::Rule;
/// use apiforge_gen::codegen::rules::compile;
///
/// let rt: syn::Path = syn::parse_quote!(apiforge_runtime);
/// let tokens = compile(&Rule::NonEmpty, &rt);
/// assert_eq!(tokens.to_string(), "apiforge_runtime :: rules :: non_empty (value)");
/// ```
pub fn compile(rule: &Rule, rt: &syn::Path) -> TokenStream {
    match rule {
        Rule::Range { min, max } => {
            let min = optional_literal(min.map(Literal::f64_suffixed));
            let max = optional_literal(max.map(Literal::f64_suffixed));
            quote! { #rt::rules::in_range(value, #min, #max) }
        }
        Rule::Length { min, max } => {
            let min = optional_literal(min.map(Literal::usize_suffixed));
            let max = optional_literal(max.map(Literal::usize_suffixed));
            quote! { #rt::rules::length(value, #min, #max) }
        }
        Rule::NonEmpty => quote! { #rt::rules::non_empty(value) },
        Rule::Pattern { pattern } => quote! { #rt::rules::matches(value, #pattern) },
        Rule::OneOf { values } => quote! { #rt::rules::one_of(value, &[#(#values),*]) },
        Rule::All { rules } => {
            let parts = rules.iter().map(|r| compile(r, rt));
            quote! { #(#parts)&&* }
        }
    }
}

fn optional_literal(lit: Option<Literal>) -> TokenStream {
    match lit {
        Some(lit) => quote! { Some(#lit) },
        None => quote! { None },
    }
}

/// Wraps a compiled predicate into a statement that binds `value`, checks
/// it and returns early on violation.
///
/// Required values bind `let value = &access;`. Optional values use
/// `if let Some(value) = &access` so the check is skipped when absent.
pub fn guard(
    rule: &Rule,
    name: &str,
    access: TokenStream,
    required: bool,
    rt: &syn::Path,
    violation: Violation,
) -> TokenStream {
    let fail = failure(rule, name, &rule.to_string(), rt, violation);
    bind(fail, access, required)
}

/// Like [`guard`], but checks `rule` against every element of a list.
///
/// ```text
/// if let Some(value) = &self.codes {
///     for value in value.iter() { ... }
/// }
/// ```
pub fn guard_elements(
    rule: &Rule,
    name: &str,
    access: TokenStream,
    required: bool,
    rt: &syn::Path,
    violation: Violation,
) -> TokenStream {
    let description = format!("{rule} (every element)");
    let fail = failure(rule, name, &description, rt, violation);
    let each = quote! {
        for value in value.iter() {
            #fail
        }
    };
    bind(each, access, required)
}

fn failure(rule: &Rule, name: &str, description: &str, rt: &syn::Path, violation: Violation) -> TokenStream {
    let predicate = compile(rule, rt);
    match violation {
        Violation::Field => {
            quote! { #rt::ValidationError::check(#predicate, #name, #description)?; }
        }
        Violation::Parameter => {
            quote! { #rt::server::check_parameter(#predicate, #name, #description)?; }
        }
    }
}

fn bind(fail: TokenStream, access: TokenStream, required: bool) -> TokenStream {
    if required {
        quote! {
            {
                let value = &#access;
                #fail
            }
        }
    } else {
        quote! {
            if let Some(value) = &#access {
                #fail
            }
        }
    }
}
