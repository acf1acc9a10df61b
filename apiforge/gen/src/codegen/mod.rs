//! Code generation for apiforge artifacts.
//!
//! Each compiler turns the API model into one artifact's items. They share
//! a [`Context`], so every artifact resolves types through the same
//! [`TypeMapper`] and derives names through [`crate::naming`].
//!
//! ## Submodules
//!
//! - [`types`] - Maps schema types to Rust types and codec categories
//! - [`rules`] - Compiles validation rules to predicates
//! - [`docs`] - Item and module documentation
//! - [`dto`] - One struct, validator and codec per definition
//! - [`server`] - Axum handlers and per-tag route registration
//! - [`application`] - Router glue calling every registration function
//! - [`client`] - The client SDK with async and callback methods
//!
//! ## Output Format
//!
//! All generators return `proc_macro2::TokenStream`, which is then:
//! - Validated with `syn::parse2` to ensure correctness
//! - Formatted with `prettyplease` for consistent style
//!
//! See [`crate::output`] for the assembly and file writing logic.

pub mod application;
pub mod client;
pub mod docs;
pub mod dto;
pub mod rules;
pub mod server;
pub mod types;

use apiforge_define::{ApiModel, BuildConfig, Parameter, PathMethodModel};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

pub use application::generate_application;
pub use client::{codec_registrations, generate_client};
pub use docs::{ModuleDocBuilder, ModuleKind};
pub use dto::generate_dtos;
pub use server::{generate_server, route_table};
pub use types::{Category, MappedType, Shape, TypeMapper};

use crate::errors::GeneratorError;
use crate::naming::{binding_ident, module_path};

/// Alias under which server and client artifacts import the DTO module.
pub const DTO_ALIAS: &str = "dto";

/// Inputs shared by every compiler.
///
/// Model and configuration are passed in explicitly; compilers hold no
/// other state.
pub struct Context<'a> {
    pub model: &'a ApiModel,
    pub config: &'a BuildConfig,
    pub mapper: TypeMapper<'a>,
    /// Path of the runtime crate in generated code.
    pub rt: syn::Path,
}

impl<'a> Context<'a> {
    pub fn new(model: &'a ApiModel, config: &'a BuildConfig) -> Self {
        Self {
            model,
            config,
            mapper: TypeMapper::new(model),
            rt: module_path(&config.runtime_crate),
        }
    }

    /// Path of the DTO module.
    pub fn dto_module(&self) -> syn::Path {
        module_path(&self.config.dto_module)
    }

    /// Path of the server module.
    pub fn server_module(&self) -> syn::Path {
        module_path(&self.config.server_module)
    }

    /// A mapper naming definitions as `dto::Name`.
    pub fn qualified_mapper(&self) -> TypeMapper<'a> {
        self.mapper.qualified(DTO_ALIAS)
    }

    /// `use crate::dto;`, or `use <path> as dto;` for other module names.
    pub fn dto_import(&self) -> TokenStream {
        let path = self.dto_module();
        let last = path.segments.last().map(|s| s.ident.to_string());
        if last.as_deref() == Some(DTO_ALIAS) {
            quote! { use #path; }
        } else {
            let alias = Ident::new(DTO_ALIAS, proc_macro2::Span::call_site());
            quote! { use #path as #alias; }
        }
    }
}

/// A parameter with its local binding and resolved type.
pub struct BoundParam<'p> {
    pub param: &'p Parameter,
    pub binding: Ident,
    pub mapped: MappedType,
    /// Where the parameter appears, for error messages.
    pub context: String,
}

/// Resolves every parameter of `op` in declaration order.
pub fn bind_parameters<'p>(
    mapper: &TypeMapper<'_>,
    op: &'p PathMethodModel,
) -> Result<Vec<BoundParam<'p>>, GeneratorError> {
    op.parameters
        .iter()
        .map(|param| {
            let context = format!("{} parameter '{}'", op.key(), param.name);
            Ok(BoundParam {
                param,
                binding: binding_ident(&param.name),
                mapped: mapper.resolve(&param.ty, &context)?,
                context,
            })
        })
        .collect()
}
