//! Application glue.
//!
//! Emits `application(server) -> Router`, which runs every registration
//! function of the server in route-table order and attaches the server as
//! shared state.

use proc_macro2::TokenStream;
use quote::quote;

use super::Context;
use super::server::route_table;
use crate::errors::GeneratorError;
use crate::naming::{ident, server_name};

/// Generates the application artifact.
pub fn generate_application(ctx: &Context<'_>) -> Result<TokenStream, GeneratorError> {
    let rt = &ctx.rt;
    let server = ident(&server_name(ctx.model, ctx.config));
    let server_module = ctx.server_module();

    let registrations = route_table(ctx.model).into_iter().map(|group| {
        let function = ident(&group.function);
        quote! { let router = #server::<A>::#function(router); }
    });

    Ok(quote! {
        use std::sync::Arc;

        use #rt::axum::Router;
        use #rt::server::Authenticator;
        use #server_module::#server;

        /// Builds the router serving every operation of the API.
        ///
        /// Each registration function mounts its routes; the server becomes
        /// the shared state of all handlers.
        pub fn application<A: Authenticator>(server: #server<A>) -> Router {
            let router: Router<Arc<#server<A>>> = Router::new();
            #(#registrations)*
            router.with_state(Arc::new(server))
        }
    })
}
