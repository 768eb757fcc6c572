//! Derive macros for the NoteGate plugin framework.
//!
//! - `#[derive(Parameters)]` implements `Parameters`, `ParameterStore` and
//!   `Default` for a struct of `IntParameter` fields.
//! - `#[derive(HasParameters)]` implements `HasParameters` for a plugin or
//!   processor struct with a `#[parameters]` field.
//!
//! # Example
//!
//! ```ignore
//! use notegate::prelude::*;
//!
//! #[derive(Parameters)]
//! pub struct GateParameters {
//!     #[parameter(id = "triggerNote", name = "Trigger Note", default = 60, range = 0..=127, kind = "note")]
//!     pub trigger_note: IntParameter,
//! }
//!
//! #[derive(Default, HasParameters)]
//! pub struct GatePlugin {
//!     #[parameters]
//!     parameters: std::sync::Arc<GateParameters>,
//! }
//! ```

use proc_macro::TokenStream;

mod codegen;
mod has_parameters;
mod ir;
mod parse;
mod validate;

/// Derive macro for parameter collections.
///
/// Generates:
/// - `Parameters` (count, iter, by_id; state save/load use the trait defaults)
/// - `ParameterStore` (host-facing normalized access)
/// - `Default`, built from the declarative attributes
/// - a `PARAM_<FIELD>_ID` constant per field
/// - a compile-time hash collision check
///
/// # Attributes
///
/// `#[parameter(...)]` is required on every `IntParameter` field:
///
/// - `id = "..."`: stable string key, hashed to the numeric id with FNV-1a
/// - `name = "..."`: display name
/// - `default = <int>`
/// - `range = <int>..=<int>`
/// - `kind = "note" | "int"`: display as a note name or a plain number (default `"int"`)
/// - `short_name = "..."`: optional abbreviated name
#[proc_macro_derive(Parameters, attributes(parameter))]
pub fn derive_parameters(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    match derive_parameters_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_parameters_impl(input: syn::DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ir = parse::parse(input)?;
    validate::validate(&ir)?;
    Ok(codegen::generate(&ir))
}

/// Derive macro for `HasParameters`.
///
/// Exactly one field must carry `#[parameters]`. The field may hold the
/// parameter struct directly or wrapped in an `Arc`.
#[proc_macro_derive(HasParameters, attributes(parameters))]
pub fn derive_has_parameters(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    match has_parameters::derive_has_parameters_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
