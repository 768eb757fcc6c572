//! Code generation for `#[derive(Parameters)]`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::ir::{ParameterKind, ParametersIR};

/// Generate all code for the derive macro.
pub fn generate(ir: &ParametersIR) -> TokenStream {
    let const_ids = generate_const_ids(ir);
    let collision_check = generate_collision_check(ir);
    let default_impl = generate_default_impl(ir);
    let parameters_impl = generate_parameters_impl(ir);
    let store_impl = generate_store_impl(ir);

    quote! {
        #const_ids
        #collision_check
        #default_impl
        #parameters_impl
        #store_impl
    }
}

/// Generate a public id constant for each parameter.
fn generate_const_ids(ir: &ParametersIR) -> TokenStream {
    let struct_name = &ir.struct_name;
    let (impl_generics, ty_generics, where_clause) = ir.generics.split_for_impl();

    let const_defs: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let const_name = param.const_name();
            let hash = param.hash_id;
            let doc = format!("Numeric id of `{}`.", param.string_id);
            quote! {
                #[doc = #doc]
                pub const #const_name: ::notegate::core::types::ParameterId = #hash;
            }
        })
        .collect();

    quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#const_defs)*
        }
    }
}

/// Generate compile-time collision detection.
fn generate_collision_check(ir: &ParametersIR) -> TokenStream {
    if ir.param_count() < 2 {
        return quote! {};
    }

    let id_pairs: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let id_str = &param.string_id;
            let hash = param.hash_id;
            quote! { (#id_str, #hash) }
        })
        .collect();

    let struct_name = &ir.struct_name;

    quote! {
        const _: () = {
            const IDS: &[(&str, u32)] = &[#(#id_pairs),*];

            let mut i = 0;
            while i < IDS.len() {
                let mut j = i + 1;
                while j < IDS.len() {
                    if IDS[i].1 == IDS[j].1 {
                        panic!(concat!(
                            "Parameter ID hash collision in ",
                            stringify!(#struct_name),
                            ": two IDs hash to the same value"
                        ));
                    }
                    j += 1;
                }
                i += 1;
            }
        };
    }
}

/// Generate `Default` from the declarative attributes.
fn generate_default_impl(ir: &ParametersIR) -> TokenStream {
    let struct_name = &ir.struct_name;
    let (impl_generics, ty_generics, where_clause) = ir.generics.split_for_impl();

    let field_inits: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let field = &param.field_name;
            let name = &param.name;
            let default = param.default;
            let start = param.range.start;
            let end = param.range.end;
            let id_str = &param.string_id;

            let constructor = match param.kind {
                ParameterKind::Note => quote! {
                    ::notegate::core::IntParameter::note(#name, #default, #start..=#end)
                },
                ParameterKind::Int => quote! {
                    ::notegate::core::IntParameter::new(#name, #default, #start..=#end)
                },
            };
            let short_name = param
                .short_name
                .as_ref()
                .map(|short| quote! { .with_short_name(#short) });

            quote! {
                #field: #constructor.with_key(#id_str) #short_name
            }
        })
        .collect();

    quote! {
        impl #impl_generics ::std::default::Default for #struct_name #ty_generics #where_clause {
            fn default() -> Self {
                Self {
                    #(#field_inits),*
                }
            }
        }
    }
}

/// Generate the `Parameters` trait implementation.
///
/// State save/load and reset use the trait's key-based defaults.
fn generate_parameters_impl(ir: &ParametersIR) -> TokenStream {
    let struct_name = &ir.struct_name;
    let (impl_generics, ty_generics, where_clause) = ir.generics.split_for_impl();
    let param_count = ir.param_count();

    let param_refs: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let field = &param.field_name;
            quote! { &self.#field as &dyn ::notegate::core::ParameterRef }
        })
        .collect();

    let by_id_arms: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let field = &param.field_name;
            let const_name = param.const_name();
            quote! {
                Self::#const_name => Some(&self.#field),
            }
        })
        .collect();

    quote! {
        impl #impl_generics ::notegate::core::Parameters for #struct_name #ty_generics #where_clause {
            fn count(&self) -> usize {
                #param_count
            }

            fn iter(&self) -> Box<dyn Iterator<Item = &dyn ::notegate::core::ParameterRef> + '_> {
                Box::new([#(#param_refs),*].into_iter())
            }

            fn by_id(&self, id: ::notegate::core::types::ParameterId) -> Option<&dyn ::notegate::core::ParameterRef> {
                match id {
                    #(#by_id_arms)*
                    _ => None,
                }
            }
        }
    }
}

/// Generate the host-facing `ParameterStore` implementation.
///
/// Calls are fully qualified because `Parameters` and `ParameterStore` share
/// method names.
fn generate_store_impl(ir: &ParametersIR) -> TokenStream {
    let struct_name = &ir.struct_name;
    let (impl_generics, ty_generics, where_clause) = ir.generics.split_for_impl();
    let param_count = ir.param_count();

    let info_arms: Vec<TokenStream> = ir
        .fields
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let field = &param.field_name;
            quote! {
                #index => Some(self.#field.info()),
            }
        })
        .collect();

    let get_arms: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let field = &param.field_name;
            let const_name = param.const_name();
            quote! {
                Self::#const_name => ::notegate::core::ParameterRef::get_normalized(&self.#field),
            }
        })
        .collect();

    let set_arms: Vec<TokenStream> = ir
        .fields
        .iter()
        .map(|param| {
            let field = &param.field_name;
            let const_name = param.const_name();
            quote! {
                Self::#const_name => ::notegate::core::ParameterRef::set_normalized(&self.#field, value),
            }
        })
        .collect();

    quote! {
        impl #impl_generics ::notegate::core::ParameterStore for #struct_name #ty_generics #where_clause {
            fn count(&self) -> usize {
                #param_count
            }

            fn info(&self, index: usize) -> Option<&::notegate::core::ParameterInfo> {
                match index {
                    #(#info_arms)*
                    _ => None,
                }
            }

            fn get_normalized(&self, id: ::notegate::core::types::ParameterId) -> ::notegate::core::types::ParameterValue {
                match id {
                    #(#get_arms)*
                    _ => 0.0,
                }
            }

            fn set_normalized(&self, id: ::notegate::core::types::ParameterId, value: ::notegate::core::types::ParameterValue) {
                match id {
                    #(#set_arms)*
                    _ => {}
                }
            }

            fn normalized_to_string(&self, id: ::notegate::core::types::ParameterId, normalized: ::notegate::core::types::ParameterValue) -> String {
                ::notegate::core::Parameters::by_id(self, id)
                    .map(|p| p.display_normalized(normalized))
                    .unwrap_or_default()
            }

            fn string_to_normalized(&self, id: ::notegate::core::types::ParameterId, string: &str) -> Option<::notegate::core::types::ParameterValue> {
                ::notegate::core::Parameters::by_id(self, id).and_then(|p| p.parse(string))
            }

            fn normalized_to_plain(&self, id: ::notegate::core::types::ParameterId, normalized: ::notegate::core::types::ParameterValue) -> ::notegate::core::types::ParameterValue {
                ::notegate::core::Parameters::by_id(self, id)
                    .map(|p| p.normalized_to_plain(normalized))
                    .unwrap_or(0.0)
            }

            fn plain_to_normalized(&self, id: ::notegate::core::types::ParameterId, plain: ::notegate::core::types::ParameterValue) -> ::notegate::core::types::ParameterValue {
                ::notegate::core::Parameters::by_id(self, id)
                    .map(|p| p.plain_to_normalized(plain))
                    .unwrap_or(0.0)
            }
        }
    }
}
