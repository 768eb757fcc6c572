//! Derive macro for the `HasParameters` trait.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, Ident, PathArguments, Type};

/// Derive `HasParameters` for a struct with a `#[parameters]` field.
///
/// An `Arc<T>` field exposes `T` as the parameter type, so processors can
/// share the collection with an editor.
pub fn derive_has_parameters_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "HasParameters can only be derived for structs with named fields",
                ));
            }
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "HasParameters cannot be derived for unit structs",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "HasParameters can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "HasParameters can only be derived for structs, not unions",
            ));
        }
    };

    let mut parameters_field: Option<(&Ident, &Type)> = None;

    for field in fields {
        if !field.attrs.iter().any(|attr| attr.path().is_ident("parameters")) {
            continue;
        }
        if parameters_field.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "Only one field can be marked with #[parameters]",
            ));
        }
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "Field must have a name"))?;
        parameters_field = Some((field_ident, &field.ty));
    }

    let (field_name, field_type) = parameters_field.ok_or_else(|| {
        syn::Error::new_spanned(
            struct_name,
            "No field marked with #[parameters]. Add #[parameters] to the field containing your parameters.\n\
             Example:\n\
             #[derive(HasParameters)]\n\
             struct MyPlugin {\n\
                 #[parameters]\n\
                 parameters: MyParameters,\n\
             }",
        )
    })?;

    let (parameters_type, accessor) = match arc_inner(field_type) {
        Some(inner) => (inner, quote! { &*self.#field_name }),
        None => (field_type, quote! { &self.#field_name }),
    };

    Ok(quote! {
        impl #impl_generics ::notegate::core::plugin::HasParameters for #struct_name #ty_generics #where_clause {
            type Parameters = #parameters_type;

            fn parameters(&self) -> &Self::Parameters {
                #accessor
            }
        }
    })
}

/// `T` for a field typed `Arc<T>` (any path ending in `Arc`).
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
