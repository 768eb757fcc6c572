//! AST parsing for the derive macro.
//!
//! Turns a `syn::DeriveInput` into [`ParametersIR`].

use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields};

use crate::ir::{ParameterFieldIR, ParameterKind, ParametersIR, RangeSpec};
use notegate_utils::fnv1a_32;

/// Longest id that fits the one-byte key length of the state format.
const MAX_ID_LEN: usize = u8::MAX as usize;

/// Parse a `DeriveInput` into the intermediate representation.
pub fn parse(input: DeriveInput) -> syn::Result<ParametersIR> {
    let data_struct = match &input.data {
        Data::Struct(s) => s,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(Parameters)] only supports structs, not enums",
            ))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(Parameters)] only supports structs, not unions",
            ))
        }
    };

    let fields = match &data_struct.fields {
        Fields::Named(named) => &named.named,
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(Parameters)] only supports structs with named fields",
            ))
        }
        Fields::Unit => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(Parameters)] requires at least one field",
            ))
        }
    };

    let mut parsed_fields = Vec::new();
    for field in fields {
        match field.attrs.iter().find(|attr| attr.path().is_ident("parameter")) {
            Some(attr) => parsed_fields.push(parse_parameter_field(field, attr)?),
            None => {
                // Every field is built by the generated Default, so plain
                // fields would have no value to start from.
                return Err(syn::Error::new_spanned(
                    field,
                    "every field of a #[derive(Parameters)] struct needs a #[parameter(...)] attribute",
                ));
            }
        }
    }

    if parsed_fields.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "#[derive(Parameters)] requires at least one #[parameter] field",
        ));
    }

    Ok(ParametersIR {
        struct_name: input.ident.clone(),
        generics: input.generics.clone(),
        fields: parsed_fields,
    })
}

/// Parse a field with a `#[parameter(...)]` attribute.
fn parse_parameter_field(field: &Field, attr: &syn::Attribute) -> syn::Result<ParameterFieldIR> {
    let field_name = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Field must have a name"))?;

    if extract_type_name(&field.ty).as_deref() != Some("IntParameter") {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "#[parameter] can only be used on IntParameter fields",
        ));
    }

    let mut string_id: Option<String> = None;
    let mut name: Option<String> = None;
    let mut short_name: Option<String> = None;
    let mut default: Option<i64> = None;
    let mut range: Option<RangeSpec> = None;
    let mut kind = ParameterKind::default();

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("id") {
            let value: syn::LitStr = meta.value()?.parse()?;
            string_id = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("name") {
            let value: syn::LitStr = meta.value()?.parse()?;
            name = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("short_name") {
            let value: syn::LitStr = meta.value()?.parse()?;
            short_name = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("default") {
            let expr: syn::Expr = meta.value()?.parse()?;
            default = Some(parse_int_expr(&expr)?);
            Ok(())
        } else if meta.path.is_ident("range") {
            range = Some(parse_range_spec(&meta)?);
            Ok(())
        } else if meta.path.is_ident("kind") {
            let value: syn::LitStr = meta.value()?.parse()?;
            let kind_str = value.value();
            kind = ParameterKind::from_str(&kind_str).ok_or_else(|| {
                syn::Error::new_spanned(
                    &value,
                    format!("unknown kind '{}'. Valid kinds: int, note", kind_str),
                )
            })?;
            Ok(())
        } else {
            Err(meta.error(
                "unknown attribute. Expected: id, name, default, range, kind, short_name",
            ))
        }
    })?;

    let missing = |what: &str| {
        syn::Error::new_spanned(
            attr,
            format!(
                "#[parameter] on field `{}` requires {} attribute",
                field_name, what
            ),
        )
    };

    let string_id = string_id.ok_or_else(|| missing("an id = \"...\""))?;
    let name = name.ok_or_else(|| missing("a name = \"...\""))?;
    let default = default.ok_or_else(|| missing("a default = <int>"))?;
    let range = range.ok_or_else(|| missing("a range = <start>..=<end>"))?;

    if string_id.is_empty() {
        return Err(syn::Error::new_spanned(attr, "parameter id cannot be empty"));
    }
    if string_id.len() > MAX_ID_LEN {
        return Err(syn::Error::new_spanned(
            attr,
            format!(
                "parameter id '{}' is {} bytes long; the limit is {}",
                string_id,
                string_id.len(),
                MAX_ID_LEN
            ),
        ));
    }
    if string_id.contains('/') {
        return Err(syn::Error::new_spanned(
            attr,
            format!("parameter id '{}' cannot contain '/'", string_id),
        ));
    }

    let hash_id = fnv1a_32(&string_id);

    Ok(ParameterFieldIR {
        field_name,
        string_id,
        hash_id,
        name,
        short_name,
        default,
        range,
        kind,
        span: attr.path().segments[0].ident.span(),
    })
}

/// Parse an integer literal, optionally negated.
fn parse_int_expr(expr: &syn::Expr) -> syn::Result<i64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(i),
            ..
        }) => i.base10_parse(),
        syn::Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            let value = parse_int_expr(&unary.expr)?;
            Ok(-value)
        }
        syn::Expr::Paren(paren) => parse_int_expr(&paren.expr),
        _ => Err(syn::Error::new_spanned(
            expr,
            "expected an integer literal (e.g., 60, -12)",
        )),
    }
}

/// Parse a range specification from `range = start..=end`.
fn parse_range_spec(meta: &syn::meta::ParseNestedMeta) -> syn::Result<RangeSpec> {
    let expr: syn::ExprRange = meta.value()?.parse().map_err(|_| {
        syn::Error::new(
            meta.path.span(),
            "range must be an inclusive range expression like `0..=127`",
        )
    })?;

    if !matches!(expr.limits, syn::RangeLimits::Closed(_)) {
        return Err(syn::Error::new_spanned(
            &expr,
            "range must be inclusive (use ..= not ..)",
        ));
    }

    let start_expr = expr
        .start
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(&expr, "range must have a start value"))?;
    let end_expr = expr
        .end
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(&expr, "range must have an end value"))?;

    Ok(RangeSpec {
        start: parse_int_expr(start_expr)?,
        end: parse_int_expr(end_expr)?,
        span: expr.span(),
    })
}

/// Last path segment of a type, e.g. `IntParameter` for
/// `notegate::core::IntParameter`.
fn extract_type_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}
