//! Semantic validation for the derive macro.

use std::collections::HashMap;

use crate::ir::{ParameterFieldIR, ParameterKind, ParametersIR};

/// Highest MIDI note number.
const MAX_NOTE: i64 = 127;

/// Validate the IR for semantic correctness.
pub fn validate(ir: &ParametersIR) -> syn::Result<()> {
    check_unique_string_ids(ir)?;
    check_no_hash_collisions(ir)?;
    for parameter in &ir.fields {
        validate_range_ordering(parameter)?;
        validate_default_in_range(parameter)?;
        validate_note_range(parameter)?;
    }
    Ok(())
}

/// Check that all string IDs are unique.
fn check_unique_string_ids(ir: &ParametersIR) -> syn::Result<()> {
    let mut seen: HashMap<&str, &syn::Ident> = HashMap::new();

    for parameter in &ir.fields {
        if let Some(first_field) = seen.get(parameter.string_id.as_str()) {
            return Err(syn::Error::new(
                parameter.span,
                format!(
                    "Duplicate parameter id \"{}\": already used by field `{}`",
                    parameter.string_id, first_field
                ),
            ));
        }
        seen.insert(&parameter.string_id, &parameter.field_name);
    }

    Ok(())
}

/// Check that no two parameter IDs hash to the same value.
fn check_no_hash_collisions(ir: &ParametersIR) -> syn::Result<()> {
    let mut seen: HashMap<u32, &str> = HashMap::new();

    for parameter in &ir.fields {
        if let Some(first_id) = seen.get(&parameter.hash_id) {
            return Err(syn::Error::new(
                parameter.span,
                format!(
                    "Parameter ID hash collision: \"{}\" and \"{}\" both hash to 0x{:08x}. \
                     Rename one of these parameters to avoid the collision.",
                    parameter.string_id, first_id, parameter.hash_id
                ),
            ));
        }
        seen.insert(parameter.hash_id, &parameter.string_id);
    }

    Ok(())
}

/// Range start must not exceed its end. A single-value range is allowed.
fn validate_range_ordering(parameter: &ParameterFieldIR) -> syn::Result<()> {
    let range = &parameter.range;
    if range.start > range.end {
        return Err(syn::Error::new(
            range.span,
            format!(
                "invalid range: start ({}) must not be greater than end ({})",
                range.start, range.end
            ),
        ));
    }
    Ok(())
}

fn validate_default_in_range(parameter: &ParameterFieldIR) -> syn::Result<()> {
    let range = &parameter.range;
    if parameter.default < range.start || parameter.default > range.end {
        return Err(syn::Error::new(
            parameter.span,
            format!(
                "default value {} is outside range {}..={}",
                parameter.default, range.start, range.end
            ),
        ));
    }
    Ok(())
}

/// `kind = "note"` ranges must stay within 0..=127.
fn validate_note_range(parameter: &ParameterFieldIR) -> syn::Result<()> {
    if parameter.kind != ParameterKind::Note {
        return Ok(());
    }
    let range = &parameter.range;
    if range.start < 0 || range.end > MAX_NOTE {
        return Err(syn::Error::new(
            range.span,
            format!(
                "kind = \"note\" requires a range within 0..={}, got {}..={}",
                MAX_NOTE, range.start, range.end
            ),
        ));
    }
    Ok(())
}
