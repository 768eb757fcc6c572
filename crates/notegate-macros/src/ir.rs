//! Intermediate representation for the derive macro.
//!
//! Produced by [`parse`](crate::parse), checked by
//! [`validate`](crate::validate), consumed by [`codegen`](crate::codegen).

use proc_macro2::Span;

/// A parsed parameter struct.
pub struct ParametersIR {
    /// The struct name (e.g., `GateParameters`)
    pub struct_name: syn::Ident,
    pub generics: syn::Generics,
    pub fields: Vec<ParameterFieldIR>,
}

/// One `#[parameter(...)]` field.
pub struct ParameterFieldIR {
    /// Field name (e.g., `trigger_note`)
    pub field_name: syn::Ident,
    /// String id from `id = "..."`
    pub string_id: String,
    /// FNV-1a hash of the string id
    pub hash_id: u32,
    pub name: String,
    pub short_name: Option<String>,
    pub default: i64,
    pub range: RangeSpec,
    pub kind: ParameterKind,
    /// Span of the attribute, for error reporting
    pub span: Span,
}

/// Inclusive integer range from `range = start..=end`.
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
    pub span: Span,
}

/// How the parameter value is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    /// Plain integer
    #[default]
    Int,
    /// MIDI note number shown as a note name
    Note,
}

impl ParameterKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "int" => Some(Self::Int),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

impl ParametersIR {
    pub fn param_count(&self) -> usize {
        self.fields.len()
    }
}

impl ParameterFieldIR {
    /// Name of the generated id constant.
    ///
    /// E.g., `trigger_note` -> `PARAM_TRIGGER_NOTE_ID`
    pub fn const_name(&self) -> syn::Ident {
        let name = self.field_name.to_string().to_uppercase();
        syn::Ident::new(&format!("PARAM_{}_ID", name), self.span)
    }
}
