//! Deterministic sample values for leaf elements and attributes.
//!
//! Enumerated simple types always yield their first enumeration value;
//! built-ins come from a fixed table. Nothing here is random: reproducible
//! corpora depend on it.

use crate::xsd::builtins::local_name;
use crate::xsd::SchemaModel;

pub struct ValueSynthesizer<'a> {
    model: &'a SchemaModel,
}

impl<'a> ValueSynthesizer<'a> {
    pub fn new(model: &'a SchemaModel) -> Self {
        ValueSynthesizer { model }
    }

    /// Produces a value for a node called `name` of the given datatype.
    /// `None` is treated as `xsd:string`.
    pub fn value_for(&self, name: &str, type_name: Option<&str>) -> String {
        let Some(type_name) = type_name else {
            return format!("{name}_value");
        };
        let local = local_name(type_name);
        if let Some(st) = self.model.simple_type(local) {
            if let Some(value) = st.first_enumeration() {
                return value.to_string();
            }
            // A restriction without enumerations falls back to its base.
            if let Some(base) = st.base.as_deref() {
                return builtin_sample(name, local_name(base));
            }
            return format!("{name}_value");
        }
        builtin_sample(name, local)
    }
}

fn builtin_sample(name: &str, local: &str) -> String {
    match local {
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
        | "positiveInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" => "42".to_string(),
        "nonPositiveInteger" => "0".to_string(),
        "negativeInteger" => "-42".to_string(),
        "decimal" | "float" => "123.45".to_string(),
        "double" => "123.456789".to_string(),
        "boolean" => "true".to_string(),
        "date" => "2024-01-01".to_string(),
        "dateTime" => "2024-01-01T00:00:00Z".to_string(),
        "time" => "10:30:00".to_string(),
        "gYear" => "2024".to_string(),
        "gYearMonth" => "2024-01".to_string(),
        "gMonth" => "--01".to_string(),
        "gMonthDay" => "--01-15".to_string(),
        "gDay" => "---15".to_string(),
        "base64Binary" => "QmFzZTY0RGF0YQ==".to_string(),
        "hexBinary" => "48656C6C6F".to_string(),
        "anyURI" => "http://example.com".to_string(),
        "language" => "en".to_string(),
        "ID" | "IDREF" => format!("id-{name}"),
        "NCName" | "Name" | "NMTOKEN" | "QName" => name.to_string(),
        "token" => format!("{name}_token"),
        _ => format!("{name}_value"),
    }
}
