use std::collections::HashSet;

use lazy_static::lazy_static;

// Namespaces relevant to schema-driven generation
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const DSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

lazy_static! {
    /// Local names of the XSD built-in datatypes. References to these
    /// terminate traversal: a built-in has no element or attribute children.
    static ref BUILTIN_DATATYPES: HashSet<&'static str> = [
        "string",
        "integer",
        "date",
        "dateTime",
        "boolean",
        "decimal",
        "float",
        "double",
        "time",
        "gYear",
        "gYearMonth",
        "gMonth",
        "gMonthDay",
        "gDay",
        "hexBinary",
        "base64Binary",
        "anyURI",
        "QName",
        "NOTATION",
        "normalizedString",
        "token",
        "language",
        "NMTOKEN",
        "NMTOKENS",
        "Name",
        "NCName",
        "ID",
        "IDREF",
        "IDREFS",
        "ENTITY",
        "ENTITIES",
        "long",
        "int",
        "short",
        "byte",
        "nonNegativeInteger",
        "positiveInteger",
        "unsignedLong",
        "unsignedInt",
        "unsignedShort",
        "unsignedByte",
        "nonPositiveInteger",
        "negativeInteger",
    ]
    .into_iter()
    .collect();
}

/// Whether `name` (already stripped of any prefix) is a built-in datatype.
pub fn is_builtin(local_name: &str) -> bool {
    BUILTIN_DATATYPES.contains(local_name)
}

/// Strips a namespace prefix: `my:ItemType` becomes `ItemType`.
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
