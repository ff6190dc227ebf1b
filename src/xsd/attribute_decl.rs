use roxmltree::Node;

/// Attribute use, from the `use` attribute of an attribute declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttributeUse {
    Optional,
    Prohibited,
    Required,
}

/// A single `<attribute>` declaration inside a complex type.
#[derive(Clone, Debug)]
pub struct AttributeDecl {
    pub name: String,
    /// Datatype reference; `None` falls back to `xsd:string`.
    pub type_name: Option<String>,
    pub use_: AttributeUse,
}

impl AttributeDecl {
    pub const TAG_NAME: &'static str = "attribute";

    /// Maps an `<attribute>` node. Declarations without a `name` (e.g. pure
    /// `ref` uses) are skipped by returning `None`.
    pub(super) fn map_from_xml(node: Node) -> Option<Self> {
        let name = node.attribute("name")?.to_string();
        let type_name = node.attribute("type").map(str::to_string);
        // The default for `use` is optional.
        let use_ = match node.attribute("use") {
            Some("required") => AttributeUse::Required,
            Some("prohibited") => AttributeUse::Prohibited,
            _ => AttributeUse::Optional,
        };
        Some(AttributeDecl {
            name,
            type_name,
            use_,
        })
    }

    pub fn is_required(&self) -> bool {
        self.use_ == AttributeUse::Required
    }

    pub fn is_optional(&self) -> bool {
        self.use_ == AttributeUse::Optional
    }
}
