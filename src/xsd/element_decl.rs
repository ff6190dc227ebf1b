use roxmltree::Node;

use super::builtins::local_name;
use super::complex_type_def::ComplexType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

/// An `<element>` declaration, either global (schema child) or local
/// (particle of a model group).
#[derive(Clone, Debug)]
pub struct ElementDecl {
    pub name: Option<String>,
    /// Reference to a global element declaration, possibly prefixed.
    pub ref_name: Option<String>,
    /// Named type reference, possibly prefixed. Built-ins terminate descent.
    pub type_name: Option<String>,
    /// Anonymous `<complexType>` defined inline under the element.
    pub inline_type: Option<Box<ComplexType>>,
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
}

impl ElementDecl {
    pub const TAG_NAME: &'static str = "element";

    pub(super) fn map_from_xml(node: Node) -> Self {
        // {min occurs}: the value of the minOccurs attribute, otherwise 1.
        let min_occurs = node
            .attribute("minOccurs")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        // {max occurs}: unbounded, or the maxOccurs attribute, otherwise 1.
        let max_occurs = node
            .attribute("maxOccurs")
            .map(|v| {
                if v == "unbounded" {
                    MaxOccurs::Unbounded
                } else {
                    MaxOccurs::Count(v.parse().unwrap_or(1))
                }
            })
            .unwrap_or(MaxOccurs::Count(1));

        let inline_type = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == "complexType")
            .map(|c| Box::new(ComplexType::map_from_xml(c)));

        ElementDecl {
            name: node.attribute("name").map(str::to_string),
            ref_name: node.attribute("ref").map(str::to_string),
            type_name: node.attribute("type").map(str::to_string),
            inline_type,
            min_occurs,
            max_occurs,
        }
    }

    /// The local tag name this declaration contributes to an instance
    /// document: the declared name, or the local part of the reference.
    pub fn local_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.ref_name.as_deref().map(local_name))
    }

    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs >= 1
    }
}
