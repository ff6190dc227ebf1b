use roxmltree::Node;

/// A `<simpleType>` definition. Only the pieces value synthesis needs are
/// kept: the restriction base and the enumeration facet values.
#[derive(Clone, Debug)]
pub struct SimpleType {
    pub name: Option<String>,
    pub base: Option<String>,
    /// Enumeration facet values in document order.
    pub enumerations: Vec<String>,
}

impl SimpleType {
    pub const TAG_NAME: &'static str = "simpleType";

    pub(super) fn map_from_xml(node: Node) -> Self {
        let base = node
            .descendants()
            .find(|d| d.is_element() && d.tag_name().name() == "restriction")
            .and_then(|r| r.attribute("base"))
            .map(str::to_string);
        let enumerations = node
            .descendants()
            .filter(|d| d.is_element() && d.tag_name().name() == "enumeration")
            .filter_map(|e| e.attribute("value"))
            .map(str::to_string)
            .collect();
        SimpleType {
            name: node.attribute("name").map(str::to_string),
            base,
            enumerations,
        }
    }

    /// The deterministic representative value of an enumerated type.
    pub fn first_enumeration(&self) -> Option<&str> {
        self.enumerations.first().map(String::as_str)
    }
}
