use roxmltree::Node;

use super::attribute_decl::AttributeDecl;
use super::model_group::{Compositor, ModelGroup};

/// A `complexContent`/`simpleContent` extension: the base type reference and
/// the attributes the extension adds on top of it.
#[derive(Clone, Debug)]
pub struct Extension {
    pub base: String,
    pub attributes: Vec<AttributeDecl>,
}

/// A `<complexType>` definition, named or anonymous.
///
/// Content containers are flattened into `groups` in document order; a
/// `sequence` nested inside another `sequence` (or inside an extension)
/// yields its own group. Containers belonging to an inline type of a child
/// element are *not* included here; they are reached by descending through
/// the child's `inline_type`.
#[derive(Clone, Debug)]
pub struct ComplexType {
    pub name: Option<String>,
    /// Attributes declared directly on the type (extensions carry theirs).
    pub attributes: Vec<AttributeDecl>,
    pub extensions: Vec<Extension>,
    pub groups: Vec<ModelGroup>,
    /// True for `simpleContent` types: the element carries character data.
    pub simple_content: bool,
}

impl ComplexType {
    pub const TAG_NAME: &'static str = "complexType";

    pub(super) fn map_from_xml(node: Node) -> Self {
        let name = node.attribute("name").map(str::to_string);
        let attributes = node
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == AttributeDecl::TAG_NAME)
            .filter_map(AttributeDecl::map_from_xml)
            .collect();

        let mut ty = ComplexType {
            name,
            attributes,
            extensions: Vec::new(),
            groups: Vec::new(),
            simple_content: false,
        };
        collect_content(node, &mut ty);
        ty
    }

    /// The textual datatype of a `simpleContent` type, taken from the
    /// extension base.
    pub fn simple_content_base(&self) -> Option<&str> {
        if self.simple_content {
            self.extensions.first().map(|e| e.base.as_str())
        } else {
            None
        }
    }

    /// All attribute declarations visible on this type itself: direct ones
    /// plus those added by extensions. Attributes inherited from an
    /// extension base live on the base type.
    pub fn own_attributes(&self) -> impl Iterator<Item = &AttributeDecl> {
        self.attributes
            .iter()
            .chain(self.extensions.iter().flat_map(|e| e.attributes.iter()))
    }
}

/// Walks the content of a complex type, collecting model groups and
/// extensions. Recursion stops at `element` boundaries: whatever is nested
/// under a child element belongs to that element's own (inline) type.
fn collect_content(node: Node, ty: &mut ComplexType) {
    for child in node.children().filter(|c| c.is_element()) {
        let tag = child.tag_name().name();
        if let Some(compositor) = Compositor::from_tag(tag) {
            ty.groups.push(ModelGroup::map_from_xml(child, compositor));
            collect_content(child, ty);
            continue;
        }
        match tag {
            "simpleContent" => {
                ty.simple_content = true;
                collect_content(child, ty);
            }
            "complexContent" | "restriction" => collect_content(child, ty),
            "extension" => {
                if let Some(base) = child.attribute("base") {
                    let attributes = child
                        .children()
                        .filter(|c| {
                            c.is_element() && c.tag_name().name() == AttributeDecl::TAG_NAME
                        })
                        .filter_map(AttributeDecl::map_from_xml)
                        .collect();
                    ty.extensions.push(Extension {
                        base: base.to_string(),
                        attributes,
                    });
                }
                collect_content(child, ty);
            }
            _ => {}
        }
    }
}
