use roxmltree::Node;

use super::element_decl::ElementDecl;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    Sequence,
    Choice,
    All,
}

impl Compositor {
    pub(super) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Compositor::Sequence),
            "choice" => Some(Compositor::Choice),
            "all" => Some(Compositor::All),
            _ => None,
        }
    }
}

/// A content container (`sequence`, `choice` or `all`) with its direct
/// element particles. Nested containers are recorded as separate groups by
/// the complex-type mapping; element children of a `choice` are the mutually
/// exclusive alternatives.
#[derive(Clone, Debug)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Vec<ElementDecl>,
}

impl ModelGroup {
    pub(super) fn map_from_xml(node: Node, compositor: Compositor) -> Self {
        let particles = node
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == ElementDecl::TAG_NAME)
            .map(ElementDecl::map_from_xml)
            .collect();
        ModelGroup {
            compositor,
            particles,
        }
    }

    pub fn is_choice(&self) -> bool {
        self.compositor == Compositor::Choice
    }
}
