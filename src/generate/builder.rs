//! Materialization of one schema-valid XML document under a parameter
//! assignment. The builder injects every required element and attribute,
//! honors choice selection and the recursion bound, and records the set of
//! paths it touched so selectors can score the result.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::xsd::builtins::{local_name, DSIG_NAMESPACE, XSI_NAMESPACE};
use crate::xsd::{ComplexType, Compositor, ElementDecl, SchemaModel, TypeDefinition};

use super::tree::XmlElement;
use super::value::ValueSynthesizer;

/// How many further element levels a depth-exhausted required subtree is
/// stubbed out with.
const STUB_LEVELS: u32 = 2;

/// A materialized candidate with its precomputed coverage contribution.
#[derive(Clone, Debug)]
pub struct XmlSnippet {
    pub root: XmlElement,
    pub covered_paths: BTreeSet<String>,
    pub depth: u32,
}

impl XmlSnippet {
    pub fn to_xml_string(&self) -> Result<String, super::tree::XmlWriteError> {
        self.root.to_xml_string()
    }
}

/// Governs whether optional structure is emitted.
#[derive(Copy, Clone, Debug)]
pub enum OptionalMode<'a> {
    /// Emit every optional element and attribute.
    All,
    /// Emit required structure only.
    RequiredOnly,
    /// Emit exactly what a test pattern asks for. Optional paths outside
    /// `universe` are not parameters of this run and are treated as
    /// structurally required.
    Assignment {
        included: &'a HashSet<String>,
        universe: &'a HashSet<String>,
    },
}

impl OptionalMode<'_> {
    fn admits(&self, path: &str) -> bool {
        match self {
            OptionalMode::All => true,
            OptionalMode::RequiredOnly => false,
            OptionalMode::Assignment { included, universe } => {
                included.contains(path) || !universe.contains(path)
            }
        }
    }

    fn is_assignment(&self) -> bool {
        matches!(self, OptionalMode::Assignment { .. })
    }
}

#[derive(Clone, Debug)]
pub struct BuilderConfig {
    /// Hard recursion ceiling; per-candidate depth bounds are clamped to it.
    pub max_depth: u32,
    /// Default namespace written on the root element.
    pub namespace: Option<String>,
    /// Written as `xsi:schemaLocation="{namespace} {schema_location}"` when
    /// both are present.
    pub schema_location: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            max_depth: 10,
            namespace: None,
            schema_location: None,
        }
    }
}

pub struct CandidateBuilder<'a> {
    model: &'a SchemaModel,
    values: ValueSynthesizer<'a>,
    config: BuilderConfig,
}

type Frame = (String, String, u32);

struct BuildState {
    covered: BTreeSet<String>,
    active: HashSet<Frame>,
}

impl<'a> CandidateBuilder<'a> {
    pub fn new(model: &'a SchemaModel, config: BuilderConfig) -> Self {
        CandidateBuilder {
            model,
            values: ValueSynthesizer::new(model),
            config,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    /// Builds one document rooted at `root`, descending at most
    /// `depth_bound` element levels. Returns `None` for nameless roots.
    pub fn build(
        &self,
        root: &ElementDecl,
        depth_bound: u32,
        mode: &OptionalMode,
        choice_index: usize,
    ) -> Option<XmlSnippet> {
        let name = root.name.as_deref()?;
        let bound = depth_bound.max(1).min(self.config.max_depth.max(1));

        let mut elem = XmlElement::new(local_name(name));
        if let Some(ns) = &self.config.namespace {
            elem.set_attribute("xmlns", ns.clone());
            if let Some(location) = &self.config.schema_location {
                elem.set_attribute("xmlns:xsi", XSI_NAMESPACE);
                elem.set_attribute("xsi:schemaLocation", format!("{ns} {location}"));
            }
        }

        let path = format!("/{}", local_name(name));
        let mut state = BuildState {
            covered: BTreeSet::new(),
            active: HashSet::new(),
        };
        state.covered.insert(path.clone());
        self.populate_element(&mut elem, &path, root, 1, bound, mode, choice_index, &mut state);

        Some(XmlSnippet {
            root: elem,
            covered_paths: state.covered,
            depth: bound,
        })
    }

    /// Fills in the content of an already-created element according to its
    /// declaration: text for leaves, attributes and children for complex
    /// types.
    #[allow(clippy::too_many_arguments)]
    fn populate_element(
        &self,
        elem: &mut XmlElement,
        path: &str,
        decl: &ElementDecl,
        depth: u32,
        bound: u32,
        mode: &OptionalMode,
        choice_index: usize,
        state: &mut BuildState,
    ) {
        if let Some(inline) = &decl.inline_type {
            self.populate_complex(elem, path, inline, depth, bound, mode, choice_index, state);
            return;
        }
        if let Some(type_name) = decl.type_name.as_deref() {
            let local = local_name(type_name);
            match self.model.type_definition(local) {
                Some(TypeDefinition::Complex(ct)) => {
                    let frame: Frame = (path.to_string(), local.to_string(), depth);
                    if !state.active.insert(frame.clone()) {
                        return;
                    }
                    self.populate_complex(elem, path, ct, depth, bound, mode, choice_index, state);
                    state.active.remove(&frame);
                }
                // Simple and built-in types are leaves with character data.
                _ => elem.text = Some(self.values.value_for(&elem.name, Some(type_name))),
            }
            return;
        }
        if let Some(ref_name) = decl.ref_name.as_deref() {
            if let Some(target) = self.model.global_element(ref_name) {
                // The referenced declaration carries the content; the path
                // stays where the reference appears.
                self.populate_element(elem, path, target, depth, bound, mode, choice_index, state);
            }
            return;
        }
        // No type information at all: emit a generic text leaf.
        elem.text = Some(self.values.value_for(&elem.name, None));
    }

    #[allow(clippy::too_many_arguments)]
    fn populate_complex(
        &self,
        elem: &mut XmlElement,
        path: &str,
        ty: &ComplexType,
        depth: u32,
        bound: u32,
        mode: &OptionalMode,
        choice_index: usize,
        state: &mut BuildState,
    ) {
        if let Some(base) = ty.simple_content_base() {
            elem.text = Some(self.values.value_for(&elem.name, Some(base)));
        }

        // Base type content first, derived additions after.
        for ext in &ty.extensions {
            let base_local = local_name(&ext.base).to_string();
            if let Some(base_ty) = self.model.complex_type(&base_local) {
                let frame: Frame = (path.to_string(), base_local, depth);
                if state.active.insert(frame.clone()) {
                    self.populate_complex(
                        elem,
                        path,
                        base_ty,
                        depth,
                        bound,
                        mode,
                        choice_index,
                        state,
                    );
                    state.active.remove(&frame);
                }
            }
            for attr in &ext.attributes {
                self.apply_attribute(elem, path, attr, mode, state);
            }
        }
        for attr in &ty.attributes {
            self.apply_attribute(elem, path, attr, mode, state);
        }

        for group in &ty.groups {
            match group.compositor {
                Compositor::Sequence | Compositor::All => {
                    for particle in &group.particles {
                        self.emit_particle(
                            elem,
                            path,
                            particle,
                            depth,
                            bound,
                            mode,
                            choice_index,
                            state,
                            false,
                        );
                    }
                }
                Compositor::Choice => {
                    if group.particles.is_empty() {
                        continue;
                    }
                    let chosen = if mode.is_assignment() {
                        self.choose_assigned(&group.particles, path, mode)
                    } else {
                        choice_index % group.particles.len()
                    };
                    self.emit_particle(
                        elem,
                        path,
                        &group.particles[chosen],
                        depth,
                        bound,
                        mode,
                        choice_index,
                        state,
                        true,
                    );
                }
            }
        }
    }

    /// Picks the choice alternative whose path the assignment sets to true,
    /// falling back to the first.
    fn choose_assigned(
        &self,
        particles: &[ElementDecl],
        path: &str,
        mode: &OptionalMode,
    ) -> usize {
        let OptionalMode::Assignment { included, .. } = mode else {
            return 0;
        };
        particles
            .iter()
            .position(|p| {
                p.local_name()
                    .map(|name| included.contains(&format!("{path}/{name}")))
                    .unwrap_or(false)
            })
            .unwrap_or(0)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_particle(
        &self,
        parent: &mut XmlElement,
        parent_path: &str,
        particle: &ElementDecl,
        depth: u32,
        bound: u32,
        mode: &OptionalMode,
        choice_index: usize,
        state: &mut BuildState,
        chosen_by_choice: bool,
    ) {
        let Some(name) = particle.local_name() else {
            return;
        };
        let child_path = format!("{parent_path}/{name}");

        if !chosen_by_choice && particle.is_optional() && !mode.admits(&child_path) {
            return;
        }

        let child_depth = depth + 1;
        if child_depth > bound {
            // Required structure is never dropped: stub it out minimally.
            if particle.is_required() || chosen_by_choice {
                self.emit_stub(parent, particle, &child_path, child_depth, STUB_LEVELS, state);
            }
            return;
        }

        // Required children referencing an imported schema cannot be
        // expanded from the model; a Signature gets the hand-crafted
        // XML-DSig skeleton, anything else a bare placeholder.
        if particle.name.is_none() {
            if let Some(ref_name) = particle.ref_name.as_deref() {
                if self.model.global_element(ref_name).is_none() {
                    state.covered.insert(child_path.clone());
                    if local_name(ref_name) == "Signature" {
                        parent.push_child(signature_skeleton());
                    } else {
                        debug!("external reference {ref_name:?} at {child_path} left empty");
                        parent.push_child(XmlElement::new(local_name(ref_name)));
                    }
                    return;
                }
            }
        }

        let mut child = XmlElement::new(name);
        state.covered.insert(child_path.clone());
        self.populate_element(
            &mut child,
            &child_path,
            particle,
            child_depth,
            bound,
            mode,
            choice_index,
            state,
        );
        parent.push_child(child);
    }

    /// Emits a minimal subtree for a required element past the depth bound:
    /// required attributes plus required children, at most `levels_left`
    /// further levels and never beyond the model's depth ceiling.
    fn emit_stub(
        &self,
        parent: &mut XmlElement,
        decl: &ElementDecl,
        path: &str,
        depth: u32,
        levels_left: u32,
        state: &mut BuildState,
    ) {
        if depth > self.config.max_depth + 1 {
            return;
        }
        let Some(name) = decl.local_name() else {
            return;
        };
        let mut elem = XmlElement::new(name);
        state.covered.insert(path.to_string());

        let resolved = self.resolve_particle_type(decl);
        if let Some(ty) = resolved {
            for attr in ty.own_attributes() {
                if attr.is_required() {
                    let attr_path = format!("{path}@{}", attr.name);
                    elem.set_attribute(
                        attr.name.clone(),
                        self.values.value_for(&attr.name, attr.type_name.as_deref()),
                    );
                    state.covered.insert(attr_path);
                }
            }
            if levels_left > 0 {
                for group in &ty.groups {
                    match group.compositor {
                        Compositor::Sequence | Compositor::All => {
                            for particle in &group.particles {
                                if particle.is_required() {
                                    if let Some(child_name) = particle.local_name() {
                                        let child_path = format!("{path}/{child_name}");
                                        self.emit_stub(
                                            &mut elem,
                                            particle,
                                            &child_path,
                                            depth + 1,
                                            levels_left - 1,
                                            state,
                                        );
                                    }
                                }
                            }
                        }
                        Compositor::Choice => {
                            if let Some(particle) = group.particles.first() {
                                if let Some(child_name) = particle.local_name() {
                                    let child_path = format!("{path}/{child_name}");
                                    self.emit_stub(
                                        &mut elem,
                                        particle,
                                        &child_path,
                                        depth + 1,
                                        levels_left - 1,
                                        state,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        } else if let Some(type_name) = decl.type_name.as_deref() {
            elem.text = Some(self.values.value_for(&elem.name, Some(type_name)));
        }

        parent.push_child(elem);
    }

    /// The complex type a particle expands to, if any.
    fn resolve_particle_type<'b>(&self, decl: &'b ElementDecl) -> Option<&'b ComplexType>
    where
        'a: 'b,
    {
        if let Some(inline) = &decl.inline_type {
            return Some(inline);
        }
        if let Some(type_name) = decl.type_name.as_deref() {
            return self.model.complex_type(type_name);
        }
        if let Some(ref_name) = decl.ref_name.as_deref() {
            let target = self.model.global_element(ref_name)?;
            if let Some(inline) = &target.inline_type {
                return Some(inline);
            }
            if let Some(type_name) = target.type_name.as_deref() {
                return self.model.complex_type(type_name);
            }
        }
        None
    }
}

/// The minimum subtree that validates structurally against the XML-DSig
/// schema: SignedInfo with canonicalization, signature and digest methods,
/// plus a SignatureValue.
fn signature_skeleton() -> XmlElement {
    let mut c14n = XmlElement::new("CanonicalizationMethod");
    c14n.set_attribute("Algorithm", "http://www.w3.org/TR/2001/REC-xml-c14n-20010315");
    let mut sig_method = XmlElement::new("SignatureMethod");
    sig_method.set_attribute("Algorithm", "http://www.w3.org/2000/09/xmldsig#rsa-sha1");

    let mut digest_method = XmlElement::new("DigestMethod");
    digest_method.set_attribute("Algorithm", "http://www.w3.org/2000/09/xmldsig#sha1");
    let mut digest_value = XmlElement::new("DigestValue");
    digest_value.text = Some("2jmj7l5rSw0yVb/vlWAYkK/YBwk=".to_string());
    let mut reference = XmlElement::new("Reference");
    reference.set_attribute("URI", "");
    reference.push_child(digest_method);
    reference.push_child(digest_value);

    let mut signed_info = XmlElement::new("SignedInfo");
    signed_info.push_child(c14n);
    signed_info.push_child(sig_method);
    signed_info.push_child(reference);

    let mut signature_value = XmlElement::new("SignatureValue");
    signature_value.text = Some("U2lnbmF0dXJlVmFsdWU=".to_string());

    let mut signature = XmlElement::new("Signature");
    signature.set_attribute("xmlns", DSIG_NAMESPACE);
    signature.push_child(signed_info);
    signature.push_child(signature_value);
    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::load_schema_source;

    fn build_first(
        schema: &str,
        depth_bound: u32,
        mode: &OptionalMode,
        choice_index: usize,
    ) -> XmlSnippet {
        let model = load_schema_source(schema, None).unwrap();
        let builder = CandidateBuilder::new(&model, BuilderConfig::default());
        let root = &model.root_elements()[0];
        builder.build(root, depth_bound, mode, choice_index).unwrap()
    }

    #[test]
    fn string_root_gets_sample_text() {
        let snippet = build_first(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Root" type="xsd:string"/>
               </xsd:schema>"#,
            3,
            &OptionalMode::All,
            0,
        );
        assert_eq!(
            snippet.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Root>Root_value</Root>\n"
        );
        assert!(snippet.covered_paths.contains("/Root"));
    }

    const MIXED: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:element name="R" type="RType"/>
            <xsd:complexType name="RType">
                <xsd:sequence>
                    <xsd:element name="A" type="EmptyType"/>
                    <xsd:element name="B" type="EmptyType" minOccurs="0"/>
                </xsd:sequence>
            </xsd:complexType>
            <xsd:complexType name="EmptyType"/>
        </xsd:schema>"#;

    #[test]
    fn required_only_drops_optional_children() {
        let snippet = build_first(MIXED, 5, &OptionalMode::RequiredOnly, 0);
        let names: Vec<&str> = snippet.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
        assert_eq!(
            snippet.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<R>\n  <A/>\n</R>\n"
        );
    }

    #[test]
    fn include_optional_emits_everything() {
        let snippet = build_first(MIXED, 5, &OptionalMode::All, 0);
        let names: Vec<&str> = snippet.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(snippet.covered_paths.contains("/R/B"));
    }

    #[test]
    fn assignment_controls_optional_children() {
        let included: HashSet<String> = HashSet::new();
        let universe: HashSet<String> = ["/R/B".to_string()].into_iter().collect();
        let snippet = build_first(
            MIXED,
            5,
            &OptionalMode::Assignment {
                included: &included,
                universe: &universe,
            },
            0,
        );
        let names: Vec<&str> = snippet.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);

        let included: HashSet<String> = ["/R/B".to_string()].into_iter().collect();
        let snippet = build_first(
            MIXED,
            5,
            &OptionalMode::Assignment {
                included: &included,
                universe: &universe,
            },
            0,
        );
        let names: Vec<&str> = snippet.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn optional_outside_universe_is_structurally_required() {
        let included: HashSet<String> = HashSet::new();
        let universe: HashSet<String> = HashSet::new();
        let snippet = build_first(
            MIXED,
            5,
            &OptionalMode::Assignment {
                included: &included,
                universe: &universe,
            },
            0,
        );
        let names: Vec<&str> = snippet.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    const CHOICE: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:element name="R" type="RType"/>
            <xsd:complexType name="RType">
                <xsd:choice>
                    <xsd:element name="A" type="xsd:string"/>
                    <xsd:element name="B" type="xsd:string"/>
                </xsd:choice>
            </xsd:complexType>
        </xsd:schema>"#;

    #[test]
    fn choice_picks_by_index() {
        let first = build_first(CHOICE, 3, &OptionalMode::All, 0);
        assert_eq!(first.root.children[0].name, "A");
        let second = build_first(CHOICE, 3, &OptionalMode::All, 1);
        assert_eq!(second.root.children[0].name, "B");
        // Indexes wrap around.
        let third = build_first(CHOICE, 3, &OptionalMode::All, 2);
        assert_eq!(third.root.children[0].name, "A");
    }

    #[test]
    fn choice_follows_assignment_with_first_fallback() {
        let universe: HashSet<String> =
            ["/R/A".to_string(), "/R/B".to_string()].into_iter().collect();
        let included: HashSet<String> = ["/R/B".to_string()].into_iter().collect();
        let snippet = build_first(
            CHOICE,
            3,
            &OptionalMode::Assignment {
                included: &included,
                universe: &universe,
            },
            0,
        );
        assert_eq!(snippet.root.children.len(), 1);
        assert_eq!(snippet.root.children[0].name, "B");

        let none: HashSet<String> = HashSet::new();
        let snippet = build_first(
            CHOICE,
            3,
            &OptionalMode::Assignment {
                included: &none,
                universe: &universe,
            },
            0,
        );
        assert_eq!(snippet.root.children[0].name, "A");
    }

    #[test]
    fn enumerated_attribute_uses_first_value() {
        let snippet = build_first(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="R" type="RType"/>
                   <xsd:complexType name="RType">
                       <xsd:attribute name="grade" type="GradeType" use="required"/>
                   </xsd:complexType>
                   <xsd:simpleType name="GradeType">
                       <xsd:restriction base="xsd:string">
                           <xsd:enumeration value="X"/>
                           <xsd:enumeration value="Y"/>
                           <xsd:enumeration value="Z"/>
                       </xsd:restriction>
                   </xsd:simpleType>
               </xsd:schema>"#,
            3,
            &OptionalMode::All,
            0,
        );
        assert_eq!(
            snippet.root.attributes,
            vec![("grade".to_string(), "X".to_string())]
        );
        assert!(snippet.covered_paths.contains("/R@grade"));
    }

    #[test]
    fn external_signature_ref_gets_skeleton() {
        let snippet = build_first(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                           xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
                   <xsd:import namespace="http://www.w3.org/2000/09/xmldsig#"
                               schemaLocation="xmldsig-core-schema.xsd"/>
                   <xsd:element name="Root" type="RootType"/>
                   <xsd:complexType name="RootType">
                       <xsd:sequence>
                           <xsd:element ref="ds:Signature"/>
                       </xsd:sequence>
                   </xsd:complexType>
               </xsd:schema>"#,
            3,
            &OptionalMode::All,
            0,
        );
        let signature = &snippet.root.children[0];
        assert_eq!(signature.name, "Signature");
        let child_names: Vec<&str> =
            signature.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(child_names, vec!["SignedInfo", "SignatureValue"]);
        assert!(snippet.covered_paths.contains("/Root/Signature"));
        // The skeleton internals are external paths, not coverage items.
        assert!(!snippet.covered_paths.contains("/Root/Signature/SignedInfo"));
    }

    #[test]
    fn depth_exhaustion_stubs_required_subtree() {
        let snippet = build_first(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="R" type="T"/>
                   <xsd:complexType name="T">
                       <xsd:sequence>
                           <xsd:element name="Sub" type="T"/>
                       </xsd:sequence>
                       <xsd:attribute name="id" type="xsd:string" use="required"/>
                   </xsd:complexType>
               </xsd:schema>"#,
            1,
            &OptionalMode::All,
            0,
        );
        // Depth bound 1 leaves only the root in-bound; the required Sub
        // chain is stubbed two further levels below the stub root.
        let level1 = &snippet.root.children[0];
        assert_eq!(level1.name, "Sub");
        assert!(level1.attributes.iter().any(|(n, _)| n == "id"));
        let level2 = &level1.children[0];
        let level3 = &level2.children[0];
        assert_eq!(level3.name, "Sub");
        assert!(level3.children.is_empty());
        assert!(snippet.covered_paths.contains("/R/Sub/Sub/Sub"));
    }

    #[test]
    fn root_namespace_and_schema_location() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                           targetNamespace="urn:example">
                   <xsd:element name="Root" type="xsd:string"/>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let builder = CandidateBuilder::new(
            &model,
            BuilderConfig {
                max_depth: 5,
                namespace: Some("urn:example".to_string()),
                schema_location: Some("schema.xsd".to_string()),
            },
        );
        let snippet = builder
            .build(&model.root_elements()[0], 2, &OptionalMode::All, 0)
            .unwrap();
        assert_eq!(
            snippet.root.attributes,
            vec![
                ("xmlns".to_string(), "urn:example".to_string()),
                ("xmlns:xsi".to_string(), XSI_NAMESPACE.to_string()),
                (
                    "xsi:schemaLocation".to_string(),
                    "urn:example schema.xsd".to_string()
                ),
            ]
        );
    }
}
