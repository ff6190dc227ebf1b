//! Encoding of structural coverage as a Boolean optimization problem.
//!
//! One Boolean variable per element path; hierarchy, required-child and
//! choice constraints; an objective maximizing the number of true paths.
//! The system is emitted as SMT-LIB 2 text for an external optimizing
//! solver, and a returned model can be materialized through the candidate
//! builder's assignment mode. One model describes one document.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::optional::OptionalSet;
use crate::xsd::builtins::{is_builtin, local_name};
use crate::xsd::{ComplexType, Compositor, SchemaModel, TypeDefinition};

/// The constraint shape the encoder needs, extracted once per schema.
#[derive(Clone, Debug, Default)]
pub struct StructuralConstraints {
    pub paths: BTreeSet<String>,
    /// `child path -> parent path`.
    pub parent_of: BTreeMap<String, String>,
    /// `parent path -> required child paths`.
    pub required_children: BTreeMap<String, Vec<String>>,
    /// `(parent path, mutually exclusive alternatives)`.
    pub choice_groups: Vec<(String, Vec<String>)>,
}

pub fn extract_constraints(model: &SchemaModel, max_depth: u32) -> StructuralConstraints {
    let mut extractor = ConstraintExtractor {
        model,
        max_depth,
        constraints: StructuralConstraints::default(),
        visited: HashSet::new(),
    };
    for root in model.root_elements() {
        let Some(name) = root.name.as_deref() else {
            continue;
        };
        let path = format!("/{}", local_name(name));
        extractor.constraints.paths.insert(path.clone());
        if let Some(inline) = &root.inline_type {
            extractor.visit_complex(inline, &path, 1);
        } else if let Some(type_name) = root.type_name.as_deref() {
            extractor.visit_type(type_name, &path, 1);
        }
    }
    extractor.constraints
}

struct ConstraintExtractor<'a> {
    model: &'a SchemaModel,
    max_depth: u32,
    constraints: StructuralConstraints,
    /// (path, type) pairs already expanded; doubles as the cycle guard.
    visited: HashSet<(String, String)>,
}

impl ConstraintExtractor<'_> {
    fn visit_type(&mut self, type_name: &str, path: &str, depth: u32) {
        if depth > self.max_depth {
            return;
        }
        let local = local_name(type_name);
        if is_builtin(local) {
            return;
        }
        let model = self.model;
        if let Some(TypeDefinition::Complex(ct)) = model.type_definition(local) {
            if !self.visited.insert((path.to_string(), local.to_string())) {
                return;
            }
            self.visit_complex(ct, path, depth);
        }
    }

    fn visit_complex(&mut self, ty: &ComplexType, path: &str, depth: u32) {
        if depth > self.max_depth {
            return;
        }
        for ext in &ty.extensions {
            self.visit_type(&ext.base, path, depth);
        }
        for group in &ty.groups {
            let mut alternatives = Vec::new();
            for particle in &group.particles {
                let Some(name) = particle.local_name() else {
                    continue;
                };
                let child = format!("{path}/{name}");
                self.constraints.paths.insert(child.clone());
                self.constraints
                    .parent_of
                    .entry(child.clone())
                    .or_insert_with(|| path.to_string());
                match group.compositor {
                    Compositor::Sequence | Compositor::All => {
                        if particle.is_required() {
                            self.constraints
                                .required_children
                                .entry(path.to_string())
                                .or_default()
                                .push(child.clone());
                        }
                    }
                    Compositor::Choice => alternatives.push(child.clone()),
                }
                self.descend(particle, &child, depth);
            }
            if group.compositor == Compositor::Choice && !alternatives.is_empty() {
                self.constraints
                    .choice_groups
                    .push((path.to_string(), alternatives));
            }
        }
    }

    fn descend(&mut self, particle: &crate::xsd::ElementDecl, child: &str, depth: u32) {
        if let Some(inline) = &particle.inline_type {
            self.visit_complex(inline, child, depth + 1);
        } else if let Some(type_name) = particle.type_name.as_deref() {
            self.visit_type(type_name, child, depth + 1);
        } else if let Some(ref_name) = particle.ref_name.as_deref() {
            let model = self.model;
            if let Some(target) = model.global_element(ref_name) {
                if let Some(inline) = &target.inline_type {
                    self.visit_complex(inline, child, depth + 1);
                } else if let Some(type_name) = target.type_name.as_deref() {
                    self.visit_type(type_name, child, depth + 1);
                }
            }
        }
    }
}

pub struct SmtEncoder<'a> {
    constraints: &'a StructuralConstraints,
}

impl<'a> SmtEncoder<'a> {
    pub fn new(constraints: &'a StructuralConstraints) -> Self {
        SmtEncoder { constraints }
    }

    /// Renders the Boolean system as SMT-LIB 2 with a maximization
    /// objective. Paths become quoted symbols, so no name mangling is
    /// needed.
    pub fn to_smtlib(&self) -> String {
        let c = self.constraints;
        let mut out = String::new();
        out.push_str("; structural coverage as Boolean optimization\n");
        out.push_str("; one variable per element path; true = present in the document\n");
        out.push_str("(set-option :produce-models true)\n");

        for path in &c.paths {
            out.push_str(&format!("(declare-const {} Bool)\n", symbol(path)));
        }

        out.push_str("; hierarchy: a child implies its parent\n");
        for (child, parent) in &c.parent_of {
            out.push_str(&format!(
                "(assert (=> {} {}))\n",
                symbol(child),
                symbol(parent)
            ));
        }

        out.push_str("; required children\n");
        for (parent, children) in &c.required_children {
            for child in children {
                out.push_str(&format!(
                    "(assert (=> {} {}))\n",
                    symbol(parent),
                    symbol(child)
                ));
            }
        }

        out.push_str("; choice: exactly one alternative under a present parent\n");
        for (parent, alternatives) in &c.choice_groups {
            let ored = alternatives
                .iter()
                .map(|a| symbol(a))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!("(assert (=> {} (or {ored})))\n", symbol(parent)));
            for (i, a) in alternatives.iter().enumerate() {
                for b in &alternatives[i + 1..] {
                    out.push_str(&format!(
                        "(assert (not (and {} {})))\n",
                        symbol(a),
                        symbol(b)
                    ));
                }
            }
        }

        out.push_str("; objective: witness as many paths as possible\n");
        let summed = c
            .paths
            .iter()
            .map(|p| format!("(ite {} 1 0)", symbol(p)))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("(maximize (+ {summed}))\n"));
        out.push_str("(check-sat)\n(get-model)\n");
        out
    }
}

/// An SMT-LIB quoted symbol; paths contain `/`, which bare symbols forbid.
fn symbol(path: &str) -> String {
    format!("|{path}|")
}

/// Translates a solver model (the set of true paths) into the include/universe
/// pair the builder's assignment mode consumes.
pub fn assignment_from_model(
    true_paths: &BTreeSet<String>,
    optional: &OptionalSet,
) -> (HashSet<String>, HashSet<String>) {
    let universe: HashSet<String> = optional.paths().into_iter().collect();
    let included = true_paths
        .iter()
        .filter(|p| universe.contains(*p))
        .cloned()
        .collect();
    (included, universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optional::{extract_optional_items, ExtractOptions};
    use crate::xsd::load_schema_source;

    const SCHEMA: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:element name="R" type="RType"/>
            <xsd:complexType name="RType">
                <xsd:sequence>
                    <xsd:element name="A" type="xsd:string"/>
                    <xsd:element name="B" type="xsd:string" minOccurs="0"/>
                </xsd:sequence>
                <xsd:choice>
                    <xsd:element name="X" type="xsd:string"/>
                    <xsd:element name="Y" type="xsd:string"/>
                </xsd:choice>
            </xsd:complexType>
        </xsd:schema>"#;

    #[test]
    fn constraints_capture_structure() {
        let model = load_schema_source(SCHEMA, None).unwrap();
        let constraints = extract_constraints(&model, 10);
        assert!(constraints.paths.contains("/R/X"));
        assert_eq!(constraints.parent_of["/R/A"], "/R");
        assert_eq!(constraints.required_children["/R"], vec!["/R/A".to_string()]);
        assert_eq!(constraints.choice_groups.len(), 1);
        assert_eq!(
            constraints.choice_groups[0],
            (
                "/R".to_string(),
                vec!["/R/X".to_string(), "/R/Y".to_string()]
            )
        );
    }

    #[test]
    fn smtlib_rendering_contains_all_constraint_kinds() {
        let model = load_schema_source(SCHEMA, None).unwrap();
        let constraints = extract_constraints(&model, 10);
        let text = SmtEncoder::new(&constraints).to_smtlib();
        assert!(text.contains("(declare-const |/R/A| Bool)"));
        assert!(text.contains("(assert (=> |/R/A| |/R|))"));
        assert!(text.contains("(assert (=> |/R| |/R/A|))"));
        assert!(text.contains("(assert (=> |/R| (or |/R/X| |/R/Y|)))"));
        assert!(text.contains("(assert (not (and |/R/X| |/R/Y|)))"));
        assert!(text.contains("(maximize"));
        assert!(text.ends_with("(check-sat)\n(get-model)\n"));
    }

    #[test]
    fn model_translates_to_an_assignment() {
        let model = load_schema_source(SCHEMA, None).unwrap();
        let optional = extract_optional_items(&model, &ExtractOptions::default());
        let true_paths: BTreeSet<String> =
            ["/R".to_string(), "/R/A".to_string(), "/R/X".to_string()]
                .into_iter()
                .collect();
        let (included, universe) = assignment_from_model(&true_paths, &optional);
        // "/R" and "/R/A" are required, not parameters.
        assert_eq!(included, HashSet::from(["/R/X".to_string()]));
        assert!(universe.contains("/R/B"));
        assert!(universe.contains("/R/Y"));
    }
}
