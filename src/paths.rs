//! Depth-bounded enumeration of the element and attribute paths a schema
//! defines. The resulting sets are the coverage universe: a corpus covers
//! the schema to the degree it witnesses these paths.

use std::collections::{BTreeSet, HashSet};

use log::warn;

use crate::xsd::builtins::{is_builtin, local_name};
use crate::xsd::{ComplexType, SchemaModel, TypeDefinition};

/// The frozen result of an enumeration run.
///
/// `BTreeSet` keeps iteration (and therefore reports) deterministic for a
/// given schema and depth.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSets {
    pub elements: BTreeSet<String>,
    pub attributes: BTreeSet<String>,
    /// Type names that resolved neither to the cache nor to a built-in.
    /// Descent below them was skipped; they are reported, not dropped.
    pub unresolved: BTreeSet<String>,
}

impl PathSets {
    /// The combined coverage universe.
    pub fn all(&self) -> BTreeSet<String> {
        self.elements.union(&self.attributes).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len() + self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.attributes.is_empty()
    }
}

/// Enumerates every defined element and attribute path, descending at most
/// `max_depth` element levels (the root sits at depth 1).
pub fn enumerate_paths(model: &SchemaModel, max_depth: u32) -> PathSets {
    let mut enumerator = Enumerator {
        model,
        max_depth,
        sets: PathSets::default(),
        active: HashSet::new(),
    };
    enumerator.run();
    enumerator.sets
}

/// Frame key for the cycle guard: a (path, type, depth) triple that is
/// already being expanded must not be re-entered.
type Frame = (String, String, u32);

struct Enumerator<'a> {
    model: &'a SchemaModel,
    max_depth: u32,
    sets: PathSets,
    active: HashSet<Frame>,
}

impl Enumerator<'_> {
    fn run(&mut self) {
        for root in self.model.root_elements() {
            let Some(name) = root.name.as_deref() else {
                continue;
            };
            let path = format!("/{}", local_name(name));
            self.sets.elements.insert(path.clone());
            if let Some(inline) = &root.inline_type {
                self.visit_complex(inline, &path, 1);
            } else if let Some(type_name) = root.type_name.clone() {
                self.visit_type(&type_name, &path, 1);
            }
        }
    }

    fn visit_type(&mut self, type_name: &str, path: &str, depth: u32) {
        if depth > self.max_depth {
            return;
        }
        let local = local_name(type_name);
        if is_builtin(local) {
            return;
        }
        let model = self.model;
        match model.type_definition(local) {
            Some(TypeDefinition::Complex(ct)) => {
                let frame: Frame = (path.to_string(), local.to_string(), depth);
                if !self.active.insert(frame.clone()) {
                    return;
                }
                self.visit_complex(ct, path, depth);
                self.active.remove(&frame);
            }
            // A simple type is a leaf; it contributes no paths of its own.
            Some(TypeDefinition::Simple(_)) => {}
            None => {
                if self.sets.unresolved.insert(local.to_string()) {
                    warn!("type {local:?} referenced at {path} is neither defined nor built-in");
                }
            }
        }
    }

    fn visit_complex(&mut self, ty: &ComplexType, path: &str, depth: u32) {
        if depth > self.max_depth {
            return;
        }
        let model = self.model;

        for attr in &ty.attributes {
            self.sets.attributes.insert(format!("{path}@{}", attr.name));
        }
        for ext in &ty.extensions {
            // Inherited content surfaces at the same path and depth.
            self.visit_type(&ext.base, path, depth);
            for attr in &ext.attributes {
                self.sets.attributes.insert(format!("{path}@{}", attr.name));
            }
        }

        for group in &ty.groups {
            for particle in &group.particles {
                if let Some(name) = particle.name.as_deref() {
                    let child = format!("{path}/{}", local_name(name));
                    self.sets.elements.insert(child.clone());
                    if let Some(inline) = &particle.inline_type {
                        self.visit_complex(inline, &child, depth + 1);
                    } else if let Some(type_name) = particle.type_name.as_deref() {
                        self.visit_type(type_name, &child, depth + 1);
                    }
                } else if let Some(ref_name) = particle.ref_name.as_deref() {
                    let child = format!("{path}/{}", local_name(ref_name));
                    self.sets.elements.insert(child.clone());
                    // Refs into imported namespaces may not resolve here;
                    // the path itself is still part of the universe.
                    if let Some(target) = model.global_element(ref_name) {
                        if let Some(inline) = &target.inline_type {
                            self.visit_complex(inline, &child, depth + 1);
                        } else if let Some(type_name) = target.type_name.as_deref() {
                            self.visit_type(type_name, &child, depth + 1);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::load_schema_source;

    #[test]
    fn single_string_root() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Root" type="xsd:string"/>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 10);
        assert_eq!(sets.elements, BTreeSet::from(["/Root".to_string()]));
        assert!(sets.attributes.is_empty());
        assert!(sets.unresolved.is_empty());
    }

    #[test]
    fn recursive_type_stops_at_depth() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="R" type="T"/>
                   <xsd:complexType name="T">
                       <xsd:sequence>
                           <xsd:element name="Sub" type="T" minOccurs="0"/>
                       </xsd:sequence>
                   </xsd:complexType>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 3);
        let expected: BTreeSet<String> = [
            "/R",
            "/R/Sub",
            "/R/Sub/Sub",
            "/R/Sub/Sub/Sub",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(sets.elements, expected);
        // Depth bound: at most max_depth + 1 slashes.
        for path in &sets.elements {
            assert!(path.matches('/').count() <= 4);
        }
    }

    #[test]
    fn attributes_and_extension_inheritance() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Doc" type="DerivedType"/>
                   <xsd:complexType name="BaseType">
                       <xsd:sequence>
                           <xsd:element name="FromBase" type="xsd:string"/>
                       </xsd:sequence>
                       <xsd:attribute name="baseAttr" type="xsd:string"/>
                   </xsd:complexType>
                   <xsd:complexType name="DerivedType">
                       <xsd:complexContent>
                           <xsd:extension base="BaseType">
                               <xsd:sequence>
                                   <xsd:element name="Added" type="xsd:string"/>
                               </xsd:sequence>
                               <xsd:attribute name="addedAttr" type="xsd:string"/>
                           </xsd:extension>
                       </xsd:complexContent>
                   </xsd:complexType>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 10);
        assert!(sets.elements.contains("/Doc/FromBase"));
        assert!(sets.elements.contains("/Doc/Added"));
        assert!(sets.attributes.contains("/Doc@baseAttr"));
        assert!(sets.attributes.contains("/Doc@addedAttr"));
    }

    #[test]
    fn ref_emits_local_name_path() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Root" type="RootType"/>
                   <xsd:element name="Part" type="PartType"/>
                   <xsd:complexType name="RootType">
                       <xsd:sequence>
                           <xsd:element ref="Part"/>
                       </xsd:sequence>
                   </xsd:complexType>
                   <xsd:complexType name="PartType">
                       <xsd:sequence>
                           <xsd:element name="Leaf" type="xsd:string"/>
                       </xsd:sequence>
                   </xsd:complexType>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 10);
        assert!(sets.elements.contains("/Root/Part"));
        assert!(sets.elements.contains("/Root/Part/Leaf"));
        // "/Part" is also a root candidate and keeps its own subtree.
        assert!(sets.elements.contains("/Part/Leaf"));
    }

    #[test]
    fn unresolved_reference_is_reported() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Root" type="MissingType"/>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 10);
        assert!(sets.elements.contains("/Root"));
        assert!(sets.unresolved.contains("MissingType"));
    }

    #[test]
    fn enumeration_is_deterministic() {
        let source = r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
               <xsd:element name="R" type="T"/>
               <xsd:complexType name="T">
                   <xsd:sequence>
                       <xsd:element name="B" type="xsd:string"/>
                       <xsd:element name="A" type="xsd:string"/>
                   </xsd:sequence>
               </xsd:complexType>
           </xsd:schema>"#;
        let model = load_schema_source(source, None).unwrap();
        let first = enumerate_paths(&model, 5);
        let second = enumerate_paths(&model, 5);
        assert_eq!(first, second);
    }
}
