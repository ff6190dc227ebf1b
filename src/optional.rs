//! Extraction of the optional structure a schema admits: `minOccurs="0"`
//! elements, `use="optional"` attributes and the alternatives of every
//! `choice`. These are the parameters combinatorial coverage ranges over.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::xsd::builtins::{is_builtin, local_name};
use crate::xsd::{ComplexType, Compositor, ElementDecl, MaxOccurs, SchemaModel, TypeDefinition};

pub const ELEMENT_PRIORITY: i32 = 5;
pub const ATTRIBUTE_PRIORITY: i32 = 4;
pub const CHOICE_PRIORITY: i32 = 7;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Element,
    Attribute,
}

/// One optional parameter. Items are identified by their path; the extractor
/// never emits the same path twice.
#[derive(Clone, Debug)]
pub struct OptionalItem {
    pub path: String,
    pub kind: ItemKind,
    pub priority: i32,
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    /// Set for choice alternatives; items sharing a group id are mutually
    /// exclusive.
    pub choice_group: Option<usize>,
}

impl PartialEq for OptionalItem {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for OptionalItem {}

/// The extracted parameter universe, in traversal order.
#[derive(Clone, Debug, Default)]
pub struct OptionalSet {
    items: Vec<OptionalItem>,
}

impl OptionalSet {
    pub fn items(&self) -> &[OptionalItem] {
        &self.items
    }

    pub fn elements(&self) -> Vec<&OptionalItem> {
        self.items
            .iter()
            .filter(|i| i.kind == ItemKind::Element)
            .collect()
    }

    pub fn attributes(&self) -> Vec<&OptionalItem> {
        self.items
            .iter()
            .filter(|i| i.kind == ItemKind::Attribute)
            .collect()
    }

    /// Choice groups as `group id -> member paths`.
    pub fn choice_groups(&self) -> BTreeMap<usize, Vec<String>> {
        let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for item in &self.items {
            if let Some(id) = item.choice_group {
                groups.entry(id).or_default().push(item.path.clone());
            }
        }
        groups
    }

    pub fn paths(&self) -> Vec<String> {
        self.items.iter().map(|i| i.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub max_depth: u32,
    /// Per-path priority overrides; unset paths keep the kind default.
    pub priority_overrides: HashMap<String, i32>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            max_depth: 10,
            priority_overrides: HashMap::new(),
        }
    }
}

pub fn extract_optional_items(model: &SchemaModel, options: &ExtractOptions) -> OptionalSet {
    let mut extractor = Extractor {
        model,
        options,
        set: OptionalSet::default(),
        seen: HashSet::new(),
        active: HashSet::new(),
        next_choice_group: 0,
    };
    extractor.run();
    extractor.set
}

type Frame = (String, String, u32);

struct Extractor<'a> {
    model: &'a SchemaModel,
    options: &'a ExtractOptions,
    set: OptionalSet,
    seen: HashSet<String>,
    active: HashSet<Frame>,
    next_choice_group: usize,
}

impl Extractor<'_> {
    fn run(&mut self) {
        let model = self.model;
        for root in model.root_elements() {
            let Some(name) = root.name.as_deref() else {
                continue;
            };
            let path = format!("/{}", local_name(name));
            if let Some(inline) = &root.inline_type {
                self.visit_complex(inline, &path, 1);
            } else if let Some(type_name) = root.type_name.as_deref() {
                self.visit_type(type_name, &path, 1);
            }
        }
    }

    fn priority_for(&self, path: &str, default: i32) -> i32 {
        self.options
            .priority_overrides
            .get(path)
            .copied()
            .unwrap_or(default)
    }

    fn push(&mut self, item: OptionalItem) {
        if self.seen.insert(item.path.clone()) {
            self.set.items.push(item);
        }
    }

    fn visit_type(&mut self, type_name: &str, path: &str, depth: u32) {
        if depth > self.options.max_depth {
            return;
        }
        let local = local_name(type_name);
        if is_builtin(local) {
            return;
        }
        let model = self.model;
        if let Some(TypeDefinition::Complex(ct)) = model.type_definition(local) {
            let frame: Frame = (path.to_string(), local.to_string(), depth);
            if !self.active.insert(frame.clone()) {
                return;
            }
            self.visit_complex(ct, path, depth);
            self.active.remove(&frame);
        }
    }

    fn visit_complex(&mut self, ty: &ComplexType, path: &str, depth: u32) {
        if depth > self.options.max_depth {
            return;
        }

        for attr in ty.attributes.iter().chain(
            ty.extensions.iter().flat_map(|e| e.attributes.iter()),
        ) {
            if attr.is_optional() {
                let attr_path = format!("{path}@{}", attr.name);
                let priority = self.priority_for(&attr_path, ATTRIBUTE_PRIORITY);
                self.push(OptionalItem {
                    path: attr_path,
                    kind: ItemKind::Attribute,
                    priority,
                    min_occurs: 0,
                    max_occurs: MaxOccurs::Count(1),
                    choice_group: None,
                });
            }
        }

        for ext in &ty.extensions {
            self.visit_type(&ext.base, path, depth);
        }

        for group in &ty.groups {
            match group.compositor {
                Compositor::Sequence | Compositor::All => {
                    for particle in &group.particles {
                        self.visit_sequence_particle(particle, path, depth);
                    }
                }
                Compositor::Choice => {
                    let group_id = self.next_choice_group;
                    self.next_choice_group += 1;
                    for particle in &group.particles {
                        self.visit_choice_particle(particle, path, depth, group_id);
                    }
                }
            }
        }
    }

    fn visit_sequence_particle(&mut self, particle: &ElementDecl, path: &str, depth: u32) {
        let Some(name) = particle.local_name() else {
            return;
        };
        let child_path = format!("{path}/{name}");
        if particle.is_optional() {
            let priority = self.priority_for(&child_path, ELEMENT_PRIORITY);
            self.push(OptionalItem {
                path: child_path.clone(),
                kind: ItemKind::Element,
                priority,
                min_occurs: particle.min_occurs,
                max_occurs: particle.max_occurs,
                choice_group: None,
            });
        }
        self.descend(particle, &child_path, depth);
    }

    fn visit_choice_particle(
        &mut self,
        particle: &ElementDecl,
        path: &str,
        depth: u32,
        group_id: usize,
    ) {
        let Some(name) = particle.local_name() else {
            return;
        };
        let child_path = format!("{path}/{name}");
        let priority = self.priority_for(&child_path, CHOICE_PRIORITY);
        self.push(OptionalItem {
            path: child_path.clone(),
            kind: ItemKind::Element,
            priority,
            min_occurs: 0,
            max_occurs: MaxOccurs::Count(1),
            choice_group: Some(group_id),
        });
        self.descend(particle, &child_path, depth);
    }

    /// Descends into a particle's content, whatever form it takes.
    fn descend(&mut self, particle: &ElementDecl, child_path: &str, depth: u32) {
        if let Some(inline) = &particle.inline_type {
            self.visit_complex(inline, child_path, depth + 1);
        } else if let Some(type_name) = particle.type_name.as_deref() {
            self.visit_type(type_name, child_path, depth + 1);
        } else if let Some(ref_name) = particle.ref_name.as_deref() {
            let model = self.model;
            if let Some(target) = model.global_element(ref_name) {
                if let Some(inline) = &target.inline_type {
                    self.visit_complex(inline, child_path, depth + 1);
                } else if let Some(type_name) = target.type_name.as_deref() {
                    self.visit_type(type_name, child_path, depth + 1);
                }
            }
        }
    }
}
