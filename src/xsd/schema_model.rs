use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use super::builtins::local_name;
use super::complex_type_def::ComplexType;
use super::element_decl::ElementDecl;
use super::error::LoadWarning;
use super::simple_type_def::SimpleType;

#[derive(Clone, Debug)]
pub enum TypeDefinition {
    Complex(ComplexType),
    Simple(SimpleType),
}

/// The assembled schema: named types, global element declarations and the
/// set of schema files folded in via `import`/`include`.
///
/// Built once by the loader and immutable afterwards. Types from imported
/// schemas share the cache; global elements come from the primary document
/// only, matching how instance documents are rooted.
#[derive(Debug, Default)]
pub struct SchemaModel {
    pub target_namespace: Option<String>,
    pub(super) types: HashMap<String, TypeDefinition>,
    pub(super) global_elements: Vec<ElementDecl>,
    pub imported_schemas: BTreeSet<PathBuf>,
    pub warnings: Vec<LoadWarning>,
}

impl SchemaModel {
    /// Looks up a named type; `name` may carry a namespace prefix.
    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(local_name(name))
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        match self.type_definition(name) {
            Some(TypeDefinition::Complex(ct)) => Some(ct),
            _ => None,
        }
    }

    pub fn simple_type(&self, name: &str) -> Option<&SimpleType> {
        match self.type_definition(name) {
            Some(TypeDefinition::Simple(st)) => Some(st),
            _ => None,
        }
    }

    /// Resolves an element `ref` against the global declarations.
    pub fn global_element(&self, name: &str) -> Option<&ElementDecl> {
        let wanted = local_name(name);
        self.global_elements
            .iter()
            .find(|e| e.name.as_deref() == Some(wanted))
    }

    /// Global element declarations, i.e. the possible document roots.
    pub fn root_elements(&self) -> &[ElementDecl] {
        &self.global_elements
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
