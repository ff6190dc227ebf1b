use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use roxmltree::{Document, Node};

use super::complex_type_def::ComplexType;
use super::element_decl::ElementDecl;
use super::error::{LoadWarning, SchemaLoadError};
use super::schema_model::{SchemaModel, TypeDefinition};
use super::simple_type_def::SimpleType;

/// Loads a schema file and everything reachable through its `import` and
/// `include` directives. Only the primary document may fail the load;
/// unresolvable imports are warnings and the model keeps whatever resolved.
pub fn load_schema(path: &Path) -> Result<SchemaModel, SchemaLoadError> {
    let source = fs::read_to_string(path).map_err(|e| SchemaLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut loader = Loader::default();
    loader.load_primary(&source, path, path.parent())?;
    Ok(loader.model)
}

/// Loads a schema from an in-memory string. Imports are resolved against
/// `base_dir` when given, otherwise reported as not found.
pub fn load_schema_source(
    source: &str,
    base_dir: Option<&Path>,
) -> Result<SchemaModel, SchemaLoadError> {
    let mut loader = Loader::default();
    loader.load_primary(source, Path::new("<inline>"), base_dir)?;
    Ok(loader.model)
}

#[derive(Default)]
struct Loader {
    model: SchemaModel,
}

impl Loader {
    fn load_primary(
        &mut self,
        source: &str,
        display_path: &Path,
        base_dir: Option<&Path>,
    ) -> Result<(), SchemaLoadError> {
        let doc = Document::parse(source).map_err(|e| SchemaLoadError::Parse {
            path: display_path.to_path_buf(),
            source: e,
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "schema" {
            return Err(SchemaLoadError::NotASchema {
                found: root.tag_name().name().to_string(),
            });
        }

        self.model.target_namespace = root.attribute("targetNamespace").map(str::to_string);
        self.cache_types(root);

        // Global element declarations: direct children of <schema>. These
        // are the candidate document roots and the targets of element refs.
        self.model.global_elements = root
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == ElementDecl::TAG_NAME)
            .map(ElementDecl::map_from_xml)
            .filter(|e| e.name.is_some())
            .collect();

        self.follow_directives(root, base_dir);
        debug!(
            "loaded schema {}: {} named types, {} global elements",
            display_path.display(),
            self.model.type_count(),
            self.model.global_elements.len()
        );
        Ok(())
    }

    /// Caches every named `complexType` and `simpleType` reachable in the
    /// document. Later documents overwrite on name collision.
    fn cache_types(&mut self, root: Node) {
        for node in root.descendants().filter(|d| d.is_element()) {
            match node.tag_name().name() {
                ComplexType::TAG_NAME => {
                    if let Some(name) = node.attribute("name") {
                        self.model
                            .types
                            .insert(name.to_string(), TypeDefinition::Complex(ComplexType::map_from_xml(node)));
                    }
                }
                SimpleType::TAG_NAME => {
                    if let Some(name) = node.attribute("name") {
                        self.model
                            .types
                            .insert(name.to_string(), TypeDefinition::Simple(SimpleType::map_from_xml(node)));
                    }
                }
                _ => {}
            }
        }
    }

    /// Follows `import` and `include` directives, depth-first, guarding
    /// against revisiting the same absolute path.
    fn follow_directives(&mut self, root: Node, base_dir: Option<&Path>) {
        for directive in root.children().filter(|c| {
            c.is_element() && matches!(c.tag_name().name(), "import" | "include")
        }) {
            let Some(location) = directive.attribute("schemaLocation") else {
                // An import without a location only names a namespace.
                continue;
            };
            self.load_imported(location, base_dir);
        }
    }

    fn load_imported(&mut self, location: &str, base_dir: Option<&Path>) {
        let raw = PathBuf::from(location);
        let resolved = if raw.is_absolute() {
            raw
        } else {
            match base_dir {
                Some(dir) => dir.join(&raw),
                None => {
                    self.warn(LoadWarning::ImportNotFound {
                        location: location.to_string(),
                    });
                    return;
                }
            }
        };
        let canonical = fs::canonicalize(&resolved).unwrap_or(resolved);
        if !self.model.imported_schemas.insert(canonical.clone()) {
            return;
        }
        if !canonical.exists() {
            self.warn(LoadWarning::ImportNotFound {
                location: location.to_string(),
            });
            return;
        }
        let source = match fs::read_to_string(&canonical) {
            Ok(source) => source,
            Err(e) => {
                self.warn(LoadWarning::ImportUnreadable {
                    path: canonical,
                    message: e.to_string(),
                });
                return;
            }
        };
        let doc = match Document::parse(&source) {
            Ok(doc) => doc,
            Err(e) => {
                self.warn(LoadWarning::ImportUnparseable {
                    path: canonical,
                    message: e.to_string(),
                });
                return;
            }
        };
        let root = doc.root_element();
        if root.tag_name().name() != "schema" {
            self.warn(LoadWarning::ImportUnparseable {
                path: canonical,
                message: format!("root element is <{}>", root.tag_name().name()),
            });
            return;
        }
        self.cache_types(root);
        // Imports of the imported schema resolve against its own directory.
        self.follow_directives(root, canonical.parent());
    }

    fn warn(&mut self, warning: LoadWarning) {
        warn!("{warning}");
        self.model.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                    targetNamespace="http://example.com/inventory">
            <xsd:element name="Inventory" type="InventoryType"/>
            <xsd:complexType name="InventoryType">
                <xsd:sequence>
                    <xsd:element name="Item" type="xsd:string"/>
                </xsd:sequence>
                <xsd:attribute name="version" type="xsd:string" use="required"/>
            </xsd:complexType>
            <xsd:simpleType name="StatusType">
                <xsd:restriction base="xsd:string">
                    <xsd:enumeration value="active"/>
                    <xsd:enumeration value="retired"/>
                </xsd:restriction>
            </xsd:simpleType>
        </xsd:schema>"#;

    #[test]
    fn loads_types_and_roots() {
        let model = load_schema_source(SIMPLE, None).unwrap();
        assert_eq!(
            model.target_namespace.as_deref(),
            Some("http://example.com/inventory")
        );
        assert_eq!(model.root_elements().len(), 1);
        assert!(model.complex_type("InventoryType").is_some());
        assert!(model.complex_type("my:InventoryType").is_some());
        let status = model.simple_type("StatusType").unwrap();
        assert_eq!(status.first_enumeration(), Some("active"));
        assert!(model.warnings.is_empty());
    }

    #[test]
    fn missing_import_is_a_warning() {
        let schema = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                <xsd:import namespace="urn:other" schemaLocation="nowhere.xsd"/>
                <xsd:element name="Root" type="xsd:string"/>
            </xsd:schema>"#;
        let model = load_schema_source(schema, None).unwrap();
        assert_eq!(model.root_elements().len(), 1);
        assert_eq!(model.warnings.len(), 1);
    }

    #[test]
    fn non_schema_root_is_fatal() {
        let err = load_schema_source("<notaschema/>", None).unwrap_err();
        assert!(matches!(err, SchemaLoadError::NotASchema { .. }));
    }

    #[test]
    fn inline_types_stay_anonymous() {
        let schema = r#"
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                <xsd:element name="Doc">
                    <xsd:complexType>
                        <xsd:sequence>
                            <xsd:element name="Leaf" type="xsd:string"/>
                        </xsd:sequence>
                    </xsd:complexType>
                </xsd:element>
            </xsd:schema>"#;
        let model = load_schema_source(schema, None).unwrap();
        let root = &model.root_elements()[0];
        let inline = root.inline_type.as_ref().unwrap();
        assert_eq!(inline.groups.len(), 1);
        assert_eq!(model.type_count(), 0);
    }
}
