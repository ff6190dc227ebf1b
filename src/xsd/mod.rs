pub mod attribute_decl;
pub mod builtins;
pub mod complex_type_def;
pub mod element_decl;
pub mod error;
pub mod model_group;
pub mod schema_model;
pub mod simple_type_def;

mod loader;

pub use attribute_decl::{AttributeDecl, AttributeUse};
pub use complex_type_def::{ComplexType, Extension};
pub use element_decl::{ElementDecl, MaxOccurs};
pub use error::{LoadWarning, SchemaLoadError};
pub use loader::{load_schema, load_schema_source};
pub use model_group::{Compositor, ModelGroup};
pub use schema_model::{SchemaModel, TypeDefinition};
pub use simple_type_def::SimpleType;
