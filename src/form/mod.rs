//! Schema-Driven Form Generation and Data Extraction
//!
//! Builds an editable field tree from a JSON Schema plus a data record, and
//! reconstructs the record from the edited fields:
//! - Builder: schema + record -> field tree, registry and live controls
//! - Extractor: registry + live controls -> record with contiguous array indices

pub mod builder;
pub mod compact;
pub mod controls;
pub mod error;
pub mod extractor;
pub mod multi_select;
pub mod path;
pub mod registry;
pub mod schema;
pub mod session;
pub mod tree;

pub use builder::{BuilderOptions, SchemaFormBuilder};
pub use controls::{ControlId, Provenance, Widget};
pub use error::{EditRejection, ExtractError, FormError, PathError, SchemaError, SchemaFieldBuildError};
pub use extractor::{Extraction, FormDataExtractor};
pub use multi_select::{MultiSelectState, SelectOption};
pub use path::{set_value_at, write_at_path, FieldPath, PathSegment};
pub use registry::{FieldDescriptor, FieldId, FieldRegistry, ValueType};
pub use schema::{Property, SchemaKind, SchemaNode};
pub use session::{Form, FormHost};
pub use tree::{ArrayId, FieldNode, FieldTree};
