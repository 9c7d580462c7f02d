//! Error types for form building, editing and extraction

use thiserror::Error;

/// A schema fragment that cannot be turned into a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema at '{pointer}' is not a JSON object")]
    NotAnObject { pointer: String },

    #[error("schema at '{pointer}' declares no type")]
    MissingType { pointer: String },

    #[error("schema at '{pointer}' has an invalid type: {found}")]
    InvalidType { pointer: String, found: String },

    #[error("array schema at '{pointer}' declares no items")]
    MissingItems { pointer: String },

    #[error("property '{name}' at '{pointer}' cannot be addressed by a field path")]
    UnaddressableKey { pointer: String, name: String },

    #[error("unresolved reference '{reference}'")]
    UnresolvedRef { reference: String },

    #[error("circular reference '{reference}'")]
    CircularRef { reference: String },

    #[error("schema at '{pointer}' is nested deeper than {limit} levels")]
    TooDeep { pointer: String, limit: usize },
}

/// A property that was skipped while building a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to build field '{path}': {source}")]
pub struct SchemaFieldBuildError {
    pub path: String,
    #[source]
    pub source: SchemaError,
}

/// Errors raised while parsing a textual field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty segment in path '{path}' at offset {offset}")]
    EmptySegment { path: String, offset: usize },

    #[error("malformed index in path '{path}' at offset {offset}")]
    BadIndex { path: String, offset: usize },

    #[error("unexpected '{found}' in path '{path}' at offset {offset}")]
    Unexpected {
        path: String,
        found: char,
        offset: usize,
    },
}

/// Why a control refused an edit. The control is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditRejection {
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("'{0}' is not one of the offered options")]
    InvalidOption(String),

    #[error("'{0}' is not an ISO date (YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{value} is outside the allowed range")]
    OutOfRange { value: f64 },

    #[error("'{0}' is already selected")]
    AlreadySelected(String),

    #[error("'{0}' is not selected")]
    NotSelected(String),
}

/// Errors returned by operations on a live [`Form`](super::session::Form).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("no field at path '{0}'")]
    UnknownField(String),

    #[error("no array at path '{0}'")]
    UnknownArray(String),

    #[error("field '{0}' no longer has a live control")]
    MissingElement(String),

    #[error("field '{0}' is not a multi-select")]
    NotMultiSelect(String),

    #[error("index {index} is out of range for array '{path}' with {len} items")]
    ItemOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("edit rejected for '{path}': {reason}")]
    Rejected {
        path: String,
        #[source]
        reason: EditRejection,
    },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Extraction failures. Any of these makes `extract` yield no object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("field registry is missing")]
    MissingRegistry,

    #[error("field registry is malformed: {0}")]
    MalformedRegistry(String),
}
