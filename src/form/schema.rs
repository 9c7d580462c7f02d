//! JSON Schema resolution with $ref support
//!
//! Resolves a JSON Schema `Value` into an immutable [`SchemaNode`] tree. A
//! property whose schema is malformed is kept as an error next to its valid
//! siblings, so one bad property never hides the rest of the form.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::error::SchemaError;

pub const DEFAULT_MAX_DEPTH: usize = 20;

// ============================================================================
// Schema Node
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub enum_values: Vec<String>,
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array { items: Box<SchemaNode> },
    Object { properties: Vec<Property> },
    /// A type name the form has no dedicated control for
    Other(String),
}

/// Object property in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub required: bool,
    pub schema: Result<SchemaNode, SchemaError>,
}

impl SchemaNode {
    /// Parse a root schema with the default depth limit.
    pub fn parse(schema: &Value) -> Result<Self, SchemaError> {
        Self::parse_with_depth(schema, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_depth(schema: &Value, max_depth: usize) -> Result<Self, SchemaError> {
        let mut ctx = SchemaResolutionContext::from_schema(schema);
        ctx.max_depth = max_depth;
        resolve_schema(schema, &mut ctx, 0, "#")
    }

    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            title: None,
            description: None,
            enum_values: Vec::new(),
            format: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Object { .. } => "object",
            SchemaKind::Other(name) => name,
        }
    }

    pub fn properties(&self) -> &[Property] {
        match &self.kind {
            SchemaKind::Object { properties } => properties,
            _ => &[],
        }
    }

    /// Vocabulary of a string enumeration, if this is one
    pub fn string_enum(&self) -> Option<&[String]> {
        match self.kind {
            SchemaKind::String if !self.enum_values.is_empty() => Some(self.enum_values.as_slice()),
            _ => None,
        }
    }
}

// ============================================================================
// Resolution Context
// ============================================================================

/// Context for schema resolution, carrying available definitions
struct SchemaResolutionContext {
    /// Local definitions (#/$defs/* or #/definitions/*)
    definitions: HashMap<String, Value>,
    /// Refs currently being resolved
    visited_refs: HashSet<String>,
    max_depth: usize,
}

impl SchemaResolutionContext {
    fn from_schema(schema: &Value) -> Self {
        let mut definitions = HashMap::new();
        for key in ["definitions", "$defs"] {
            if let Some(defs) = schema.get(key).and_then(|v| v.as_object()) {
                for (name, def) in defs {
                    definitions.insert(name.clone(), def.clone());
                }
            }
        }

        Self {
            definitions,
            visited_refs: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ============================================================================
// Schema Resolution
// ============================================================================

fn resolve_schema(
    schema: &Value,
    ctx: &mut SchemaResolutionContext,
    depth: usize,
    pointer: &str,
) -> Result<SchemaNode, SchemaError> {
    if depth > ctx.max_depth {
        return Err(SchemaError::TooDeep {
            pointer: pointer.to_string(),
            limit: ctx.max_depth,
        });
    }

    let object = schema.as_object().ok_or_else(|| SchemaError::NotAnObject {
        pointer: pointer.to_string(),
    })?;

    if let Some(reference) = object.get("$ref").and_then(|v| v.as_str()) {
        return resolve_ref(reference, ctx, depth);
    }

    let type_name = match object.get("type") {
        Some(Value::String(name)) => name.clone(),
        // Nullable unions such as ["string", "null"]
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|v| v.as_str())
            .find(|name| *name != "null")
            .map(String::from)
            .ok_or_else(|| SchemaError::InvalidType {
                pointer: pointer.to_string(),
                found: Value::Array(names.clone()).to_string(),
            })?,
        Some(other) => {
            return Err(SchemaError::InvalidType {
                pointer: pointer.to_string(),
                found: other.to_string(),
            })
        }
        None if object.contains_key("properties") => "object".to_string(),
        None => {
            return Err(SchemaError::MissingType {
                pointer: pointer.to_string(),
            })
        }
    };

    let kind = match type_name.as_str() {
        "string" => SchemaKind::String,
        "number" => SchemaKind::Number,
        "integer" => SchemaKind::Integer,
        "boolean" => SchemaKind::Boolean,
        "array" => resolve_array_type(schema, ctx, depth, pointer)?,
        "object" => resolve_object_type(schema, ctx, depth, pointer),
        _ => SchemaKind::Other(type_name.clone()),
    };

    let mut node = extract_common_props(schema);
    node.kind = kind;
    Ok(node)
}

fn resolve_ref(
    reference: &str,
    ctx: &mut SchemaResolutionContext,
    depth: usize,
) -> Result<SchemaNode, SchemaError> {
    let name = reference
        .strip_prefix("#/definitions/")
        .or_else(|| reference.strip_prefix("#/$defs/"))
        .ok_or_else(|| SchemaError::UnresolvedRef {
            reference: reference.to_string(),
        })?;

    let definition = ctx
        .definitions
        .get(name)
        .cloned()
        .ok_or_else(|| SchemaError::UnresolvedRef {
            reference: reference.to_string(),
        })?;

    if !ctx.visited_refs.insert(reference.to_string()) {
        return Err(SchemaError::CircularRef {
            reference: reference.to_string(),
        });
    }
    let result = resolve_schema(&definition, ctx, depth + 1, reference);
    ctx.visited_refs.remove(reference);
    result
}

fn resolve_array_type(
    schema: &Value,
    ctx: &mut SchemaResolutionContext,
    depth: usize,
    pointer: &str,
) -> Result<SchemaKind, SchemaError> {
    let items_schema = schema.get("items").ok_or_else(|| SchemaError::MissingItems {
        pointer: pointer.to_string(),
    })?;
    let items = resolve_schema(items_schema, ctx, depth + 1, &format!("{}/items", pointer))?;
    Ok(SchemaKind::Array {
        items: Box::new(items),
    })
}

fn resolve_object_type(
    schema: &Value,
    ctx: &mut SchemaResolutionContext,
    depth: usize,
    pointer: &str,
) -> SchemaKind {
    let required: HashSet<&str> = schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let mut properties = Vec::new();
    if let Some(props) = schema.get("properties").and_then(|v| v.as_object()) {
        for (name, prop_schema) in props {
            let prop_pointer = format!("{}/properties/{}", pointer, name);
            let schema = if name.is_empty() || name.contains(|c| matches!(c, '.' | '[' | ']')) {
                Err(SchemaError::UnaddressableKey {
                    pointer: prop_pointer,
                    name: name.clone(),
                })
            } else {
                resolve_schema(prop_schema, ctx, depth + 1, &prop_pointer)
            };
            properties.push(Property {
                name: name.clone(),
                required: required.contains(name.as_str()),
                schema,
            });
        }
    }

    SchemaKind::Object { properties }
}

/// Extract annotations shared by every schema type
fn extract_common_props(schema: &Value) -> SchemaNode {
    let text = |key: &str| schema.get(key).and_then(|v| v.as_str()).map(String::from);

    SchemaNode {
        title: text("title"),
        description: text("description"),
        format: text("format"),
        minimum: schema.get("minimum").and_then(|v| v.as_f64()),
        maximum: schema.get("maximum").and_then(|v| v.as_f64()),
        enum_values: schema
            .get("enum")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        ..SchemaNode::with_kind(SchemaKind::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_in_declaration_order() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "title": "Name"},
                "age": {"type": "integer", "minimum": 0, "maximum": 130},
                "active": {"type": "boolean"}
            }
        });

        let node = SchemaNode::parse(&schema).unwrap();
        let names: Vec<&str> = node.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "active"]);

        let name = &node.properties()[0];
        assert!(name.required);
        assert_eq!(name.schema.as_ref().unwrap().title.as_deref(), Some("Name"));

        let age = node.properties()[1].schema.as_ref().unwrap();
        assert_eq!(age.kind, SchemaKind::Integer);
        assert_eq!(age.minimum, Some(0.0));
        assert_eq!(age.maximum, Some(130.0));
        assert!(!node.properties()[1].required);
    }

    #[test]
    fn test_root_without_type_is_object() {
        let node = SchemaNode::parse(&json!({"properties": {"a": {"type": "string"}}})).unwrap();
        assert_eq!(node.type_name(), "object");
        assert_eq!(node.properties().len(), 1);
    }

    #[test]
    fn test_malformed_property_is_isolated() {
        let schema = json!({
            "type": "object",
            "properties": {
                "good": {"type": "string"},
                "bad": {"title": "No type"},
                "list": {"type": "array"},
                "also_good": {"type": "number"}
            }
        });

        let node = SchemaNode::parse(&schema).unwrap();
        let props = node.properties();
        assert!(props[0].schema.is_ok());
        assert_eq!(
            props[1].schema,
            Err(SchemaError::MissingType {
                pointer: "#/properties/bad".into()
            })
        );
        assert_eq!(
            props[2].schema,
            Err(SchemaError::MissingItems {
                pointer: "#/properties/list".into()
            })
        );
        assert!(props[3].schema.is_ok());
    }

    #[test]
    fn test_unaddressable_property_name() {
        let node = SchemaNode::parse(&json!({
            "properties": {"a.b": {"type": "string"}}
        }))
        .unwrap();
        assert!(matches!(
            node.properties()[0].schema,
            Err(SchemaError::UnaddressableKey { .. })
        ));
    }

    #[test]
    fn test_nullable_type_list() {
        let node = SchemaNode::parse(&json!({"type": ["null", "integer"]})).unwrap();
        assert_eq!(node.kind, SchemaKind::Integer);

        let err = SchemaNode::parse(&json!({"type": ["null"]})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { .. }));
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let node = SchemaNode::parse(&json!({"type": "color"})).unwrap();
        assert_eq!(node.kind, SchemaKind::Other("color".into()));
        assert_eq!(node.type_name(), "color");
    }

    #[test]
    fn test_ref_resolution() {
        let schema = json!({
            "type": "object",
            "properties": {
                "home": {"$ref": "#/definitions/Address"},
                "work": {"$ref": "#/$defs/Contact"},
                "missing": {"$ref": "#/definitions/Nope"}
            },
            "definitions": {
                "Address": {"type": "object", "properties": {"city": {"type": "string"}}}
            },
            "$defs": {
                "Contact": {"type": "object", "properties": {"phone": {"type": "string"}}}
            }
        });

        let node = SchemaNode::parse(&schema).unwrap();
        let props = node.properties();
        let home = props[0].schema.as_ref().unwrap();
        assert_eq!(home.properties()[0].name, "city");
        let work = props[1].schema.as_ref().unwrap();
        assert_eq!(work.properties()[0].name, "phone");
        assert!(matches!(props[2].schema, Err(SchemaError::UnresolvedRef { .. })));
    }

    #[test]
    fn test_circular_ref_is_reported() {
        let schema = json!({
            "type": "object",
            "properties": {"node": {"$ref": "#/definitions/Node"}},
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {"next": {"$ref": "#/definitions/Node"}}
                }
            }
        });

        let node = SchemaNode::parse(&schema).unwrap();
        let inner = node.properties()[0].schema.as_ref().unwrap();
        assert_eq!(
            inner.properties()[0].schema,
            Err(SchemaError::CircularRef {
                reference: "#/definitions/Node".into()
            })
        );
    }

    #[test]
    fn test_string_enum_vocabulary() {
        let node = SchemaNode::parse(&json!({
            "type": "array",
            "items": {"type": "string", "enum": ["x", "y"]}
        }))
        .unwrap();
        let SchemaKind::Array { items } = &node.kind else {
            panic!("expected array");
        };
        assert_eq!(items.string_enum(), Some(&["x".to_string(), "y".to_string()][..]));
        assert_eq!(node.string_enum(), None);
    }

    #[test]
    fn test_depth_limit() {
        let schema = json!({"properties": {"a": {"properties": {"b": {"type": "string"}}}}});
        let node = SchemaNode::parse_with_depth(&schema, 1).unwrap();
        let a = node.properties()[0].schema.as_ref().unwrap();
        assert!(matches!(a.properties()[0].schema, Err(SchemaError::TooDeep { .. })));
    }
}
