//! Schema-driven form builder
//!
//! Walks a [`SchemaNode`] together with a data record and produces a
//! [`Form`]: the field tree, the flat registry and one live control per leaf.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::controls::{Control, ControlState, Controls, Provenance, Widget};
use super::error::SchemaFieldBuildError;
use super::multi_select::{MultiSelectState, SelectOption};
use super::path::FieldPath;
use super::registry::{FieldId, FieldRegistry, ValueType};
use super::schema::{Property, SchemaKind, SchemaNode};
use super::session::Form;
use super::tree::{ArrayId, ArrayItem, ArrayNode, FieldNode, ItemContent, LeafNode, ObjectNode};

// ============================================================================
// Builder Options
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BuilderOptions {
    /// Label of the "none selected" choice in selects
    pub empty_option_label: String,
    /// Keys containing any of these (case-insensitive) get a long-text control
    pub long_text_keywords: Vec<String>,
    pub long_text_rows: u32,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            empty_option_label: "-- Select --".to_string(),
            long_text_keywords: vec!["description".to_string()],
            long_text_rows: 3,
        }
    }
}

impl BuilderOptions {
    fn is_long_text(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.long_text_keywords
            .iter()
            .any(|keyword| key.contains(&keyword.to_lowercase()))
    }
}

// ============================================================================
// Form Builder
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct SchemaFormBuilder {
    options: BuilderOptions,
}

impl SchemaFormBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build a form for `data` shaped by `schema`.
    ///
    /// Never fails: properties that cannot be built are logged, recorded in
    /// [`Form::build_errors`] and left out.
    pub fn build(&self, schema: &SchemaNode, data: Option<&Value>) -> Form {
        let mut form = Form::empty(self.options.clone(), schema.title.clone());

        match &schema.kind {
            SchemaKind::Object { properties } => {
                let root = FieldPath::root();
                let record = object_data(data, &root);
                let nodes = form.assembler().build_properties(properties, record, &root);
                form.tree.nodes = nodes;
            }
            _ => warn!(
                schema_type = schema.type_name(),
                "root schema is not an object, form has no fields"
            ),
        }

        info!(
            fields = form.registry.len(),
            skipped = form.build_errors.len(),
            "built form"
        );
        form
    }
}

/// Borrowed view of the parts of a [`Form`] that building writes to.
pub(crate) struct Assembler<'a> {
    pub(crate) options: &'a BuilderOptions,
    pub(crate) registry: &'a mut FieldRegistry,
    pub(crate) controls: &'a mut Controls,
    pub(crate) next_array: &'a mut usize,
    pub(crate) errors: &'a mut Vec<SchemaFieldBuildError>,
}

impl Assembler<'_> {
    pub(crate) fn build_properties(
        &mut self,
        properties: &[Property],
        record: Option<&Map<String, Value>>,
        parent: &FieldPath,
    ) -> Vec<FieldNode> {
        let mut nodes = Vec::with_capacity(properties.len());
        for property in properties {
            let path = parent.push_property(&property.name);
            match &property.schema {
                Ok(schema) => {
                    let value = record.and_then(|r| r.get(&property.name));
                    nodes.push(self.build_field(property, schema, value, path));
                }
                Err(source) => {
                    let error = SchemaFieldBuildError {
                        path: path.to_string(),
                        source: source.clone(),
                    };
                    warn!(path = %error.path, error = %error.source, "skipping field");
                    self.errors.push(error);
                }
            }
        }
        nodes
    }

    fn build_field(
        &mut self,
        property: &Property,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: FieldPath,
    ) -> FieldNode {
        let key = property.name.clone();
        let label = schema.title.clone().unwrap_or_else(|| key.clone());

        match &schema.kind {
            SchemaKind::Object { properties } => {
                let record = object_data(value, &path);
                let children = self.build_properties(properties, record, &path);
                FieldNode::Object(ObjectNode {
                    key,
                    label,
                    path,
                    children,
                })
            }
            SchemaKind::Array { items } => match items.string_enum() {
                Some(vocabulary) => {
                    let field = self.build_multi_select(vocabulary, value, path);
                    FieldNode::MultiSelect(LeafNode {
                        key,
                        label,
                        required: property.required,
                        field,
                    })
                }
                None => FieldNode::Array(self.build_array(key, label, items, value, path)),
            },
            _ => {
                let field = self.build_scalar(Some(&key), property.required, schema, value, path);
                FieldNode::Scalar(LeafNode {
                    key,
                    label,
                    required: property.required,
                    field,
                })
            }
        }
    }

    fn build_array(
        &mut self,
        key: String,
        label: String,
        items_schema: &SchemaNode,
        value: Option<&Value>,
        path: FieldPath,
    ) -> ArrayNode {
        let id = ArrayId(*self.next_array);
        *self.next_array += 1;

        let elements: &[Value] = match value {
            Some(Value::Array(elements)) => elements,
            None | Some(Value::Null) => &[],
            Some(_) => {
                warn!(path = %path, "expected an array, starting empty");
                &[]
            }
        };

        let items = elements
            .iter()
            .enumerate()
            .map(|(index, element)| self.build_item(items_schema, Some(element), path.push_index(index)))
            .collect();

        ArrayNode {
            id,
            key,
            label,
            path,
            items_schema: items_schema.clone(),
            items,
        }
    }

    /// Build one array item at `item_path`. `None` yields a default item.
    pub(crate) fn build_item(
        &mut self,
        items_schema: &SchemaNode,
        element: Option<&Value>,
        item_path: FieldPath,
    ) -> ArrayItem {
        let content = match &items_schema.kind {
            SchemaKind::Object { properties } => {
                let record = object_data(element, &item_path);
                ItemContent::Fields(self.build_properties(properties, record, &item_path))
            }
            SchemaKind::Array { .. } => {
                // Nested arrays get one text field per outer item
                if element.is_some_and(|e| !e.is_null()) {
                    warn!(path = %item_path, "nested array item is edited as text, its contents are dropped");
                }
                ItemContent::Value(self.build_scalar(None, false, items_schema, None, item_path.clone()))
            }
            _ => ItemContent::Value(self.build_scalar(None, false, items_schema, element, item_path.clone())),
        };
        ArrayItem {
            path: item_path,
            content,
        }
    }

    fn build_multi_select(&mut self, vocabulary: &[String], value: Option<&Value>, path: FieldPath) -> FieldId {
        let (initial, provenance) = match value {
            Some(Value::Array(elements)) => {
                let initial: Vec<String> = elements
                    .iter()
                    .filter_map(|e| match e {
                        Value::String(s) => Some(s.clone()),
                        other => {
                            warn!(path = %path, value = %other, "ignoring non-string selection");
                            None
                        }
                    })
                    .collect();
                (initial, Provenance::Provided)
            }
            None | Some(Value::Null) => (Vec::new(), Provenance::Default),
            Some(_) => {
                warn!(path = %path, "expected a list of selections, starting empty");
                (Vec::new(), Provenance::Default)
            }
        };

        let state = ControlState::Selection(MultiSelectState::new(vocabulary, &initial));
        let handle = self.controls.insert(Control::new(Widget::MultiSelect, state, provenance));
        self.registry.register(path, ValueType::ArrayOfEnum, handle)
    }

    fn build_scalar(
        &mut self,
        key: Option<&str>,
        required: bool,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: FieldPath,
    ) -> FieldId {
        let (widget, value_type) = self.widget_for(key, required, schema);
        let (state, provenance) = seed_state(&widget, value, &path);
        let handle = self.controls.insert(Control::new(widget, state, provenance));
        self.registry.register(path, value_type, handle)
    }

    fn widget_for(&self, key: Option<&str>, required: bool, schema: &SchemaNode) -> (Widget, ValueType) {
        match &schema.kind {
            SchemaKind::String => {
                if let Some(vocabulary) = schema.string_enum() {
                    let placeholder = (!required)
                        .then(|| SelectOption::new("", self.options.empty_option_label.as_str()));
                    let options = placeholder
                        .into_iter()
                        .chain(vocabulary.iter().map(|v| SelectOption::plain(v)))
                        .collect();
                    (Widget::Select { options }, ValueType::String)
                } else if schema.format.as_deref() == Some("date") {
                    (Widget::Date, ValueType::String)
                } else if key.is_some_and(|k| self.options.is_long_text(k)) {
                    (
                        Widget::LongText {
                            rows: self.options.long_text_rows,
                        },
                        ValueType::String,
                    )
                } else {
                    (Widget::Text, ValueType::String)
                }
            }
            SchemaKind::Number | SchemaKind::Integer => {
                let integer = schema.kind == SchemaKind::Integer;
                let widget = Widget::Number {
                    integer,
                    minimum: schema.minimum,
                    maximum: schema.maximum,
                };
                let value_type = if integer { ValueType::Integer } else { ValueType::Number };
                (widget, value_type)
            }
            SchemaKind::Boolean => (Widget::Checkbox, ValueType::Boolean),
            _ => {
                debug!(schema_type = schema.type_name(), "no dedicated control, using text");
                (Widget::Text, ValueType::String)
            }
        }
    }
}

/// Initial control state from the record value, falling back to the
/// type default when the value is missing or unusable.
fn seed_state(widget: &Widget, value: Option<&Value>, path: &FieldPath) -> (ControlState, Provenance) {
    let value = value.filter(|v| !v.is_null());

    match widget {
        Widget::Checkbox => match value {
            Some(v) => (ControlState::Checked(v == &Value::Bool(true)), Provenance::Provided),
            None => (ControlState::Checked(false), Provenance::Default),
        },
        Widget::Select { options } => {
            let matched = value
                .and_then(Value::as_str)
                .filter(|v| options.iter().any(|o| o.value == *v));
            match matched {
                Some(v) => (ControlState::Text(v.to_string()), Provenance::Provided),
                None => {
                    if let Some(v) = value {
                        debug!(path = %path, value = %v, "value is not an option, using default");
                    }
                    // Without a placeholder the first enum value is preselected
                    let default = options.first().map(|o| o.value.clone()).unwrap_or_default();
                    (ControlState::Text(default), Provenance::Default)
                }
            }
        }
        _ => match value {
            Some(Value::String(s)) => (ControlState::Text(s.clone()), Provenance::Provided),
            Some(Value::Number(n)) => (ControlState::Text(n.to_string()), Provenance::Provided),
            Some(Value::Bool(b)) => (ControlState::Text(b.to_string()), Provenance::Provided),
            Some(other) => {
                warn!(path = %path, value = %other, "cannot show a structured value in a scalar field");
                (ControlState::Text(String::new()), Provenance::Default)
            }
            None => (ControlState::Text(String::new()), Provenance::Default),
        },
    }
}

/// Object data for a nested record. Non-objects are treated as absent.
fn object_data<'a>(value: Option<&'a Value>, path: &FieldPath) -> Option<&'a Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Some(map),
        None | Some(Value::Null) => None,
        Some(_) => {
            warn!(path = %path, "expected an object, using defaults");
            None
        }
    }
}
