//! Editing sessions
//!
//! A [`Form`] owns everything one mounted form needs: the field tree, the
//! registry and the control arena. [`FormHost`] keeps at most one form per
//! mount target.

use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info};

use super::builder::{Assembler, BuilderOptions, SchemaFormBuilder};
use super::controls::{Control, Controls, Provenance};
use super::error::{EditRejection, ExtractError, FormError, SchemaFieldBuildError};
use super::extractor::{Extraction, FormDataExtractor, Slot};
use super::multi_select::{MultiSelectState, SelectOption};
use super::path::FieldPath;
use super::registry::{FieldDescriptor, FieldId, FieldRegistry};
use super::schema::SchemaNode;
use super::tree::{find_array, find_array_mut, ArrayId, ArrayNode, FieldNode, FieldTree, ItemContent};

// ============================================================================
// Form
// ============================================================================

#[derive(Debug)]
pub struct Form {
    pub(crate) tree: FieldTree,
    pub(crate) registry: FieldRegistry,
    pub(crate) controls: Controls,
    pub(crate) options: BuilderOptions,
    pub(crate) next_array: usize,
    pub(crate) build_errors: Vec<SchemaFieldBuildError>,
}

impl Form {
    pub(crate) fn empty(options: BuilderOptions, title: Option<String>) -> Self {
        Self {
            tree: FieldTree {
                title,
                nodes: Vec::new(),
            },
            registry: FieldRegistry::new(),
            controls: Controls::new(),
            options,
            next_array: 0,
            build_errors: Vec::new(),
        }
    }

    pub(crate) fn assembler(&mut self) -> Assembler<'_> {
        Assembler {
            options: &self.options,
            registry: &mut self.registry,
            controls: &mut self.controls,
            next_array: &mut self.next_array,
            errors: &mut self.build_errors,
        }
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Properties that were skipped while building
    pub fn build_errors(&self) -> &[SchemaFieldBuildError] {
        &self.build_errors
    }

    pub fn field(&self, path: &str) -> Result<&FieldDescriptor, FormError> {
        let parsed = FieldPath::parse(path)?;
        self.registry
            .find_by_path(&parsed)
            .ok_or_else(|| FormError::UnknownField(path.to_string()))
    }

    fn control(&self, path: &str) -> Result<&Control, FormError> {
        let handle = self.field(path)?.handle;
        self.controls
            .get(handle)
            .ok_or_else(|| FormError::MissingElement(path.to_string()))
    }

    fn control_mut(&mut self, path: &str) -> Result<&mut Control, FormError> {
        let handle = self.field(path)?.handle;
        self.controls
            .get_mut(handle)
            .ok_or_else(|| FormError::MissingElement(path.to_string()))
    }

    /// Current value of a field, coerced as extraction would read it
    pub fn value(&self, path: &str) -> Result<Value, FormError> {
        Ok(self.control(path)?.read())
    }

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), FormError> {
        self.control_mut(path)?
            .assign(&value)
            .map_err(|reason| rejected(path, reason))?;
        debug!(path, "field edited");
        Ok(())
    }

    pub fn selection(&self, path: &str) -> Result<&MultiSelectState, FormError> {
        self.control(path)?
            .selection()
            .ok_or_else(|| FormError::NotMultiSelect(path.to_string()))
    }

    /// Options currently offered by a multi-select's selector
    pub fn selector_options(&self, path: &str) -> Result<Vec<SelectOption>, FormError> {
        Ok(self
            .selection(path)?
            .selector_options(&self.options.empty_option_label))
    }

    pub fn select_option(&mut self, path: &str, option: &str) -> Result<(), FormError> {
        self.edit_selection(path, |selection| selection.select(option))
    }

    pub fn deselect_option(&mut self, path: &str, option: &str) -> Result<(), FormError> {
        self.edit_selection(path, |selection| selection.deselect(option))
    }

    fn edit_selection<F>(&mut self, path: &str, edit: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut MultiSelectState) -> Result<(), EditRejection>,
    {
        self.control_mut(path)?
            .edit_selection(edit)
            .ok_or_else(|| FormError::NotMultiSelect(path.to_string()))?
            .map_err(|reason| rejected(path, reason))
    }

    // ------------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------------

    /// Stable id of the array currently at `path`
    pub fn array_id(&self, path: &str) -> Result<ArrayId, FormError> {
        let parsed = FieldPath::parse(path)?;
        find_array(&self.tree.nodes, &parsed)
            .map(|array| array.id)
            .ok_or_else(|| FormError::UnknownArray(path.to_string()))
    }

    pub fn array(&self, path: &str) -> Result<&ArrayNode, FormError> {
        let parsed = FieldPath::parse(path)?;
        find_array(&self.tree.nodes, &parsed).ok_or_else(|| FormError::UnknownArray(path.to_string()))
    }

    /// Append a default-valued item. Returns its index.
    pub fn append_item(&mut self, array_path: &str) -> Result<usize, FormError> {
        let id = self.array_id(array_path)?;
        self.append_item_to(id)
    }

    pub fn append_item_to(&mut self, id: ArrayId) -> Result<usize, FormError> {
        let mut assembler = Assembler {
            options: &self.options,
            registry: &mut self.registry,
            controls: &mut self.controls,
            next_array: &mut self.next_array,
            errors: &mut self.build_errors,
        };
        let array = find_array_mut(&mut self.tree.nodes, id)
            .ok_or_else(|| FormError::UnknownArray(format!("{:?}", id)))?;

        let index = array.next_index();
        let item = assembler.build_item(&array.items_schema, None, array.path.push_index(index));
        array.items.push(item);
        debug!(array = %array.path, index, "appended item");
        Ok(index)
    }

    /// Remove the item at `index` and reindex the remaining items.
    pub fn remove_item(&mut self, array_path: &str, index: usize) -> Result<(), FormError> {
        let id = self.array_id(array_path)?;
        self.remove_item_from(id, index)
    }

    pub fn remove_item_from(&mut self, id: ArrayId, index: usize) -> Result<(), FormError> {
        self.detach_item(id, index)?;
        self.reindex_array(id)?;
        Ok(())
    }

    /// Drop an item together with its registry entries and controls,
    /// leaving sibling positions as they were.
    pub(crate) fn detach_item(&mut self, id: ArrayId, index: usize) -> Result<(), FormError> {
        let array = find_array_mut(&mut self.tree.nodes, id)
            .ok_or_else(|| FormError::UnknownArray(format!("{:?}", id)))?;
        if index >= array.items.len() {
            return Err(FormError::ItemOutOfRange {
                path: array.path.to_string(),
                index,
                len: array.items.len(),
            });
        }

        let item = array.items.remove(index);
        let mut released = Vec::new();
        item.collect_fields(&mut released);
        for field in &released {
            if let Some(descriptor) = self.registry.remove(*field) {
                self.controls.release(descriptor.handle);
            }
        }
        debug!(array = %array.path, index, fields = released.len(), "removed item");
        Ok(())
    }

    /// Relabel the items of the array at `array_path` to 0..n-1.
    pub fn reindex(&mut self, array_path: &str) -> Result<(), FormError> {
        let id = self.array_id(array_path)?;
        self.reindex_array(id)
    }

    fn reindex_array(&mut self, id: ArrayId) -> Result<(), FormError> {
        let array = find_array_mut(&mut self.tree.nodes, id)
            .ok_or_else(|| FormError::UnknownArray(format!("{:?}", id)))?;
        if array.reindex(&mut self.registry) {
            debug!(array = %array.path, items = array.items.len(), "reindexed");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------------

    /// Reconstruct the edited record. Arrays without items and objects
    /// without fields appear as `[]` and `{}`.
    pub fn extract(&self) -> Option<Value> {
        match self.extract_detailed() {
            Ok(extraction) => Some(extraction.value),
            Err(e) => {
                error!(error = %e, "extraction failed");
                None
            }
        }
    }

    pub fn extract_detailed(&self) -> Result<Extraction, ExtractError> {
        let mut order = Vec::with_capacity(self.registry.len());
        output_slots(&self.tree.nodes, &mut order);

        // Registered fields the tree does not reach still go out, last
        let reached: HashSet<FieldId> = order
            .iter()
            .filter_map(|slot| match slot {
                Slot::Field(id) => Some(*id),
                Slot::Fill(..) => None,
            })
            .collect();
        order.extend(
            self.registry
                .iter()
                .filter(|d| !reached.contains(&d.id))
                .map(|d| Slot::Field(d.id)),
        );

        FormDataExtractor::extract_ordered(&self.registry, &self.controls, order)
    }

    /// Paths of fields still holding a synthesized default
    pub fn synthesized_paths(&self) -> Vec<FieldPath> {
        self.registry
            .iter()
            .filter(|d| {
                self.controls
                    .get(d.handle)
                    .is_some_and(|c| c.provenance() == Provenance::Default)
            })
            .map(|d| d.path.clone())
            .collect()
    }
}

fn rejected(path: &str, reason: EditRejection) -> FormError {
    FormError::Rejected {
        path: path.to_string(),
        reason,
    }
}

/// Output entries in tree order. Arrays with no items and objects with no
/// children become fills with the matching empty value.
fn output_slots(nodes: &[FieldNode], out: &mut Vec<Slot>) {
    for node in nodes {
        match node {
            FieldNode::Scalar(leaf) | FieldNode::MultiSelect(leaf) => out.push(Slot::Field(leaf.field)),
            FieldNode::Object(object) if object.children.is_empty() => {
                out.push(Slot::Fill(object.path.clone(), Value::Object(Map::new())))
            }
            FieldNode::Object(object) => output_slots(&object.children, out),
            FieldNode::Array(array) if array.items.is_empty() => {
                out.push(Slot::Fill(array.path.clone(), Value::Array(Vec::new())))
            }
            FieldNode::Array(array) => {
                for item in &array.items {
                    match &item.content {
                        ItemContent::Fields(children) if children.is_empty() => {
                            out.push(Slot::Fill(item.path.clone(), Value::Object(Map::new())))
                        }
                        ItemContent::Fields(children) => output_slots(children, out),
                        ItemContent::Value(field) => out.push(Slot::Field(*field)),
                    }
                }
            }
        }
    }
}

// ============================================================================
// Form Host
// ============================================================================

/// Mount points for forms, one form per target.
#[derive(Debug, Default)]
pub struct FormHost {
    builder: SchemaFormBuilder,
    mounted: HashMap<String, Form>,
}

impl FormHost {
    pub fn new(builder: SchemaFormBuilder) -> Self {
        Self {
            builder,
            mounted: HashMap::new(),
        }
    }

    /// Build a form into `target`, discarding whatever was mounted there.
    pub fn mount(&mut self, target: &str, schema: &SchemaNode, data: Option<&Value>) -> &mut Form {
        let form = self.builder.build(schema, data);
        match self.mounted.entry(target.to_string()) {
            Entry::Occupied(mut slot) => {
                info!(mount = %target, "replacing mounted form");
                slot.insert(form);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(form),
        }
    }

    pub fn form(&self, target: &str) -> Option<&Form> {
        self.mounted.get(target)
    }

    pub fn form_mut(&mut self, target: &str) -> Option<&mut Form> {
        self.mounted.get_mut(target)
    }

    /// Discard a form without extracting it.
    pub fn unmount(&mut self, target: &str) -> Option<Form> {
        self.mounted.remove(target)
    }

    /// Extract the form mounted at `target`.
    pub fn save(&self, target: &str) -> Option<Value> {
        self.mounted.get(target).and_then(Form::extract)
    }
}
