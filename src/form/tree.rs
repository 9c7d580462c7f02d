//! Field tree produced by the form builder
//!
//! The tree mirrors the schema: objects group children, arrays own an ordered
//! list of items, and leaves point at registry entries by [`FieldId`].

use super::compact::{IndexCompactor, IndexMapping};
use super::path::FieldPath;
use super::registry::{FieldId, FieldRegistry};
use super::schema::SchemaNode;

/// Stable identity of an array node, unaffected by reindexing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayId(pub(crate) usize);

#[derive(Clone, Debug, Default)]
pub struct FieldTree {
    pub title: Option<String>,
    pub nodes: Vec<FieldNode>,
}

#[derive(Clone, Debug)]
pub enum FieldNode {
    Scalar(LeafNode),
    Object(ObjectNode),
    Array(ArrayNode),
    MultiSelect(LeafNode),
}

#[derive(Clone, Debug)]
pub struct LeafNode {
    pub key: String,
    pub label: String,
    pub required: bool,
    pub field: FieldId,
}

#[derive(Clone, Debug)]
pub struct ObjectNode {
    pub key: String,
    pub label: String,
    pub path: FieldPath,
    pub children: Vec<FieldNode>,
}

#[derive(Clone, Debug)]
pub struct ArrayNode {
    pub id: ArrayId,
    pub key: String,
    pub label: String,
    pub path: FieldPath,
    pub items_schema: SchemaNode,
    pub items: Vec<ArrayItem>,
}

#[derive(Clone, Debug)]
pub struct ArrayItem {
    pub path: FieldPath,
    pub content: ItemContent,
}

#[derive(Clone, Debug)]
pub enum ItemContent {
    /// Object item: one node per item property
    Fields(Vec<FieldNode>),
    /// Scalar item registered directly at the item path
    Value(FieldId),
}

impl FieldNode {
    pub fn key(&self) -> &str {
        match self {
            FieldNode::Scalar(leaf) | FieldNode::MultiSelect(leaf) => &leaf.key,
            FieldNode::Object(object) => &object.key,
            FieldNode::Array(array) => &array.key,
        }
    }

    /// Every field id registered at or below this node
    pub fn collect_fields(&self, out: &mut Vec<FieldId>) {
        match self {
            FieldNode::Scalar(leaf) | FieldNode::MultiSelect(leaf) => out.push(leaf.field),
            FieldNode::Object(object) => {
                for child in &object.children {
                    child.collect_fields(out);
                }
            }
            FieldNode::Array(array) => {
                for item in &array.items {
                    item.collect_fields(out);
                }
            }
        }
    }

    fn rebase(&mut self, mapping: &IndexMapping, registry: &mut FieldRegistry) {
        match self {
            FieldNode::Scalar(leaf) | FieldNode::MultiSelect(leaf) => {
                rebase_field(leaf.field, mapping, registry)
            }
            FieldNode::Object(object) => {
                object.path = mapping.remap(&object.path);
                for child in &mut object.children {
                    child.rebase(mapping, registry);
                }
            }
            FieldNode::Array(array) => {
                array.path = mapping.remap(&array.path);
                for item in &mut array.items {
                    item.rebase(mapping, registry);
                }
            }
        }
    }
}

impl ArrayItem {
    /// Position of this item within its array
    pub fn index(&self) -> usize {
        self.path.last_index().unwrap_or_default()
    }

    pub fn collect_fields(&self, out: &mut Vec<FieldId>) {
        match &self.content {
            ItemContent::Fields(children) => {
                for child in children {
                    child.collect_fields(out);
                }
            }
            ItemContent::Value(field) => out.push(*field),
        }
    }

    fn rebase(&mut self, mapping: &IndexMapping, registry: &mut FieldRegistry) {
        self.path = mapping.remap(&self.path);
        match &mut self.content {
            ItemContent::Fields(children) => {
                for child in children {
                    child.rebase(mapping, registry);
                }
            }
            ItemContent::Value(field) => rebase_field(*field, mapping, registry),
        }
    }
}

fn rebase_field(field: FieldId, mapping: &IndexMapping, registry: &mut FieldRegistry) {
    if let Some(descriptor) = registry.get_mut(field) {
        descriptor.path = mapping.remap(&descriptor.path);
    }
}

impl ArrayNode {
    /// Position the next appended item takes
    pub fn next_index(&self) -> usize {
        self.items.last().map_or(0, |item| item.index() + 1)
    }

    /// Relabel items 0..n-1 in display order, rewriting every nested path
    /// and registry entry. Returns whether anything moved.
    pub fn reindex(&mut self, registry: &mut FieldRegistry) -> bool {
        let depth = self.path.depth();
        debug_assert!(self.items.windows(2).all(|w| w[0].index() < w[1].index()));

        let mut compactor = IndexCompactor::new();
        for item in &self.items {
            compactor.observe_at(&item.path, depth);
        }
        let mapping = compactor.finish();
        if mapping.is_identity() {
            return false;
        }

        for item in &mut self.items {
            item.rebase(&mapping, registry);
        }
        true
    }
}

/// Find an array by id anywhere below `nodes`.
pub(crate) fn find_array_mut(nodes: &mut [FieldNode], id: ArrayId) -> Option<&mut ArrayNode> {
    for node in nodes.iter_mut() {
        match node {
            FieldNode::Array(array) => {
                if array.id == id {
                    return Some(array);
                }
                for item in array.items.iter_mut() {
                    if let ItemContent::Fields(children) = &mut item.content {
                        if let Some(found) = find_array_mut(children, id) {
                            return Some(found);
                        }
                    }
                }
            }
            FieldNode::Object(object) => {
                if let Some(found) = find_array_mut(&mut object.children, id) {
                    return Some(found);
                }
            }
            FieldNode::Scalar(_) | FieldNode::MultiSelect(_) => {}
        }
    }
    None
}

/// Find an array by its current path anywhere below `nodes`.
pub(crate) fn find_array<'a>(nodes: &'a [FieldNode], path: &FieldPath) -> Option<&'a ArrayNode> {
    nodes.iter().find_map(|node| match node {
        FieldNode::Array(array) if &array.path == path => Some(array),
        FieldNode::Array(array) if path.starts_with(&array.path) => {
            array.items.iter().find_map(|item| match &item.content {
                ItemContent::Fields(children) => find_array(children, path),
                ItemContent::Value(_) => None,
            })
        }
        FieldNode::Object(object) if path.starts_with(&object.path) => {
            find_array(&object.children, path)
        }
        _ => None,
    })
}
