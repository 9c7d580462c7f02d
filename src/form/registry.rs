//! Flat field registry
//!
//! One [`FieldDescriptor`] per leaf field, keyed by a stable [`FieldId`].
//! Paths are data, not keys: reindexing rewrites them in place while ids and
//! handles stay put.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::controls::ControlId;
use super::error::ExtractError;
use super::path::FieldPath;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    /// Multi-select over an enumerated string vocabulary
    ArrayOfEnum,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub path: FieldPath,
    pub value_type: ValueType,
    pub handle: ControlId,
}

impl FieldDescriptor {
    pub fn is_multi_select(&self) -> bool {
        self.value_type == ValueType::ArrayOfEnum
    }
}

#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    entries: BTreeMap<FieldId, FieldDescriptor>,
    next_id: usize,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: FieldPath, value_type: ValueType, handle: ControlId) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            FieldDescriptor {
                id,
                path,
                value_type,
                handle,
            },
        );
        id
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: FieldId) -> Option<&mut FieldDescriptor> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: FieldId) -> Option<FieldDescriptor> {
        self.entries.remove(&id)
    }

    pub fn find_by_path(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        self.entries.values().find(|d| &d.path == path)
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every path must be unique at any instant.
    pub fn check_unique_paths(&self) -> Result<(), ExtractError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for descriptor in self.entries.values() {
            if !seen.insert(&descriptor.path) {
                return Err(ExtractError::MalformedRegistry(format!(
                    "duplicate path '{}'",
                    descriptor.path
                )));
            }
        }
        Ok(())
    }

    /// Snapshot as a JSON list of descriptors
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries.values().collect::<Vec<_>>())
    }

    /// Restore a snapshot written by [`FieldRegistry::to_json`].
    pub fn from_json(raw: &str) -> Result<Self, ExtractError> {
        let descriptors: Vec<FieldDescriptor> =
            serde_json::from_str(raw).map_err(|e| ExtractError::MalformedRegistry(e.to_string()))?;

        let mut registry = Self::new();
        for descriptor in descriptors {
            let id = descriptor.id;
            if registry.entries.insert(id, descriptor).is_some() {
                return Err(ExtractError::MalformedRegistry(format!(
                    "duplicate field id {}",
                    id.0
                )));
            }
            let after = id.0.checked_add(1).ok_or_else(|| {
                ExtractError::MalformedRegistry(format!("field id {} is out of range", id.0))
            })?;
            registry.next_id = registry.next_id.max(after);
        }
        registry.check_unique_paths()?;
        Ok(registry)
    }
}
