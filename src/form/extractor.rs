//! Reconstructs a record from a field registry
//!
//! Extraction runs in two passes. The first collects live descriptors and
//! compacts array positions per array; the second writes each coerced value
//! through the shared path writer. Extraction only reads, so repeated calls
//! on unchanged state return equal records.

use serde_json::{Map, Value};
use tracing::{error, warn};

use super::compact::IndexCompactor;
use super::controls::FieldStates;
use super::error::ExtractError;
use super::path::{write_at_path, FieldPath};
use super::registry::{FieldId, FieldRegistry};

/// One entry of the output, in write order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Slot {
    /// A registered field, read through its control
    Field(FieldId),
    /// A fixed value, such as `[]` for an array without items
    Fill(FieldPath, Value),
}

/// Result of a successful extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub value: Value,
    /// Fields whose control no longer exists
    pub skipped: Vec<FieldId>,
}

pub struct FormDataExtractor;

impl FormDataExtractor {
    /// Rebuild the record, or `None` when the registry is absent or malformed.
    pub fn extract<S>(registry: Option<&FieldRegistry>, states: &S) -> Option<Value>
    where
        S: FieldStates + ?Sized,
    {
        match Self::extract_detailed(registry, states) {
            Ok(extraction) => Some(extraction.value),
            Err(e) => {
                error!(error = %e, "extraction failed");
                None
            }
        }
    }

    pub fn extract_detailed<S>(
        registry: Option<&FieldRegistry>,
        states: &S,
    ) -> Result<Extraction, ExtractError>
    where
        S: FieldStates + ?Sized,
    {
        let registry = registry.ok_or(ExtractError::MissingRegistry)?;
        let order = registry.iter().map(|d| Slot::Field(d.id)).collect();
        Self::extract_ordered(registry, states, order)
    }

    /// Extract the entries of `order`, written in that order. Fill entries
    /// take part in index compaction alongside the registered fields.
    pub(crate) fn extract_ordered<S>(
        registry: &FieldRegistry,
        states: &S,
        order: Vec<Slot>,
    ) -> Result<Extraction, ExtractError>
    where
        S: FieldStates + ?Sized,
    {
        registry.check_unique_paths()?;

        // Pass 1: live entries and the position mapping
        let mut compactor = IndexCompactor::new();
        let mut live = Vec::with_capacity(order.len());
        let mut skipped = Vec::new();
        for slot in order {
            let (path, value) = match slot {
                Slot::Field(id) => {
                    let Some(descriptor) = registry.get(id) else {
                        continue;
                    };
                    match states.current_value(descriptor.handle) {
                        Some(value) => (descriptor.path.clone(), value),
                        None => {
                            warn!(path = %descriptor.path, "field has no live control, skipping");
                            skipped.push(descriptor.id);
                            continue;
                        }
                    }
                }
                Slot::Fill(path, value) => (path, value),
            };
            compactor.observe(&path);
            live.push((path, value));
        }
        let mapping = compactor.finish();

        // Pass 2: write through the path writer
        let mut record = Value::Object(Map::new());
        for (path, value) in live {
            write_at_path(&mut record, &mapping.remap(&path), value);
        }

        Ok(Extraction {
            value: record,
            skipped,
        })
    }
}
