//! Scripted form edits
//!
//! An edit script is a list of operations applied in order to a built form,
//! the batch counterpart of a user typing into controls. Scripts load from
//! JSON or YAML:
//!
//! ```yaml
//! - op: set
//!   path: people[0].name
//!   value: Ada
//! - op: append
//!   array: people
//! - op: remove
//!   array: people
//!   index: 1
//! - op: select
//!   path: tags
//!   option: blue
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::form::{Form, FormError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormEdit {
    Set { path: String, value: Value },
    Append { array: String },
    Remove { array: String, index: usize },
    Select { path: String, option: String },
    Deselect { path: String, option: String },
}

impl FormEdit {
    pub fn apply(&self, form: &mut Form) -> Result<(), FormError> {
        match self {
            FormEdit::Set { path, value } => form.set_value(path, value.clone()),
            FormEdit::Append { array } => form.append_item(array).map(|index| {
                debug!(array = %array, index, "appended item");
            }),
            FormEdit::Remove { array, index } => form.remove_item(array, *index),
            FormEdit::Select { path, option } => form.select_option(path, option),
            FormEdit::Deselect { path, option } => form.deselect_option(path, option),
        }
    }
}

#[derive(Debug, Error)]
#[error("edit {step} failed: {source}")]
pub struct ScriptError {
    /// Zero-based position of the failing edit
    pub step: usize,
    #[source]
    pub source: FormError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript(pub Vec<FormEdit>);

impl EditScript {
    /// Load a script, picking the format from the file extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading edit script {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let script = match ext {
            "json" => Self::from_json_str(&content)?,
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            other => anyhow::bail!(
                "unsupported edit script format '{}' for {}",
                other,
                path.display()
            ),
        };
        Ok(script)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every edit in order, stopping at the first failure. Edits before
    /// the failing one stay applied.
    pub fn apply(&self, form: &mut Form) -> Result<(), ScriptError> {
        for (step, edit) in self.0.iter().enumerate() {
            edit.apply(form)
                .map_err(|source| ScriptError { step, source })?;
        }
        info!(edits = self.0.len(), "applied edit script");
        Ok(())
    }
}
