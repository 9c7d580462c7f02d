//! Multi-select state for arrays of enumerated strings

use tracing::debug;

use super::error::EditRejection;

/// An option shown in a select control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label is its value
    pub fn plain(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// Selected values in selection order, plus the values still on offer.
///
/// A value is never both selected and available. Values seeded from data that
/// are outside the vocabulary stay selected but never return to the selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSelectState {
    vocabulary: Vec<String>,
    selected: Vec<String>,
    available: Vec<String>,
}

impl MultiSelectState {
    pub fn new(vocabulary: &[String], initial: &[String]) -> Self {
        let mut selected: Vec<String> = Vec::with_capacity(initial.len());
        for value in initial {
            if selected.contains(value) {
                debug!(value = %value, "dropping duplicate selection");
                continue;
            }
            if !vocabulary.contains(value) {
                debug!(value = %value, "keeping selection outside the vocabulary");
            }
            selected.push(value.clone());
        }

        let mut available: Vec<String> = vocabulary
            .iter()
            .filter(|v| !selected.contains(v))
            .cloned()
            .collect();
        available.sort();

        Self {
            vocabulary: vocabulary.to_vec(),
            selected,
            available,
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// Move `option` from the selector to the end of the selection.
    pub fn select(&mut self, option: &str) -> Result<(), EditRejection> {
        if self.selected.iter().any(|v| v == option) {
            return Err(EditRejection::AlreadySelected(option.to_string()));
        }
        let pos = self
            .available
            .iter()
            .position(|v| v == option)
            .ok_or_else(|| EditRejection::InvalidOption(option.to_string()))?;
        let value = self.available.remove(pos);
        self.selected.push(value);
        Ok(())
    }

    /// Return `option` to the selector, which is then kept alphabetical.
    pub fn deselect(&mut self, option: &str) -> Result<(), EditRejection> {
        let pos = self
            .selected
            .iter()
            .position(|v| v == option)
            .ok_or_else(|| EditRejection::NotSelected(option.to_string()))?;
        let value = self.selected.remove(pos);
        if self.vocabulary.contains(&value) {
            self.available.push(value);
            self.available.sort();
        }
        Ok(())
    }

    /// Replace the whole selection. Nothing changes if any value is rejected.
    pub fn replace(&mut self, values: &[String]) -> Result<(), EditRejection> {
        let mut next = Self::new(&self.vocabulary, &[]);
        for value in values {
            next.select(value)?;
        }
        *self = next;
        Ok(())
    }

    /// Selector contents: the empty placeholder first, then available values.
    pub fn selector_options(&self, placeholder: &str) -> Vec<SelectOption> {
        std::iter::once(SelectOption::new("", placeholder))
            .chain(self.available.iter().map(|v| SelectOption::plain(v)))
            .collect()
    }
}
