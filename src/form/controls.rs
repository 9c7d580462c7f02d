//! Live editable controls
//!
//! Every registered field points at one [`Control`] in the [`Controls`] arena.
//! A control holds raw editable state (text, a checkbox flag, or a
//! multi-selection) and converts it to a typed JSON value when read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::EditRejection;
use super::multi_select::{MultiSelectState, SelectOption};

/// Opaque handle to a control in [`Controls`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(usize);

/// Where a control's current value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Synthesized because the input record had no value
    Default,
    /// Seeded from the input record
    Provided,
    /// Changed during the editing session
    Edited,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Widget {
    Text,
    LongText {
        rows: u32,
    },
    /// ISO `YYYY-MM-DD` text
    Date,
    Select {
        options: Vec<SelectOption>,
    },
    Number {
        integer: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Checkbox,
    MultiSelect,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlState {
    Text(String),
    Checked(bool),
    Selection(MultiSelectState),
}

#[derive(Clone, Debug)]
pub struct Control {
    widget: Widget,
    state: ControlState,
    provenance: Provenance,
}

impl Control {
    pub fn new(widget: Widget, state: ControlState, provenance: Provenance) -> Self {
        Self {
            widget,
            state,
            provenance,
        }
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn selection(&self) -> Option<&MultiSelectState> {
        match &self.state {
            ControlState::Selection(selection) => Some(selection),
            _ => None,
        }
    }

    /// Current value, coerced by control type
    pub fn read(&self) -> Value {
        match &self.state {
            ControlState::Checked(checked) => Value::Bool(*checked),
            ControlState::Selection(selection) => Value::Array(
                selection
                    .selected()
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
            ControlState::Text(text) => match self.widget {
                Widget::Number { integer, .. } => parse_number(text, integer),
                _ => Value::String(text.clone()),
            },
        }
    }

    /// Apply a user edit. On rejection the control is unchanged.
    pub fn assign(&mut self, value: &Value) -> Result<(), EditRejection> {
        let next = match &self.widget {
            Widget::Checkbox => match value {
                Value::Bool(checked) => ControlState::Checked(*checked),
                other => return Err(mismatch("boolean", other)),
            },
            Widget::MultiSelect => {
                let values = string_list(value)?;
                let mut selection = self
                    .selection()
                    .cloned()
                    .ok_or_else(|| mismatch("selection", value))?;
                selection.replace(&values)?;
                ControlState::Selection(selection)
            }
            Widget::Select { options } => {
                let chosen = match value {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => return Err(mismatch("string", other)),
                };
                if !options.iter().any(|o| o.value == chosen) {
                    return Err(EditRejection::InvalidOption(chosen));
                }
                ControlState::Text(chosen)
            }
            Widget::Date => {
                let text = match value {
                    Value::Null => String::new(),
                    Value::String(s) => s.trim().to_string(),
                    other => return Err(mismatch("date string", other)),
                };
                if !text.is_empty() && NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_err() {
                    return Err(EditRejection::InvalidDate(text));
                }
                ControlState::Text(text)
            }
            Widget::Number {
                integer,
                minimum,
                maximum,
            } => {
                let text = match value {
                    Value::Null => String::new(),
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.trim().to_string(),
                    other => return Err(mismatch("number", other)),
                };
                if !text.is_empty() {
                    check_number(&text, *integer, *minimum, *maximum)?;
                }
                ControlState::Text(text)
            }
            Widget::Text | Widget::LongText { .. } => match value {
                Value::Null => ControlState::Text(String::new()),
                Value::String(s) => ControlState::Text(s.clone()),
                Value::Number(n) => ControlState::Text(n.to_string()),
                Value::Bool(b) => ControlState::Text(b.to_string()),
                other => return Err(mismatch("text", other)),
            },
        };

        self.state = next;
        self.provenance = Provenance::Edited;
        Ok(())
    }

    /// Run `edit` against the multi-selection, if this control has one.
    pub(crate) fn edit_selection<F>(&mut self, edit: F) -> Option<Result<(), EditRejection>>
    where
        F: FnOnce(&mut MultiSelectState) -> Result<(), EditRejection>,
    {
        let ControlState::Selection(selection) = &mut self.state else {
            return None;
        };
        let result = edit(selection);
        if result.is_ok() {
            self.provenance = Provenance::Edited;
        }
        Some(result)
    }
}

/// Blank or unparseable text reads as null. Integer fields read integral
/// values such as `1e3` as integers.
fn parse_number(text: &str, integer: bool) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(int) = text.parse::<u64>() {
        return Value::Number(int.into());
    }
    let Some(float) = text.parse::<f64>().ok().filter(|n| n.is_finite()) else {
        return Value::Null;
    };
    if integer && float.fract() == 0.0 {
        // Bounds are powers of two, so the casts below are exact
        if float >= i64::MIN as f64 && float < i64::MAX as f64 {
            return Value::Number((float as i64).into());
        }
        if float >= 0.0 && float < u64::MAX as f64 {
            return Value::Number((float as u64).into());
        }
    }
    Number::from_f64(float).map(Value::Number).unwrap_or(Value::Null)
}

fn check_number(
    text: &str,
    integer: bool,
    minimum: Option<f64>,
    maximum: Option<f64>,
) -> Result<(), EditRejection> {
    let parsed: f64 = text
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| EditRejection::NotANumber(text.to_string()))?;

    if integer && parsed.fract() != 0.0 {
        return Err(EditRejection::TypeMismatch {
            expected: "integer",
            actual: text.to_string(),
        });
    }
    if minimum.is_some_and(|min| parsed < min) || maximum.is_some_and(|max| parsed > max) {
        return Err(EditRejection::OutOfRange { value: parsed });
    }
    Ok(())
}

fn string_list(value: &Value) -> Result<Vec<String>, EditRejection> {
    let Value::Array(items) = value else {
        return Err(mismatch("list of strings", value));
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        })
        .collect()
}

fn mismatch(expected: &'static str, actual: &Value) -> EditRejection {
    let actual = match actual {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    EditRejection::TypeMismatch {
        expected,
        actual: actual.to_string(),
    }
}

// ============================================================================
// Control Arena
// ============================================================================

/// Read access to live field values, keyed by control handle.
pub trait FieldStates {
    /// `None` when the handle no longer refers to a live control.
    fn current_value(&self, handle: ControlId) -> Option<Value>;
}

/// Arena of controls. Released slots are never reused, so a stale handle
/// can only ever resolve to nothing.
#[derive(Debug, Default)]
pub struct Controls {
    slots: Vec<Option<Control>>,
    live: usize,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, control: Control) -> ControlId {
        self.slots.push(Some(control));
        self.live += 1;
        ControlId(self.slots.len() - 1)
    }

    pub fn release(&mut self, id: ControlId) -> Option<Control> {
        let released = self.slots.get_mut(id.0).and_then(Option::take);
        if released.is_some() {
            self.live -= 1;
        }
        released
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live controls
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl FieldStates for Controls {
    fn current_value(&self, handle: ControlId) -> Option<Value> {
        self.get(handle).map(Control::read)
    }
}
