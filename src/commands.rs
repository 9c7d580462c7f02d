//! Subcommand implementations

use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::adapters::edit_script::EditScript;
use crate::cli::Command;
use crate::config::Settings;
use crate::domain::{is_minimal_card, CardDeck, CardSet};
use crate::form::{Form, Provenance, SchemaFormBuilder, SchemaNode, ValueType};

pub fn run(command: &Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Fields { schema, data } => {
            let form = build_form(settings, schema, data.as_deref())?;
            write_output(&field_rows(&form)?, None)
        }
        Command::Apply {
            schema,
            data,
            edits,
            output,
        } => {
            let mut form = build_form(settings, schema, data.as_deref())?;
            EditScript::from_path(edits)?.apply(&mut form)?;
            let record = form
                .extract()
                .ok_or_else(|| anyhow!("form could not be extracted"))?;
            write_output(&record, output.as_deref())
        }
        Command::Deck { deck } => {
            let deck = load_deck(deck)?;
            write_output(&DeckSummary::of(&deck), None)
        }
        Command::EditCard {
            schema,
            deck: deck_path,
            set,
            card_id,
            edits,
            output,
        } => {
            let mut deck = load_deck(deck_path)?;
            let card = deck
                .card(*set, card_id)
                .cloned()
                .ok_or_else(|| anyhow!("no card '{}' in set {}", card_id, set))?;

            let schema = load_schema(settings, schema)?;
            let mut form = SchemaFormBuilder::new(settings.builder_options()).build(&schema, Some(&card));
            report_build_errors(&form);
            EditScript::from_path(edits)?.apply(&mut form)?;
            let edited = form
                .extract()
                .ok_or_else(|| anyhow!("form could not be extracted"))?;

            deck.merge_edited(*set, card_id, edited)?;
            info!(set = %set, card = %card_id, "card updated");
            write_output(&deck, output.as_deref())
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_schema(settings: &Settings, path: &Path) -> anyhow::Result<SchemaNode> {
    let raw = read_json(path)?;
    SchemaNode::parse_with_depth(&raw, settings.form.max_schema_depth)
        .with_context(|| format!("invalid schema {}", path.display()))
}

fn load_deck(path: &Path) -> anyhow::Result<CardDeck> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    CardDeck::from_json(&content).with_context(|| format!("invalid deck {}", path.display()))
}

fn build_form(settings: &Settings, schema: &Path, data: Option<&Path>) -> anyhow::Result<Form> {
    let schema = load_schema(settings, schema)?;
    let data = data.map(read_json).transpose()?;
    let form = SchemaFormBuilder::new(settings.builder_options()).build(&schema, data.as_ref());
    report_build_errors(&form);
    Ok(form)
}

fn report_build_errors(form: &Form) {
    for error in form.build_errors() {
        warn!(%error, "field left out of form");
    }
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
            info!(output = %path.display(), "wrote result");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldRow {
    path: String,
    value_type: ValueType,
    provenance: Option<Provenance>,
    value: Value,
}

fn field_rows(form: &Form) -> anyhow::Result<Vec<FieldRow>> {
    form.registry()
        .iter()
        .map(|descriptor| {
            let path = descriptor.path.to_string();
            let control = form.controls().get(descriptor.handle);
            Ok(FieldRow {
                value: form.value(&path)?,
                provenance: control.map(|c| c.provenance()),
                value_type: descriptor.value_type,
                path,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckSummary {
    comparisons: usize,
    /// Cards per set that carry no details and score 0
    minimal_cards: [usize; 3],
}

impl DeckSummary {
    fn of(deck: &CardDeck) -> Self {
        let minimal = |set| deck.set(set).iter().filter(|c| is_minimal_card(c)).count();
        Self {
            comparisons: deck.comparisons(),
            minimal_cards: [minimal(CardSet::A), minimal(CardSet::B), minimal(CardSet::C)],
        }
    }
}
