use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::CardSet;

/// Curator - build editable forms from JSON Schema and rebuild records from them
#[derive(Parser, Debug, Clone)]
#[command(name = "curator", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CURATOR_CONFIG", default_value = "curator.toml")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CURATOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the fields a schema produces for a record
    Fields {
        /// JSON Schema file
        #[arg(short, long)]
        schema: PathBuf,
        /// Record to seed the form with
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Apply an edit script to a record and print the extracted result
    Apply {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Edit script (.json, .yaml or .yml)
        #[arg(short, long)]
        edits: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a card deck and summarise its comparisons
    Deck {
        deck: PathBuf,
    },
    /// Edit one card of a deck through a generated form
    EditCard {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        deck: PathBuf,
        #[arg(long, value_enum)]
        set: CardSet,
        #[arg(long)]
        card_id: String,
        #[arg(short, long)]
        edits: PathBuf,
        /// Write the updated deck here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
