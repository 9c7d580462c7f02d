//! # Curator - Schema-Driven Record Editing
//!
//! Curator turns a JSON Schema and a data record into an editable form, and
//! turns the edited form back into a record.
//!
//! ## Features
//!
//! - **Form Builder**: one control per leaf field, chosen from the schema type
//! - **Arrays**: add and remove items with contiguous, reindexed paths
//! - **Multi-Select**: enumerated string arrays edited as chips over a vocabulary
//! - **Extraction**: two-pass rebuild that tolerates gaps and removed controls
//! - **Edit Scripts**: batch edits from JSON or YAML files
//! - **Card Decks**: edit cards of an A/B/C comparison deck through generated forms
//!
//! ## Quick Start
//!
//! ```rust
//! use curator::form::{SchemaFormBuilder, SchemaNode};
//! use serde_json::json;
//!
//! let schema = SchemaNode::parse(&json!({
//!     "type": "object",
//!     "properties": {"title": {"type": "string"}}
//! }))
//! .unwrap();
//!
//! let mut form = SchemaFormBuilder::default().build(&schema, Some(&json!({"title": "Draft"})));
//! form.set_value("title", json!("Final")).unwrap();
//! assert_eq!(form.extract(), Some(json!({"title": "Final"})));
//! ```
//!
//! ## Architecture
//!
//! - **Form**: schema model, builder, registry, controls and extractor
//! - **Domain**: card decks and comparison results
//! - **Adapters**: edit scripts loaded from files
//! - **Config**: configuration management

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod form;
