use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

pub mod validator;

use crate::cli::Cli;
use crate::form::schema::DEFAULT_MAX_DEPTH;
use crate::form::BuilderOptions;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub form: FormSettings,
    pub logging: LoggingSettings,
}

/// Options handed to the form builder
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormSettings {
    pub empty_option_label: String,
    pub long_text_keywords: Vec<String>,
    pub long_text_rows: u32,
    /// Nesting limit when resolving schemas, `$ref` hops included
    pub max_schema_depth: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_path(Path::new("curator.toml"))
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        if let Some(level) = &cli.log_level {
            settings.logging.level = level.clone();
        }

        settings.validated()
    }

    /// Load settings from a config file; a missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        Self::load(path)?.validated()
    }

    fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let defaults = BuilderOptions::default();
        let s = Config::builder()
            .add_source(File::from(path).required(false))
            .set_default("form.empty_option_label", defaults.empty_option_label)?
            .set_default("form.long_text_keywords", defaults.long_text_keywords)?
            .set_default("form.long_text_rows", i64::from(defaults.long_text_rows))?
            .set_default("form.max_schema_depth", DEFAULT_MAX_DEPTH as i64)?
            .set_default("logging.level", "info")?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn validated(self) -> Result<Self, anyhow::Error> {
        validator::ConfigValidator::validate(&self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;
        Ok(self)
    }

    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            empty_option_label: self.form.empty_option_label.clone(),
            long_text_keywords: self.form.long_text_keywords.clone(),
            long_text_rows: self.form.long_text_rows,
        }
    }

    /// Parsed log level, `info` when unrecognised
    pub fn log_level(&self) -> Level {
        self.logging.level.parse().unwrap_or(Level::INFO)
    }
}
