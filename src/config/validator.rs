use thiserror::Error;
use tracing::Level;

use crate::config::{FormSettings, LoggingSettings, Settings};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_form(&settings.form) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_logging(&settings.logging) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_form(form: &FormSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if form.empty_option_label.trim().is_empty() {
            errors.push(ValidationError::MissingField(
                "form.empty_option_label".to_string(),
            ));
        }

        for (idx, keyword) in form.long_text_keywords.iter().enumerate() {
            if keyword.trim().is_empty() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("form.long_text_keywords[{}]", idx),
                    reason: "Keyword must not be empty".to_string(),
                });
            }
        }

        if form.long_text_rows == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "form.long_text_rows".to_string(),
                reason: "Rows must be greater than 0".to_string(),
            });
        }

        if form.max_schema_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "form.max_schema_depth".to_string(),
                reason: "Depth must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_logging(logging: &LoggingSettings) -> Result<(), Vec<ValidationError>> {
        if logging.level.parse::<Level>().is_err() {
            return Err(vec![ValidationError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Unknown level '{}'", logging.level),
            }]);
        }
        Ok(())
    }
}
