//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeout > 0)
//! - Detect duplicate target names and ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::Config;

/// One failed rule, with the offending field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.collector.interval_secs == 0 {
        errors.push(ValidationError::new("collector.interval_secs", "must be greater than zero"));
    }
    if config.collector.request_timeout_secs == 0 {
        errors.push(ValidationError::new("collector.request_timeout_secs", "must be greater than zero"));
    }
    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected pretty or json", config.observability.log_format),
        ));
    }

    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for (i, target) in config.target_configurations().iter().enumerate() {
        let field = format!("targets[{i}]");
        if target.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.name"), "must not be empty"));
        } else if !names.insert(target.name.as_str().to_owned()) {
            errors.push(ValidationError::new(
                format!("{field}.name"),
                format!("duplicate target name '{}'", target.name),
            ));
        }
        if !ids.insert(target.id) {
            errors.push(ValidationError::new(format!("{field}.id"), format!("duplicate target id {}", target.id)));
        }
        if target.uri.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.uri"), "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Config {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = parse(
            r#"
            [[targets]]
            name = "api"
            uri = "/health"
            "#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let config = parse(
            r#"
            [collector]
            interval_secs = 0

            [observability]
            log_format = "xml"

            [[targets]]
            name = "api"
            uri = ""

            [[targets]]
            id = 1
            name = "api"
            uri = "/health"
            "#,
        );
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "collector.interval_secs",
                "observability.log_format",
                "targets[0].uri",
                "targets[1].name",
                "targets[1].id",
            ]
        );
    }
}
