//! Parsing of Kafka Connect validation responses.

use crate::{ConnectorError, ConnectorResult};
use serde::Deserialize;

/// Result of `PUT /connector-plugins/{class}/config/validate`
///
/// Only `error_count` is required. Everything else is optional so that
/// responses from older or newer Connect versions still parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub name: Option<String>,
    pub error_count: u64,
    #[serde(default)]
    pub configs: Vec<ConfigValidation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigValidation {
    pub value: FieldValidation,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldValidation {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Parse a raw response body
    ///
    /// # Errors
    ///
    /// `ConnectorError::InvalidValidationResponse` carrying the raw body when it
    /// is not a JSON validation result.
    pub fn parse(raw: &str) -> ConnectorResult<Self> {
        serde_json::from_str(raw).map_err(|_| ConnectorError::InvalidValidationResponse {
            raw: raw.to_string(),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    /// Fields that carry at least one error, with their messages
    pub fn field_errors(&self) -> Vec<(&str, &[String])> {
        self.configs
            .iter()
            .filter(|c| !c.value.errors.is_empty())
            .map(|c| (c.value.name.as_str(), c.value.errors.as_slice()))
            .collect()
    }
}
