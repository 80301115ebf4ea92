use std::sync::LazyLock;

use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

use super::contracts::{AiResponse, response_schema};

#[derive(Debug, Error)]
pub enum ResponseValidationError {
    #[error("assistant reply does not start with a json object or array")]
    NotJson,
    #[error("assistant reply is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("assistant response schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("assistant reply failed schema validation: {errors:?}")]
    SchemaViolation { errors: Vec<String> },
    #[error("assistant reply does not match a response shape: {0}")]
    Shape(String),
}

/// Treats `raw` as untrusted model output. Anything that does not begin with
/// `{` or `[` is rejected without a parse attempt.
pub fn parse_reply_text(raw: &str) -> Result<AiResponse, ResponseValidationError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return Err(ResponseValidationError::NotJson);
    }

    let payload: Value = serde_json::from_str(trimmed)?;
    validate_reply_value(&payload)
}

pub fn validate_reply_value(payload: &Value) -> Result<AiResponse, ResponseValidationError> {
    let validator = RESPONSE_VALIDATOR
        .as_ref()
        .map_err(|message| ResponseValidationError::SchemaCompile(message.clone()))?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(ResponseValidationError::SchemaViolation { errors });
    }

    serde_json::from_value(payload.clone())
        .map_err(|err| ResponseValidationError::Shape(err.to_string()))
}

static RESPONSE_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| JSONSchema::compile(&response_schema()).map_err(|err| err.to_string()));
