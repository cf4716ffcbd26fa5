//! JSON well-formedness check.

use serde::Serialize;
use serde_json::{json, Value};

use crate::tools::{string_schema, text_arg, ValidatorTool};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parses `json_string` strictly (no fence stripping, no trailing garbage).
/// Errors are prefixed with `SyntaxError:` and carry the parser's line/column.
pub fn validate_json(json_string: &str) -> JsonCheck {
    match serde_json::from_str::<Value>(json_string) {
        Ok(parsed) => JsonCheck {
            valid: true,
            parsed: Some(parsed),
            error: None,
        },
        Err(e) => JsonCheck {
            valid: false,
            parsed: None,
            error: Some(format!("SyntaxError: {e}")),
        },
    }
}

pub struct JsonValidatorTool;

impl ValidatorTool for JsonValidatorTool {
    fn name(&self) -> &'static str {
        "validate_json"
    }

    fn description(&self) -> &'static str {
        "Checks whether a string is well-formed JSON. Call this on your draft before \
         answering; fix any reported SyntaxError."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "json_string": string_schema("The JSON text to check") },
            "required": ["json_string"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match text_arg(input, "json_string") {
            Ok(s) => serde_json::to_value(validate_json(&s)).unwrap_or(Value::Null),
            Err(e) => e,
        }
    }
}
