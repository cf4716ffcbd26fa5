//! Validator Tools — deterministic checks a role agent can call mid-conversation
//! to verify its own draft before answering.
//!
//! Every tool is pure: the same input always yields the same verdict. Tools that
//! need parameters (expected lengths, whitelists) are built through constructors
//! and hold only immutable data.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm_client::ToolSpec;

pub mod experience;
pub mod json;
pub mod ranking;
pub mod sections;
pub mod skills;
pub mod whitelist;

/// Verdict returned by every issue-collecting validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    pub fn ok() -> Self {
        Self::from_issues(vec![])
    }

    pub fn to_value(&self) -> Value {
        json!({ "valid": self.valid, "issues": self.issues })
    }
}

/// A validator exposed to the model as a callable function.
pub trait ValidatorTool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Shown to the model so it can decide when to call the tool.
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    fn call(&self, input: &Value) -> Value;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Argument helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads a string argument. Models sometimes pass the JSON value itself instead of
/// a string holding it; such values are re-serialized.
pub(crate) fn text_arg(input: &Value, key: &str) -> Result<String, Value> {
    match input.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(missing_arg(key)),
        Some(other) => Ok(other.to_string()),
    }
}

pub(crate) fn string_list_arg(input: &Value, key: &str) -> Result<Vec<String>, Value> {
    let items = input
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| missing_arg(key))?;

    items
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ValidationReport::from_issues(vec![format!(
                "Argument '{key}' must be an array of strings"
            )])
            .to_value()),
        })
        .collect()
}

fn missing_arg(key: &str) -> Value {
    ValidationReport::from_issues(vec![format!("Missing required argument '{key}'")]).to_value()
}

pub(crate) fn string_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub(crate) fn string_array_schema(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_valid_iff_no_issues() {
        assert!(ValidationReport::ok().valid);
        let r = ValidationReport::from_issues(vec!["bad".to_string()]);
        assert!(!r.valid);
        assert_eq!(r.to_value()["issues"][0], "bad");
    }

    #[test]
    fn test_text_arg_reserializes_non_strings() {
        let input = json!({ "json_string": { "a": 1 } });
        assert_eq!(text_arg(&input, "json_string").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_text_arg_missing() {
        let err = text_arg(&json!({}), "summary").unwrap_err();
        assert_eq!(err["valid"], false);
        assert!(err["issues"][0].as_str().unwrap().contains("summary"));
    }

    #[test]
    fn test_string_list_arg_rejects_mixed_types() {
        let input = json!({ "original": ["a", 3] });
        assert!(string_list_arg(&input, "original").is_err());
        let input = json!({ "original": ["a", "b"] });
        assert_eq!(string_list_arg(&input, "original").unwrap().len(), 2);
    }
}
