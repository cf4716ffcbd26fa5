//! Permutation check for `rankedIndices`.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::tools::{string_schema, text_arg, ValidationReport, ValidatorTool};

pub const RANKED_INDICES_ISSUE: &str = "Missing or invalid rankedIndices field";

/// Checks that `indices` is a permutation of `0..expected_len`.
pub fn validate_permutation(indices: &[i64], expected_len: usize) -> ValidationReport {
    let mut issues = Vec::new();

    if indices.len() != expected_len {
        issues.push(format!(
            "rankedIndices has {} entries, expected {}",
            indices.len(),
            expected_len
        ));
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    let mut out_of_range = BTreeSet::new();
    for &index in indices {
        if index < 0 || index as usize >= expected_len {
            out_of_range.insert(index);
        } else if !seen.insert(index) {
            duplicates.insert(index);
        }
    }

    for index in out_of_range {
        issues.push(format!(
            "Index {index} is out of range (valid: 0 to {})",
            expected_len as i64 - 1
        ));
    }
    for index in duplicates {
        issues.push(format!("Index {index} appears more than once"));
    }
    for index in 0..expected_len as i64 {
        if !seen.contains(&index) {
            issues.push(format!("Missing index {index}"));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Parses `{"rankedIndices": [...]}` and checks the permutation.
pub fn validate_ranking(json_string: &str, expected_len: usize) -> ValidationReport {
    let value: Value = match serde_json::from_str(json_string) {
        Ok(v) => v,
        Err(e) => {
            return ValidationReport::from_issues(vec![format!(
                "Response is not valid JSON: {e}"
            )])
        }
    };

    let Some(items) = value.get("rankedIndices").and_then(Value::as_array) else {
        return ValidationReport::from_issues(vec![RANKED_INDICES_ISSUE.to_string()]);
    };

    let indices: Option<Vec<i64>> = items.iter().map(Value::as_i64).collect();
    match indices {
        Some(indices) => validate_permutation(&indices, expected_len),
        None => ValidationReport::from_issues(vec![
            "rankedIndices must contain only integers".to_string()
        ]),
    }
}

/// Turns any proposed ordering into a permutation: drops out-of-range and repeated
/// indices, then appends missing ones in original order.
pub fn repair_permutation(proposed: &[usize], len: usize) -> Vec<usize> {
    let mut result: Vec<usize> = Vec::with_capacity(len);
    let mut used = vec![false; len];
    for &index in proposed {
        if index < len && !used[index] {
            used[index] = true;
            result.push(index);
        }
    }
    result.extend((0..len).filter(|&i| !used[i]));
    result
}

/// Permutation validator bound to the number of achievements being ranked.
pub struct RankingTool {
    expected_len: usize,
}

impl RankingTool {
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }
}

impl ValidatorTool for RankingTool {
    fn name(&self) -> &'static str {
        "validate_ranking"
    }

    fn description(&self) -> &'static str {
        "Validates a ranking JSON of the form {\"rankedIndices\": [int]}: every index from 0 \
         to N-1 must appear exactly once. Call it on the candidate before answering."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "json_string": string_schema("The ranking JSON to validate") },
            "required": ["json_string"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match text_arg(input, "json_string") {
            Ok(s) => validate_ranking(&s, self.expected_len).to_value(),
            Err(e) => e,
        }
    }
}
