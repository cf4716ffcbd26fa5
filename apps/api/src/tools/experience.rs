//! Validators for the experience-tailoring sub-artifacts (description, achievements,
//! tech stack) plus the keyword-recording tool used by the analyst.

use serde_json::{json, Value};

use crate::tools::{
    string_array_schema, string_list_arg, string_schema, text_arg, ValidationReport,
    ValidatorTool,
};

pub const MIN_ACHIEVEMENT_CHARS: usize = 10;
pub const MIN_DESCRIPTION_CHARS: usize = 50;
pub const IDENTICAL_DESCRIPTION_ISSUE: &str =
    "Rewritten description is identical to original — no changes were made";

/// Flags a count mismatch and every rewritten achievement under 10 trimmed chars.
pub fn validate_achievements(original: &[String], rewritten: &[String]) -> ValidationReport {
    let mut issues = Vec::new();

    if rewritten.len() != original.len() {
        issues.push(format!(
            "Expected {} achievements but got {}",
            original.len(),
            rewritten.len()
        ));
    }

    for (i, text) in rewritten.iter().enumerate() {
        let len = text.trim().chars().count();
        if len < MIN_ACHIEVEMENT_CHARS {
            issues.push(format!(
                "Achievement {} is too short ({} characters, minimum {})",
                i + 1,
                len,
                MIN_ACHIEVEMENT_CHARS
            ));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Flags an empty rewrite, a rewrite under 50 trimmed chars, and a rewrite
/// identical to the original.
pub fn validate_description(original: &str, rewritten: &str) -> ValidationReport {
    let mut issues = Vec::new();
    let trimmed = rewritten.trim();

    if trimmed.is_empty() {
        issues.push("Rewritten description is empty".to_string());
    } else if trimmed.chars().count() < MIN_DESCRIPTION_CHARS {
        issues.push(format!(
            "Rewritten description is too short ({} characters, minimum {})",
            trimmed.chars().count(),
            MIN_DESCRIPTION_CHARS
        ));
    }

    if !trimmed.is_empty() && trimmed == original.trim() {
        issues.push(IDENTICAL_DESCRIPTION_ISSUE.to_string());
    }

    ValidationReport::from_issues(issues)
}

fn normalize(item: &str) -> String {
    item.trim().to_lowercase()
}

/// True when `item` is a substring of some original entry or vice versa
/// (lowercase, trimmed). Blank items never match.
pub fn has_provenance(item: &str, original: &[String]) -> bool {
    let item = normalize(item);
    if item.is_empty() {
        return false;
    }
    original.iter().map(|o| normalize(o)).any(|o| {
        !o.is_empty() && (o.contains(&item) || item.contains(&o))
    })
}

/// Flags proposed technologies with no substring relation to the original stack, and
/// proposals more than twice the size of the original.
pub fn validate_tech_stack(original: &[String], proposed: &[String]) -> ValidationReport {
    let mut issues: Vec<String> = proposed
        .iter()
        .filter(|item| !has_provenance(item, original))
        .map(|item| format!("'{}' does not appear in the original tech stack", item.trim()))
        .collect();

    if proposed.len() > original.len() * 2 {
        issues.push(format!(
            "Proposed {} technologies, more than twice the original {}",
            proposed.len(),
            original.len()
        ));
    }

    ValidationReport::from_issues(issues)
}

// ────────────────────────────────────────────────────────────────────────────
// Tools
// ────────────────────────────────────────────────────────────────────────────

pub struct AchievementIntegrityTool;

impl ValidatorTool for AchievementIntegrityTool {
    fn name(&self) -> &'static str {
        "validate_achievements"
    }

    fn description(&self) -> &'static str {
        "Checks rewritten achievements against the originals: same count, and every \
         rewritten entry at least 10 characters. Call before returning your rewrite."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "original": string_array_schema("The original achievements, in order"),
                "rewritten": string_array_schema("Your rewritten achievements, in the same order")
            },
            "required": ["original", "rewritten"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        let original = match string_list_arg(input, "original") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let rewritten = match string_list_arg(input, "rewritten") {
            Ok(v) => v,
            Err(e) => return e,
        };
        validate_achievements(&original, &rewritten).to_value()
    }
}

pub struct DescriptionQualityTool;

impl ValidatorTool for DescriptionQualityTool {
    fn name(&self) -> &'static str {
        "validate_description"
    }

    fn description(&self) -> &'static str {
        "Checks a rewritten role description: must be non-empty, at least 50 characters, \
         and actually different from the original."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "original": string_schema("The original description"),
                "rewritten": string_schema("Your rewritten description")
            },
            "required": ["original", "rewritten"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        let original = match text_arg(input, "original") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let rewritten = match text_arg(input, "rewritten") {
            Ok(v) => v,
            Err(e) => return e,
        };
        validate_description(&original, &rewritten).to_value()
    }
}

pub struct TechStackProvenanceTool;

impl ValidatorTool for TechStackProvenanceTool {
    fn name(&self) -> &'static str {
        "validate_tech_stack"
    }

    fn description(&self) -> &'static str {
        "Checks a proposed tech stack against the original: every proposed item must relate \
         to an original item, and the list may be at most twice as long."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "original": string_array_schema("The original tech stack"),
                "proposed": string_array_schema("Your proposed tech stack")
            },
            "required": ["original", "proposed"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        let original = match string_list_arg(input, "original") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let proposed = match string_list_arg(input, "proposed") {
            Ok(v) => v,
            Err(e) => return e,
        };
        validate_tech_stack(&original, &proposed).to_value()
    }
}

/// Structured-output tool for the experience analyst. The orchestrator reads the
/// call's arguments from the agent transcript; the tool itself only checks them.
pub struct RecordKeywordsTool;

pub const RECORD_KEYWORDS_TOOL: &str = "record_keywords";

impl ValidatorTool for RecordKeywordsTool {
    fn name(&self) -> &'static str {
        RECORD_KEYWORDS_TOOL
    }

    fn description(&self) -> &'static str {
        "Records the job description keywords the experience entry should emphasize. \
         Call exactly once with your final keyword list."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": string_array_schema("Keywords and phrases from the job description, most important first")
            },
            "required": ["keywords"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match string_list_arg(input, "keywords") {
            Ok(keywords) if keywords.iter().any(|k| !k.trim().is_empty()) => {
                json!({ "recorded": true, "count": keywords.len() })
            }
            Ok(_) => ValidationReport::from_issues(vec![
                "keywords must contain at least one non-empty entry".to_string(),
            ])
            .to_value(),
            Err(e) => e,
        }
    }
}
