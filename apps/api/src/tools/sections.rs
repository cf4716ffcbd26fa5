//! Markdown section checker for refined job descriptions.

use serde_json::{json, Value};

use crate::tools::{string_schema, text_arg, ValidationReport, ValidatorTool};

/// Sections a refined job description must contain, in this order.
pub const JD_SECTIONS: &[&str] = &[
    "Role Overview",
    "Key Responsibilities",
    "Required Qualifications",
    "Preferred Qualifications",
];

/// Splits markdown into `(heading, body)` pairs for every `## ` heading.
fn sections(markdown: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();
    for line in markdown.lines() {
        if let Some(heading) = line.trim_start().strip_prefix("## ") {
            result.push((heading.trim().to_string(), String::new()));
        } else if let Some((_, body)) = result.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }
    result
}

/// Flags each required heading that is missing or has an empty body.
/// Headings match case-insensitively.
pub fn check_sections(markdown: &str, required: &[&str]) -> ValidationReport {
    let found = sections(markdown);
    let issues = required
        .iter()
        .filter_map(|name| {
            match found
                .iter()
                .find(|(heading, _)| heading.eq_ignore_ascii_case(name))
            {
                None => Some(format!("Missing section '## {name}'")),
                Some((_, body)) if body.trim().is_empty() => {
                    Some(format!("Section '## {name}' is empty"))
                }
                Some(_) => None,
            }
        })
        .collect();
    ValidationReport::from_issues(issues)
}

pub struct MarkdownSectionsTool {
    required: &'static [&'static str],
}

impl MarkdownSectionsTool {
    pub fn new(required: &'static [&'static str]) -> Self {
        Self { required }
    }
}

impl ValidatorTool for MarkdownSectionsTool {
    fn name(&self) -> &'static str {
        "check_markdown_sections"
    }

    fn description(&self) -> &'static str {
        "Checks that a markdown document contains every required '## ' section and that \
         none of them is empty."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "markdown": string_schema("The markdown document to check") },
            "required": ["markdown"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match text_arg(input, "markdown") {
            Ok(markdown) => check_sections(&markdown, self.required).to_value(),
            Err(e) => e,
        }
    }
}
