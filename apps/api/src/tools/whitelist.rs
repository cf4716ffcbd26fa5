//! Skill whitelist — flags technology-looking tokens in a summary that the
//! candidate never listed as a skill.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::tools::{string_schema, text_arg, ValidationReport, ValidatorTool};

/// Capitalized and title-case words: "React", "TypeScript", "C++", "C#".
const CAPITALIZED_PATTERN: &str = r"\b[A-Z][A-Za-z0-9]*[+#]*";
/// All-caps acronyms: "AWS", "SQL", "CSS3".
const ACRONYM_PATTERN: &str = r"\b[A-Z]{2,}[0-9]*\b";
/// Dotted names: "Node.js", "ASP.NET", "vue.js".
const DOTTED_PATTERN: &str = r"\b[A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z0-9]+)+\b";

/// Ordinary resume vocabulary that is capitalized only because it starts a sentence
/// or is a title word.
const IGNORED_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "with", "for", "in", "on", "at", "of", "to",
    "as", "by", "from", "into", "over", "across", "through", "while", "within", "i",
    "my", "our", "their", "this", "that", "these", "those", "it", "is", "am", "are",
    "was", "were", "be", "been", "who", "which", "where", "when", "currently", "now",
    "experienced", "seasoned", "senior", "junior", "lead", "principal", "staff", "head",
    "engineer", "engineering", "developer", "development", "software", "full", "stack",
    "professional", "proven", "passionate", "skilled", "expert", "results", "driven",
    "dedicated", "motivated", "highly", "strong", "deep", "extensive", "background",
    "track", "record", "team", "teams", "years", "year", "built", "led", "designed",
    "developed", "delivered", "created", "managed", "implemented", "architected",
    "specializing", "specialized", "focused", "collaborative", "adept", "known",
    "committed", "versatile", "creative", "detail", "oriented", "hands", "product",
    "products", "platform", "platforms", "systems", "applications", "solutions",
    "customer", "customers", "business", "backend", "frontend", "services", "ceo", "cto",
    "vp", "ai",
];

fn token_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(DOTTED_PATTERN).expect("valid dotted-name regex"),
            Regex::new(ACRONYM_PATTERN).expect("valid acronym regex"),
            Regex::new(CAPITALIZED_PATTERN).expect("valid capitalized-word regex"),
        ]
    })
}

/// True when only spacing, quotes or bullet marks separate `start` from the
/// beginning of the text or the end of the previous sentence.
fn starts_sentence(text: &str, start: usize) -> bool {
    for c in text[..start].chars().rev() {
        match c {
            ' ' | '\t' | '\r' | '"' | '\'' | '(' | '*' | '-' | '•' => continue,
            '.' | '!' | '?' | ':' | ';' | '\n' => return true,
            _ => return false,
        }
    }
    true
}

/// "Improved", "Mentored": one leading capital followed by lowercase letters only.
fn is_plain_word(token: &str) -> bool {
    token.chars().skip(1).all(|c| c.is_ascii_lowercase())
}

/// Extracts candidate skill tokens in order of appearance. Tokens nested inside a
/// longer match ("Node" inside "Node.js") are dropped, as are plain capitalized
/// words that merely open a sentence.
pub fn extract_skill_tokens(text: &str) -> Vec<String> {
    // (start, end, pattern index); the capitalized-word pattern is last.
    let mut spans: Vec<(usize, usize, usize)> = token_patterns()
        .iter()
        .enumerate()
        .flat_map(|(i, re)| re.find_iter(text).map(move |m| (m.start(), m.end(), i)))
        .collect();
    // Earliest first; at equal starts the longest wins, then the more specific pattern.
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

    let capitalized = token_patterns().len() - 1;
    let mut tokens: Vec<String> = Vec::new();
    let mut covered_until = 0usize;
    for (start, end, pattern) in spans {
        if start < covered_until {
            continue;
        }
        covered_until = end;
        let token = &text[start..end];
        if IGNORED_WORDS.contains(&token.to_lowercase().as_str()) {
            continue;
        }
        if pattern == capitalized && is_plain_word(token) && starts_sentence(text, start) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Whitelist bound to the candidate's skills. Built once per run.
#[derive(Debug, Clone)]
pub struct SkillWhitelist {
    allowed: Vec<String>,
}

impl SkillWhitelist {
    pub fn new(allowed_skills: &[String]) -> Self {
        let allowed = allowed_skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allows(&self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        self.allowed
            .iter()
            .any(|skill| skill == &token || skill.contains(&token) || token.contains(skill))
    }

    pub fn check(&self, summary: &str) -> ValidationReport {
        let issues = extract_skill_tokens(summary)
            .into_iter()
            .filter(|token| !self.allows(token))
            .map(|token| format!("'{token}' is not in the candidate's skill list"))
            .collect();
        ValidationReport::from_issues(issues)
    }
}

pub struct SkillWhitelistTool {
    whitelist: SkillWhitelist,
}

impl SkillWhitelistTool {
    pub fn new(allowed_skills: &[String]) -> Self {
        Self {
            whitelist: SkillWhitelist::new(allowed_skills),
        }
    }
}

impl ValidatorTool for SkillWhitelistTool {
    fn name(&self) -> &'static str {
        "check_skill_whitelist"
    }

    fn description(&self) -> &'static str {
        "Lists technology or skill names in a summary that are not in the candidate's \
         skill list. Any reported token must be removed or replaced with a listed skill."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "summary": string_schema("The summary text to check") },
            "required": ["summary"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match text_arg(input, "summary") {
            Ok(summary) => self.whitelist.check(&summary).to_value(),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_dotted_acronym_and_capitalized() {
        let tokens = extract_skill_tokens("Built APIs in Node.js and TypeScript on AWS with C++.");
        assert!(tokens.contains(&"Node.js".to_string()));
        assert!(tokens.contains(&"TypeScript".to_string()));
        assert!(tokens.contains(&"AWS".to_string()));
        assert!(tokens.contains(&"C++".to_string()));
        assert!(!tokens.contains(&"Node".to_string()));
        assert!(!tokens.contains(&"Built".to_string()));
    }

    #[test]
    fn test_lowercase_prose_yields_no_tokens() {
        assert!(extract_skill_tokens("shipped reliable services for ten years").is_empty());
    }

    #[test]
    fn test_whitelist_allows_substring_either_direction() {
        let list = SkillWhitelist::new(&skills(&["  PostgreSQL ", "React Native", "Go"]));
        assert!(list.allows("postgresql"));
        assert!(list.allows("React"));
        assert!(list.allows("Golang"));
        assert!(!list.allows("Kafka"));
    }

    #[test]
    fn test_check_flags_unlisted_skills() {
        let list = SkillWhitelist::new(&skills(&["Rust", "AWS"]));
        let report = list.check("Senior engineer building Rust services on AWS and Kubernetes.");
        assert!(!report.valid);
        assert_eq!(
            report.issues,
            vec!["'Kubernetes' is not in the candidate's skill list".to_string()]
        );
    }

    #[test]
    fn test_check_passes_clean_summary() {
        let list = SkillWhitelist::new(&skills(&["Rust", "Tokio", "PostgreSQL"]));
        let report = list.check(
            "Experienced engineer who designed Rust services with Tokio and PostgreSQL.",
        );
        assert_eq!(report, ValidationReport::ok());
    }

    #[test]
    fn test_sentence_opening_verbs_are_not_skills() {
        let list = SkillWhitelist::new(&skills(&["Rust"]));
        let report = list.check("Improved checkout reliability using Rust. Mentored engineers.");
        assert_eq!(report, ValidationReport::ok());

        let tokens = extract_skill_tokens("- Spearheaded rollout.\nOwns TypeScript. Kafka expert.");
        assert!(tokens.contains(&"TypeScript".to_string()));
        assert!(!tokens.contains(&"Spearheaded".to_string()));
        assert!(!tokens.contains(&"Owns".to_string()));
    }

    #[test]
    fn test_mid_sentence_and_styled_names_still_flagged() {
        let list = SkillWhitelist::new(&skills(&["Rust"]));
        let report = list.check("Shipped Rust services. GraphQL gateways on Kubernetes.");
        assert_eq!(
            report.issues,
            vec![
                "'GraphQL' is not in the candidate's skill list".to_string(),
                "'Kubernetes' is not in the candidate's skill list".to_string(),
            ]
        );
    }

    #[test]
    fn test_tool_wraps_whitelist() {
        let tool = SkillWhitelistTool::new(&skills(&["Python"]));
        let out = tool.call(&json!({ "summary": "Python and Django developer." }));
        assert_eq!(out["valid"], false);
        assert_eq!(out["issues"].as_array().unwrap().len(), 1);
    }
}
