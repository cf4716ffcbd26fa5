//! Skills-sort shape validation and the deterministic coverage check run after review.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};

use crate::models::resume::{SkillGroup, SkillsOrder};
use crate::tools::{string_schema, text_arg, ValidationReport, ValidatorTool};

pub const NOT_JSON_ISSUE: &str = "Response is not valid JSON";
pub const GROUP_ORDER_ISSUE: &str = "Missing or invalid groupOrder field";
pub const SKILL_ORDER_ISSUE: &str = "Missing or invalid skillOrder field";

/// Checks the `{groupOrder, skillOrder}` shape.
///
/// Issue priority is fixed: invalid JSON short-circuits with a single issue; then
/// `groupOrder`; then `skillOrder`; then the group count when one is expected.
pub fn validate_skills_sort(json_string: &str, expected_groups: Option<usize>) -> ValidationReport {
    let value: Value = match serde_json::from_str(json_string) {
        Ok(v) => v,
        Err(_) => return ValidationReport::from_issues(vec![NOT_JSON_ISSUE.to_string()]),
    };

    let mut issues = Vec::new();

    let group_order = value
        .get("groupOrder")
        .and_then(Value::as_array)
        .filter(|items| items.iter().all(Value::is_string));
    if group_order.is_none() {
        issues.push(GROUP_ORDER_ISSUE.to_string());
    }

    let skill_order_ok = value
        .get("skillOrder")
        .and_then(Value::as_object)
        .is_some_and(|map| {
            map.values().all(|v| {
                v.as_array()
                    .is_some_and(|items| items.iter().all(Value::is_string))
            })
        });
    if !skill_order_ok {
        issues.push(SKILL_ORDER_ISSUE.to_string());
    }

    if let (Some(groups), Some(expected)) = (group_order, expected_groups) {
        if groups.len() != expected {
            issues.push(format!(
                "groupOrder lists {} groups but {} were provided",
                groups.len(),
                expected
            ));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Verifies that nothing from the original groups was lost or invented.
pub fn check_skill_coverage(original: &[SkillGroup], order: &SkillsOrder) -> ValidationReport {
    let mut issues = Vec::new();
    let known: HashSet<&str> = original.iter().map(|g| g.name.as_str()).collect();

    for group in original {
        if !order.group_order.iter().any(|g| g == &group.name) {
            issues.push(format!("Group '{}' is missing from groupOrder", group.name));
        }
        let listed = order.skill_order.get(&group.name);
        for skill in &group.skills {
            if !listed.is_some_and(|items| items.contains(skill)) {
                issues.push(format!(
                    "Skill '{}' is missing from group '{}'",
                    skill, group.name
                ));
            }
        }
    }

    for name in &order.group_order {
        if !known.contains(name.as_str()) {
            issues.push(format!("Unknown group '{name}' in groupOrder"));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Rebuilds an order that covers exactly the original groups and skills: keeps the
/// proposed ordering for known entries, drops invented ones, and appends anything
/// lost in original order.
pub fn repair_skill_order(original: &[SkillGroup], proposed: &SkillsOrder) -> SkillsOrder {
    let mut group_order: Vec<String> = Vec::new();
    for name in &proposed.group_order {
        if original.iter().any(|g| &g.name == name) && !group_order.contains(name) {
            group_order.push(name.clone());
        }
    }
    for group in original {
        if !group_order.contains(&group.name) {
            group_order.push(group.name.clone());
        }
    }

    let mut skill_order = BTreeMap::new();
    for group in original {
        let mut ordered: Vec<String> = Vec::new();
        if let Some(items) = proposed.skill_order.get(&group.name) {
            for skill in items {
                if group.skills.contains(skill) && !ordered.contains(skill) {
                    ordered.push(skill.clone());
                }
            }
        }
        for skill in &group.skills {
            if !ordered.contains(skill) {
                ordered.push(skill.clone());
            }
        }
        skill_order.insert(group.name.clone(), ordered);
    }

    SkillsOrder {
        group_order,
        skill_order,
    }
}

/// Shape validator handed to the skills editor, bound to the number of groups.
pub struct SkillsSortTool {
    expected_groups: usize,
}

impl SkillsSortTool {
    pub fn new(expected_groups: usize) -> Self {
        Self { expected_groups }
    }
}

impl ValidatorTool for SkillsSortTool {
    fn name(&self) -> &'static str {
        "validate_skills_sort"
    }

    fn description(&self) -> &'static str {
        "Validates a skills ordering JSON of the form \
         {\"groupOrder\": [string], \"skillOrder\": {group: [string]}} and checks that every \
         group is present. Call it on the candidate before approving or correcting."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "json_string": string_schema("The skills ordering JSON to validate") },
            "required": ["json_string"]
        })
    }

    fn call(&self, input: &Value) -> Value {
        match text_arg(input, "json_string") {
            Ok(s) => validate_skills_sort(&s, Some(self.expected_groups)).to_value(),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<SkillGroup> {
        vec![
            SkillGroup {
                name: "Frontend".to_string(),
                skills: vec!["React".to_string(), "CSS".to_string()],
            },
            SkillGroup {
                name: "Backend".to_string(),
                skills: vec!["Node".to_string(), "Rust".to_string()],
            },
        ]
    }

    #[test]
    fn test_valid_shape_passes() {
        let json = r#"{"groupOrder":["Frontend","Backend"],"skillOrder":{"Frontend":["React"],"Backend":["Node"]}}"#;
        let report = validate_skills_sort(json, None);
        assert_eq!(report, ValidationReport::ok());
    }

    #[test]
    fn test_malformed_json_short_circuits() {
        let report = validate_skills_sort("{groupOrder: []", Some(2));
        assert!(!report.valid);
        assert_eq!(report.issues, vec![NOT_JSON_ISSUE.to_string()]);
        assert!(report.issues[0].contains("not valid JSON"));
    }

    #[test]
    fn test_missing_group_order_reported_first() {
        let report = validate_skills_sort(r#"{"skillOrder": 3}"#, None);
        assert_eq!(
            report.issues,
            vec![GROUP_ORDER_ISSUE.to_string(), SKILL_ORDER_ISSUE.to_string()]
        );
    }

    #[test]
    fn test_group_order_must_be_strings() {
        let report = validate_skills_sort(r#"{"groupOrder":[1],"skillOrder":{}}"#, None);
        assert_eq!(report.issues, vec![GROUP_ORDER_ISSUE.to_string()]);
    }

    #[test]
    fn test_skill_order_values_must_be_string_arrays() {
        let report = validate_skills_sort(
            r#"{"groupOrder":["A"],"skillOrder":{"A":"React"}}"#,
            None,
        );
        assert_eq!(report.issues, vec![SKILL_ORDER_ISSUE.to_string()]);
        let report =
            validate_skills_sort(r#"{"groupOrder":["A"],"skillOrder":["A"]}"#, None);
        assert_eq!(report.issues, vec![SKILL_ORDER_ISSUE.to_string()]);
    }

    #[test]
    fn test_expected_group_count() {
        let json = r#"{"groupOrder":["Frontend"],"skillOrder":{"Frontend":[]}}"#;
        let report = validate_skills_sort(json, Some(2));
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("1 groups"));
        assert!(validate_skills_sort(json, Some(1)).valid);
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let json = r#"{"groupOrder":["A"],"skillOrder":{"A":["x"]}}"#;
        let first = validate_skills_sort(json, Some(1));
        let reparsed: Value = serde_json::from_str(json).unwrap();
        let second = validate_skills_sort(&reparsed.to_string(), Some(1));
        assert_eq!(first, second);
    }

    #[test]
    fn test_coverage_detects_lost_and_invented() {
        let order = SkillsOrder {
            group_order: vec!["Backend".to_string(), "DevOps".to_string()],
            skill_order: BTreeMap::from([(
                "Backend".to_string(),
                vec!["Rust".to_string(), "Node".to_string()],
            )]),
        };
        let report = check_skill_coverage(&groups(), &order);
        assert!(!report.valid);
        assert!(report.issues.iter().any(|i| i.contains("'Frontend' is missing")));
        assert!(report.issues.iter().any(|i| i.contains("'React'")));
        assert!(report.issues.iter().any(|i| i.contains("'DevOps'")));
    }

    #[test]
    fn test_repair_preserves_proposed_order_and_restores_losses() {
        let proposed = SkillsOrder {
            group_order: vec!["Backend".to_string(), "Invented".to_string()],
            skill_order: BTreeMap::from([
                (
                    "Backend".to_string(),
                    vec!["Rust".to_string(), "Go".to_string(), "Rust".to_string()],
                ),
                ("Frontend".to_string(), vec!["CSS".to_string()]),
            ]),
        };
        let repaired = repair_skill_order(&groups(), &proposed);
        assert_eq!(repaired.group_order, vec!["Backend", "Frontend"]);
        assert_eq!(repaired.skill_order["Backend"], vec!["Rust", "Node"]);
        assert_eq!(repaired.skill_order["Frontend"], vec!["CSS", "React"]);
        assert!(check_skill_coverage(&groups(), &repaired).valid);
    }

    #[test]
    fn test_tool_binds_expected_groups() {
        let tool = SkillsSortTool::new(3);
        let out = tool.call(&json!({
            "json_string": r#"{"groupOrder":["A"],"skillOrder":{"A":[]}}"#
        }));
        assert_eq!(out["valid"], false);
    }
}
