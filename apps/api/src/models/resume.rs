//! Resume fragments consumed by the pipelines and the artifacts they return.
//!
//! These are wire types only. The surrounding application owns the full resume
//! model; the pipelines see just the pieces a task needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named group of skills as it appears on the resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Output of skills sorting: group order plus per-group skill order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsOrder {
    pub group_order: Vec<String>,
    pub skill_order: BTreeMap<String, Vec<String>>,
}

/// Output of achievement sorting. Always a permutation of `0..N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAchievements {
    pub ranked_indices: Vec<usize>,
}

/// Output of experience tailoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredExperience {
    pub description: String,
    pub achievements: Vec<String>,
    /// Absent when the entry had no tech stack to align.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    /// JD keywords extracted by the analyst.
    pub keywords: Vec<String>,
}
