//! Pipeline Orchestrator — one module per refinement task.
//!
//! Every task follows the same shape: build its role agents for this run, execute
//! stages in a fixed order through the `StageRunner`, put the candidate through the
//! critique loop, apply deterministic repairs, and emit a single `done` event.
//! Stages within a run are strictly sequential.

use std::sync::Arc;

use serde::Serialize;

use crate::llm_client::{create_model, AgentConfig, ChatModel, LlmError};

pub mod achievements;
pub mod cover_letter;
pub mod critique;
pub mod experience;
pub mod handlers;
pub mod jd_refine;
pub mod job_title;
pub mod progress;
pub mod prompts;
pub mod skills;
pub mod state;
pub mod summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    JobTitle,
    Summary,
    Experience,
    AchievementSort,
    SkillsSort,
    CoverLetter,
    JdRefine,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::JobTitle => "job-title",
            TaskKind::Summary => "summary",
            TaskKind::Experience => "experience",
            TaskKind::AchievementSort => "achievement-sort",
            TaskKind::SkillsSort => "skills-sort",
            TaskKind::CoverLetter => "cover-letter",
            TaskKind::JdRefine => "jd-refine",
        }
    }

    /// Maximum reviewer rounds per run. Experience tailoring has no reviewer; its
    /// sub-artifacts are checked deterministically instead.
    pub fn review_budget(self) -> u32 {
        match self {
            TaskKind::JobTitle => 2,
            TaskKind::Summary => 3,
            TaskKind::Experience => 0,
            TaskKind::AchievementSort => 3,
            TaskKind::SkillsSort => 3,
            TaskKind::CoverLetter => 2,
            TaskKind::JdRefine => 2,
        }
    }

    /// Shortest rewritten text worth returning, in characters.
    pub fn min_rewrite_chars(self) -> usize {
        match self {
            TaskKind::JobTitle => 3,
            TaskKind::Summary => 80,
            TaskKind::Experience => 50,
            TaskKind::CoverLetter => 400,
            TaskKind::AchievementSort | TaskKind::SkillsSort | TaskKind::JdRefine => 0,
        }
    }

    /// Changed-character count at or below which a rewrite of an `original_len`-char
    /// text counts as trivial.
    pub fn trivial_edit_chars(self, original_len: usize) -> usize {
        match self {
            TaskKind::JobTitle => 2,
            TaskKind::Summary | TaskKind::Experience => (original_len / 50).max(5),
            _ => 0,
        }
    }
}

/// Builds the shared model client for one run.
pub fn model_for(config: &AgentConfig) -> Arc<dyn ChatModel> {
    Arc::new(create_model(config))
}

/// A writer that answers with nothing has produced a malformed response.
pub(crate) fn require_text(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyContent)
    } else {
        Ok(text)
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Size of the region that differs between `a` and `b` once their common prefix and
/// suffix are removed.
fn edit_span(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(a.len().min(b.len()) - prefix)
        .take_while(|(x, y)| x == y)
        .count();
    (a.len() - prefix - suffix).max(b.len() - prefix - suffix)
}

/// Why `rewritten` is not a real rewrite of `original` for `task`, if it is not.
///
/// Too short for the task, or within the task's edit threshold of the original
/// after whitespace and case are normalised.
pub(crate) fn rewrite_issue(task: TaskKind, original: &str, rewritten: &str) -> Option<String> {
    let len = rewritten.trim().chars().count();
    let min = task.min_rewrite_chars();
    if len < min {
        return Some(format!("rewrite is {len} chars, under the {min}-char minimum"));
    }
    if original.trim().is_empty() {
        return None;
    }

    let (before, after) = (normalize_text(original), normalize_text(rewritten));
    let changed = edit_span(&before, &after);
    (changed <= task.trivial_edit_chars(before.chars().count()))
        .then(|| format!("rewrite changes only {changed} chars of the original"))
}

/// Renders a list for a prompt, one item per line.
pub(crate) fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a list for a prompt with zero-based indices.
pub(crate) fn indexed_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[{i}] {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
