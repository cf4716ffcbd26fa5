//! Experience tailoring: a fixed four-stage sequence over one resume entry.
//!
//! ANALYZE(keywords) → DRAFT(description) → DRAFT(achievements) → DRAFT(tech stack).
//! There is no reviewer. Each sub-artifact is checked deterministically after its
//! stage and falls back to the original when the check fails, so the entry returned
//! is never worse than the one sent in.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::{AgentTurn, RoleAgent};
use crate::llm_client::{strip_json_fences, AgentConfig, ChatModel, LlmError};
use crate::models::resume::TailoredExperience;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{self, EXPERIENCE_ANALYST_SYSTEM};
use crate::pipeline::state::PipelineState;
use crate::pipeline::{bullet_list, indexed_list, model_for, rewrite_issue, TaskKind};
use crate::tools::experience::{
    has_provenance, validate_achievements, validate_description, AchievementIntegrityTool,
    DescriptionQualityTool, RecordKeywordsTool, TechStackProvenanceTool,
    MIN_ACHIEVEMENT_CHARS, RECORD_KEYWORDS_TOOL,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequest {
    pub job_description: String,
    /// Title held in this entry, e.g. "Backend Engineer".
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl ExperienceRequest {
    fn render_entry(&self) -> String {
        let heading = match (&self.title, &self.company) {
            (Some(t), Some(c)) => format!("{t} at {c}"),
            (Some(t), None) => t.clone(),
            (None, Some(c)) => c.clone(),
            (None, None) => "Experience entry".to_string(),
        };
        format!(
            "{heading}\n\nDescription:\n{}\n\nAchievements:\n{}\n\nTech stack:\n{}",
            self.description.trim(),
            bullet_list(&self.achievements),
            bullet_list(&self.tech_stack)
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Deterministic post-checks
// ────────────────────────────────────────────────────────────────────────────

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(|s| s.trim().to_string()))
        .collect()
}

/// Accepts a bare JSON array of strings or an object holding one under `key`.
fn parse_string_list(text: &str, key: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(strip_json_fences(text)).ok()?;
    string_list(&value).or_else(|| value.get(key).and_then(string_list))
}

/// Keywords come from the `record_keywords` call when the analyst made one, else from
/// JSON in its reply, else there are none.
fn extract_keywords(turn: &AgentTurn) -> Vec<String> {
    let recorded = turn
        .last_invocation(RECORD_KEYWORDS_TOOL)
        .and_then(|call| call.input.get("keywords"))
        .and_then(string_list);
    let keywords = recorded
        .or_else(|| parse_string_list(&turn.text, "keywords"))
        .unwrap_or_default();

    let mut unique: Vec<String> = Vec::new();
    for keyword in keywords {
        if !keyword.is_empty() && !unique.iter().any(|k| k.eq_ignore_ascii_case(&keyword)) {
            unique.push(keyword);
        }
    }
    unique
}

fn finalize_description(original: &str, rewritten: &str) -> String {
    let report = validate_description(original, rewritten);
    if report.valid {
        return rewritten.trim().to_string();
    }

    let trimmed = rewritten.trim();
    if !trimmed.is_empty() && trimmed != original.trim() {
        warn!(
            "[experience] Keeping description despite: {}",
            report.issues.join("; ")
        );
        trimmed.to_string()
    } else {
        warn!("[experience] Description rewrite unusable; keeping original");
        original.to_string()
    }
}

fn finalize_achievements(original: &[String], reply: &str) -> Vec<String> {
    let Some(rewritten) = parse_string_list(reply, "achievements") else {
        warn!("[experience] Achievements reply is not a JSON string array; keeping originals");
        return original.to_vec();
    };
    if rewritten.len() != original.len() {
        warn!(
            "[experience] Expected {} achievements but got {}; keeping originals",
            original.len(),
            rewritten.len()
        );
        return original.to_vec();
    }

    let report = validate_achievements(original, &rewritten);
    if !report.valid {
        warn!(
            "[experience] Restoring short achievements: {}",
            report.issues.join("; ")
        );
    }
    rewritten
        .into_iter()
        .zip(original)
        .map(|(new, old)| {
            if new.trim().chars().count() < MIN_ACHIEVEMENT_CHARS {
                old.clone()
            } else {
                new
            }
        })
        .collect()
}

fn finalize_tech_stack(original: &[String], reply: &str) -> Vec<String> {
    let Some(proposed) = parse_string_list(reply, "techStack") else {
        warn!("[experience] Tech stack reply is not a JSON string array; keeping original");
        return original.to_vec();
    };

    let mut aligned: Vec<String> = Vec::new();
    for item in proposed {
        if !has_provenance(&item, original) {
            warn!("[experience] Dropping '{item}' from tech stack: not in original");
            continue;
        }
        if !aligned.iter().any(|a| a.eq_ignore_ascii_case(&item)) {
            aligned.push(item);
        }
    }
    aligned.truncate(original.len() * 2);

    if aligned.is_empty() {
        original.to_vec()
    } else {
        aligned
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration
// ────────────────────────────────────────────────────────────────────────────

pub async fn run_with_config(
    config: &AgentConfig,
    request: &ExperienceRequest,
    progress: &dyn ProgressSink,
) -> Result<TailoredExperience, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &ExperienceRequest,
    progress: &dyn ProgressSink,
) -> Result<TailoredExperience, LlmError> {
    let mut state = PipelineState::new(TaskKind::Experience, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);

    let analyst = RoleAgent::new("experience-analyst", EXPERIENCE_ANALYST_SYSTEM, model.clone())
        .with_tool(RecordKeywordsTool);

    // ── Keywords ─────────────────────────────────────────────────────────────
    let prompt = prompts::keywords_prompt(
        &state.role_label(),
        &request.job_description,
        &request.render_entry(),
    );
    let turn = runner
        .run(&mut state, Stage::Analyze, "Extracting job keywords...", &analyst, &prompt)
        .await?;
    let keywords = extract_keywords(&turn);
    if keywords.is_empty() {
        warn!("[experience] Analyst recorded no keywords");
    } else {
        info!("[experience] {} keywords: {}", keywords.len(), keywords.join(", "));
    }
    let keyword_list = bullet_list(&keywords);

    // ── Description ──────────────────────────────────────────────────────────
    let description = if request.description.trim().is_empty() {
        String::new()
    } else {
        let writer = RoleAgent::new(
            "description-writer",
            prompts::description_writer_system(),
            model.clone(),
        )
        .with_tool(DescriptionQualityTool);
        let prompt = prompts::description_prompt(&keyword_list, &request.description);
        let turn = runner
            .run(&mut state, Stage::Draft, "Rewriting description...", &writer, &prompt)
            .await?;
        let description = finalize_description(&request.description, &turn.text);
        if description != request.description {
            if let Some(issue) =
                rewrite_issue(TaskKind::Experience, &request.description, &description)
            {
                warn!("[experience] Description looks untailored: {issue}");
            }
        }
        description
    };

    // ── Achievements ─────────────────────────────────────────────────────────
    let achievements = if request.achievements.is_empty() {
        Vec::new()
    } else {
        let writer = RoleAgent::new(
            "achievements-writer",
            prompts::achievements_writer_system(),
            model.clone(),
        )
        .with_tool(AchievementIntegrityTool);
        let prompt = prompts::achievements_prompt(
            &keyword_list,
            request.achievements.len(),
            &indexed_list(&request.achievements),
        );
        let turn = runner
            .run(&mut state, Stage::Draft, "Rewriting achievements...", &writer, &prompt)
            .await?;
        finalize_achievements(&request.achievements, &turn.text)
    };

    // ── Tech stack ───────────────────────────────────────────────────────────
    let tech_stack = if request.tech_stack.is_empty() {
        None
    } else {
        let writer = RoleAgent::new(
            "tech-stack-writer",
            prompts::tech_stack_writer_system(),
            model,
        )
        .with_tool(TechStackProvenanceTool);
        let prompt = prompts::tech_stack_prompt(&keyword_list, &bullet_list(&request.tech_stack));
        let turn = runner
            .run(&mut state, Stage::Draft, "Aligning tech stack...", &writer, &prompt)
            .await?;
        Some(finalize_tech_stack(&request.tech_stack, &turn.text))
    };

    let result = TailoredExperience {
        description,
        achievements,
        tech_stack,
        keywords,
    };
    runner.finish(&mut state, serde_json::to_string(&result)?);
    Ok(result)
}
