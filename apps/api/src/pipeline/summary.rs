//! Professional summary tailoring: ANALYZE → DRAFT → REVIEW, where the reviewer holds
//! a whitelist of the candidate's own skills.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{AgentConfig, ChatModel, LlmError};
use crate::pipeline::critique::review_until_approved;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{self, JD_ANALYST_SYSTEM, SUMMARY_ANALYSIS_FOCUS};
use crate::pipeline::state::PipelineState;
use crate::pipeline::{bullet_list, model_for, require_text, rewrite_issue, TaskKind};
use crate::tools::whitelist::{SkillWhitelist, SkillWhitelistTool};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub job_description: String,
    pub current_summary: String,
    #[serde(default)]
    pub allowed_skills: Vec<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &SummaryRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &SummaryRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    let mut state = PipelineState::new(TaskKind::Summary, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);
    let skills = bullet_list(&request.allowed_skills);

    let analyst = RoleAgent::new("summary-analyst", JD_ANALYST_SYSTEM, model.clone());
    let writer = RoleAgent::new(
        "summary-writer",
        prompts::summary_writer_system(),
        model.clone(),
    );
    let reviewer = RoleAgent::new("summary-reviewer", prompts::summary_reviewer_system(), model)
        .with_tool(SkillWhitelistTool::new(&request.allowed_skills));

    let prompt = prompts::analysis_prompt(
        &state.role_label(),
        &request.job_description,
        &format!("{SUMMARY_ANALYSIS_FOCUS}\n\nCANDIDATE'S SKILLS:\n{skills}"),
    );
    let analysis = runner
        .run(&mut state, Stage::Analyze, "Analyzing job requirements...", &analyst, &prompt)
        .await?
        .text;

    let prompt = prompts::summary_draft_prompt(&analysis, &request.current_summary, &skills);
    let turn = runner
        .run(&mut state, Stage::Draft, "Writing summary...", &writer, &prompt)
        .await?;
    let draft = require_text(turn.text)?;

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &reviewer,
        draft,
        "Reviewing summary",
        |candidate| {
            prompts::summary_review_prompt(
                &request.job_description,
                &request.current_summary,
                &skills,
                candidate,
            )
        },
    )
    .await?;
    let summary = reviewed.artifact;

    if let Some(issue) = rewrite_issue(TaskKind::Summary, &request.current_summary, &summary) {
        warn!("[summary] Tailored summary looks untailored: {issue}");
    }
    // Reported only; the reviewer owns enforcement.
    let leftovers = SkillWhitelist::new(&request.allowed_skills).check(&summary);
    if !leftovers.valid && !request.allowed_skills.is_empty() {
        warn!(
            "[summary] Final summary still names unlisted skills: {}",
            leftovers.issues.join("; ")
        );
    }

    runner.finish(&mut state, summary.clone());
    Ok(summary)
}
