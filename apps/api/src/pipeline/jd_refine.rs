//! Job description refinement: WRITE(markdown sections) → REVIEW.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{strip_json_fences, AgentConfig, ChatModel, LlmError};
use crate::pipeline::critique::review_until_approved;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts;
use crate::pipeline::state::PipelineState;
use crate::pipeline::{model_for, require_text, TaskKind};
use crate::tools::sections::{check_sections, MarkdownSectionsTool, JD_SECTIONS};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineJdRequest {
    pub job_description: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Models sometimes fence markdown as ```markdown.
fn unfence(text: &str) -> String {
    let text = text.trim();
    match text.strip_prefix("```markdown") {
        Some(inner) => inner.trim().trim_end_matches("```").trim().to_string(),
        None => strip_json_fences(text).to_string(),
    }
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &RefineJdRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &RefineJdRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    let mut state = PipelineState::new(TaskKind::JdRefine, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);

    let writer = RoleAgent::new(
        "jd-refiner",
        prompts::jd_refiner_system(JD_SECTIONS),
        model.clone(),
    );
    let reviewer = RoleAgent::new("jd-reviewer", prompts::jd_reviewer_system(JD_SECTIONS), model)
        .with_tool(MarkdownSectionsTool::new(JD_SECTIONS));

    let prompt = prompts::jd_refine_prompt(&state.role_label(), &request.job_description);
    let turn = runner
        .run(&mut state, Stage::Draft, "Restructuring job description...", &writer, &prompt)
        .await?;
    let draft = unfence(&require_text(turn.text)?);

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &reviewer,
        draft,
        "Reviewing job description",
        |candidate| prompts::jd_review_prompt(&request.job_description, candidate),
    )
    .await?;

    let markdown = unfence(&reviewed.artifact);
    let report = check_sections(&markdown, JD_SECTIONS);
    if !report.valid {
        warn!(
            "[jd-refine] Final markdown is incomplete: {}",
            report.issues.join("; ")
        );
    }

    runner.finish(&mut state, markdown.clone());
    Ok(markdown)
}
