//! Job title tailoring: ANALYZE → DRAFT → REVIEW.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{AgentConfig, ChatModel, LlmError};
use crate::pipeline::critique::{review_until_approved, Artifact};
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{self, JD_ANALYST_SYSTEM, JOB_TITLE_ANALYSIS_FOCUS};
use crate::pipeline::state::PipelineState;
use crate::pipeline::{model_for, rewrite_issue, TaskKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTitleRequest {
    pub job_description: String,
    pub current_title: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Models wrap titles in quotes or end them with a period despite instructions.
fn clean_title(text: &str) -> String {
    text.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// A cleaned, non-empty title. Replies that clean down to nothing (`""`, `...`)
/// do not decode.
#[derive(Debug, Clone, PartialEq)]
struct JobTitle(String);

impl Artifact for JobTitle {
    fn encode(&self) -> String {
        self.0.clone()
    }

    fn decode(text: &str) -> Option<Self> {
        let title = clean_title(text);
        (!title.is_empty()).then_some(JobTitle(title))
    }
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &JobTitleRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &JobTitleRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    let mut state = PipelineState::new(TaskKind::JobTitle, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);

    let analyst = RoleAgent::new("job-title-analyst", JD_ANALYST_SYSTEM, model.clone());
    let writer = RoleAgent::new(
        "job-title-writer",
        prompts::job_title_writer_system(),
        model.clone(),
    );
    let reviewer = RoleAgent::new(
        "job-title-reviewer",
        prompts::job_title_reviewer_system(),
        model,
    );

    let prompt = prompts::analysis_prompt(
        &state.role_label(),
        &request.job_description,
        JOB_TITLE_ANALYSIS_FOCUS,
    );
    let analysis = runner
        .run(&mut state, Stage::Analyze, "Analyzing the target role...", &analyst, &prompt)
        .await?
        .text;

    let prompt = prompts::job_title_draft_prompt(&analysis, &request.current_title);
    let turn = runner
        .run(&mut state, Stage::Draft, "Writing job title...", &writer, &prompt)
        .await?;
    let draft = JobTitle::decode(&turn.text).ok_or(LlmError::EmptyContent)?;

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &reviewer,
        draft,
        "Reviewing job title",
        |candidate| {
            prompts::job_title_review_prompt(
                &request.job_description,
                &request.current_title,
                candidate,
            )
        },
    )
    .await?;

    let title = reviewed.artifact.0;
    if let Some(issue) = rewrite_issue(TaskKind::JobTitle, &request.current_title, &title) {
        warn!(
            "[job-title] Tailored title looks untailored next to '{}': {issue}",
            request.current_title
        );
    }

    runner.finish(&mut state, title.clone());
    Ok(title)
}
