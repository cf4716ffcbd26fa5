//! Axum route handlers for the tailoring API.
//!
//! Handlers own the caller-side preconditions (job description length, provider
//! configuration), collect progress events for the response, and delegate every
//! semantic decision to the pipeline modules.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{create_model, AgentConfig};
use crate::models::resume::{RankedAchievements, SkillsOrder, TailoredExperience};
use crate::pipeline::achievements::{self, AchievementSortRequest};
use crate::pipeline::cover_letter::{self, CoverLetterRequest};
use crate::pipeline::experience::{self, ExperienceRequest};
use crate::pipeline::jd_refine::{self, RefineJdRequest};
use crate::pipeline::job_title::{self, JobTitleRequest};
use crate::pipeline::progress::{ChannelProgress, ProgressEvent};
use crate::pipeline::skills::{self, SkillsSortRequest};
use crate::pipeline::summary::{self, SummaryRequest};
use crate::state::AppState;

pub const MIN_JOB_DESCRIPTION_CHARS: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Task payload plus an optional per-request provider config.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest<T> {
    #[serde(default)]
    pub agent_config: Option<AgentConfig>,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse<T> {
    pub result: T,
    pub progress: Vec<ProgressEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsRequest {
    #[serde(default)]
    pub agent_config: Option<AgentConfig>,
}

#[derive(Debug, Serialize)]
pub struct ListModelsResponse {
    pub models: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Preconditions
// ────────────────────────────────────────────────────────────────────────────

fn validate_job_description(job_description: &str) -> Result<(), AppError> {
    let len = job_description.trim().chars().count();
    if len < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "jobDescription must be at least {MIN_JOB_DESCRIPTION_CHARS} characters (got {len})"
        )));
    }
    Ok(())
}

/// Picks the request's own config, else the server default.
fn resolve_agent(
    state: &AppState,
    requested: Option<AgentConfig>,
    require_model: bool,
) -> Result<AgentConfig, AppError> {
    let config = requested
        .or_else(|| state.config.default_agent.clone())
        .ok_or_else(|| {
            AppError::Validation(
                "agentConfig is required: no default model provider is configured".to_string(),
            )
        })?;

    if require_model && config.model.trim().is_empty() {
        return Err(AppError::Validation(
            "agentConfig.model cannot be empty".to_string(),
        ));
    }
    Ok(config)
}

fn respond<T>(result: T, rx: &mut UnboundedReceiver<ProgressEvent>) -> Json<TaskResponse<T>> {
    Json(TaskResponse {
        result,
        progress: ChannelProgress::drain(rx),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/models
///
/// Lists models available to the given (or default) provider credentials.
/// Send `{}` to use the default provider.
pub async fn handle_list_models(
    State(state): State<AppState>,
    payload: Result<Json<ListModelsRequest>, JsonRejection>,
) -> Result<Json<ListModelsResponse>, AppError> {
    let Json(request) = payload?;
    let config = resolve_agent(&state, request.agent_config, false)?;
    let client = create_model(&config);
    let models = client.list_models().await?;
    info!(
        "[models] {} models available from {} provider",
        models.len(),
        client.provider().as_str()
    );
    Ok(Json(ListModelsResponse { models }))
}

/// POST /api/v1/tailor/job-title
pub async fn handle_job_title(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<JobTitleRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<String>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = job_title::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<SummaryRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<String>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = summary::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/experience
pub async fn handle_experience(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<ExperienceRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<TailoredExperience>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = experience::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/achievements/sort
pub async fn handle_sort_achievements(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<AchievementSortRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<RankedAchievements>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = achievements::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/skills/sort
pub async fn handle_sort_skills(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<SkillsSortRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<SkillsOrder>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = skills::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<CoverLetterRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<String>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = cover_letter::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}

/// POST /api/v1/tailor/job-description/refine
pub async fn handle_refine_job_description(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest<RefineJdRequest>>, JsonRejection>,
) -> Result<Json<TaskResponse<String>>, AppError> {
    let Json(request) = payload?;
    validate_job_description(&request.payload.job_description)?;
    let config = resolve_agent(&state, request.agent_config, true)?;
    let request = request.payload;
    let (sink, mut rx) = ChannelProgress::new();
    let result = jd_refine::run_with_config(&config, &request, &sink).await?;
    Ok(respond(result, &mut rx))
}
