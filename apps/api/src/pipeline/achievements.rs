//! Achievement sorting: ANALYZE → DRAFT(`rankedIndices`) → REVIEW, followed by a
//! deterministic repair that guarantees a permutation of `0..N`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{AgentConfig, ChatModel, LlmError};
use crate::models::resume::RankedAchievements;
use crate::pipeline::critique::{review_until_approved, Artifact};
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{self, ACHIEVEMENT_ANALYSIS_FOCUS, JD_ANALYST_SYSTEM};
use crate::pipeline::state::PipelineState;
use crate::pipeline::{indexed_list, model_for, TaskKind};
use crate::tools::ranking::{repair_permutation, RankingTool};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSortRequest {
    pub job_description: String,
    pub achievements: Vec<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &AchievementSortRequest,
    progress: &dyn ProgressSink,
) -> Result<RankedAchievements, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &AchievementSortRequest,
    progress: &dyn ProgressSink,
) -> Result<RankedAchievements, LlmError> {
    let mut state = PipelineState::new(TaskKind::AchievementSort, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);
    let count = request.achievements.len();

    if count <= 1 {
        info!("[achievement-sort] {count} achievement(s); nothing to rank");
        let identity = RankedAchievements {
            ranked_indices: (0..count).collect(),
        };
        runner.finish(&mut state, identity.encode());
        return Ok(identity);
    }

    let listing = indexed_list(&request.achievements);

    let analyst = RoleAgent::new("achievement-analyst", JD_ANALYST_SYSTEM, model.clone());
    let sorter = RoleAgent::new(
        "achievement-sorter",
        prompts::achievement_sorter_system(count),
        model.clone(),
    );
    let reviewer = RoleAgent::new(
        "achievement-reviewer",
        prompts::achievement_reviewer_system(count),
        model,
    )
    .with_tool(RankingTool::new(count));

    let prompt = prompts::analysis_prompt(
        &state.role_label(),
        &request.job_description,
        ACHIEVEMENT_ANALYSIS_FOCUS,
    );
    let analysis = runner
        .run(&mut state, Stage::Analyze, "Analyzing job priorities...", &analyst, &prompt)
        .await?
        .text;

    let prompt = prompts::achievement_draft_prompt(&analysis, &listing);
    let turn = runner
        .run(&mut state, Stage::Draft, "Ranking achievements...", &sorter, &prompt)
        .await?;
    let draft = RankedAchievements::decode(&turn.text).unwrap_or_else(|| {
        warn!("[achievement-sort] Sorter reply is not a ranking; reviewing original order");
        RankedAchievements {
            ranked_indices: (0..count).collect(),
        }
    });

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &reviewer,
        draft,
        "Reviewing ranking",
        |candidate| {
            prompts::achievement_review_prompt(&request.job_description, &listing, candidate)
        },
    )
    .await?;

    let ranked_indices = repair_permutation(&reviewed.artifact.ranked_indices, count);
    if ranked_indices != reviewed.artifact.ranked_indices {
        warn!(
            "[achievement-sort] Repaired ranking {:?} into {:?}",
            reviewed.artifact.ranked_indices, ranked_indices
        );
    }

    let result = RankedAchievements { ranked_indices };
    runner.finish(&mut state, result.encode());
    Ok(result)
}
