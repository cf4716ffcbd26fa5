//! Skills sorting: ANALYZE(brain) → DRAFT(scribe) → REVIEW(editor), followed by a
//! coverage repair so no group or skill is ever lost or invented.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{AgentConfig, ChatModel, LlmError};
use crate::models::resume::{SkillGroup, SkillsOrder};
use crate::pipeline::critique::{review_until_approved, Artifact};
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{self, SKILLS_BRAIN_SYSTEM};
use crate::pipeline::state::PipelineState;
use crate::pipeline::{model_for, TaskKind};
use crate::tools::json::JsonValidatorTool;
use crate::tools::skills::{check_skill_coverage, repair_skill_order, SkillsSortTool};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsSortRequest {
    pub job_description: String,
    pub skill_groups: Vec<SkillGroup>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

fn original_order(groups: &[SkillGroup]) -> SkillsOrder {
    SkillsOrder {
        group_order: groups.iter().map(|g| g.name.clone()).collect(),
        skill_order: groups
            .iter()
            .map(|g| (g.name.clone(), g.skills.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn render_groups(groups: &[SkillGroup]) -> String {
    groups
        .iter()
        .map(|g| format!("- {}: {}", g.name, g.skills.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &SkillsSortRequest,
    progress: &dyn ProgressSink,
) -> Result<SkillsOrder, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &SkillsSortRequest,
    progress: &dyn ProgressSink,
) -> Result<SkillsOrder, LlmError> {
    let mut state = PipelineState::new(TaskKind::SkillsSort, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);
    let groups = &request.skill_groups;

    if groups.is_empty() {
        info!("[skills-sort] No skill groups; nothing to sort");
        let empty = SkillsOrder::default();
        runner.finish(&mut state, empty.encode());
        return Ok(empty);
    }

    let listing = render_groups(groups);

    let brain = RoleAgent::new("skills-brain", SKILLS_BRAIN_SYSTEM, model.clone());
    let scribe = RoleAgent::new(
        "skills-scribe",
        prompts::skills_scribe_system(groups.len()),
        model.clone(),
    )
    .with_tool(JsonValidatorTool);
    let editor = RoleAgent::new(
        "skills-editor",
        prompts::skills_editor_system(groups.len()),
        model,
    )
    .with_tool(SkillsSortTool::new(groups.len()));

    let prompt =
        prompts::skills_brain_prompt(&state.role_label(), &request.job_description, &listing);
    let plan = runner
        .run(&mut state, Stage::Analyze, "Planning skills order...", &brain, &prompt)
        .await?
        .text;

    let prompt = prompts::skills_scribe_prompt(&plan, &listing);
    let turn = runner
        .run(&mut state, Stage::Draft, "Structuring skills order...", &scribe, &prompt)
        .await?;
    let draft = SkillsOrder::decode(&turn.text).unwrap_or_else(|| {
        warn!("[skills-sort] Scribe reply is not a skills order; reviewing original order");
        original_order(groups)
    });

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &editor,
        draft,
        "Reviewing skills order",
        |candidate| prompts::skills_edit_prompt(&request.job_description, &listing, candidate),
    )
    .await?;

    let coverage = check_skill_coverage(groups, &reviewed.artifact);
    let result = if coverage.valid {
        reviewed.artifact
    } else {
        warn!(
            "[skills-sort] Repairing final order: {}",
            coverage.issues.join("; ")
        );
        repair_skill_order(groups, &reviewed.artifact)
    };

    runner.finish(&mut state, result.encode());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingProgress, ScriptedModel};

    fn request() -> SkillsSortRequest {
        SkillsSortRequest {
            job_description: "Backend role: Rust and Node services.".to_string(),
            skill_groups: vec![
                SkillGroup {
                    name: "Frontend".to_string(),
                    skills: vec!["React".to_string()],
                },
                SkillGroup {
                    name: "Backend".to_string(),
                    skills: vec!["Node".to_string(), "Rust".to_string()],
                },
            ],
            position: None,
            organization: None,
        }
    }

    #[tokio::test]
    async fn test_empty_groups_skip_model() {
        let model = ScriptedModel::texts(&[]);
        let mut req = request();
        req.skill_groups.clear();
        let result = run(model.clone(), &req, &CollectingProgress::default())
            .await
            .unwrap();
        assert_eq!(result, SkillsOrder::default());
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_approved_order_is_returned() {
        let model = ScriptedModel::texts(&[
            "Backend first; Rust before Node.",
            r#"{"groupOrder":["Backend","Frontend"],"skillOrder":{"Backend":["Rust","Node"],"Frontend":["React"]}}"#,
            "APPROVED",
        ]);
        let result = run(model.clone(), &request(), &CollectingProgress::default())
            .await
            .unwrap();
        assert_eq!(result.group_order, vec!["Backend", "Frontend"]);
        assert_eq!(result.skill_order["Backend"], vec!["Rust", "Node"]);

        let calls = model.calls();
        assert!(calls[1].system.contains("There are 2 groups"));
        assert!(calls[1].prompt().contains("Backend first"));
        assert_eq!(calls[1].tool_names, vec!["validate_json".to_string()]);
        assert_eq!(calls[2].tool_names, vec!["validate_skills_sort".to_string()]);
    }

    #[tokio::test]
    async fn test_lost_skills_are_restored() {
        let model = ScriptedModel::texts(&[
            "plan",
            r#"{"groupOrder":["Backend"],"skillOrder":{"Backend":["Rust","Go"]}}"#,
            "APPROVED",
        ]);
        let result = run(model, &request(), &CollectingProgress::default())
            .await
            .unwrap();
        assert_eq!(result.group_order, vec!["Backend", "Frontend"]);
        assert_eq!(result.skill_order["Backend"], vec!["Rust", "Node"]);
        assert_eq!(result.skill_order["Frontend"], vec!["React"]);
    }

    #[tokio::test]
    async fn test_malformed_scribe_output_reviews_original_order() {
        let model = ScriptedModel::texts(&["plan", "{groupOrder: oops", "APPROVED"]);
        let progress = CollectingProgress::default();
        let result = run(model.clone(), &request(), &progress).await.unwrap();
        assert_eq!(result, original_order(&request().skill_groups));
        assert!(model.calls()[2].prompt().contains("\"groupOrder\":[\"Frontend\",\"Backend\"]"));
        let done = progress.events().last().unwrap().clone();
        assert!(done.done);
        assert!(done.content.contains("groupOrder"));
    }
}
