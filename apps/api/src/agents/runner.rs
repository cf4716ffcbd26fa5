//! Stage Runner — executes one directed stage of a pipeline run.

use tracing::{info, info_span, Instrument};

use crate::agents::{AgentTurn, RoleAgent};
use crate::llm_client::LlmError;
use crate::pipeline::progress::{ProgressEvent, ProgressSink};
use crate::pipeline::state::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analyze,
    Draft,
    Review,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Draft => "draft",
            Stage::Review => "review",
        }
    }
}

pub struct StageRunner<'a> {
    progress: &'a dyn ProgressSink,
}

impl<'a> StageRunner<'a> {
    pub fn new(progress: &'a dyn ProgressSink) -> Self {
        Self { progress }
    }

    /// Reports `status`, runs the agent on `prompt` and records its reply.
    ///
    /// Analysis replies become `state.analysis`; draft replies are appended to the
    /// draft history. Review replies are only counted; the critique loop decides
    /// what to record.
    pub async fn run(
        &self,
        state: &mut PipelineState,
        stage: Stage,
        status: &str,
        agent: &RoleAgent,
        prompt: &str,
    ) -> Result<AgentTurn, LlmError> {
        self.progress.report(ProgressEvent::status(status));

        let span = info_span!(
            "stage",
            run_id = %state.run_id,
            task = state.task.as_str(),
            stage = stage.as_str(),
            agent = agent.name(),
            tools = ?agent.tool_names(),
        );
        let turn = agent.run(prompt).instrument(span).await?;

        match stage {
            Stage::Analyze => state.record_analysis(&turn.text),
            Stage::Draft => state.record_draft(&turn.text),
            Stage::Review => state.review_rounds += 1,
        }

        info!(
            "[{}] {} stage by '{}' done: {} chars, {} tool calls",
            state.task.as_str(),
            stage.as_str(),
            agent.name(),
            turn.text.len(),
            turn.invocations.len()
        );

        Ok(turn)
    }

    /// Records the final artifact and emits the terminal `done` event.
    pub fn finish(&self, state: &mut PipelineState, artifact: String) {
        info!(
            "[{}] run {} complete after {} drafts, {} review rounds",
            state.task.as_str(),
            state.run_id,
            state.drafts.len(),
            state.review_rounds
        );
        self.progress.report(ProgressEvent::done(artifact.clone()));
        state.final_artifact = Some(artifact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ModelReply;
    use crate::pipeline::TaskKind;
    use crate::test_support::{CollectingProgress, ScriptedModel};

    #[tokio::test]
    async fn test_stages_record_into_state() {
        let model = ScriptedModel::new(vec![
            ModelReply::text(" notes "),
            ModelReply::text("draft text"),
            ModelReply::text("APPROVED"),
        ]);
        let progress = CollectingProgress::default();
        let runner = StageRunner::new(&progress);
        let agent = RoleAgent::new("analyst", "system", model);
        let mut state = PipelineState::new(TaskKind::JobTitle, "jd");

        runner
            .run(&mut state, Stage::Analyze, "Analyzing...", &agent, "p")
            .await
            .unwrap();
        runner
            .run(&mut state, Stage::Draft, "Writing...", &agent, "p")
            .await
            .unwrap();
        runner
            .run(&mut state, Stage::Review, "Reviewing...", &agent, "p")
            .await
            .unwrap();
        runner.finish(&mut state, "final".to_string());

        assert_eq!(state.analysis.as_deref(), Some("notes"));
        assert_eq!(state.drafts, vec!["draft text"]);
        assert_eq!(state.review_rounds, 1);
        assert_eq!(state.final_artifact.as_deref(), Some("final"));

        let events = progress.events();
        let contents: Vec<&str> = events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["Analyzing...", "Writing...", "Reviewing...", "final"]);
        assert_eq!(events.iter().filter(|e| e.done).count(), 1);
        assert!(events.last().unwrap().done);
    }

    #[tokio::test]
    async fn test_failed_stage_records_nothing() {
        let model = ScriptedModel::failing(500, "boom");
        let progress = CollectingProgress::default();
        let runner = StageRunner::new(&progress);
        let agent = RoleAgent::new("writer", "system", model);
        let mut state = PipelineState::new(TaskKind::Summary, "jd");

        let result = runner
            .run(&mut state, Stage::Draft, "Writing...", &agent, "p")
            .await;
        assert!(result.is_err());
        assert!(state.drafts.is_empty());
        assert_eq!(progress.events().len(), 1);
    }
}
