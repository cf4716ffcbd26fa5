use uuid::Uuid;

use crate::pipeline::TaskKind;

/// Per-run record of inputs and intermediate artifacts. Lives for one
/// orchestrator invocation and is never persisted.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub task: TaskKind,
    pub job_description: String,
    pub position: Option<String>,
    pub organization: Option<String>,
    pub analysis: Option<String>,
    /// Every candidate produced so far, oldest first (`draft-1`, `draft-2`, ...).
    pub drafts: Vec<String>,
    pub review_rounds: u32,
    pub final_artifact: Option<String>,
}

impl PipelineState {
    pub fn new(task: TaskKind, job_description: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            task,
            job_description: job_description.to_string(),
            position: None,
            organization: None,
            analysis: None,
            drafts: Vec::new(),
            review_rounds: 0,
            final_artifact: None,
        }
    }

    pub fn with_role(mut self, position: Option<&str>, organization: Option<&str>) -> Self {
        self.position = position.map(str::to_string).filter(|s| !s.trim().is_empty());
        self.organization = organization
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty());
        self
    }

    pub fn record_analysis(&mut self, text: &str) {
        self.analysis = Some(text.to_string());
    }

    pub fn record_draft(&mut self, text: &str) {
        self.drafts.push(text.to_string());
    }

    pub fn draft_label(&self) -> String {
        format!("draft-{}", self.drafts.len())
    }

    /// "Senior Engineer at Acme", "Senior Engineer", "Acme", or "the target role".
    pub fn role_label(&self) -> String {
        match (&self.position, &self.organization) {
            (Some(p), Some(o)) => format!("{p} at {o}"),
            (Some(p), None) => p.clone(),
            (None, Some(o)) => o.clone(),
            (None, None) => "the target role".to_string(),
        }
    }
}
