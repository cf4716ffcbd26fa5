//! Cover letter generation: WRITE → REVIEW.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{AgentConfig, ChatModel, LlmError};
use crate::pipeline::critique::review_until_approved;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts;
use crate::pipeline::state::PipelineState;
use crate::pipeline::{model_for, require_text, rewrite_issue, TaskKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub job_description: String,
    /// The candidate's resume as plain text.
    pub resume: String,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Template slots such as "[Company Name]" or "[Your Name]".
fn placeholders(letter: &str) -> Vec<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\[[A-Z][A-Za-z' ]{1,40}\]").expect("valid placeholder regex")
    });
    re.find_iter(letter).map(|m| m.as_str().to_string()).collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub async fn run_with_config(
    config: &AgentConfig,
    request: &CoverLetterRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    run(model_for(config), request, progress).await
}

pub async fn run(
    model: Arc<dyn ChatModel>,
    request: &CoverLetterRequest,
    progress: &dyn ProgressSink,
) -> Result<String, LlmError> {
    let mut state = PipelineState::new(TaskKind::CoverLetter, &request.job_description)
        .with_role(request.position.as_deref(), request.organization.as_deref());
    let runner = StageRunner::new(progress);

    let writer = RoleAgent::new(
        "cover-letter-writer",
        prompts::cover_letter_writer_system(),
        model.clone(),
    );
    let reviewer = RoleAgent::new(
        "cover-letter-reviewer",
        prompts::cover_letter_reviewer_system(),
        model,
    );

    let name = request
        .candidate_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("(not given)");
    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("(none)");
    let prompt = prompts::cover_letter_prompt(
        &state.role_label(),
        &request.job_description,
        &request.resume,
        name,
        notes,
    );
    let turn = runner
        .run(&mut state, Stage::Draft, "Writing cover letter...", &writer, &prompt)
        .await?;
    let draft = require_text(turn.text)?;

    let reviewed = review_until_approved(
        &runner,
        &mut state,
        &reviewer,
        draft,
        "Reviewing cover letter",
        |candidate| {
            prompts::cover_letter_review_prompt(&request.job_description, &request.resume, candidate)
        },
    )
    .await?;
    let letter = reviewed.artifact;

    let slots = placeholders(&letter);
    if !slots.is_empty() {
        warn!("[cover-letter] Final letter has placeholders: {}", slots.join(", "));
    }
    if let Some(issue) = rewrite_issue(TaskKind::CoverLetter, "", &letter) {
        warn!("[cover-letter] {issue}");
    }
    let words = word_count(&letter);
    if !(200..=450).contains(&words) {
        warn!("[cover-letter] Final letter is {words} words");
    }

    runner.finish(&mut state, letter.clone());
    Ok(letter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingProgress, ScriptedModel};

    fn request() -> CoverLetterRequest {
        CoverLetterRequest {
            job_description: "Acme is hiring a platform engineer to scale our Rust services."
                .to_string(),
            resume: "Ada Lovelace. Platform engineer, 6 years, Rust and Kubernetes.".to_string(),
            candidate_name: Some("Ada Lovelace".to_string()),
            notes: None,
            position: Some("Platform Engineer".to_string()),
            organization: Some("Acme".to_string()),
        }
    }

    #[tokio::test]
    async fn test_write_then_review() {
        let model = ScriptedModel::texts(&[
            "Dear Acme hiring team,\n\nI build Rust platforms.\n\nAda Lovelace",
            "APPROVED",
        ]);
        let progress = CollectingProgress::default();
        let letter = run(model.clone(), &request(), &progress).await.unwrap();
        assert!(letter.starts_with("Dear Acme hiring team"));

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt().contains("TARGET ROLE: Platform Engineer at Acme"));
        assert!(calls[0].prompt().contains("CANDIDATE NAME: Ada Lovelace"));
        assert!(calls[0].prompt().contains("(none)"));
        assert!(calls[1].system.contains("APPROVED"));

        let contents: Vec<String> = progress.events().into_iter().map(|e| e.content).collect();
        assert_eq!(contents[0], "Writing cover letter...");
        assert_eq!(contents[1], "Reviewing cover letter (round 1 of 2)...");
    }

    #[tokio::test]
    async fn test_multiline_correction_replaces_letter() {
        let model = ScriptedModel::texts(&[
            "Dear [Hiring Manager],\n\nI am great.",
            "CRITIQUE: Placeholder left in greeting\nDear Acme team,\n\nI build Rust platforms.",
            "APPROVED",
        ]);
        let letter = run(model, &request(), &CollectingProgress::default())
            .await
            .unwrap();
        assert_eq!(letter, "Dear Acme team,\n\nI build Rust platforms.");
    }

    #[test]
    fn test_placeholder_detection() {
        assert_eq!(
            placeholders("Dear [Hiring Manager], I love [Company Name]."),
            vec!["[Hiring Manager]", "[Company Name]"]
        );
        assert!(placeholders("I cut costs [by 40%] at [0].").is_empty());
    }
}
