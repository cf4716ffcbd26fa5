//! Critique/revise loop shared by every reviewed task.
//!
//! REVIEW → APPROVED ends the loop. REVIEW → CRITIQUE replaces the candidate with the
//! reviewer's correction and reviews again. Running out of rounds returns the last
//! candidate. A reply that does not follow the protocol, or a correction that does not
//! decode, keeps the prior candidate. Only provider errors escape.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::agents::review::{parse_review, ReviewVerdict};
use crate::agents::runner::{Stage, StageRunner};
use crate::agents::RoleAgent;
use crate::llm_client::{strip_json_fences, LlmError};
use crate::models::resume::{RankedAchievements, SkillsOrder};
use crate::pipeline::state::PipelineState;

/// A candidate the reviewer sees as text and may hand back corrected.
pub trait Artifact: Sized {
    fn encode(&self) -> String;
    fn decode(text: &str) -> Option<Self>;
}

impl Artifact for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(text: &str) -> Option<Self> {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn decode_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(strip_json_fences(text)).ok()
}

impl Artifact for RankedAchievements {
    fn encode(&self) -> String {
        encode_json(self)
    }

    fn decode(text: &str) -> Option<Self> {
        decode_json(text)
    }
}

impl Artifact for SkillsOrder {
    fn encode(&self) -> String {
        encode_json(self)
    }

    fn decode(text: &str) -> Option<Self> {
        decode_json(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Approved { rounds: u32 },
    Exhausted { rounds: u32 },
    FailedOpen { rounds: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reviewed<T> {
    pub artifact: T,
    pub outcome: ReviewOutcome,
}

/// Reviews `candidate` until approval or until the task's review budget runs out.
///
/// `build_prompt` receives the encoded candidate for each round. Accepted
/// corrections are appended to the state's draft history.
pub async fn review_until_approved<T, F>(
    runner: &StageRunner<'_>,
    state: &mut PipelineState,
    reviewer: &RoleAgent,
    candidate: T,
    status: &str,
    build_prompt: F,
) -> Result<Reviewed<T>, LlmError>
where
    T: Artifact,
    F: Fn(&str) -> String,
{
    let task = state.task.as_str();
    let budget = state.task.review_budget();
    let mut candidate = candidate;

    for round in 1..=budget {
        let prompt = build_prompt(&candidate.encode());
        let turn = runner
            .run(
                state,
                Stage::Review,
                &format!("{status} (round {round} of {budget})..."),
                reviewer,
                &prompt,
            )
            .await?;

        match parse_review(&turn.text) {
            Ok(ReviewVerdict::Approved) => {
                info!("[{task}] Candidate approved in round {round}");
                return Ok(Reviewed {
                    artifact: candidate,
                    outcome: ReviewOutcome::Approved { rounds: round },
                });
            }
            Ok(ReviewVerdict::Critique { reason, corrected }) => match T::decode(&corrected) {
                Some(next) => {
                    state.record_draft(&next.encode());
                    info!(
                        "[{task}] Round {round} critique: {reason}; revised as {}",
                        state.draft_label()
                    );
                    candidate = next;
                }
                None => {
                    warn!(
                        "[{task}] Round {round} correction could not be decoded ({reason}); \
                         keeping previous candidate"
                    );
                    return Ok(Reviewed {
                        artifact: candidate,
                        outcome: ReviewOutcome::FailedOpen { rounds: round },
                    });
                }
            },
            Err(e) => {
                warn!("[{task}] Malformed review in round {round}: {e}; keeping previous candidate");
                return Ok(Reviewed {
                    artifact: candidate,
                    outcome: ReviewOutcome::FailedOpen { rounds: round },
                });
            }
        }
    }

    warn!("[{task}] Review budget of {budget} rounds exhausted; returning last candidate");
    Ok(Reviewed {
        artifact: candidate,
        outcome: ReviewOutcome::Exhausted { rounds: budget },
    })
}
