//! Reviewer reply protocol.
//!
//! A reviewer answers either `APPROVED` or a `CRITIQUE: <reason>` line followed by the
//! full corrected candidate. Anything else is malformed and the caller keeps the
//! candidate it already has.

use thiserror::Error;

use crate::llm_client::strip_json_fences;

const APPROVED: &str = "APPROVED";
const CRITIQUE: &str = "CRITIQUE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    Critique { reason: String, corrected: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReview {
    #[error("reviewer reply was empty")]
    Empty,

    #[error("critique carried no corrected candidate")]
    MissingCorrection,

    #[error("unrecognized reviewer reply: {0}")]
    Unrecognized(String),
}

/// Strips the markdown emphasis models like to wrap keywords in.
fn unwrap_emphasis(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '*' || c == '_' || c == '`').trim()
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        Some(&line[keyword.len()..])
    } else {
        None
    }
}

/// Parses a reviewer reply.
///
/// Keywords match case-insensitively. `APPROVED` may carry trailing punctuation and
/// commentary on later lines. A critique's reason is the rest of its first line and
/// the correction is everything after it, with code fences removed.
pub fn parse_review(reply: &str) -> Result<ReviewVerdict, MalformedReview> {
    let reply = strip_json_fences(reply);
    if reply.is_empty() {
        return Err(MalformedReview::Empty);
    }

    let (first_line, rest) = reply.split_once('\n').unwrap_or((reply, ""));
    let first_line = unwrap_emphasis(first_line);

    if let Some(tail) = strip_keyword(first_line, APPROVED) {
        if tail.chars().all(|c| !c.is_alphanumeric()) {
            return Ok(ReviewVerdict::Approved);
        }
    }

    if let Some(tail) = strip_keyword(first_line, CRITIQUE) {
        let tail = tail.trim_start().trim_start_matches(['*', '_']);
        if let Some(reason) = tail.strip_prefix(':') {
            let reason = unwrap_emphasis(reason).to_string();
            let corrected = strip_json_fences(rest).to_string();
            if corrected.is_empty() {
                return Err(MalformedReview::MissingCorrection);
            }
            return Ok(ReviewVerdict::Critique { reason, corrected });
        }
    }

    Err(MalformedReview::Unrecognized(
        first_line.chars().take(80).collect(),
    ))
}
