// Shared prompt fragments used by several role agents.
// Each task keeps its own prompts in pipeline/prompts.rs; only cross-cutting
// instructions live here.

/// Instruction appended to every role that must answer with JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every writer role.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY facts present in the candidate's original content. \
    Do NOT invent employers, metrics, technologies, certifications or dates. \
    Mirror the job description's vocabulary only where the original content supports it.";

/// Reply protocol every reviewer/editor role must follow. Parsed by `agents::review`.
pub const REVIEW_PROTOCOL: &str = "\
REPLY FORMAT (strict):\n\
- If the candidate is acceptable, reply with exactly: APPROVED\n\
- Otherwise reply with a first line `CRITIQUE: <one-sentence reason>` and, starting on the \
next line, the complete corrected candidate in the same format as the input candidate \
(plain text for text candidates, raw JSON for JSON candidates).\n\
Never reply with anything else. Never return a partial correction.";
