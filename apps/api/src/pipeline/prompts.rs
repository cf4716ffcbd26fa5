// Role instructions and stage prompt templates for every tailoring task.
// Cross-cutting fragments (JSON-only, no-fabrication, review protocol) come from
// llm_client::prompts. Templates are filled with `.replace("{placeholder}", ..)`
// inside pure builder functions; nothing here is mutated at runtime.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION, REVIEW_PROTOCOL};

fn with_fragments(role: &str, fragments: &[&str]) -> String {
    let mut prompt = role.to_string();
    for fragment in fragments {
        prompt.push_str("\n\n");
        prompt.push_str(fragment.trim());
    }
    prompt
}

fn reviewer(role: &str) -> String {
    with_fragments(role, &[REVIEW_PROTOCOL])
}

// ────────────────────────────────────────────────────────────────────────────
// Shared analyst
// ────────────────────────────────────────────────────────────────────────────

pub const JD_ANALYST_SYSTEM: &str = "You are a senior technical recruiter. \
    Read a job description and summarize what the hiring team actually needs: \
    seniority, core responsibilities, must-have skills, nice-to-have skills, domain, \
    and the vocabulary the posting uses for them. \
    Respond with concise plain-text notes (bullet points are fine). Do not write resume content.";

/// Replace: {role}, {jd}, {focus}
const ANALYSIS_TEMPLATE: &str = r#"TARGET ROLE: {role}

JOB DESCRIPTION:
{jd}

{focus}"#;

pub fn analysis_prompt(role: &str, jd: &str, focus: &str) -> String {
    ANALYSIS_TEMPLATE
        .replace("{role}", role)
        .replace("{jd}", jd.trim())
        .replace("{focus}", focus)
}

// ────────────────────────────────────────────────────────────────────────────
// Job title
// ────────────────────────────────────────────────────────────────────────────

pub const JOB_TITLE_ANALYSIS_FOCUS: &str = "Focus on how the employer titles this role, \
    its seniority level, and the title conventions used in the posting.";

const JOB_TITLE_WRITER_ROLE: &str = "You write the headline job title on a resume. \
    The title must truthfully describe the candidate's current role while using the \
    employer's terminology where it fits. Never raise the candidate's seniority. \
    Keep it to at most 8 words. \
    Reply with the title only: no quotes, no trailing punctuation, no explanation.";

const JOB_TITLE_REVIEWER_ROLE: &str = "You review a proposed resume headline job title. \
    Check that it is truthful to the candidate's current title and seniority, uses the \
    job description's vocabulary where justified, has at most 8 words, and contains \
    nothing but the title.";

pub fn job_title_writer_system() -> String {
    with_fragments(JOB_TITLE_WRITER_ROLE, &[NO_FABRICATION_INSTRUCTION])
}

pub fn job_title_reviewer_system() -> String {
    reviewer(JOB_TITLE_REVIEWER_ROLE)
}

/// Replace: {analysis}, {current}
const JOB_TITLE_DRAFT_TEMPLATE: &str = r#"ANALYSIS OF THE TARGET ROLE:
{analysis}

CANDIDATE'S CURRENT TITLE:
{current}

Write the tailored job title."#;

pub fn job_title_draft_prompt(analysis: &str, current: &str) -> String {
    JOB_TITLE_DRAFT_TEMPLATE
        .replace("{analysis}", analysis)
        .replace("{current}", current.trim())
}

/// Replace: {jd}, {current}, {candidate}
const JOB_TITLE_REVIEW_TEMPLATE: &str = r#"JOB DESCRIPTION:
{jd}

CANDIDATE'S CURRENT TITLE:
{current}

PROPOSED TITLE:
{candidate}"#;

pub fn job_title_review_prompt(jd: &str, current: &str, candidate: &str) -> String {
    JOB_TITLE_REVIEW_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{current}", current.trim())
        .replace("{candidate}", candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

pub const SUMMARY_ANALYSIS_FOCUS: &str = "Focus on the three to five requirements a \
    professional summary must speak to, and which of them the candidate's listed skills cover.";

const SUMMARY_WRITER_ROLE: &str = "You write the professional summary at the top of a resume. \
    Write 2 to 4 sentences (roughly 300 to 600 characters) in first person without pronouns. \
    Lead with the candidate's strongest match for the role. \
    Mention only technologies from the candidate's skill list. \
    Reply with the summary text only.";

const SUMMARY_REVIEWER_ROLE: &str = "You review a tailored resume summary. \
    Call check_skill_whitelist on the candidate first: every technology it reports must be \
    removed or replaced with a listed skill. Also check that the summary keeps the facts of \
    the original, speaks to the job's core requirements, and is 2 to 4 sentences.";

pub fn summary_writer_system() -> String {
    with_fragments(SUMMARY_WRITER_ROLE, &[NO_FABRICATION_INSTRUCTION])
}

pub fn summary_reviewer_system() -> String {
    reviewer(SUMMARY_REVIEWER_ROLE)
}

/// Replace: {analysis}, {current}, {skills}
const SUMMARY_DRAFT_TEMPLATE: &str = r#"ANALYSIS OF THE TARGET ROLE:
{analysis}

CANDIDATE'S CURRENT SUMMARY:
{current}

CANDIDATE'S SKILLS (the only technologies you may name):
{skills}

Write the tailored summary."#;

pub fn summary_draft_prompt(analysis: &str, current: &str, skills: &str) -> String {
    SUMMARY_DRAFT_TEMPLATE
        .replace("{analysis}", analysis)
        .replace("{current}", current.trim())
        .replace("{skills}", skills)
}

/// Replace: {jd}, {current}, {skills}, {candidate}
const SUMMARY_REVIEW_TEMPLATE: &str = r#"JOB DESCRIPTION:
{jd}

ORIGINAL SUMMARY:
{current}

CANDIDATE'S SKILLS:
{skills}

PROPOSED SUMMARY:
{candidate}"#;

pub fn summary_review_prompt(jd: &str, current: &str, skills: &str, candidate: &str) -> String {
    SUMMARY_REVIEW_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{current}", current.trim())
        .replace("{skills}", skills)
        .replace("{candidate}", candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Achievement sorting
// ────────────────────────────────────────────────────────────────────────────

pub const ACHIEVEMENT_ANALYSIS_FOCUS: &str = "Focus on which outcomes and skills the hiring \
    team will value most, in priority order.";

/// Replace: {count}, {max_index}
const ACHIEVEMENT_SORTER_ROLE: &str = r#"You order resume achievements by relevance to a job.
Return a JSON object of the form {"rankedIndices": [..]} listing the zero-based index of
every achievement, most relevant first. There are {count} achievements, so the array must
contain each integer from 0 to {max_index} exactly once."#;

/// Replace: {count}, {max_index}
const ACHIEVEMENT_REVIEWER_ROLE: &str = r#"You review an achievement ranking of the form {"rankedIndices": [..]}.
Call validate_ranking on the candidate first. The array must contain each integer from 0 to
{max_index} exactly once ({count} entries). Then check that the most job-relevant achievements
come first. A correction must be the complete JSON object."#;

pub fn achievement_sorter_system(count: usize) -> String {
    let role = ACHIEVEMENT_SORTER_ROLE
        .replace("{count}", &count.to_string())
        .replace("{max_index}", &count.saturating_sub(1).to_string());
    with_fragments(&role, &[JSON_ONLY_INSTRUCTION])
}

pub fn achievement_reviewer_system(count: usize) -> String {
    let role = ACHIEVEMENT_REVIEWER_ROLE
        .replace("{count}", &count.to_string())
        .replace("{max_index}", &count.saturating_sub(1).to_string());
    reviewer(&role)
}

/// Replace: {analysis}, {achievements}
const ACHIEVEMENT_DRAFT_TEMPLATE: &str = r#"ANALYSIS OF THE TARGET ROLE:
{analysis}

ACHIEVEMENTS:
{achievements}

Rank the achievements."#;

pub fn achievement_draft_prompt(analysis: &str, achievements: &str) -> String {
    ACHIEVEMENT_DRAFT_TEMPLATE
        .replace("{analysis}", analysis)
        .replace("{achievements}", achievements)
}

/// Replace: {jd}, {achievements}, {candidate}
const ACHIEVEMENT_REVIEW_TEMPLATE: &str = r#"JOB DESCRIPTION:
{jd}

ACHIEVEMENTS:
{achievements}

PROPOSED RANKING:
{candidate}"#;

pub fn achievement_review_prompt(jd: &str, achievements: &str, candidate: &str) -> String {
    ACHIEVEMENT_REVIEW_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{achievements}", achievements)
        .replace("{candidate}", candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Skills sorting
// ────────────────────────────────────────────────────────────────────────────

pub const SKILLS_BRAIN_SYSTEM: &str = "You are a career strategist deciding how to order a \
    resume's skills section for a specific job. Reason in plain text: which skill groups \
    matter most for the role, and within each group which skills should come first. \
    Never drop, rename, or add groups or skills.";

/// Replace: {count}
const SKILLS_SCRIBE_ROLE: &str = r#"You convert a skills-ordering plan into JSON.
Return {"groupOrder": [group names], "skillOrder": {group name: [skills]}}.
There are {count} groups. Every group must appear in groupOrder and as a key of skillOrder,
and every skill must appear under its own group. Use names exactly as given.
Call validate_json on your answer before returning it."#;

/// Replace: {count}
const SKILLS_EDITOR_ROLE: &str = r#"You edit a skills ordering JSON of the form
{"groupOrder": [..], "skillOrder": {group: [..]}}.
Call validate_skills_sort on the candidate first. It must list all {count} groups, keep every
skill under its own group with its exact name, and put the most job-relevant groups and skills
first. A correction must be the complete JSON object."#;

pub fn skills_scribe_system(group_count: usize) -> String {
    let role = SKILLS_SCRIBE_ROLE.replace("{count}", &group_count.to_string());
    with_fragments(&role, &[JSON_ONLY_INSTRUCTION])
}

pub fn skills_editor_system(group_count: usize) -> String {
    reviewer(&SKILLS_EDITOR_ROLE.replace("{count}", &group_count.to_string()))
}

/// Replace: {role}, {jd}, {groups}
const SKILLS_BRAIN_TEMPLATE: &str = r#"TARGET ROLE: {role}

JOB DESCRIPTION:
{jd}

SKILL GROUPS:
{groups}

Explain the ideal ordering."#;

pub fn skills_brain_prompt(role: &str, jd: &str, groups: &str) -> String {
    SKILLS_BRAIN_TEMPLATE
        .replace("{role}", role)
        .replace("{jd}", jd.trim())
        .replace("{groups}", groups)
}

/// Replace: {plan}, {groups}
const SKILLS_SCRIBE_TEMPLATE: &str = r#"ORDERING PLAN:
{plan}

SKILL GROUPS:
{groups}

Write the ordering JSON."#;

pub fn skills_scribe_prompt(plan: &str, groups: &str) -> String {
    SKILLS_SCRIBE_TEMPLATE
        .replace("{plan}", plan)
        .replace("{groups}", groups)
}

/// Replace: {jd}, {groups}, {candidate}
const SKILLS_EDIT_TEMPLATE: &str = r#"JOB DESCRIPTION:
{jd}

ORIGINAL SKILL GROUPS:
{groups}

PROPOSED ORDERING:
{candidate}"#;

pub fn skills_edit_prompt(jd: &str, groups: &str, candidate: &str) -> String {
    SKILLS_EDIT_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{groups}", groups)
        .replace("{candidate}", candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Experience tailoring
// ────────────────────────────────────────────────────────────────────────────

pub const EXPERIENCE_ANALYST_SYSTEM: &str = "You extract the keywords a resume experience \
    entry should emphasize for a job: technologies, responsibilities, and domain phrases, \
    most important first. Call record_keywords exactly once with the list, then reply \
    with a one-line confirmation.";

const DESCRIPTION_WRITER_ROLE: &str = "You rewrite the description of one resume experience \
    entry so it speaks to the target job. Keep every fact; reorder and reword to emphasize \
    the keywords the entry genuinely supports. The rewrite must differ from the original and \
    be at least 50 characters. Call validate_description before answering. \
    Reply with the rewritten description only.";

const ACHIEVEMENTS_WRITER_ROLE: &str = r#"You rewrite the achievement bullets of one resume experience entry for a target job.
Rewrite each bullet in place: same count, same order, one rewrite per original, each at
least 10 characters. Keep every number and fact. Call validate_achievements before answering.
Reply with a JSON array of strings."#;

const TECH_STACK_WRITER_ROLE: &str = r#"You align the tech stack of one resume experience entry with a target job.
Reorder the original technologies so the most relevant come first. You may use the name the
job description uses for a technology the candidate listed, but never add a technology that is
not in the original list, and never return more than twice as many items.
Call validate_tech_stack before answering. Reply with a JSON array of strings."#;

pub fn description_writer_system() -> String {
    with_fragments(DESCRIPTION_WRITER_ROLE, &[NO_FABRICATION_INSTRUCTION])
}

pub fn achievements_writer_system() -> String {
    with_fragments(
        ACHIEVEMENTS_WRITER_ROLE,
        &[NO_FABRICATION_INSTRUCTION, JSON_ONLY_INSTRUCTION],
    )
}

pub fn tech_stack_writer_system() -> String {
    with_fragments(TECH_STACK_WRITER_ROLE, &[JSON_ONLY_INSTRUCTION])
}

/// Replace: {role}, {jd}, {entry}
const KEYWORDS_TEMPLATE: &str = r#"TARGET ROLE: {role}

JOB DESCRIPTION:
{jd}

EXPERIENCE ENTRY:
{entry}"#;

pub fn keywords_prompt(role: &str, jd: &str, entry: &str) -> String {
    KEYWORDS_TEMPLATE
        .replace("{role}", role)
        .replace("{jd}", jd.trim())
        .replace("{entry}", entry)
}

/// Replace: {keywords}, {original}
const DESCRIPTION_TEMPLATE: &str = r#"KEYWORDS TO EMPHASIZE:
{keywords}

ORIGINAL DESCRIPTION:
{original}

Rewrite the description."#;

pub fn description_prompt(keywords: &str, original: &str) -> String {
    DESCRIPTION_TEMPLATE
        .replace("{keywords}", keywords)
        .replace("{original}", original.trim())
}

/// Replace: {keywords}, {count}, {original}
const ACHIEVEMENTS_TEMPLATE: &str = r#"KEYWORDS TO EMPHASIZE:
{keywords}

ORIGINAL ACHIEVEMENTS ({count}):
{original}

Rewrite the achievements as a JSON array of exactly {count} strings."#;

pub fn achievements_prompt(keywords: &str, count: usize, original: &str) -> String {
    ACHIEVEMENTS_TEMPLATE
        .replace("{keywords}", keywords)
        .replace("{count}", &count.to_string())
        .replace("{original}", original)
}

/// Replace: {keywords}, {original}
const TECH_STACK_TEMPLATE: &str = r#"KEYWORDS TO EMPHASIZE:
{keywords}

ORIGINAL TECH STACK:
{original}

Return the aligned tech stack."#;

pub fn tech_stack_prompt(keywords: &str, original: &str) -> String {
    TECH_STACK_TEMPLATE
        .replace("{keywords}", keywords)
        .replace("{original}", original)
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

const COVER_LETTER_WRITER_ROLE: &str = "You write cover letters. \
    Write 3 to 4 short paragraphs (250 to 400 words) addressed to the hiring team for the \
    target role. Connect the candidate's real experience to the job's core needs, end with a \
    brief call to action, and sign with the candidate's name when it is given. \
    Never leave placeholders such as [Company]. Reply with the letter text only.";

const COVER_LETTER_REVIEWER_ROLE: &str = "You review a cover letter. \
    Check that every claim is supported by the candidate's resume notes, that it addresses \
    the job's core needs, that it has no placeholders or generic filler, and that it is \
    250 to 400 words.";

pub fn cover_letter_writer_system() -> String {
    with_fragments(COVER_LETTER_WRITER_ROLE, &[NO_FABRICATION_INSTRUCTION])
}

pub fn cover_letter_reviewer_system() -> String {
    reviewer(COVER_LETTER_REVIEWER_ROLE)
}

/// Replace: {role}, {jd}, {resume}, {name}, {notes}
const COVER_LETTER_TEMPLATE: &str = r#"TARGET ROLE: {role}

JOB DESCRIPTION:
{jd}

CANDIDATE'S RESUME:
{resume}

CANDIDATE NAME: {name}

ADDITIONAL NOTES FROM THE CANDIDATE:
{notes}

Write the cover letter."#;

pub fn cover_letter_prompt(role: &str, jd: &str, resume: &str, name: &str, notes: &str) -> String {
    COVER_LETTER_TEMPLATE
        .replace("{role}", role)
        .replace("{jd}", jd.trim())
        .replace("{resume}", resume.trim())
        .replace("{name}", name)
        .replace("{notes}", notes)
}

/// Replace: {jd}, {resume}, {candidate}
const COVER_LETTER_REVIEW_TEMPLATE: &str = r#"JOB DESCRIPTION:
{jd}

CANDIDATE'S RESUME:
{resume}

PROPOSED COVER LETTER:
{candidate}"#;

pub fn cover_letter_review_prompt(jd: &str, resume: &str, candidate: &str) -> String {
    COVER_LETTER_REVIEW_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{resume}", resume.trim())
        .replace("{candidate}", candidate)
}

// ────────────────────────────────────────────────────────────────────────────
// Job description refinement
// ────────────────────────────────────────────────────────────────────────────

/// Replace: {sections}
const JD_REFINER_ROLE: &str = r#"You restructure raw job postings into clean markdown.
Use exactly these level-two headings, in this order:
{sections}
Put each requirement or responsibility on its own "- " bullet. Drop boilerplate such as
benefits, legal notices, and application instructions. Never invent requirements that the
posting does not state. Reply with the markdown only."#;

/// Replace: {sections}
const JD_REVIEWER_ROLE: &str = r#"You review a restructured job description.
Call check_markdown_sections on the candidate first; every one of these sections must be
present and non-empty:
{sections}
Then check that nothing was invented and no real requirement from the original posting was lost."#;

fn heading_list(sections: &[&str]) -> String {
    sections
        .iter()
        .map(|s| format!("## {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn jd_refiner_system(sections: &[&str]) -> String {
    JD_REFINER_ROLE.replace("{sections}", &heading_list(sections))
}

pub fn jd_reviewer_system(sections: &[&str]) -> String {
    reviewer(&JD_REVIEWER_ROLE.replace("{sections}", &heading_list(sections)))
}

/// Replace: {role}, {jd}
const JD_REFINE_TEMPLATE: &str = r#"TARGET ROLE: {role}

RAW JOB POSTING:
{jd}

Restructure the posting."#;

pub fn jd_refine_prompt(role: &str, jd: &str) -> String {
    JD_REFINE_TEMPLATE
        .replace("{role}", role)
        .replace("{jd}", jd.trim())
}

/// Replace: {jd}, {candidate}
const JD_REVIEW_TEMPLATE: &str = r#"ORIGINAL POSTING:
{jd}

PROPOSED MARKDOWN:
{candidate}"#;

pub fn jd_review_prompt(jd: &str, candidate: &str) -> String {
    JD_REVIEW_TEMPLATE
        .replace("{jd}", jd.trim())
        .replace("{candidate}", candidate)
}
