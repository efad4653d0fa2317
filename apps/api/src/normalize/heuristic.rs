//! Keyword / line-pattern parser used when AI extraction is unavailable.
//! Trades precision for availability: it always returns something.

use serde_json::json;

use crate::normalize::extraction::normalize_extraction;
use crate::normalize::text::dedup_preserving_order;
use crate::normalize::{CanonicalCandidateFields, MAX_SKILLS};

const MAX_HEURISTIC_PROJECTS: usize = 20;

/// A line mentioning any of these is mined for skill tokens.
const TECH_KEYWORDS: &[&str] = &[
    "react",
    "next",
    "node",
    "python",
    "java",
    "mongodb",
    "flask",
    "django",
    "aws",
    "gcp",
    "azure",
    "docker",
    "kubernetes",
    "typescript",
];

const EXPERIENCE_MARKERS: &[&str] = &["company", "experience", "worked at", "at "];

const TOKEN_DECORATION: &[char] = &['•', '-', ' '];

/// Derives canonical candidate fields straight from raw resume text.
pub fn heuristic_parse(raw_text: &str) -> CanonicalCandidateFields {
    let mut skills = Vec::new();
    let mut projects = Vec::new();
    let mut previous = Vec::new();

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();

        if TECH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            skills.extend(skill_tokens(line));
        }

        if lower.starts_with("project") || lower.contains("project:") {
            let description = strip_project_label(line);
            if !description.is_empty() {
                projects.push(description.to_string());
            }
        }

        if EXPERIENCE_MARKERS.iter().any(|m| lower.contains(m)) {
            previous.push(json!({ "company": null, "title": line, "duration": null }));
        }
    }

    let mut skills = dedup_preserving_order(skills);
    skills.truncate(MAX_SKILLS);
    let mut projects = dedup_preserving_order(projects);
    projects.truncate(MAX_HEURISTIC_PROJECTS);

    normalize_extraction(&json!({
        "skills": skills,
        "projects": projects,
        "previous_experience": previous,
        "role": null,
        "availability": null,
    }))
}

/// Splits a line on whitespace and commas and keeps plausibly sized tokens.
fn skill_tokens(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim_matches(TOKEN_DECORATION).trim())
        .filter(|token| {
            let len = token.chars().count();
            len > 1 && len < 30
        })
        .map(String::from)
}

/// Removes a leading `project` / `project:` label, case-insensitively.
fn strip_project_label(line: &str) -> &str {
    const LABEL: &str = "project";
    match line.get(..LABEL.len()) {
        Some(head) if head.eq_ignore_ascii_case(LABEL) => {
            let rest = line[LABEL.len()..].trim_start();
            rest.strip_prefix(':').unwrap_or(rest).trim()
        }
        _ => line.trim(),
    }
}
