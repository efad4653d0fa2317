use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::models::candidate::PreviousExperience;
use crate::normalize::text::{dedup_preserving_order, scalar_to_trimmed};
use crate::normalize::{
    CanonicalCandidateFields, MAX_PREVIOUS_EXPERIENCE, MAX_PROJECTS, MAX_PROJECTS_PER_SKILL,
    MAX_SKILLS,
};

/// Bucket for flat project lines that mention none of the candidate's skills.
pub const UNATTRIBUTED_BUCKET: &str = "Projects";

/// Maps a loosely structured extraction result onto the canonical schema.
///
/// Accepted keys: `skills`, `projects_by_skill`, `projects`,
/// `previous_experience` (or legacy `experience`), `role`, `availability`.
/// A field of the wrong shape is treated as absent.
pub fn normalize_extraction(raw: &Value) -> CanonicalCandidateFields {
    let empty = Map::new();
    let raw = raw.as_object().unwrap_or(&empty);

    let mut skills = dedup_preserving_order(string_list(raw.get("skills")));
    let flat_projects = raw.get("projects").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(scalar_to_trimmed)
            .collect::<Vec<_>>()
    });

    let mut by_skill = explicit_projects_by_skill(raw.get("projects_by_skill"));
    if by_skill.is_empty() && !skills.is_empty() {
        if let Some(flat) = &flat_projects {
            by_skill = bucket_projects_by_skill(&skills, flat);
        }
    }

    let projects_by_skill: IndexMap<String, Vec<String>> = by_skill
        .into_iter()
        .map(|(skill, projects)| {
            let mut projects = dedup_preserving_order(projects);
            projects.truncate(MAX_PROJECTS_PER_SKILL);
            (skill, projects)
        })
        .filter(|(_, projects)| !projects.is_empty())
        .collect();

    let flattened: Vec<String> = if !projects_by_skill.is_empty() {
        projects_by_skill
            .iter()
            .flat_map(|(skill, projects)| projects.iter().map(move |p| format!("{skill} — {p}")))
            .collect()
    } else {
        flat_projects.unwrap_or_default()
    };

    skills.truncate(MAX_SKILLS);

    let mut projects = dedup_preserving_order(flattened);
    projects.truncate(MAX_PROJECTS);

    let mut previous_experience = dedup_preserving_order(previous_experience(raw));
    previous_experience.truncate(MAX_PREVIOUS_EXPERIENCE);

    CanonicalCandidateFields {
        skills,
        projects_by_skill,
        projects,
        previous_experience,
        role: optional_string(raw.get("role")),
        availability: optional_string(raw.get("availability")),
    }
}

/// Only list-typed input counts; anything else is an empty list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_to_trimmed).collect())
        .unwrap_or_default()
}

fn explicit_projects_by_skill(value: Option<&Value>) -> IndexMap<String, Vec<String>> {
    let Some(map) = value.and_then(Value::as_object) else {
        return IndexMap::new();
    };

    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, projects) in map {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let projects: Vec<String> = match projects {
            Value::Array(items) => items.iter().filter_map(scalar_to_trimmed).collect(),
            Value::String(_) => scalar_to_trimmed(projects).into_iter().collect(),
            _ => Vec::new(),
        };
        if !projects.is_empty() {
            out.entry(key.to_string()).or_default().extend(projects);
        }
    }
    out
}

/// Attributes flat project lines to skills by case-insensitive containment.
/// A line that mentions several skills lands in every one of their buckets.
fn bucket_projects_by_skill(
    skills: &[String],
    projects: &[String],
) -> IndexMap<String, Vec<String>> {
    let mut buckets: IndexMap<String, Vec<String>> =
        skills.iter().map(|s| (s.clone(), Vec::new())).collect();
    let lowered_skills: Vec<(String, String)> = skills
        .iter()
        .map(|s| (s.clone(), s.to_lowercase()))
        .collect();

    for project in projects {
        let lowered = project.to_lowercase();
        let mut matched = false;
        for (skill, skill_lower) in &lowered_skills {
            if lowered.contains(skill_lower.as_str()) {
                if let Some(bucket) = buckets.get_mut(skill) {
                    bucket.push(project.clone());
                }
                matched = true;
            }
        }
        if !matched {
            buckets
                .entry(UNATTRIBUTED_BUCKET.to_string())
                .or_default()
                .push(project.clone());
        }
    }

    buckets
}

fn previous_experience(raw: &Map<String, Value>) -> Vec<PreviousExperience> {
    if let Some(items) = raw.get("previous_experience").and_then(Value::as_array) {
        return items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| PreviousExperience {
                company: item.get("company").and_then(scalar_to_trimmed),
                title: item.get("title").and_then(scalar_to_trimmed),
                duration: item.get("duration").and_then(scalar_to_trimmed),
            })
            .filter(|entry| entry.company.is_some() || entry.title.is_some())
            .collect();
    }

    raw.get("experience")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|item| {
                    let title = item.get("title").and_then(scalar_to_trimmed)?;
                    Some(PreviousExperience {
                        company: None,
                        title: Some(title),
                        duration: item.get("duration").and_then(scalar_to_trimmed),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
