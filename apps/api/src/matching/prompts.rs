use serde_json::{json, Value};

use crate::matching::scoring::ScoredCandidate;
use crate::models::project::Project;

/// System instruction for the re-ranking call.
pub const RERANK_SYSTEM: &str = "You are a technical recruiter AI. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

const RERANK_INSTRUCTIONS: &str = "\
Analyze each candidate for the given project.
Focus mainly on skills and whether they have built projects using those skills.
Also lightly consider availability.
Return STRICT JSON with this structure:
{ \"results\": [ {\"id\": string, \"rerank_score\": float (0-1), \"reason\": string} ] }
Each reason must be ONE SENTENCE (<= 180 chars) like:
\"This employee has React and Django skills, has done projects in these areas, and is available soon.\"
---
";

/// Builds the re-ranking prompt for the head of the ranked list.
pub fn rerank_prompt(project: &Project, head: &[ScoredCandidate]) -> String {
    let candidates: Vec<Value> = head
        .iter()
        .map(|c| {
            json!({
                "id": c.candidate.id.to_string(),
                "name": c.candidate.name,
                "role": c.candidate.role,
                "matched_skills": c.matched_skills,
                "projects_by_skill": c.candidate.projects_by_skill,
                "projects": c.candidate.projects,
                "previous_experience": c.candidate.previous_experience,
                "availability": c.candidate.availability,
                "availability_dates": c.candidate.availability_dates,
                "_base_score": c.base_score,
            })
        })
        .collect();

    let payload = json!({
        "project": {
            "name": project.project_name,
            "required_skills": project.required_skills,
        },
        "candidates": candidates,
    });

    format!("{RERANK_INSTRUCTIONS}{payload}")
}
