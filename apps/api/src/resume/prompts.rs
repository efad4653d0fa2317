/// Builds the resume extraction prompt.
/// The schema matches what `normalize_extraction` accepts.
pub fn extraction_prompt(resume_text: &str) -> String {
    format!(
        r#"You are a senior resume parser. Return STRICT JSON only (no prose).

Schema:
{{
  "skills": string[],
  "projects_by_skill": {{ [skill: string]: string[] }},
  "previous_experience": [{{ "company": string, "title": string, "duration": string }}],
  "role": string | null,
  "availability": string | null
}}

Guidelines:
- "skills" are deduplicated canonical skill names (e.g. "Django", "React", "Python").
- "projects_by_skill" maps each skill to the project names where that skill was actually used.
- Use concise project names only (e.g. "Online Examination Portal").
- "previous_experience" holds real company names and job titles, with brief durations if available.
- Do not invent facts. If unsure, omit entries.

---
RESUME TEXT:
{resume_text}"#
    )
}
