//! Scoring Engine — weighted relevance of every stored candidate against one
//! project.
//!
//! `_base_score = 4·overlap + 3·project_hits + 1·previous_bonus + 1·availability_bonus`
//!
//! Skill overlap and project experience dominate; previous employment and an
//! availability date close to today only break near-ties.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::models::candidate::{Candidate, PreviousExperience};
use crate::models::project::Project;

const SKILL_OVERLAP_WEIGHT: f64 = 4.0;
const PROJECT_HIT_WEIGHT: f64 = 3.0;
const PREVIOUS_EXPERIENCE_WEIGHT: f64 = 1.0;
const AVAILABILITY_WEIGHT: f64 = 1.0;

const PREVIOUS_EXPERIENCE_STEP: f64 = 0.5;
const PREVIOUS_EXPERIENCE_CAP: f64 = 2.0;
/// Decay constant, in days, of the availability bonus.
const AVAILABILITY_DECAY_DAYS: f64 = 7.0;
/// Stands in for a zero top score so the whole window normalizes to 0.
const ZERO_SCORE_EPSILON: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// Output model
// ────────────────────────────────────────────────────────────────────────────

/// A candidate annotated for one matching request. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Required skills the candidate has, in the candidate's casing.
    pub matched_skills: Vec<String>,
    #[serde(rename = "_base_score")]
    pub base_score: f64,
    /// 0–100, relative to the best candidate of the returned window.
    pub score: Option<f64>,
    pub ai_reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores candidates against the project as of today (UTC). Output follows
/// input order; use [`rank`] to sort.
pub fn score_candidates(candidates: Vec<Candidate>, project: &Project) -> Vec<ScoredCandidate> {
    score_candidates_on(candidates, project, Utc::now().date_naive())
}

pub fn score_candidates_on(
    candidates: Vec<Candidate>,
    project: &Project,
    today: NaiveDate,
) -> Vec<ScoredCandidate> {
    let required = &project.required_skills;

    candidates
        .into_iter()
        .map(|candidate| {
            let matched = matched_skills(required, &candidate.skills);
            let hits = project_experience_hits(required, &candidate);
            let previous = previous_experience_bonus(&candidate.previous_experience);
            let available = availability_bonus(&candidate.availability_dates, today);

            let base_score = SKILL_OVERLAP_WEIGHT * matched.len() as f64
                + PROJECT_HIT_WEIGHT * hits as f64
                + PREVIOUS_EXPERIENCE_WEIGHT * previous
                + AVAILABILITY_WEIGHT * available;

            ScoredCandidate {
                candidate,
                matched_skills: matched,
                base_score,
                score: None,
                ai_reason: None,
            }
        })
        .collect()
}

/// Stable sort by `_base_score`, highest first. Ties keep their input order.
pub fn rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| b.base_score.total_cmp(&a.base_score));
}

/// Sets `score` on every candidate of the window relative to its top
/// `_base_score`, rounded to two decimals.
pub fn normalize_scores(window: &mut [ScoredCandidate]) {
    let top = window.iter().map(|c| c.base_score).fold(0.0_f64, f64::max);
    let denominator = if top > 0.0 { top } else { ZERO_SCORE_EPSILON };

    for c in window.iter_mut() {
        let pct = c.base_score / denominator * 100.0;
        c.score = Some((pct * 100.0).round() / 100.0);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signals
// ────────────────────────────────────────────────────────────────────────────

fn fold_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-insensitive intersection, in candidate skill order and casing.
pub fn matched_skills(required: &[String], skills: &[String]) -> Vec<String> {
    let wanted: HashSet<String> = required
        .iter()
        .map(|s| fold_key(s))
        .filter(|s| !s.is_empty())
        .collect();

    let mut seen = HashSet::new();
    skills
        .iter()
        .filter(|s| {
            let key = fold_key(s);
            wanted.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}

/// Projects the candidate built with the required skills. Falls back to
/// counting flat project strings mentioning any required skill.
pub fn project_experience_hits(required: &[String], candidate: &Candidate) -> usize {
    let required: Vec<String> = required
        .iter()
        .map(|s| fold_key(s))
        .filter(|s| !s.is_empty())
        .collect();

    let bucketed: usize = required
        .iter()
        .map(|skill| {
            candidate
                .projects_by_skill
                .iter()
                .filter(|(key, _)| fold_key(key) == *skill)
                .map(|(_, projects)| projects.len())
                .sum::<usize>()
        })
        .sum();

    if bucketed > 0 {
        return bucketed;
    }

    candidate
        .projects
        .iter()
        .filter(|project| {
            let project = project.to_lowercase();
            required.iter().any(|skill| project.contains(skill.as_str()))
        })
        .count()
}

pub fn previous_experience_bonus(previous: &[PreviousExperience]) -> f64 {
    let substantive = previous.iter().filter(|p| p.is_substantive()).count();
    (substantive as f64 * PREVIOUS_EXPERIENCE_STEP).min(PREVIOUS_EXPERIENCE_CAP)
}

/// `exp(-|Δdays| / 7)` for the valid date closest to `today`; 0 if none parse.
pub fn availability_bonus(dates: &[String], today: NaiveDate) -> f64 {
    dates
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| {
            let days = (d - today).num_days().abs() as f64;
            (-days / AVAILABILITY_DECAY_DAYS).exp()
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn candidate(name: &str, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new(name);
        c.skills = strings(skills);
        c
    }

    fn with_base(name: &str, base: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new(name),
            matched_skills: vec![],
            base_score: base,
            score: None,
            ai_reason: None,
        }
    }

    #[test]
    fn test_matched_skills_keep_candidate_casing() {
        let matched = matched_skills(
            &strings(&["React", "Python"]),
            &strings(&["react", "Django"]),
        );
        assert_eq!(matched, vec!["react".to_string()]);
    }

    #[test]
    fn test_matched_skills_follow_candidate_order() {
        let matched = matched_skills(
            &strings(&["Docker", " rust ", "Go"]),
            &strings(&["Go", "Rust", "Kotlin", "docker"]),
        );
        assert_eq!(matched, strings(&["Go", "Rust", "docker"]));
    }

    #[test]
    fn test_bucketed_hits_sum_matching_keys() {
        let mut c = candidate("Asha", &["Python"]);
        let mut buckets = IndexMap::new();
        buckets.insert("python".to_string(), strings(&["A", "B"]));
        buckets.insert("Go".to_string(), strings(&["C"]));
        c.projects_by_skill = buckets;
        c.projects = strings(&["python — A", "python — B", "Go — C"]);

        assert_eq!(project_experience_hits(&strings(&["Python"]), &c), 2);
    }

    #[test]
    fn test_flat_hits_used_when_no_bucket_matches() {
        let mut c = candidate("Asha", &[]);
        c.projects = strings(&["React dashboard", "Python and react tooling", "Chess bot"]);

        // each string counts once, however many skills it mentions
        assert_eq!(
            project_experience_hits(&strings(&["React", "Python"]), &c),
            2
        );
    }

    #[test]
    fn test_previous_experience_bonus_is_capped() {
        let entry = |title: &str| PreviousExperience {
            title: Some(title.to_string()),
            ..Default::default()
        };
        assert_eq!(previous_experience_bonus(&[]), 0.0);
        assert_eq!(previous_experience_bonus(&[entry("A"), PreviousExperience::default()]), 0.5);
        let many: Vec<_> = (0..6).map(|i| entry(&format!("T{i}"))).collect();
        assert_eq!(previous_experience_bonus(&many), 2.0);
    }

    #[test]
    fn test_availability_bonus_prefers_closest_valid_date() {
        let dates = strings(&["2024-02-30", "2024-06-08", "2024-06-01", "someday"]);
        assert_eq!(availability_bonus(&dates, today()), 1.0);

        let week_out = availability_bonus(&strings(&["2024-06-08"]), today());
        assert!((week_out - (-1.0_f64).exp()).abs() < 1e-12);

        let week_ago = availability_bonus(&strings(&["2024-05-25"]), today());
        assert!((week_ago - week_out).abs() < 1e-12);
    }

    #[test]
    fn test_availability_bonus_zero_without_valid_dates() {
        assert_eq!(availability_bonus(&strings(&["2024-02-30"]), today()), 0.0);
        assert_eq!(availability_bonus(&[], today()), 0.0);
    }

    #[test]
    fn test_skill_overlap_and_projects_outweigh_single_skill() {
        let project = Project::new("Portal", strings(&["React", "Python"]));

        let mut strong = candidate("Strong", &["React", "Python"]);
        let mut buckets = IndexMap::new();
        buckets.insert("React".to_string(), strings(&["A", "B", "C"]));
        strong.projects_by_skill = buckets;

        let weak = candidate("Weak", &["Python"]);

        let scored = score_candidates_on(vec![weak, strong], &project, today());
        assert_eq!(scored[0].base_score, 4.0);
        assert_eq!(scored[1].base_score, 4.0 * 2.0 + 3.0 * 3.0);
    }

    #[test]
    fn test_base_score_combines_all_signals() {
        let project = Project::new("Portal", strings(&["Rust"]));
        let mut c = candidate("Asha", &["rust"]);
        c.projects = strings(&["Rust — cli"]);
        c.previous_experience = vec![PreviousExperience {
            company: Some("Globex".to_string()),
            ..Default::default()
        }];
        c.availability_dates = strings(&["2024-06-01"]);

        let scored = score_candidates_on(vec![c], &project, today());
        assert_eq!(scored[0].matched_skills, strings(&["rust"]));
        assert_eq!(scored[0].base_score, 4.0 + 3.0 + 0.5 + 1.0);
        assert!(scored[0].score.is_none());
        assert!(scored[0].ai_reason.is_none());
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let mut window = vec![with_base("a", 1.0), with_base("b", 3.0), with_base("c", 1.0)];
        rank(&mut window);
        let names: Vec<_> = window.iter().map(|c| c.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_normalize_scores_relative_to_top() {
        let mut window = vec![with_base("a", 10.0), with_base("b", 5.0), with_base("c", 0.0)];
        normalize_scores(&mut window);
        let scores: Vec<_> = window.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![Some(100.0), Some(50.0), Some(0.0)]);
    }

    #[test]
    fn test_normalize_scores_rounds_to_two_decimals() {
        let mut window = vec![with_base("a", 3.0), with_base("b", 1.0)];
        normalize_scores(&mut window);
        assert_eq!(window[1].score, Some(33.33));
    }

    #[test]
    fn test_normalize_scores_all_zero_window() {
        let mut window = vec![with_base("a", 0.0), with_base("b", 0.0)];
        normalize_scores(&mut window);
        assert!(window.iter().all(|c| c.score == Some(0.0)));

        let mut empty: Vec<ScoredCandidate> = vec![];
        normalize_scores(&mut empty);
    }

    #[test]
    fn test_scored_candidate_serializes_flat() {
        let json = serde_json::to_value(with_base("Asha", 2.5)).unwrap();
        assert_eq!(json["name"], "Asha");
        assert_eq!(json["_base_score"], 2.5);
        assert!(json.get("candidate").is_none());
    }
}
