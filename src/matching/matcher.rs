use serde::{Deserialize, Serialize};

use super::domain::{CandidateProfile, StudentId, TargetId, TargetPosting};
use super::eligibility::RequirementChecker;
use super::score::{MatchScore, ScoreCalculator};
use crate::notify::{NotificationKind, NotificationRequest};

/// Cutoffs for qualifying and recommending matches. The platform has never
/// agreed on a single threshold, so both are policy rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Minimum score for a candidate to count as qualified for a posting.
    pub qualify_threshold: f32,
    /// Higher bar used before proactively recommending a posting.
    pub recommend_threshold: f32,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            qualify_threshold: 0.7,
            recommend_threshold: 0.8,
        }
    }
}

/// A candidate who cleared the eligibility gate and the qualify threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub student_id: StudentId,
    pub score: MatchScore,
}

/// A posting recommended to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingMatch {
    pub target_id: TargetId,
    pub score: MatchScore,
}

/// Ranks candidates for a posting and surfaces postings to candidates.
#[derive(Debug, Clone, Default)]
pub struct CandidateMatcher {
    checker: RequirementChecker,
    calculator: ScoreCalculator,
    policy: MatchPolicy,
}

impl CandidateMatcher {
    pub fn new(calculator: ScoreCalculator, policy: MatchPolicy) -> Self {
        Self {
            checker: RequirementChecker::new(),
            calculator,
            policy,
        }
    }

    /// Eligible candidates scoring at or above the qualify threshold,
    /// strongest match first.
    pub fn rank_candidates(
        &self,
        posting: &TargetPosting,
        candidates: &[CandidateProfile],
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .filter(|candidate| {
                self.checker
                    .check(candidate, &posting.requirement)
                    .is_eligible()
            })
            .map(|candidate| RankedCandidate {
                student_id: candidate.student_id.clone(),
                score: self.calculator.score(candidate, posting),
            })
            .filter(|candidate| candidate.score.total >= self.policy.qualify_threshold)
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Postings worth pushing to the candidate, with one recommendation
    /// notification per strong match.
    pub fn recommend_postings(
        &self,
        candidate: &CandidateProfile,
        postings: &[TargetPosting],
    ) -> (Vec<PostingMatch>, Vec<NotificationRequest>) {
        let mut matches = Vec::new();
        let mut notifications = Vec::new();

        for posting in postings {
            if !self
                .checker
                .check(candidate, &posting.requirement)
                .is_eligible()
            {
                continue;
            }

            let score = self.calculator.score(candidate, posting);
            if score.total < self.policy.recommend_threshold {
                continue;
            }

            notifications.push(
                NotificationRequest::new(
                    candidate.student_id.clone(),
                    NotificationKind::JobRecommendation,
                )
                .with("target_id", posting.target_id.0.clone())
                .with("match_score", format!("{:.2}", score.total)),
            );
            matches.push(PostingMatch {
                target_id: posting.target_id.clone(),
                score,
            });
        }

        (matches, notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::domain::{AcademicRecord, Requirement, TargetKind, WorkExperience};
    use std::collections::BTreeMap;

    fn candidate(id: &str, gpa: f32, skills: &[&str]) -> CandidateProfile {
        let mut subjects = BTreeMap::new();
        subjects.insert("Mathematics".to_string(), 80.0);
        CandidateProfile {
            student_id: StudentId(id.to_string()),
            academic_records: vec![AcademicRecord {
                institution: "Riverside Tech".to_string(),
                course: "Software Engineering".to_string(),
                subjects,
                gpa,
            }],
            skills: skills.iter().map(|s| s.to_string()).collect(),
            certificates: vec!["AWS Certified Developer".to_string()],
            work_experience: vec![WorkExperience {
                description: "Intern".to_string(),
                months: 12,
            }],
        }
    }

    fn job_posting() -> TargetPosting {
        TargetPosting {
            target_id: TargetId("job-1".to_string()),
            kind: TargetKind::Job,
            requirement: Requirement {
                min_gpa: Some(2.5),
                skills: Some(vec!["Rust".to_string()]),
                certificates: Some(vec!["AWS".to_string()]),
                min_experience_months: Some(6),
                ..Requirement::default()
            },
        }
    }

    #[test]
    fn ranking_is_sorted_strongest_first() {
        let matcher = CandidateMatcher::default();
        let candidates = vec![
            candidate("stu-low", 2.6, &["Rust"]),
            candidate("stu-high", 4.0, &["Rust", "SQL"]),
        ];

        let ranked = matcher.rank_candidates(&job_posting(), &candidates);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].student_id, StudentId("stu-high".to_string()));
        assert!(ranked[0].score.total >= ranked[1].score.total);
    }

    #[test]
    fn ineligible_candidates_are_excluded_before_scoring() {
        let matcher = CandidateMatcher::default();
        // Missing the required Rust skill entirely; a perfect GPA must not
        // rescue the candidate.
        let candidates = vec![candidate("stu-no-skill", 4.0, &["COBOL"])];

        assert!(matcher
            .rank_candidates(&job_posting(), &candidates)
            .is_empty());
    }

    #[test]
    fn recommendations_emit_one_notification_per_match() {
        let matcher = CandidateMatcher::default();
        let strong = candidate("stu-1", 4.0, &["Rust"]);

        let (matches, notifications) = matcher.recommend_postings(&strong, &[job_posting()]);

        assert_eq!(matches.len(), 1);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::JobRecommendation);
        assert_eq!(
            notifications[0].payload.get("target_id"),
            Some(&"job-1".to_string())
        );
    }

    #[test]
    fn weak_matches_are_not_recommended() {
        let matcher = CandidateMatcher::default();
        let mut weak = candidate("stu-2", 2.5, &["Rust"]);
        weak.work_experience[0].months = 3;

        let (matches, notifications) = matcher.recommend_postings(&weak, &[job_posting()]);

        assert!(matches.is_empty());
        assert!(notifications.is_empty());
    }
}
