use serde::{Deserialize, Serialize};

use super::domain::{fuzzy_contains, CandidateProfile, Requirement, TargetKind, TargetPosting};

/// Criteria feeding the weighted match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCriterion {
    Academic,
    CourseRelevance,
    Skills,
    Certificates,
    Experience,
}

impl MatchCriterion {
    pub const fn label(self) -> &'static str {
        match self {
            MatchCriterion::Academic => "academic",
            MatchCriterion::CourseRelevance => "course_relevance",
            MatchCriterion::Skills => "skills",
            MatchCriterion::Certificates => "certificates",
            MatchCriterion::Experience => "experience",
        }
    }
}

/// Discrete contribution to a match score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchComponent {
    pub criterion: MatchCriterion,
    pub weight: f32,
    pub score: f32,
    pub notes: String,
}

/// Normalized weighted score in `[0, 1]` with its component trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub total: f32,
    pub components: Vec<MatchComponent>,
}

/// Stateless multi-criteria scorer.
///
/// Weights per target kind are fixed and sum to 1.0. When a criterion is
/// absent from the posting its weight is redistributed proportionally over
/// the remaining applicable criteria instead of deflating the total.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    gpa_ceiling: f32,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_GPA_CEILING)
    }
}

pub(crate) const DEFAULT_GPA_CEILING: f32 = 4.0;

const COURSE_WEIGHTS: [(MatchCriterion, f32); 4] = [
    (MatchCriterion::Academic, 0.4),
    (MatchCriterion::CourseRelevance, 0.3),
    (MatchCriterion::Experience, 0.2),
    (MatchCriterion::Certificates, 0.1),
];

const JOB_WEIGHTS: [(MatchCriterion, f32); 4] = [
    (MatchCriterion::Academic, 0.4),
    (MatchCriterion::Certificates, 0.25),
    (MatchCriterion::Skills, 0.2),
    (MatchCriterion::Experience, 0.15),
];

impl ScoreCalculator {
    pub fn new(gpa_ceiling: f32) -> Self {
        Self { gpa_ceiling }
    }

    /// Score a candidate against a posting's requirement set.
    pub fn score(&self, candidate: &CandidateProfile, posting: &TargetPosting) -> MatchScore {
        let weights: &[(MatchCriterion, f32)] = match posting.kind {
            TargetKind::Course => &COURSE_WEIGHTS,
            TargetKind::Job => &JOB_WEIGHTS,
        };

        let mut components = Vec::new();
        let mut weighted_sum = 0.0;
        let mut applicable_weight = 0.0;

        for &(criterion, weight) in weights {
            let Some((score, notes)) = self.sub_score(criterion, candidate, &posting.requirement)
            else {
                continue;
            };
            weighted_sum += score * weight;
            applicable_weight += weight;
            components.push(MatchComponent {
                criterion,
                weight,
                score,
                notes,
            });
        }

        let total = if applicable_weight > 0.0 {
            (weighted_sum / applicable_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        MatchScore { total, components }
    }

    fn sub_score(
        &self,
        criterion: MatchCriterion,
        candidate: &CandidateProfile,
        requirement: &Requirement,
    ) -> Option<(f32, String)> {
        match criterion {
            MatchCriterion::Academic => self.academic_sub_score(candidate, requirement),
            MatchCriterion::CourseRelevance => relevance_sub_score(candidate, requirement),
            MatchCriterion::Skills => {
                set_sub_score(&candidate.skills, requirement.skills.as_deref(), "skill")
            }
            MatchCriterion::Certificates => set_sub_score(
                &candidate.certificates,
                requirement.certificates.as_deref(),
                "certificate",
            ),
            MatchCriterion::Experience => experience_sub_score(candidate, requirement),
        }
    }

    fn academic_sub_score(
        &self,
        candidate: &CandidateProfile,
        requirement: &Requirement,
    ) -> Option<(f32, String)> {
        let min_gpa = requirement.min_gpa?;
        let gpa = candidate.highest_gpa();

        let score = if gpa >= min_gpa {
            let headroom = self.gpa_ceiling - min_gpa;
            if headroom <= f32::EPSILON {
                1.0
            } else {
                (0.5 + 0.5 * ((gpa - min_gpa) / headroom)).min(1.0)
            }
        } else if min_gpa > 0.0 {
            0.2 * (gpa / min_gpa)
        } else {
            0.0
        };

        Some((
            score,
            format!("gpa {gpa:.2} against required minimum {min_gpa:.2}"),
        ))
    }
}

fn relevance_sub_score(
    candidate: &CandidateProfile,
    requirement: &Requirement,
) -> Option<(f32, String)> {
    let keywords = requirement.course_keywords.as_deref()?;
    if keywords.is_empty() {
        return Some((0.5, "no course keywords on posting".to_string()));
    }

    let courses: Vec<String> = candidate
        .academic_records
        .iter()
        .map(|record| record.course.clone())
        .collect();
    let matched = keywords
        .iter()
        .filter(|keyword| fuzzy_contains(&courses, keyword))
        .count();

    Some((
        matched as f32 / keywords.len() as f32,
        format!("{matched} of {} course keyword(s) matched", keywords.len()),
    ))
}

fn set_sub_score(
    owned: &[String],
    required: Option<&[String]>,
    noun: &str,
) -> Option<(f32, String)> {
    let required = required?;
    if required.is_empty() {
        return Some((0.5, format!("no {noun}s required")));
    }

    let matched = required
        .iter()
        .filter(|item| fuzzy_contains(owned, item))
        .count();

    Some((
        matched as f32 / required.len() as f32,
        format!("{matched} of {} required {noun}(s) matched", required.len()),
    ))
}

fn experience_sub_score(
    candidate: &CandidateProfile,
    requirement: &Requirement,
) -> Option<(f32, String)> {
    let required = requirement.min_experience_months?;
    let accumulated = candidate.total_experience_months();

    let score = if required == 0 {
        1.0
    } else {
        (accumulated as f32 / required as f32).min(1.0)
    };

    Some((
        score,
        format!("{accumulated} of {required} required month(s) of experience"),
    ))
}
