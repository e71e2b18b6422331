use serde::{Deserialize, Serialize};

use super::domain::{fuzzy_contains, CandidateProfile, Requirement};

/// A single hard-requirement failure, suitable for surfacing to the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RequirementFailure {
    #[error("minimum GPA requirement not met (required {required:.2}, achieved {achieved:.2})")]
    GpaBelowMinimum { required: f32, achieved: f32 },
    #[error("missing required subject: {subject}")]
    MissingSubject { subject: String },
    #[error("missing required skill: {skill}")]
    MissingSkill { skill: String },
}

/// Outcome of the eligibility gate: eligible iff no failures were recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub failures: Vec<RequirementFailure>,
}

impl EligibilityReport {
    pub fn is_eligible(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|failure| failure.to_string())
            .collect()
    }
}

/// Hard gate run before any scoring or ledger work. A candidate failing any
/// check here is never admitted or waitlisted, regardless of match score.
#[derive(Debug, Clone, Default)]
pub struct RequirementChecker;

impl RequirementChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(
        &self,
        candidate: &CandidateProfile,
        requirement: &Requirement,
    ) -> EligibilityReport {
        let mut failures = Vec::new();

        if let Some(required) = requirement.min_gpa {
            let achieved = candidate.highest_gpa();
            if achieved < required {
                failures.push(RequirementFailure::GpaBelowMinimum { required, achieved });
            }
        }

        for subject in &requirement.subjects {
            if !candidate.has_subject(subject) {
                failures.push(RequirementFailure::MissingSubject {
                    subject: subject.clone(),
                });
            }
        }

        if let Some(skills) = &requirement.skills {
            for skill in skills {
                if !fuzzy_contains(&candidate.skills, skill) {
                    failures.push(RequirementFailure::MissingSkill {
                        skill: skill.clone(),
                    });
                }
            }
        }

        EligibilityReport { failures }
    }
}
