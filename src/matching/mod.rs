//! Multi-criteria matching: weighted scoring, hard eligibility gating, and
//! candidate/posting ranking. Everything here is pure; no collaborator
//! interfaces are touched.

pub mod domain;
pub mod eligibility;
pub mod matcher;
pub mod score;

pub use domain::{
    AcademicRecord, CandidateProfile, Requirement, StudentId, TargetId, TargetKind, TargetPosting,
    WorkExperience,
};
pub use eligibility::{EligibilityReport, RequirementChecker, RequirementFailure};
pub use matcher::{CandidateMatcher, MatchPolicy, PostingMatch, RankedCandidate};
pub use score::{MatchComponent, MatchCriterion, MatchScore, ScoreCalculator};
