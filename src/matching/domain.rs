use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for student accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for a course or job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distinguishes what kind of posting a requirement belongs to; the scoring
/// rubric weights differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Course,
    Job,
}

impl TargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            TargetKind::Course => "course",
            TargetKind::Job => "job",
        }
    }
}

/// One completed (or in-progress) study record on a candidate's transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub institution: String,
    pub course: String,
    /// Subject name to achieved grade.
    pub subjects: BTreeMap<String, f32>,
    pub gpa: f32,
}

/// A single prior employment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub description: String,
    pub months: u32,
}

/// Everything the engine reads about a student. Owned by the student;
/// read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub student_id: StudentId,
    pub academic_records: Vec<AcademicRecord>,
    pub skills: Vec<String>,
    pub certificates: Vec<String>,
    pub work_experience: Vec<WorkExperience>,
}

impl CandidateProfile {
    /// Highest GPA across all academic records, 0.0 when none exist.
    pub fn highest_gpa(&self) -> f32 {
        self.academic_records
            .iter()
            .map(|record| record.gpa)
            .fold(0.0, f32::max)
    }

    /// Total accumulated work experience in months.
    pub fn total_experience_months(&self) -> u32 {
        self.work_experience.iter().map(|exp| exp.months).sum()
    }

    /// Case-insensitive lookup across every record's subject map.
    pub fn has_subject(&self, subject: &str) -> bool {
        self.academic_records.iter().any(|record| {
            record
                .subjects
                .keys()
                .any(|name| name.eq_ignore_ascii_case(subject))
        })
    }
}

/// Requirements a course or job poster attaches to a posting.
///
/// `None` means the criterion is absent from the posting entirely and its
/// scoring weight is redistributed; `Some` with an empty list means the
/// criterion exists but constrains nothing, which scores neutrally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub min_gpa: Option<f32>,
    /// Subjects that must appear on the transcript. Hard gate only.
    pub subjects: Vec<String>,
    pub skills: Option<Vec<String>>,
    pub certificates: Option<Vec<String>>,
    pub min_experience_months: Option<u32>,
    /// Keywords matched against the candidate's course/major names.
    pub course_keywords: Option<Vec<String>>,
}

/// A course or job posting as the matching layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPosting {
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub requirement: Requirement,
}

/// Case-insensitive substring match in either direction, the matching rule
/// used for skills, certificates, and course keywords alike.
pub(crate) fn fuzzy_contains(haystack: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    haystack.iter().any(|entry| {
        let entry = entry.to_lowercase();
        entry.contains(&needle) || needle.contains(&entry)
    })
}
