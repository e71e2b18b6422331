use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::allocation::domain::{
    AdmissionPolicy, Application, ApplicationId, ApplicationStatus, InstitutionId, TargetSnapshot,
};
use crate::allocation::engine::AllocationEngine;
use crate::allocation::memory::{InMemoryCatalog, InMemoryDirectory, InMemoryStore};
use crate::config::AllocationSettings;
use crate::matching::domain::{
    AcademicRecord, CandidateProfile, Requirement, StudentId, TargetId, TargetKind, TargetPosting,
    WorkExperience,
};
use crate::matching::score::ScoreCalculator;

pub(super) fn student(id: &str) -> StudentId {
    StudentId(id.to_string())
}

pub(super) fn target(id: &str) -> TargetId {
    TargetId(id.to_string())
}

pub(super) fn candidate(id: &str, gpa: f32) -> CandidateProfile {
    let mut subjects = BTreeMap::new();
    subjects.insert("Mathematics".to_string(), 82.0);
    subjects.insert("English".to_string(), 75.0);
    CandidateProfile {
        student_id: student(id),
        academic_records: vec![AcademicRecord {
            institution: "Riverside Tech".to_string(),
            course: "Software Engineering".to_string(),
            subjects,
            gpa,
        }],
        skills: vec!["Rust".to_string(), "SQL".to_string()],
        certificates: vec!["AWS Cloud Practitioner".to_string()],
        work_experience: vec![WorkExperience {
            description: "Backend intern".to_string(),
            months: 6,
        }],
    }
}

pub(super) fn course_requirement() -> Requirement {
    Requirement {
        min_gpa: Some(3.0),
        subjects: vec!["Mathematics".to_string()],
        ..Requirement::default()
    }
}

pub(super) fn course(
    id: &str,
    institution: &str,
    capacity: u32,
    policy: AdmissionPolicy,
) -> TargetSnapshot {
    TargetSnapshot {
        posting: TargetPosting {
            target_id: target(id),
            kind: TargetKind::Course,
            requirement: course_requirement(),
        },
        institution_id: InstitutionId(institution.to_string()),
        capacity,
        policy,
    }
}

pub(super) fn job(id: &str, institution: &str, capacity: u32) -> TargetSnapshot {
    TargetSnapshot {
        posting: TargetPosting {
            target_id: target(id),
            kind: TargetKind::Job,
            requirement: Requirement {
                min_gpa: Some(2.5),
                skills: Some(vec!["Rust".to_string()]),
                ..Requirement::default()
            },
        },
        institution_id: InstitutionId(institution.to_string()),
        capacity,
        policy: AdmissionPolicy::ManualReview,
    }
}

pub(super) fn test_settings() -> AllocationSettings {
    AllocationSettings {
        institution_application_limit: 2,
        retry_attempts: 3,
        retry_base_delay_ms: 1,
    }
}

pub(super) struct Fixture {
    pub directory: Arc<InMemoryDirectory>,
    pub catalog: Arc<InMemoryCatalog>,
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<AllocationEngine<InMemoryDirectory, InMemoryCatalog, InMemoryStore>>,
}

pub(super) fn fixture(
    candidates: Vec<CandidateProfile>,
    targets: Vec<TargetSnapshot>,
) -> Fixture {
    let directory = Arc::new(InMemoryDirectory::with_profiles(candidates));
    let catalog = Arc::new(InMemoryCatalog::with_targets(targets));
    let store = Arc::new(InMemoryStore::default());
    let engine = Arc::new(AllocationEngine::new(
        directory.clone(),
        catalog.clone(),
        store.clone(),
        ScoreCalculator::default(),
        test_settings(),
    ));
    Fixture {
        directory,
        catalog,
        store,
        engine,
    }
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single().expect("valid timestamp")
}

/// Hand-built application record for ledger-level tests.
pub(super) fn application(
    id: &str,
    student_id: &str,
    target_id: &str,
    institution: &str,
    status: ApplicationStatus,
    minutes_offset: i64,
) -> Application {
    let created = base_time() + Duration::minutes(minutes_offset);
    Application {
        id: ApplicationId(id.to_string()),
        student_id: student(student_id),
        target_id: target(target_id),
        institution_id: InstitutionId(institution.to_string()),
        status,
        priority: 1,
        created_at: created,
        updated_at: created,
        sequence: minutes_offset as u64,
        status_reason: None,
    }
}
