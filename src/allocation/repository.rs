//! Collaborator interfaces supplied by the persistence layer.
//!
//! The engine holds no shared state of its own; counts are always recomputed
//! from the authoritative application set through these traits, and every
//! multi-record mutation goes through the all-or-nothing
//! [`ApplicationStore::atomic_transition`] contract.

use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, ApplicationStatus, TargetSnapshot};
use crate::matching::domain::{CandidateProfile, StudentId, TargetId};

/// Read access to student profiles.
pub trait CandidateDirectory: Send + Sync {
    fn fetch_candidate(&self, student_id: &StudentId) -> Result<CandidateProfile, StoreError>;
}

/// Read access to course/job postings and their allocation facts.
pub trait TargetCatalog: Send + Sync {
    fn fetch_target(&self, target_id: &TargetId) -> Result<TargetSnapshot, StoreError>;
}

/// Predicate for [`ApplicationStore::list`]. Results are always ordered by
/// `(created_at, sequence)` ascending, which is the waitlist order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationQuery {
    pub student_id: Option<StudentId>,
    pub target_id: Option<TargetId>,
    /// Empty means any status.
    pub statuses: Vec<ApplicationStatus>,
}

impl ApplicationQuery {
    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::default()
        }
    }

    pub fn for_target(target_id: TargetId) -> Self {
        Self {
            target_id: Some(target_id),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[ApplicationStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Waiting entries for a target, i.e. its waitlist front to back.
    pub fn waitlist(target_id: TargetId) -> Self {
        Self::for_target(target_id).with_statuses(&[ApplicationStatus::Waiting])
    }

    /// Seat-occupying entries for a target.
    pub fn occupants(target_id: TargetId) -> Self {
        Self::for_target(target_id)
            .with_statuses(&[ApplicationStatus::Pending, ApplicationStatus::Admitted])
    }

    pub fn matches(&self, application: &Application) -> bool {
        if let Some(student_id) = &self.student_id {
            if &application.student_id != student_id {
                return false;
            }
        }
        if let Some(target_id) = &self.target_id {
            if &application.target_id != target_id {
                return false;
            }
        }
        self.statuses.is_empty() || self.statuses.contains(&application.status)
    }
}

/// One conditional status transition inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub application_id: ApplicationId,
    /// Current status the record must still hold for the batch to apply.
    pub expect: ApplicationStatus,
    pub to: ApplicationStatus,
    pub reason: Option<String>,
}

impl StatusChange {
    pub fn new(application_id: ApplicationId, expect: ApplicationStatus, to: ApplicationStatus) -> Self {
        Self {
            application_id,
            expect,
            to,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Persistence contract for application records.
pub trait ApplicationStore: Send + Sync {
    /// Insert a new record. The store assigns the insertion `sequence` and
    /// revalidates, inside the same isolation scope, that the target's seat
    /// occupancy still equals `expected_occupancy`; a mismatch means a
    /// concurrent submit won the capacity check and must fail with
    /// [`StoreError::CapacityRace`].
    fn insert(
        &self,
        application: Application,
        expected_occupancy: usize,
    ) -> Result<Application, StoreError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<Application>, StoreError>;

    /// Apply every change or none. Each change is conditional on its
    /// `expect` status and must be a legal edge of the status machine;
    /// a stale expectation fails the whole batch with
    /// [`StoreError::StaleTransition`].
    fn atomic_transition(&self, changes: &[StatusChange]) -> Result<(), StoreError>;
}

/// Failures reported by the persistence collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("occupancy for target {target_id} changed during insert")]
    CapacityRace { target_id: TargetId },
    #[error("application {application_id} no longer holds the expected status")]
    StaleTransition { application_id: ApplicationId },
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
