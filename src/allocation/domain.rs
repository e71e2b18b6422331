use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::domain::{StudentId, TargetId, TargetPosting};

/// Identifier wrapper for institutions (course providers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionId(pub String);

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a free seat admits an eligible applicant immediately or leaves
/// the application pending for an explicit institution decision. Jobs always
/// go through manual review; courses choose per posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionPolicy {
    AutoAdmit,
    ManualReview,
}

/// A posting together with the allocation-side facts about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub posting: TargetPosting,
    pub institution_id: InstitutionId,
    pub capacity: u32,
    pub policy: AdmissionPolicy,
}

impl TargetSnapshot {
    pub fn target_id(&self) -> &TargetId {
        &self.posting.target_id
    }
}

/// The single mutable field of an application record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Waiting,
    Admitted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Waiting => "waiting",
            ApplicationStatus::Admitted => "admitted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Rejected and withdrawn records never transition again; withdrawal is
    /// a terminal status rather than erasure, preserving audit history.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Whether this status holds one unit of the target's seat capacity.
    pub const fn occupies_seat(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Admitted
        )
    }

    /// Legal edges of the status machine.
    pub const fn can_transition(self, to: ApplicationStatus) -> bool {
        match (self, to) {
            (
                ApplicationStatus::Pending,
                ApplicationStatus::Admitted
                | ApplicationStatus::Rejected
                | ApplicationStatus::Withdrawn,
            ) => true,
            (
                ApplicationStatus::Waiting,
                ApplicationStatus::Admitted | ApplicationStatus::Rejected,
            ) => true,
            // Only the arbiter rejects an admitted application, when a
            // competing admission is confirmed.
            (ApplicationStatus::Admitted, ApplicationStatus::Rejected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One student's application to one target. Created by the engine, mutated
/// only through status transitions, never physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub target_id: TargetId,
    pub institution_id: InstitutionId,
    pub status: ApplicationStatus,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion sequence assigned by the store; breaks creation-time ties
    /// in waitlist ordering.
    pub sequence: u64,
    /// Reason attached by the most recent transition, if any.
    pub status_reason: Option<String>,
}
