use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus, TargetSnapshot};

/// Count and uniqueness gate over one student's applications, evaluated
/// against a snapshot of their records fetched in the current transaction
/// scope.
#[derive(Debug, Clone)]
pub struct ApplicationLedger {
    applications: Vec<Application>,
    institution_limit: u32,
}

/// Violations reported by [`ApplicationLedger::can_submit`], in the fixed
/// evaluation order duplicate → quota → conflicting admission so error
/// reporting stays deterministic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerViolation {
    #[error("student already has an active application for this target")]
    DuplicateApplication,
    #[error("student already holds {limit} applications to this institution")]
    InstitutionQuotaExceeded { limit: u32 },
    #[error("student already holds an admitted application and must confirm a choice first")]
    ConflictingAdmission,
}

/// Per-status application counts for dashboards and stats endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl ApplicationLedger {
    pub fn new(applications: Vec<Application>, institution_limit: u32) -> Self {
        Self {
            applications,
            institution_limit,
        }
    }

    /// Gate a new submission for `target`.
    pub fn can_submit(&self, target: &TargetSnapshot) -> Result<(), LedgerViolation> {
        let duplicate = self.applications.iter().any(|application| {
            &application.target_id == target.target_id() && !application.status.is_terminal()
        });
        if duplicate {
            return Err(LedgerViolation::DuplicateApplication);
        }

        // Withdrawn applications release their institution slot; every other
        // status, terminal or not, keeps counting against the quota.
        let institution_count = self
            .applications
            .iter()
            .filter(|application| {
                application.institution_id == target.institution_id
                    && application.status != ApplicationStatus::Withdrawn
            })
            .count();
        if institution_count >= self.institution_limit as usize {
            return Err(LedgerViolation::InstitutionQuotaExceeded {
                limit: self.institution_limit,
            });
        }

        let already_admitted = self
            .applications
            .iter()
            .any(|application| application.status == ApplicationStatus::Admitted);
        if already_admitted {
            return Err(LedgerViolation::ConflictingAdmission);
        }

        Ok(())
    }

    /// Applications currently holding admitted status.
    pub fn admitted(&self) -> Vec<&Application> {
        self.applications
            .iter()
            .filter(|application| application.status == ApplicationStatus::Admitted)
            .collect()
    }

    /// Summary counts grouped by status label.
    pub fn tally(&self) -> StatusTally {
        let mut tally = StatusTally::default();
        for application in &self.applications {
            tally.total += 1;
            *tally
                .by_status
                .entry(application.status.label().to_string())
                .or_insert(0) += 1;
        }
        tally
    }
}
