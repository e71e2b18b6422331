use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, TargetSnapshot,
};
use super::ledger::{ApplicationLedger, LedgerViolation};
use super::repository::{
    ApplicationQuery, ApplicationStore, CandidateDirectory, StatusChange, StoreError, TargetCatalog,
};
use crate::config::AllocationSettings;
use crate::matching::domain::{StudentId, TargetId};
use crate::matching::eligibility::RequirementChecker;
use crate::matching::score::{MatchScore, ScoreCalculator};
use crate::notify::{NotificationKind, NotificationRequest};

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub application: Application,
    pub score: MatchScore,
    pub notifications: Vec<NotificationRequest>,
}

/// Outcome of an institution or student decision on an existing application.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub application: Application,
    /// Waitlist entry promoted into the vacated seat, if any.
    pub promoted: Option<Application>,
    pub notifications: Vec<NotificationRequest>,
}

/// Outcome of a waitlist promotion attempt.
#[derive(Debug, Clone, Default)]
pub struct PromotionOutcome {
    pub promoted: Option<Application>,
    pub notifications: Vec<NotificationRequest>,
}

/// Errors raised by the allocation engine and arbiter.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("candidate does not meet hard requirements: {}", reasons.join("; "))]
    Ineligible { reasons: Vec<String> },
    #[error(transparent)]
    Ledger(#[from] LedgerViolation),
    #[error("lost the capacity check race for target {target_id}")]
    CapacityRaceLost { target_id: TargetId },
    #[error("selection is not an admitted application owned by the student")]
    InvalidSelection,
    #[error("application does not belong to the requesting student")]
    ForeignApplication,
    #[error("transition rejected: {from} -> {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("atomic transition failed after {attempts} attempt(s)")]
    TransactionAborted {
        attempts: u32,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Orchestrates the eligibility gate, ledger checks, and the
/// capacity-constrained admission/waitlist state machine. Holds no mutable
/// state of its own; every count is recomputed from the store.
pub struct AllocationEngine<D, C, S> {
    directory: Arc<D>,
    catalog: Arc<C>,
    store: Arc<S>,
    checker: RequirementChecker,
    calculator: ScoreCalculator,
    settings: AllocationSettings,
}

impl<D, C, S> AllocationEngine<D, C, S>
where
    D: CandidateDirectory + 'static,
    C: TargetCatalog + 'static,
    S: ApplicationStore + 'static,
{
    pub fn new(
        directory: Arc<D>,
        catalog: Arc<C>,
        store: Arc<S>,
        calculator: ScoreCalculator,
        settings: AllocationSettings,
    ) -> Self {
        Self {
            directory,
            catalog,
            store,
            checker: RequirementChecker::new(),
            calculator,
            settings,
        }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn settings(&self) -> &AllocationSettings {
        &self.settings
    }

    /// Submit a new application for `student_id` to `target_id`.
    ///
    /// Runs the hard eligibility gate first (no record is created for an
    /// ineligible candidate), then the ledger gates, then the capacity
    /// decision. The insert is conditional on the occupancy the engine
    /// observed; if a concurrent submission wins that check the call fails
    /// with [`AllocationError::CapacityRaceLost`] and the caller retries.
    pub fn submit(
        &self,
        student_id: &StudentId,
        target_id: &TargetId,
        priority: u8,
    ) -> Result<SubmitOutcome, AllocationError> {
        let candidate = self.directory.fetch_candidate(student_id)?;
        let target = self.catalog.fetch_target(target_id)?;

        let report = self.checker.check(&candidate, &target.posting.requirement);
        if !report.is_eligible() {
            debug!(
                student = %student_id,
                target = %target_id,
                failures = report.failures.len(),
                "submission rejected by eligibility gate"
            );
            return Err(AllocationError::Ineligible {
                reasons: report.reasons(),
            });
        }

        let score = self.calculator.score(&candidate, &target.posting);

        let application = self.with_retry("submit", || {
            let existing = self
                .store
                .list(&ApplicationQuery::for_student(student_id.clone()))?;
            let ledger =
                ApplicationLedger::new(existing, self.settings.institution_application_limit);
            ledger.can_submit(&target)?;

            let occupancy = self.occupancy(&target)?;
            let status = if occupancy < target.capacity as usize {
                match target.policy {
                    super::domain::AdmissionPolicy::AutoAdmit => ApplicationStatus::Admitted,
                    super::domain::AdmissionPolicy::ManualReview => ApplicationStatus::Pending,
                }
            } else {
                ApplicationStatus::Waiting
            };

            let now = Utc::now();
            let application = Application {
                id: next_application_id(),
                student_id: student_id.clone(),
                target_id: target_id.clone(),
                institution_id: target.institution_id.clone(),
                status,
                priority,
                created_at: now,
                updated_at: now,
                sequence: 0,
                status_reason: None,
            };

            self.store
                .insert(application, occupancy)
                .map_err(|error| match error {
                    StoreError::CapacityRace { target_id } => {
                        AllocationError::CapacityRaceLost { target_id }
                    }
                    other => AllocationError::Store(other),
                })
        })?;

        info!(
            application = %application.id,
            student = %student_id,
            target = %target_id,
            status = %application.status,
            score = score.total,
            "application submitted"
        );

        let notification_kind = match application.status {
            ApplicationStatus::Admitted => NotificationKind::AdmissionOffer,
            ApplicationStatus::Waiting => NotificationKind::Waitlisted,
            _ => NotificationKind::ApplicationReceived,
        };
        let notifications = vec![NotificationRequest::new(
            student_id.clone(),
            notification_kind,
        )
        .with("application_id", application.id.0.clone())
        .with("target_id", target_id.0.clone())];

        Ok(SubmitOutcome {
            application,
            score,
            notifications,
        })
    }

    /// Explicit institution decision admitting a pending application.
    ///
    /// A pending record already occupies its seat, so this never overflows
    /// capacity. When the admission is the student's second concurrent one a
    /// `MultipleAdmissions` notification is emitted so they confirm a choice.
    pub fn admit(&self, application_id: &ApplicationId) -> Result<DecisionOutcome, AllocationError> {
        let application = self.fetch_existing(application_id)?;
        if application.status != ApplicationStatus::Pending {
            return Err(AllocationError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Admitted,
            });
        }

        self.with_retry("admit", || {
            self.store
                .atomic_transition(&[StatusChange::new(
                    application_id.clone(),
                    ApplicationStatus::Pending,
                    ApplicationStatus::Admitted,
                )])
                .map_err(AllocationError::Store)
        })?;

        let application = self.fetch_existing(application_id)?;
        info!(application = %application.id, student = %application.student_id, "application admitted");

        let mut notifications = vec![NotificationRequest::new(
            application.student_id.clone(),
            NotificationKind::AdmissionOffer,
        )
        .with("application_id", application.id.0.clone())
        .with("target_id", application.target_id.0.clone())];

        let admitted = self.store.list(
            &ApplicationQuery::for_student(application.student_id.clone())
                .with_statuses(&[ApplicationStatus::Admitted]),
        )?;
        if admitted.len() > 1 {
            notifications.push(
                NotificationRequest::new(
                    application.student_id.clone(),
                    NotificationKind::MultipleAdmissions,
                )
                .with("admission_count", admitted.len().to_string()),
            );
        }

        Ok(DecisionOutcome {
            application,
            promoted: None,
            notifications,
        })
    }

    /// Institution decision rejecting a pending or waiting application.
    /// Rejecting a pending application vacates its seat and drives one
    /// waitlist promotion.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        reason: &str,
    ) -> Result<DecisionOutcome, AllocationError> {
        let application = self.fetch_existing(application_id)?;
        if !matches!(
            application.status,
            ApplicationStatus::Pending | ApplicationStatus::Waiting
        ) {
            return Err(AllocationError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Rejected,
            });
        }

        let vacates_seat = application.status.occupies_seat();
        let expect = application.status;
        self.with_retry("reject", || {
            self.store
                .atomic_transition(&[StatusChange::new(
                    application_id.clone(),
                    expect,
                    ApplicationStatus::Rejected,
                )
                .with_reason(reason)])
                .map_err(AllocationError::Store)
        })?;

        let application = self.fetch_existing(application_id)?;
        self.after_vacancy(application, vacates_seat)
    }

    /// Student withdrawal of their own pending application.
    pub fn withdraw(
        &self,
        application_id: &ApplicationId,
        student_id: &StudentId,
    ) -> Result<DecisionOutcome, AllocationError> {
        let application = self.fetch_existing(application_id)?;
        if &application.student_id != student_id {
            return Err(AllocationError::ForeignApplication);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(AllocationError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Withdrawn,
            });
        }

        self.with_retry("withdraw", || {
            self.store
                .atomic_transition(&[StatusChange::new(
                    application_id.clone(),
                    ApplicationStatus::Pending,
                    ApplicationStatus::Withdrawn,
                )
                .with_reason("withdrawn by student")])
                .map_err(AllocationError::Store)
        })?;

        let application = self.fetch_existing(application_id)?;
        self.after_vacancy(application, true)
    }

    /// Promote the earliest waiting application for `target_id` into a free
    /// seat. No-op when the waitlist is empty or every seat is still taken,
    /// so re-running after a single vacancy never promotes twice.
    pub fn promote_next(&self, target_id: &TargetId) -> Result<PromotionOutcome, AllocationError> {
        let target = self.catalog.fetch_target(target_id)?;

        let promoted = self.with_retry("promote_next", || {
            let occupancy = self.occupancy(&target)?;
            if occupancy >= target.capacity as usize {
                debug!(target = %target_id, occupancy, "no free seat; promotion skipped");
                return Ok(None);
            }

            let waitlist = self
                .store
                .list(&ApplicationQuery::waitlist(target_id.clone()))?;
            let Some(head) = waitlist.into_iter().next() else {
                return Ok(None);
            };

            self.store
                .atomic_transition(&[StatusChange::new(
                    head.id.clone(),
                    ApplicationStatus::Waiting,
                    ApplicationStatus::Admitted,
                )
                .with_reason("promoted from waiting list")])
                .map_err(|error| match error {
                    // A concurrent vacancy event already promoted this entry.
                    StoreError::StaleTransition { .. } => AllocationError::CapacityRaceLost {
                        target_id: target_id.clone(),
                    },
                    other => AllocationError::Store(other),
                })?;

            Ok(Some(head.id))
        })?;

        let Some(promoted_id) = promoted else {
            return Ok(PromotionOutcome::default());
        };

        let application = self.fetch_existing(&promoted_id)?;
        info!(
            application = %application.id,
            student = %application.student_id,
            target = %target_id,
            "promoted from waiting list"
        );

        let notifications = vec![NotificationRequest::new(
            application.student_id.clone(),
            NotificationKind::WaitlistPromotion,
        )
        .with("application_id", application.id.0.clone())
        .with("target_id", target_id.0.clone())];

        Ok(PromotionOutcome {
            promoted: Some(application),
            notifications,
        })
    }

    fn after_vacancy(
        &self,
        application: Application,
        vacated: bool,
    ) -> Result<DecisionOutcome, AllocationError> {
        let mut promoted = None;
        let mut notifications = Vec::new();

        if vacated {
            let promotion = self.promote_next(&application.target_id)?;
            promoted = promotion.promoted;
            notifications.extend(promotion.notifications);
        }

        Ok(DecisionOutcome {
            application,
            promoted,
            notifications,
        })
    }

    /// Seat occupancy derived by query, never cached.
    fn occupancy(&self, target: &TargetSnapshot) -> Result<usize, AllocationError> {
        Ok(self
            .store
            .list(&ApplicationQuery::occupants(target.target_id().clone()))?
            .len())
    }

    fn fetch_existing(&self, id: &ApplicationId) -> Result<Application, AllocationError> {
        self.store
            .fetch(id)?
            .ok_or(AllocationError::Store(StoreError::NotFound))
    }

    /// Retry wrapper for lost optimistic concurrency. Only
    /// [`StoreError::TransactionAborted`] is retried; every business-rule
    /// error is terminal for the call.
    pub(crate) fn with_retry<T>(
        &self,
        operation: &str,
        mut attempt_fn: impl FnMut() -> Result<T, AllocationError>,
    ) -> Result<T, AllocationError> {
        let attempts = self.settings.retry_attempts.max(1);
        for attempt in 1..=attempts {
            match attempt_fn() {
                Err(AllocationError::Store(StoreError::TransactionAborted(message))) => {
                    if attempt == attempts {
                        return Err(AllocationError::TransactionAborted {
                            attempts,
                            source: StoreError::TransactionAborted(message),
                        });
                    }
                    warn!(operation, attempt, "transaction aborted; retrying");
                    thread::sleep(Duration::from_millis(
                        self.settings.retry_base_delay_ms * attempt as u64,
                    ));
                }
                other => return other,
            }
        }
        unreachable!("retry loop always returns within the attempt budget")
    }
}
