use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Application, ApplicationId, ApplicationStatus};
use super::engine::{AllocationEngine, AllocationError};
use super::ledger::ApplicationLedger;
use super::repository::{
    ApplicationQuery, ApplicationStore, CandidateDirectory, StatusChange, TargetCatalog,
};
use crate::matching::domain::{StudentId, TargetId};
use crate::notify::{NotificationKind, NotificationRequest};

/// Reason recorded on every admission displaced by a confirmed choice.
pub const SUPERSEDED_REASON: &str = "superseded by student selection";

/// Result of confirming a final admission choice.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub confirmed: Application,
    pub rejected: Vec<Application>,
    /// Waitlist entries promoted into the seats the rejections vacated.
    pub promotions: Vec<Application>,
    /// Targets whose backfill promotion failed; their seat stays free and a
    /// later `promote_next` on the target fills it.
    pub promotion_failures: Vec<TargetId>,
    pub notifications: Vec<NotificationRequest>,
}

/// Enforces admission exclusivity: when a student confirms one admission,
/// every competing admitted application is rejected in a single atomic batch
/// and each vacated seat drives exactly one waitlist promotion.
pub struct AdmissionArbiter<D, C, S> {
    engine: Arc<AllocationEngine<D, C, S>>,
}

impl<D, C, S> AdmissionArbiter<D, C, S>
where
    D: CandidateDirectory + 'static,
    C: TargetCatalog + 'static,
    S: ApplicationStore + 'static,
{
    pub fn new(engine: Arc<AllocationEngine<D, C, S>>) -> Self {
        Self { engine }
    }

    /// Confirm `chosen_id` as the student's final admission.
    ///
    /// The rejections are applied all-or-nothing: a failed transaction
    /// leaves every admission exactly as it was, never a partial rejection.
    /// Once the batch has committed, the backfill promotions are side
    /// effects like notifications: one target failing to promote never
    /// skips the remaining targets, it is reported in the outcome instead.
    pub fn confirm_choice(
        &self,
        student_id: &StudentId,
        chosen_id: &ApplicationId,
    ) -> Result<ConfirmOutcome, AllocationError> {
        let store = self.engine.store();

        let chosen = store
            .fetch(chosen_id)?
            .ok_or(AllocationError::InvalidSelection)?;
        if &chosen.student_id != student_id || chosen.status != ApplicationStatus::Admitted {
            return Err(AllocationError::InvalidSelection);
        }

        let applications = store.list(&ApplicationQuery::for_student(student_id.clone()))?;
        let ledger = ApplicationLedger::new(
            applications,
            self.engine.settings().institution_application_limit,
        );
        let displaced: Vec<Application> = ledger
            .admitted()
            .into_iter()
            .filter(|application| application.id != *chosen_id)
            .cloned()
            .collect();

        if !displaced.is_empty() {
            let changes: Vec<StatusChange> = displaced
                .iter()
                .map(|application| {
                    StatusChange::new(
                        application.id.clone(),
                        ApplicationStatus::Admitted,
                        ApplicationStatus::Rejected,
                    )
                    .with_reason(SUPERSEDED_REASON)
                })
                .collect();

            self.engine.with_retry("confirm_choice", || {
                store
                    .atomic_transition(&changes)
                    .map_err(AllocationError::Store)
            })?;
        }

        info!(
            student = %student_id,
            chosen = %chosen_id,
            displaced = displaced.len(),
            "admission choice confirmed"
        );

        let mut notifications = vec![NotificationRequest::new(
            student_id.clone(),
            NotificationKind::ChoiceConfirmed,
        )
        .with("application_id", chosen_id.0.clone())
        .with("target_id", chosen.target_id.0.clone())];

        let mut rejected = Vec::with_capacity(displaced.len());
        let mut promotions = Vec::new();
        let mut promotion_failures = Vec::new();
        for application in &displaced {
            let updated = store
                .fetch(&application.id)?
                .ok_or(AllocationError::Store(super::repository::StoreError::NotFound))?;
            rejected.push(updated);

            // Exactly one promotion attempt per vacated target. A lost race
            // on one target's waitlist head must not starve the others.
            match self.engine.promote_next(&application.target_id) {
                Ok(promotion) => {
                    if let Some(promoted) = promotion.promoted {
                        promotions.push(promoted);
                    }
                    notifications.extend(promotion.notifications);
                }
                Err(error) => {
                    warn!(
                        target = %application.target_id,
                        %error,
                        "waitlist backfill failed after displacement"
                    );
                    promotion_failures.push(application.target_id.clone());
                }
            }
        }

        Ok(ConfirmOutcome {
            confirmed: chosen,
            rejected,
            promotions,
            promotion_failures,
            notifications,
        })
    }
}
