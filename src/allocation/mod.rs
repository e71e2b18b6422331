//! Capacity-constrained admission and waitlist allocation.
//!
//! The engine consumes the collaborator traits in [`repository`] and
//! produces decisions plus notification requests; it never performs side
//! effects beyond status transitions through the store.

pub mod arbiter;
pub mod domain;
pub mod engine;
pub mod ledger;
pub mod memory;
pub mod repository;

#[cfg(test)]
mod tests;

pub use arbiter::{AdmissionArbiter, ConfirmOutcome, SUPERSEDED_REASON};
pub use domain::{
    AdmissionPolicy, Application, ApplicationId, ApplicationStatus, InstitutionId, TargetSnapshot,
};
pub use engine::{
    AllocationEngine, AllocationError, DecisionOutcome, PromotionOutcome, SubmitOutcome,
};
pub use ledger::{ApplicationLedger, LedgerViolation, StatusTally};
pub use repository::{
    ApplicationQuery, ApplicationStore, CandidateDirectory, StatusChange, StoreError, TargetCatalog,
};
