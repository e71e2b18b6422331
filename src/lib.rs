//! Matching and seat-allocation engine for an admissions and job-placement
//! platform.
//!
//! The crate scores candidates against course or job requirements, gates
//! applications through hard eligibility and per-institution quota checks,
//! and drives the capacity-constrained admission/waitlist state machine.
//! Persistence, authentication, and notification delivery stay behind the
//! collaborator traits in [`allocation::repository`]; engine operations
//! return [`notify::NotificationRequest`] values for the caller to deliver.

pub mod allocation;
pub mod config;
pub mod matching;
pub mod notify;
pub mod telemetry;
