//! Reference in-memory collaborators.
//!
//! These honor the full persistence contract — occupancy revalidation inside
//! `insert`, conditional all-or-nothing transitions, waitlist ordering —
//! under a single lock, which serializes operations per store the way the
//! production document store serializes per transaction scope. They back the
//! unit and integration suites and any host that wants to exercise the
//! engine without real persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use super::domain::{Application, ApplicationId, TargetSnapshot};
use super::repository::{
    ApplicationQuery, ApplicationStore, CandidateDirectory, StatusChange, StoreError, TargetCatalog,
};
use crate::matching::domain::{CandidateProfile, StudentId, TargetId};

/// In-memory [`CandidateDirectory`].
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: Mutex<HashMap<StudentId, CandidateProfile>>,
}

impl InMemoryDirectory {
    pub fn with_profiles(profiles: impl IntoIterator<Item = CandidateProfile>) -> Self {
        let directory = Self::default();
        {
            let mut guard = directory.profiles.lock().expect("directory lock");
            for profile in profiles {
                guard.insert(profile.student_id.clone(), profile);
            }
        }
        directory
    }

    pub fn upsert(&self, profile: CandidateProfile) {
        self.profiles
            .lock()
            .expect("directory lock")
            .insert(profile.student_id.clone(), profile);
    }
}

impl CandidateDirectory for InMemoryDirectory {
    fn fetch_candidate(&self, student_id: &StudentId) -> Result<CandidateProfile, StoreError> {
        self.profiles
            .lock()
            .expect("directory lock")
            .get(student_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// In-memory [`TargetCatalog`].
#[derive(Default)]
pub struct InMemoryCatalog {
    targets: Mutex<HashMap<TargetId, TargetSnapshot>>,
}

impl InMemoryCatalog {
    pub fn with_targets(targets: impl IntoIterator<Item = TargetSnapshot>) -> Self {
        let catalog = Self::default();
        {
            let mut guard = catalog.targets.lock().expect("catalog lock");
            for target in targets {
                guard.insert(target.target_id().clone(), target);
            }
        }
        catalog
    }

    pub fn upsert(&self, target: TargetSnapshot) {
        self.targets
            .lock()
            .expect("catalog lock")
            .insert(target.target_id().clone(), target);
    }
}

impl TargetCatalog for InMemoryCatalog {
    fn fetch_target(&self, target_id: &TargetId) -> Result<TargetSnapshot, StoreError> {
        self.targets
            .lock()
            .expect("catalog lock")
            .get(target_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// In-memory [`ApplicationStore`] with serializable semantics.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<ApplicationId, Application>>,
    sequence: AtomicU64,
}

impl InMemoryStore {
    fn occupancy_of(records: &HashMap<ApplicationId, Application>, target_id: &TargetId) -> usize {
        records
            .values()
            .filter(|application| {
                &application.target_id == target_id && application.status.occupies_seat()
            })
            .count()
    }

    /// All records, for invariant assertions in tests.
    pub fn snapshot(&self) -> Vec<Application> {
        let mut records: Vec<Application> = self
            .records
            .lock()
            .expect("store lock")
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.created_at, a.sequence).cmp(&(b.created_at, b.sequence)));
        records
    }
}

impl ApplicationStore for InMemoryStore {
    fn insert(
        &self,
        mut application: Application,
        expected_occupancy: usize,
    ) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store lock");

        if records.contains_key(&application.id) {
            return Err(StoreError::Conflict);
        }
        if Self::occupancy_of(&records, &application.target_id) != expected_occupancy {
            return Err(StoreError::CapacityRace {
                target_id: application.target_id.clone(),
            });
        }

        application.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        records.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.records.lock().expect("store lock").get(id).cloned())
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<Application>, StoreError> {
        let records = self.records.lock().expect("store lock");
        let mut matched: Vec<Application> = records
            .values()
            .filter(|application| query.matches(application))
            .cloned()
            .collect();
        matched.sort_by(|a, b| (a.created_at, a.sequence).cmp(&(b.created_at, b.sequence)));
        Ok(matched)
    }

    fn atomic_transition(&self, changes: &[StatusChange]) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store lock");

        // Validate the whole batch before touching anything.
        for change in changes {
            let current = records
                .get(&change.application_id)
                .ok_or(StoreError::NotFound)?;
            if current.status != change.expect || !current.status.can_transition(change.to) {
                return Err(StoreError::StaleTransition {
                    application_id: change.application_id.clone(),
                });
            }
        }

        let now = Utc::now();
        for change in changes {
            let record = records
                .get_mut(&change.application_id)
                .expect("validated above");
            record.status = change.to;
            record.updated_at = now;
            record.status_reason = change.reason.clone();
        }
        Ok(())
    }
}
