//! Notification side-effect requests.
//!
//! Engine operations never deliver notifications themselves; they return
//! these requests for the caller to hand to its delivery channel. A failed
//! delivery must never roll back a committed state transition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matching::domain::StudentId;

/// Template-style notification categories mirrored by the delivery layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ApplicationReceived,
    Waitlisted,
    AdmissionOffer,
    WaitlistPromotion,
    MultipleAdmissions,
    ChoiceConfirmed,
    JobRecommendation,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::ApplicationReceived => "application_received",
            NotificationKind::Waitlisted => "waitlisted",
            NotificationKind::AdmissionOffer => "admission_offer",
            NotificationKind::WaitlistPromotion => "waitlist_promotion",
            NotificationKind::MultipleAdmissions => "multiple_admissions",
            NotificationKind::ChoiceConfirmed => "choice_confirmed",
            NotificationKind::JobRecommendation => "job_recommendation",
        }
    }
}

/// A single fire-and-forget delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: StudentId,
    pub kind: NotificationKind,
    pub payload: BTreeMap<String, String>,
}

impl NotificationRequest {
    pub fn new(user_id: StudentId, kind: NotificationKind) -> Self {
        Self {
            user_id,
            kind,
            payload: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Body handed to the notification service, with the kind flattened to
    /// its template label.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id.0,
            "template": self.kind.label(),
            "payload": self.payload,
        })
    }
}
