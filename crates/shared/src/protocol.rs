use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BorrowerId, CallOutcome, DealerId, EnrollmentId, EnrollmentStatus, TouchChannel,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub borrower_id: BorrowerId,
    pub dealer_id: DealerId,
    pub status: EnrollmentStatus,
    pub current_day: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_posted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_due: Option<f64>,
}

/// One immutable fact from an enrollment's contact history. Events are
/// append-only server-side; the client never re-sorts what the server
/// returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TimelineEvent {
    TouchSent {
        channel: TouchChannel,
        day: u32,
        sent_at: DateTime<Utc>,
    },
    CallCompleted {
        day: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        outcome: CallOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transfer_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent_date: Option<NaiveDate>,
    },
    PaymentPosted {
        posted_at: DateTime<Utc>,
        amount: f64,
    },
    Escalated {
        escalated_at: DateTime<Utc>,
        reason: String,
    },
    Suppressed {
        suppressed_at: DateTime<Utc>,
        reason: String,
    },
}

impl TimelineEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::TouchSent { sent_at, .. } => *sent_at,
            Self::CallCompleted { started_at, .. } => *started_at,
            Self::PaymentPosted { posted_at, .. } => *posted_at,
            Self::Escalated { escalated_at, .. } => *escalated_at,
            Self::Suppressed { suppressed_at, .. } => *suppressed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentPayload {
    pub borrower_id: BorrowerId,
    pub dealer_id: DealerId,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_due: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonPayload {
    pub reason: String,
}

impl ReasonPayload {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
