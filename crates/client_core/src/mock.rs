//! In-memory stand-in for the Sequence API backend. Serves the canned
//! book behind the mock variant of the dashboard and enforces the
//! server-side rules the HTTP client only tolerates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use shared::{
    domain::{BorrowerId, CallOutcome, DealerId, EnrollmentId, EnrollmentStatus, TouchChannel},
    error::ErrorBody,
    protocol::{CreateEnrollmentPayload, Enrollment, ReasonPayload, TimelineEvent},
};
use tokio::sync::Mutex;

use crate::{ApiError, Result, SequenceApi};

pub struct MockSequenceApi {
    inner: Mutex<MockBook>,
}

struct MockBook {
    enrollments: Vec<Enrollment>,
    timelines: HashMap<EnrollmentId, Vec<TimelineEvent>>,
    next_id: u32,
}

enum AdminAction {
    Suppress,
    Escalate,
}

impl MockSequenceApi {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockBook::empty()),
        }
    }

    /// A small book with one enrollment per status and a filled-in
    /// activity log for each.
    pub fn seeded() -> Self {
        let mut book = MockBook::empty();
        book.seed();
        Self {
            inner: Mutex::new(book),
        }
    }
}

impl Default for MockSequenceApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBook {
    fn empty() -> Self {
        Self {
            enrollments: Vec::new(),
            timelines: HashMap::new(),
            next_id: 1,
        }
    }

    fn seed(&mut self) {
        let now = Utc::now();

        let active = Enrollment {
            id: EnrollmentId::new("enr_0001"),
            borrower_id: BorrowerId::new("bor_4417"),
            dealer_id: DealerId::new("dlr_021"),
            status: EnrollmentStatus::Active,
            current_day: 4,
            created_at: now - Duration::days(4),
            updated_at: now - Duration::hours(2),
            next_action_at: Some(now + Duration::days(1)),
            payment_posted_at: None,
            suppress_reason: None,
            escalate_reason: None,
            phone: Some("+15555550144".into()),
            email: Some("m.reyes@example.com".into()),
            vehicle: Some("2018 Civic".into()),
            amount_due: Some(384.20),
        };
        self.insert(
            active,
            vec![
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Sms,
                    day: 1,
                    sent_at: now - Duration::days(3),
                },
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Email,
                    day: 2,
                    sent_at: now - Duration::days(2),
                },
                TimelineEvent::CallCompleted {
                    day: 3,
                    started_at: now - Duration::days(1),
                    ended_at: now - Duration::days(1) + Duration::minutes(1),
                    outcome: CallOutcome::NoAnswer,
                    transfer_reason: None,
                    notes: None,
                    intent_date: None,
                },
                TimelineEvent::CallCompleted {
                    day: 4,
                    started_at: now - Duration::hours(2),
                    ended_at: now - Duration::hours(2) + Duration::minutes(6),
                    outcome: CallOutcome::PromiseToPay,
                    transfer_reason: None,
                    notes: Some("will pay after the 15th".into()),
                    intent_date: Some((now + Duration::days(5)).date_naive()),
                },
            ],
        );

        let paid = Enrollment {
            id: EnrollmentId::new("enr_0002"),
            borrower_id: BorrowerId::new("bor_1029"),
            dealer_id: DealerId::new("dlr_021"),
            status: EnrollmentStatus::PaidExit,
            current_day: 6,
            created_at: now - Duration::days(8),
            updated_at: now - Duration::days(1),
            next_action_at: None,
            payment_posted_at: Some(now - Duration::days(1)),
            suppress_reason: None,
            escalate_reason: None,
            phone: Some("+15555550177".into()),
            email: None,
            vehicle: Some("2021 Elantra".into()),
            amount_due: None,
        };
        self.insert(
            paid,
            vec![
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Sms,
                    day: 1,
                    sent_at: now - Duration::days(7),
                },
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Call,
                    day: 4,
                    sent_at: now - Duration::days(4),
                },
                TimelineEvent::PaymentPosted {
                    posted_at: now - Duration::days(1),
                    amount: 412.55,
                },
            ],
        );

        let escalated = Enrollment {
            id: EnrollmentId::new("enr_0003"),
            borrower_id: BorrowerId::new("bor_8854"),
            dealer_id: DealerId::new("dlr_009"),
            status: EnrollmentStatus::Escalated,
            current_day: 11,
            created_at: now - Duration::days(12),
            updated_at: now - Duration::days(1),
            next_action_at: None,
            payment_posted_at: None,
            suppress_reason: None,
            escalate_reason: Some("no contact after day 10".into()),
            phone: Some("+15555550191".into()),
            email: None,
            vehicle: None,
            amount_due: Some(711.08),
        };
        self.insert(
            escalated,
            vec![
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Push,
                    day: 2,
                    sent_at: now - Duration::days(10),
                },
                TimelineEvent::CallCompleted {
                    day: 7,
                    started_at: now - Duration::days(5),
                    ended_at: now - Duration::days(5) + Duration::minutes(11),
                    outcome: CallOutcome::Transferred,
                    transfer_reason: Some("hardship review".into()),
                    notes: Some("asked for a payment plan".into()),
                    intent_date: None,
                },
                TimelineEvent::Escalated {
                    escalated_at: now - Duration::days(1),
                    reason: "no contact after day 10".into(),
                },
            ],
        );

        let suppressed = Enrollment {
            id: EnrollmentId::new("enr_0004"),
            borrower_id: BorrowerId::new("bor_3302"),
            dealer_id: DealerId::new("dlr_034"),
            status: EnrollmentStatus::Suppressed,
            current_day: 2,
            created_at: now - Duration::days(3),
            updated_at: now - Duration::hours(5),
            next_action_at: None,
            payment_posted_at: None,
            suppress_reason: Some("bankruptcy filing".into()),
            escalate_reason: None,
            phone: Some("+15555550108".into()),
            email: None,
            vehicle: Some("2016 Altima".into()),
            amount_due: Some(523.90),
        };
        self.insert(
            suppressed,
            vec![
                TimelineEvent::TouchSent {
                    channel: TouchChannel::Sms,
                    day: 1,
                    sent_at: now - Duration::days(2),
                },
                TimelineEvent::Suppressed {
                    suppressed_at: now - Duration::hours(5),
                    reason: "bankruptcy filing".into(),
                },
            ],
        );

        self.next_id = 5;
    }

    fn insert(&mut self, enrollment: Enrollment, timeline: Vec<TimelineEvent>) {
        self.timelines.insert(enrollment.id.clone(), timeline);
        self.enrollments.push(enrollment);
    }

    fn transition(
        &mut self,
        id: &EnrollmentId,
        action: AdminAction,
        reason: &str,
    ) -> Result<Enrollment> {
        let Some(enrollment) = self.enrollments.iter_mut().find(|e| &e.id == id) else {
            return Err(not_found());
        };
        if enrollment.status.is_terminal() {
            return Err(ApiError::http(409, error_body("enrollment is not active")));
        }

        let now = Utc::now();
        enrollment.updated_at = now;
        enrollment.next_action_at = None;
        let event = match action {
            AdminAction::Suppress => {
                enrollment.status = EnrollmentStatus::Suppressed;
                enrollment.suppress_reason = Some(reason.to_string());
                TimelineEvent::Suppressed {
                    suppressed_at: now,
                    reason: reason.to_string(),
                }
            }
            AdminAction::Escalate => {
                enrollment.status = EnrollmentStatus::Escalated;
                enrollment.escalate_reason = Some(reason.to_string());
                TimelineEvent::Escalated {
                    escalated_at: now,
                    reason: reason.to_string(),
                }
            }
        };
        let snapshot = enrollment.clone();
        self.timelines.entry(id.clone()).or_default().push(event);
        Ok(snapshot)
    }
}

fn not_found() -> ApiError {
    ApiError::http(404, error_body("enrollment not found"))
}

fn error_body(message: &str) -> Option<Value> {
    serde_json::to_value(ErrorBody::new(message)).ok()
}

#[async_trait]
impl SequenceApi for MockSequenceApi {
    async fn list_enrollments(&self, status: EnrollmentStatus) -> Result<Vec<Enrollment>> {
        let book = self.inner.lock().await;
        Ok(book
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.status == status)
            .cloned()
            .collect())
    }

    async fn create_enrollment(&self, payload: &CreateEnrollmentPayload) -> Result<Enrollment> {
        let mut book = self.inner.lock().await;
        let now = Utc::now();
        let id = EnrollmentId(format!("enr_{:04}", book.next_id));
        book.next_id += 1;
        let enrollment = Enrollment {
            id: id.clone(),
            borrower_id: payload.borrower_id.clone(),
            dealer_id: payload.dealer_id.clone(),
            status: EnrollmentStatus::Active,
            current_day: 0,
            created_at: now,
            updated_at: now,
            next_action_at: Some(now + Duration::days(1)),
            payment_posted_at: None,
            suppress_reason: None,
            escalate_reason: None,
            phone: Some(payload.phone.clone()),
            email: payload.email.clone(),
            vehicle: payload.vehicle.clone(),
            amount_due: payload.amount_due,
        };
        book.insert(enrollment.clone(), Vec::new());
        Ok(enrollment)
    }

    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        let book = self.inner.lock().await;
        book.enrollments
            .iter()
            .find(|enrollment| &enrollment.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn get_timeline(&self, id: &EnrollmentId) -> Result<Vec<TimelineEvent>> {
        let book = self.inner.lock().await;
        book.timelines.get(id).cloned().ok_or_else(not_found)
    }

    async fn suppress_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        let mut book = self.inner.lock().await;
        book.transition(id, AdminAction::Suppress, &payload.reason)
    }

    async fn escalate_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        let mut book = self.inner.lock().await;
        book.transition(id, AdminAction::Escalate, &payload.reason)
    }
}

#[cfg(test)]
#[path = "tests/mock_tests.rs"]
mod tests;
