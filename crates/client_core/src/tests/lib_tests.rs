use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use shared::domain::{BorrowerId, DealerId};
use tokio::{net::TcpListener, sync::Mutex};

async fn spawn_api_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn sample_enrollment(id: &str) -> Enrollment {
    Enrollment {
        id: EnrollmentId::new(id),
        borrower_id: BorrowerId::new("bor_100"),
        dealer_id: DealerId::new("dlr_7"),
        status: EnrollmentStatus::Active,
        current_day: 3,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        next_action_at: Some(Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap()),
        payment_posted_at: None,
        suppress_reason: None,
        escalate_reason: None,
        phone: Some("+15555550100".to_string()),
        email: None,
        vehicle: Some("2019 Accord".to_string()),
        amount_due: Some(412.55),
    }
}

async fn static_json(State(body): State<serde_json::Value>) -> Json<serde_json::Value> {
    Json(body)
}

async fn list_enrollments_handler(
    State(shape): State<&'static str>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    assert_eq!(params.get("status").map(String::as_str), Some("ACTIVE"));
    let items = json!([sample_enrollment("enr_1"), sample_enrollment("enr_2")]);
    let body = match shape {
        "bare" => items,
        "enrollments" => json!({ "enrollments": items }),
        "data" => json!({ "data": items }),
        _ => json!({ "foo": items }),
    };
    Json(body)
}

async fn spawn_list_server(shape: &'static str) -> String {
    let app = Router::new()
        .route("/api/enrollments", get(list_enrollments_handler))
        .with_state(shape);
    spawn_api_server(app).await
}

#[tokio::test]
async fn list_enrollments_normalizes_every_accepted_envelope() {
    let mut normalized = Vec::new();
    for shape in ["bare", "enrollments", "data"] {
        let server_url = spawn_list_server(shape).await;
        let client = SequenceClient::new(server_url);
        let enrollments = client
            .list_enrollments(EnrollmentStatus::Active)
            .await
            .expect("list");
        normalized.push(enrollments);
    }

    assert_eq!(normalized[0].len(), 2);
    assert_eq!(normalized[0][0].id, EnrollmentId::new("enr_1"));
    assert_eq!(normalized[0], normalized[1]);
    assert_eq!(normalized[1], normalized[2]);
}

#[tokio::test]
async fn list_enrollments_rejects_unrecognized_envelope() {
    let server_url = spawn_list_server("unrecognized").await;
    let client = SequenceClient::new(server_url);

    let err = client
        .list_enrollments(EnrollmentStatus::Active)
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 200);
    assert_eq!(err.to_string(), "Expected enrollments array from API");
    assert!(err.payload().is_some());
}

#[tokio::test]
async fn base_url_trailing_slash_is_stripped() {
    let server_url = spawn_list_server("bare").await;
    let client = SequenceClient::new(format!("{server_url}/"));

    assert!(!client.base_url().ends_with('/'));
    let enrollments = client
        .list_enrollments(EnrollmentStatus::Active)
        .await
        .expect("list with trailing slash configured");
    assert_eq!(enrollments.len(), 2);
}

async fn spawn_timeline_server(body: serde_json::Value) -> String {
    let app = Router::new()
        .route("/api/enrollments/:id/timeline", get(static_json))
        .with_state(body);
    spawn_api_server(app).await
}

#[tokio::test]
async fn get_timeline_accepts_empty_events_wrapper() {
    let server_url = spawn_timeline_server(json!({ "events": [] })).await;
    let client = SequenceClient::new(server_url);

    let events = client
        .get_timeline(&EnrollmentId::new("enr_1"))
        .await
        .expect("timeline");
    assert!(events.is_empty());
}

#[tokio::test]
async fn get_timeline_rejects_bare_array() {
    let server_url = spawn_timeline_server(json!([])).await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_timeline(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 200);
    assert_eq!(err.to_string(), "Expected events array from API");
}

#[tokio::test]
async fn get_timeline_decodes_tagged_events() {
    let server_url = spawn_timeline_server(json!({
        "events": [
            {
                "type": "TOUCH_SENT",
                "channel": "SMS",
                "day": 1,
                "sentAt": "2024-03-01T15:00:00Z"
            },
            {
                "type": "CALL_COMPLETED",
                "day": 3,
                "startedAt": "2024-03-03T15:00:00Z",
                "endedAt": "2024-03-03T15:06:00Z",
                "outcome": "PROMISE_TO_PAY",
                "notes": "will pay friday",
                "intentDate": "2024-03-08"
            },
            {
                "type": "PAYMENT_POSTED",
                "postedAt": "2024-03-08T12:00:00Z",
                "amount": 120.5
            }
        ]
    }))
    .await;
    let client = SequenceClient::new(server_url);

    let events = client
        .get_timeline(&EnrollmentId::new("enr_1"))
        .await
        .expect("timeline");

    assert_eq!(events.len(), 3);
    match &events[0] {
        shared::protocol::TimelineEvent::TouchSent { channel, day, .. } => {
            assert_eq!(channel.as_str(), "SMS");
            assert_eq!(*day, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match &events[1] {
        shared::protocol::TimelineEvent::CallCompleted {
            outcome,
            notes,
            intent_date,
            transfer_reason,
            ..
        } => {
            assert_eq!(outcome.as_str(), "PROMISE_TO_PAY");
            assert_eq!(notes.as_deref(), Some("will pay friday"));
            assert!(intent_date.is_some());
            assert!(transfer_reason.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

async fn spawn_error_server(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route(
        "/api/enrollments/:id",
        get(move || async move { (status, body) }),
    );
    spawn_api_server(app).await
}

#[tokio::test]
async fn http_error_prefers_server_message() {
    let server_url = spawn_error_server(StatusCode::NOT_FOUND, r#"{"message":"not found"}"#).await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_404"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 404);
    assert_eq!(err.to_string(), "not found");
}

#[tokio::test]
async fn http_error_synthesizes_message_for_empty_body() {
    let server_url = spawn_error_server(StatusCode::INTERNAL_SERVER_ERROR, "").await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 500);
    assert_eq!(err.to_string(), "Request failed (500)");
    assert!(err.payload().is_none());
}

#[tokio::test]
async fn http_error_coerces_non_string_message() {
    let server_url = spawn_error_server(StatusCode::SERVICE_UNAVAILABLE, r#"{"message":42}"#).await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 503);
    assert_eq!(err.to_string(), "42");
}

#[tokio::test]
async fn non_json_error_body_degrades_to_string_payload() {
    let server_url = spawn_error_server(StatusCode::BAD_GATEWAY, "upstream exploded").await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 502);
    assert_eq!(err.to_string(), "Request failed (502)");
    assert_eq!(
        err.payload(),
        Some(&serde_json::Value::String("upstream exploded".to_string()))
    );
}

#[tokio::test]
async fn connection_failure_reports_status_zero() {
    let client = SequenceClient::new("http://127.0.0.1:9");

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 0);
    assert!(err.payload().is_none());
}

#[derive(Clone)]
struct ActionState {
    reasons: Arc<Mutex<Vec<String>>>,
}

async fn suppress_handler(
    State(state): State<ActionState>,
    Path(id): Path<String>,
    Json(payload): Json<ReasonPayload>,
) -> Json<Enrollment> {
    state.reasons.lock().await.push(payload.reason.clone());
    let mut enrollment = sample_enrollment(&id);
    enrollment.status = EnrollmentStatus::Suppressed;
    enrollment.suppress_reason = Some(payload.reason);
    Json(enrollment)
}

async fn escalate_handler(
    State(state): State<ActionState>,
    Path(id): Path<String>,
    Json(payload): Json<ReasonPayload>,
) -> Json<Enrollment> {
    state.reasons.lock().await.push(payload.reason.clone());
    let mut enrollment = sample_enrollment(&id);
    enrollment.status = EnrollmentStatus::Escalated;
    enrollment.escalate_reason = Some(payload.reason);
    Json(enrollment)
}

#[tokio::test]
async fn suppress_and_escalate_return_server_asserted_status() {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/enrollments/:id/suppress", post(suppress_handler))
        .route("/api/enrollments/:id/escalate", post(escalate_handler))
        .with_state(ActionState {
            reasons: reasons.clone(),
        });
    let server_url = spawn_api_server(app).await;
    let client = SequenceClient::new(server_url);

    let suppressed = client
        .suppress_enrollment(
            &EnrollmentId::new("enr_1"),
            &ReasonPayload::new("debt dispute"),
        )
        .await
        .expect("suppress");
    assert_eq!(suppressed.status, EnrollmentStatus::Suppressed);
    assert_eq!(suppressed.suppress_reason.as_deref(), Some("debt dispute"));

    let escalated = client
        .escalate_enrollment(
            &EnrollmentId::new("enr_2"),
            &ReasonPayload::new("charge-off risk"),
        )
        .await
        .expect("escalate");
    assert_eq!(escalated.status, EnrollmentStatus::Escalated);

    let recorded = reasons.lock().await.clone();
    assert_eq!(
        recorded,
        vec!["debt dispute".to_string(), "charge-off risk".to_string()]
    );
}

async fn create_handler(Json(payload): Json<CreateEnrollmentPayload>) -> Json<Enrollment> {
    Json(Enrollment {
        id: EnrollmentId::new("enr_900"),
        borrower_id: payload.borrower_id,
        dealer_id: payload.dealer_id,
        status: EnrollmentStatus::Active,
        current_day: 0,
        created_at: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
        next_action_at: None,
        payment_posted_at: None,
        suppress_reason: None,
        escalate_reason: None,
        phone: Some(payload.phone),
        email: payload.email,
        vehicle: payload.vehicle,
        amount_due: payload.amount_due,
    })
}

#[tokio::test]
async fn create_enrollment_round_trips_identity_fields() {
    let app = Router::new().route("/api/enrollments", post(create_handler));
    let server_url = spawn_api_server(app).await;
    let client = SequenceClient::new(server_url);

    let payload = CreateEnrollmentPayload {
        borrower_id: BorrowerId::new("bor_77"),
        dealer_id: DealerId::new("dlr_3"),
        phone: "+15555550123".to_string(),
        email: Some("b77@example.com".to_string()),
        vehicle: None,
        amount_due: Some(250.0),
    };

    let created = client.create_enrollment(&payload).await.expect("create");

    assert_eq!(created.borrower_id, BorrowerId::new("bor_77"));
    assert_eq!(created.dealer_id, DealerId::new("dlr_3"));
    assert_eq!(created.phone.as_deref(), Some("+15555550123"));
    assert_eq!(created.status, EnrollmentStatus::Active);
}

#[tokio::test]
async fn get_enrollment_decodes_trusted_body() {
    let app = Router::new()
        .route("/api/enrollments/:id", get(static_json))
        .with_state(serde_json::to_value(sample_enrollment("enr_55")).expect("encode"));
    let server_url = spawn_api_server(app).await;
    let client = SequenceClient::new(server_url);

    let enrollment = client
        .get_enrollment(&EnrollmentId::new("enr_55"))
        .await
        .expect("get");
    assert_eq!(enrollment, sample_enrollment("enr_55"));
}

#[tokio::test]
async fn get_enrollment_reports_undecodable_body_as_shape_failure() {
    let app = Router::new()
        .route("/api/enrollments/:id", get(static_json))
        .with_state(json!({ "unexpected": true }));
    let server_url = spawn_api_server(app).await;
    let client = SequenceClient::new(server_url);

    let err = client
        .get_enrollment(&EnrollmentId::new("enr_1"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), 200);
    assert_eq!(err.to_string(), "Expected enrollment object from API");
}
