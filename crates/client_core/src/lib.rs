use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{EnrollmentId, EnrollmentStatus},
    protocol::{CreateEnrollmentPayload, Enrollment, ReasonPayload, TimelineEvent},
};
use tracing::warn;

pub mod error;
pub mod mock;

mod envelope;

pub use error::ApiError;
pub use mock::MockSequenceApi;

pub type Result<T> = std::result::Result<T, ApiError>;

const ENROLLMENT_OBJECT_EXPECTED: &str = "Expected enrollment object from API";

/// The six Sequence API operations, behind a trait so views and tests can
/// run against either the HTTP client or the mock backend.
#[async_trait]
pub trait SequenceApi: Send + Sync {
    async fn list_enrollments(&self, status: EnrollmentStatus) -> Result<Vec<Enrollment>>;
    async fn create_enrollment(&self, payload: &CreateEnrollmentPayload) -> Result<Enrollment>;
    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment>;
    async fn get_timeline(&self, id: &EnrollmentId) -> Result<Vec<TimelineEvent>>;
    async fn suppress_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment>;
    async fn escalate_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment>;
}

pub struct SequenceClient {
    http: Client,
    base_url: String,
}

impl SequenceClient {
    /// Base URL is injected here, never read from ambient state; a
    /// trailing slash is stripped so path building stays uniform.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One HTTP exchange: send, read the body as text, parse leniently.
    /// Non-2xx statuses always become `ApiError::Http`, whatever the body
    /// looked like.
    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let payload = error::parse_body(&text);
        if !status.is_success() {
            warn!(status = status.as_u16(), "sequence api request failed");
            return Err(ApiError::http(status.as_u16(), payload));
        }
        Ok(payload)
    }

    async fn fetch_enrollment(&self, request: RequestBuilder) -> Result<Enrollment> {
        let body = self.execute(request).await?;
        let Some(body) = body else {
            return Err(ApiError::malformed(ENROLLMENT_OBJECT_EXPECTED, None));
        };
        decode(&body, ENROLLMENT_OBJECT_EXPECTED)
    }

    async fn list_enrollments_impl(&self, status: EnrollmentStatus) -> Result<Vec<Enrollment>> {
        let request = self
            .http
            .get(format!("{}/api/enrollments", self.base_url))
            .query(&[("status", status.as_str())]);
        let body = self.execute(request).await?;
        let envelope = &envelope::ENROLLMENT_LIST;
        let Some(items) = body.as_ref().and_then(|body| envelope.extract(body)) else {
            warn!(
                status = status.as_str(),
                "enrollment list body matched no accepted envelope"
            );
            return Err(ApiError::malformed(envelope.expected, body));
        };
        decode(items, envelope.expected)
    }

    async fn create_enrollment_impl(&self, payload: &CreateEnrollmentPayload) -> Result<Enrollment> {
        let request = self
            .http
            .post(format!("{}/api/enrollments", self.base_url))
            .json(payload);
        self.fetch_enrollment(request).await
    }

    async fn get_enrollment_impl(&self, id: &EnrollmentId) -> Result<Enrollment> {
        let request = self
            .http
            .get(format!("{}/api/enrollments/{}", self.base_url, id.0));
        self.fetch_enrollment(request).await
    }

    async fn get_timeline_impl(&self, id: &EnrollmentId) -> Result<Vec<TimelineEvent>> {
        let request = self
            .http
            .get(format!("{}/api/enrollments/{}/timeline", self.base_url, id.0));
        let body = self.execute(request).await?;
        let envelope = &envelope::TIMELINE;
        let Some(events) = body.as_ref().and_then(|body| envelope.extract(body)) else {
            warn!(enrollment_id = %id.0, "timeline body matched no accepted envelope");
            return Err(ApiError::malformed(envelope.expected, body));
        };
        decode(events, envelope.expected)
    }

    async fn suppress_enrollment_impl(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        let request = self
            .http
            .post(format!("{}/api/enrollments/{}/suppress", self.base_url, id.0))
            .json(payload);
        self.fetch_enrollment(request).await
    }

    async fn escalate_enrollment_impl(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        let request = self
            .http
            .post(format!("{}/api/enrollments/{}/escalate", self.base_url, id.0))
            .json(payload);
        self.fetch_enrollment(request).await
    }
}

fn decode<T: DeserializeOwned>(value: &Value, expected: &'static str) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|_| ApiError::malformed(expected, Some(value.clone())))
}

#[async_trait]
impl SequenceApi for SequenceClient {
    async fn list_enrollments(&self, status: EnrollmentStatus) -> Result<Vec<Enrollment>> {
        self.list_enrollments_impl(status).await
    }

    async fn create_enrollment(&self, payload: &CreateEnrollmentPayload) -> Result<Enrollment> {
        self.create_enrollment_impl(payload).await
    }

    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.get_enrollment_impl(id).await
    }

    async fn get_timeline(&self, id: &EnrollmentId) -> Result<Vec<TimelineEvent>> {
        self.get_timeline_impl(id).await
    }

    async fn suppress_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        self.suppress_enrollment_impl(id, payload).await
    }

    async fn escalate_enrollment(
        &self,
        id: &EnrollmentId,
        payload: &ReasonPayload,
    ) -> Result<Enrollment> {
        self.escalate_enrollment_impl(id, payload).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
