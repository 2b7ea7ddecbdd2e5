//! # Enrollment API Client
//!
//! reqwest-backed implementation of [`EnrollmentGateway`]. Every request carries
//! the current bearer credential; a missing credential fails before any request
//! is built. Non-success responses are decoded into typed errors and are never
//! retried here.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::wire::{
    extract_list, WireCompetency, WireCourse, WireEnrollment, WireOffering, WireProgress,
    WireStudent,
};
use super::EnrollmentGateway;
use crate::config::ApiEndpointConfig;
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::models::{
    BatchReassignmentRequest, Competency, CompetencyId, CompetencyProgress, Course, CourseId,
    CourseOffering, CourseRef, ProgressPayload, Student, StudentId,
};

/// Configuration for the enrollment API client
///
/// # Examples
///
/// ```rust
/// use enrollment_core::EnrollmentApiConfig;
///
/// let config = EnrollmentApiConfig::default();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// assert_eq!(config.timeout_ms, 30000);
/// assert!(config.auth_token.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct EnrollmentApiConfig {
    /// Base URL for the enrollment API, optionally with a path prefix
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer credential attached to every call
    pub auth_token: Option<String>,
}

impl Default for EnrollmentApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30000,
            auth_token: None,
        }
    }
}

impl From<&ApiEndpointConfig> for EnrollmentApiConfig {
    fn from(config: &ApiEndpointConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
            auth_token: config.auth_token.clone(),
        }
    }
}

/// HTTP client for the enrollment API
pub struct EnrollmentApiClient {
    client: Client,
    config: EnrollmentApiConfig,
    base_url: Url,
    credential: RwLock<Option<String>>,
}

impl std::fmt::Debug for EnrollmentApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("has_credential", &self.has_credential())
            .finish()
    }
}

impl EnrollmentApiClient {
    /// Create a new client, validating the base URL and building the HTTP client
    ///
    /// # Examples
    ///
    /// ```rust
    /// use enrollment_core::{EnrollmentApiClient, EnrollmentApiConfig};
    ///
    /// let client = EnrollmentApiClient::new(EnrollmentApiConfig {
    ///     base_url: "http://localhost:8080/api".to_string(),
    ///     timeout_ms: 10000,
    ///     auth_token: Some("token".to_string()),
    /// })
    /// .unwrap();
    /// assert!(client.has_credential());
    /// ```
    pub fn new(config: EnrollmentApiConfig) -> EnrollmentResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| EnrollmentError::config_error(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(EnrollmentError::config_error(format!(
                "Base URL cannot carry a path: {}",
                config.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("enrollment-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                EnrollmentError::config_error(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            auth_configured = config.auth_token.is_some(),
            "Created enrollment API client"
        );

        let credential = RwLock::new(config.auth_token.clone());
        Ok(Self {
            client,
            config,
            base_url,
            credential,
        })
    }

    /// Replace the bearer credential used for subsequent calls
    pub fn set_credential(&self, token: impl Into<String>) {
        *self.credential.write() = Some(token.into());
    }

    /// Drop the bearer credential; subsequent calls fail with an auth error
    pub fn clear_credential(&self) {
        *self.credential.write() = None;
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential
            .read()
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Get the configured base URL for debugging/logging
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Get the configured timeout for debugging/logging
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    fn bearer_token(&self) -> EnrollmentResult<String> {
        self.credential
            .read()
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| EnrollmentError::auth(None, "No credential available for request"))
    }

    fn endpoint(&self, segments: &[&str]) -> EnrollmentResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EnrollmentError::config_error("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, operation: &'static str) -> EnrollmentResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(operation, error = %e, "Transport failure calling enrollment API");
            EnrollmentError::Http(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = decode_error_response(status, &body);
        warn!(operation, status = status.as_u16(), error = %error, "Enrollment API call failed");
        Err(error)
    }

    async fn get_json(&self, segments: &[&str], operation: &'static str) -> EnrollmentResult<Value> {
        let token = self.bearer_token()?;
        let url = self.endpoint(segments)?;
        debug!(url = %url, operation, "GET enrollment API");

        let response = self
            .send(self.client.get(url).bearer_auth(token), operation)
            .await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn put_json<B: serde::Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        operation: &'static str,
    ) -> EnrollmentResult<()> {
        let token = self.bearer_token()?;
        let url = self.endpoint(segments)?;
        debug!(url = %url, operation, "PUT enrollment API");

        self.send(self.client.put(url).bearer_auth(token).json(body), operation)
            .await?;
        Ok(())
    }
}

/// Decode a non-success response into a typed error
///
/// A JSON `message` (then `error`) string is preferred; otherwise the status
/// code and reason phrase are used. 401 and 403 become auth errors.
pub fn decode_error_response(status: StatusCode, body: &str) -> EnrollmentError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            EnrollmentError::auth(Some(status.as_u16()), message)
        }
        _ => EnrollmentError::api_error(status.as_u16(), message),
    }
}

#[async_trait]
impl EnrollmentGateway for EnrollmentApiClient {
    async fn list_students(&self) -> EnrollmentResult<Vec<Student>> {
        let payload = self.get_json(&["students"], "list_students").await?;
        extract_list(payload, &["students"], WireStudent::into_model)
    }

    async fn list_courses(&self) -> EnrollmentResult<Vec<Course>> {
        let payload = self.get_json(&["courses"], "list_courses").await?;
        extract_list(payload, &["courses"], WireCourse::into_model)
    }

    async fn list_course_offerings(&self) -> EnrollmentResult<Vec<CourseOffering>> {
        let payload = self
            .get_json(&["course-offerings"], "list_course_offerings")
            .await?;
        extract_list(
            payload,
            &["course_offerings", "offerings"],
            WireOffering::into_model,
        )
    }

    async fn list_competencies(&self) -> EnrollmentResult<Vec<Competency>> {
        let payload = self.get_json(&["competencies"], "list_competencies").await?;
        extract_list(payload, &["competencies"], WireCompetency::into_model)
    }

    async fn student_competency_progress(
        &self,
        student_id: &StudentId,
    ) -> EnrollmentResult<Vec<CompetencyProgress>> {
        let payload = self
            .get_json(
                &["students", student_id.as_str(), "competency-progress"],
                "student_competency_progress",
            )
            .await?;
        extract_list(
            payload,
            &["competency_progress", "progress"],
            WireProgress::into_model,
        )
    }

    async fn student_enrollments(
        &self,
        student_id: &StudentId,
    ) -> EnrollmentResult<Vec<CourseRef>> {
        let payload = self
            .get_json(
                &["students", student_id.as_str(), "enrollments"],
                "student_enrollments",
            )
            .await?;
        extract_list(payload, &["enrollments"], WireEnrollment::into_model)
    }

    async fn course_competencies(&self, course_id: &CourseId) -> EnrollmentResult<Vec<Competency>> {
        let payload = self
            .get_json(
                &["courses", course_id.as_str(), "competencies"],
                "course_competencies",
            )
            .await?;
        extract_list(
            payload,
            &["competencies", "course_competencies"],
            WireCompetency::into_model,
        )
    }

    async fn reassign_batch(&self, request: &BatchReassignmentRequest) -> EnrollmentResult<()> {
        self.put_json(&["students", "batch-reassign"], request, "reassign_batch")
            .await?;
        info!(
            students = request.student_ids.len(),
            batch = %request.new_batch_identifier,
            "Submitted batch reassignment"
        );
        Ok(())
    }

    async fn upsert_competency_progress(
        &self,
        student_id: &StudentId,
        competency_id: &CompetencyId,
        payload: &ProgressPayload,
    ) -> EnrollmentResult<()> {
        self.put_json(
            &[
                "students",
                student_id.as_str(),
                "competency-progress",
                competency_id.as_str(),
            ],
            payload,
            "upsert_competency_progress",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_prefers_message_then_error() {
        let err = decode_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Batch is closed", "error": "ignored"}"#,
        );
        assert!(matches!(err, EnrollmentError::Api { status: 400, ref message } if message == "Batch is closed"));

        let err = decode_error_response(StatusCode::NOT_FOUND, r#"{"error": "No such student"}"#);
        assert!(matches!(err, EnrollmentError::Api { status: 404, ref message } if message == "No such student"));
    }

    #[test]
    fn test_decode_falls_back_to_status_text() {
        let err = decode_error_response(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert!(err.is_transport());
        assert!(matches!(err, EnrollmentError::Api { ref message, .. } if message == "502 Bad Gateway"));
    }

    #[test]
    fn test_decode_distinguishes_auth_statuses() {
        let err = decode_error_response(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, EnrollmentError::Auth { status: Some(401), .. }));

        let err = decode_error_response(StatusCode::FORBIDDEN, r#"{"message": "Admins only"}"#);
        assert!(matches!(err, EnrollmentError::Auth { status: Some(403), ref message } if message == "Admins only"));
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_escapes_ids() {
        let client = EnrollmentApiClient::new(EnrollmentApiConfig {
            base_url: "http://localhost:8080/api/v1".to_string(),
            ..Default::default()
        })
        .unwrap();

        let url = client
            .endpoint(&["students", "a b/c", "competency-progress"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/students/a%20b%2Fc/competency-progress"
        );
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let err = EnrollmentApiClient::new(EnrollmentApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, EnrollmentError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let client = EnrollmentApiClient::new(EnrollmentApiConfig {
            // Nothing listens here; the call must fail before connecting.
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = client.list_students().await.unwrap_err();
        assert!(matches!(err, EnrollmentError::Auth { status: None, .. }));
    }

    #[test]
    fn test_credential_can_be_swapped() {
        let client = EnrollmentApiClient::new(EnrollmentApiConfig::default()).unwrap();
        assert!(!client.has_credential());
        client.set_credential("abc");
        assert!(client.has_credential());
        client.clear_credential();
        assert!(!client.has_credential());
    }
}
