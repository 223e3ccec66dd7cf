//! REST client for the reservation backend
//!
//! Every call is raced against a [`CancellationToken`] owned by the view
//! that issued it. A cancelled call resolves to the caller's fallback value
//! instead of an error, so torn-down views never surface anything.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use seatwise_common::format::{format_student_date, format_student_time};
use seatwise_common::{
    ClientConfig, Course, CourseId, CoursePayload, Envelope, SeatRequest, Student, StudentId,
    StudentPayload, StudentQuery, StudentStatus, StudentStatusUpdate,
};

/// Errors surfaced by the API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with `{ "error": message }`
    #[error("{0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Format(#[from] seatwise_common::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Client for the reservation REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.url(path))
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request and unwrap the `{ data }` envelope.
    ///
    /// `on_cancel` is returned as-is when `token` fires first.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &CancellationToken,
        on_cancel: Option<T>,
    ) -> ApiResult<Option<T>> {
        let exchange = send::<T>(request);

        tokio::select! {
            biased;

            _ = token.cancelled() => {
                debug!("Request cancelled, discarding result");
                Ok(on_cancel)
            }
            result = exchange => {
                if let Err(e) = &result {
                    if !matches!(e, ApiError::Api(_)) {
                        error!("Request to {} failed: {}", self.config.base_url, e);
                    }
                }
                result
            }
        }
    }

    // Student operations

    /// List reservations, optionally filtered by date or mobile number
    pub async fn list_students(
        &self,
        query: &StudentQuery,
        token: &CancellationToken,
    ) -> ApiResult<Vec<Student>> {
        let request = self.request(Method::GET, "/students").query(query);
        let mut students: Vec<Student> = self
            .fetch_json(request, token, Some(Vec::new()))
            .await?
            .unwrap_or_default();

        format_student_date(&mut students)?;
        format_student_time(&mut students)?;
        Ok(students)
    }

    /// Create a reservation
    pub async fn create_student(
        &self,
        student: &StudentPayload,
        token: &CancellationToken,
    ) -> ApiResult<Option<Student>> {
        let request = self
            .request(Method::POST, "/students")
            .json(&Envelope::new(student));
        self.fetch_json(request, token, None).await
    }

    /// Replace the details of an existing reservation
    pub async fn edit_student(
        &self,
        student_id: StudentId,
        student: &StudentPayload,
        token: &CancellationToken,
    ) -> ApiResult<Option<Student>> {
        let request = self
            .request(Method::PUT, &format!("/students/{}", student_id))
            .json(&Envelope::new(student));
        self.fetch_json(request, token, None).await
    }

    /// Move a reservation to a new status
    pub async fn update_student_status(
        &self,
        student_id: StudentId,
        status: StudentStatus,
        token: &CancellationToken,
    ) -> ApiResult<Option<StudentStatusUpdate>> {
        let request = self
            .request(Method::PUT, &format!("/students/{}/status", student_id))
            .json(&Envelope::new(StudentStatusUpdate { status }));
        self.fetch_json(request, token, None).await
    }

    // Course operations

    /// List all tables, ordered by id
    pub async fn list_courses(&self, token: &CancellationToken) -> ApiResult<Vec<Course>> {
        let request = self.request(Method::GET, "/courses");
        let mut courses: Vec<Course> = self
            .fetch_json(request, token, Some(Vec::new()))
            .await?
            .unwrap_or_default();

        courses.sort_by_key(|c| c.course_id);
        Ok(courses)
    }

    /// Create a table
    pub async fn create_course(
        &self,
        course: &CoursePayload,
        token: &CancellationToken,
    ) -> ApiResult<Option<Course>> {
        let request = self
            .request(Method::POST, "/courses")
            .json(&Envelope::new(course));
        self.fetch_json(request, token, None).await
    }

    /// Seat a reservation at a table
    pub async fn seat_course(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        token: &CancellationToken,
    ) -> ApiResult<Option<Course>> {
        let request = self
            .request(Method::PUT, &format!("/courses/{}/seat", course_id))
            .json(&Envelope::new(SeatRequest { student_id }));
        self.fetch_json(request, token, None).await
    }

    /// Release a table
    pub async fn finish_course(
        &self,
        course_id: CourseId,
        token: &CancellationToken,
    ) -> ApiResult<Option<Course>> {
        let request = self.request(Method::DELETE, &format!("/courses/{}/seat", course_id));
        self.fetch_json(request, token, None).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<Option<T>> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    decode_payload(status, &body)
}

/// Interpret a response body.
///
/// `204` is a null result, an `error` field is a rejection carrying its
/// message whatever the status, otherwise `data` is the result.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> ApiResult<Option<T>> {
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidResponse(format!("{} (status {})", e, status)))?;

    match payload.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(Value::String(message)) if message.is_empty() => {}
        Some(Value::String(message)) => return Err(ApiError::Api(message.clone())),
        Some(other) => return Err(ApiError::Api(other.to_string())),
    }

    match payload.get("data") {
        None | Some(Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| ApiError::InvalidResponse(e.to_string())),
    }
}
