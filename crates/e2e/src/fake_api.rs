//! In-memory stand-in for the reservation REST backend
//!
//! Speaks the same `{ data }` / `{ error }` envelopes as the real service and
//! enforces the same seating rules server-side, so scenarios can check that
//! the backend stays the source of truth when the client is bypassed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::debug;

use seatwise_common::{
    Course, CourseId, CoursePayload, CourseStatus, Envelope, ErrorBody, SeatRequest, Student,
    StudentId, StudentPayload, StudentQuery, StudentStatus, StudentStatusUpdate,
};

#[derive(Debug, Default)]
struct Store {
    students: BTreeMap<StudentId, Student>,
    courses: BTreeMap<CourseId, Course>,
    next_student_id: StudentId,
    next_course_id: CourseId,
}

impl Store {
    fn insert_course(&mut self, course_name: &str, capacity: u32) -> Course {
        self.next_course_id += 1;
        let course = Course {
            course_id: self.next_course_id,
            course_name: course_name.to_string(),
            capacity,
            status: CourseStatus::Free,
            student_id: None,
        };
        self.courses.insert(course.course_id, course.clone());
        course
    }

    fn insert_student(&mut self, payload: StudentPayload) -> Student {
        self.next_student_id += 1;
        let student = Student {
            student_id: self.next_student_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            mobile_number: payload.mobile_number,
            student_date: payload.student_date,
            student_time: payload.student_time,
            people: payload.people,
            status: StudentStatus::Booked,
        };
        self.students.insert(student.student_id, student.clone());
        student
    }
}

/// Shared handle to the fake backend's state
#[derive(Clone, Default)]
pub struct FakeApi {
    store: Arc<RwLock<Store>>,
    /// Delay before every API response; `/health` is never delayed
    latency: Option<Duration>,
}

impl FakeApi {
    /// An empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with the standard dining room: two bar seats and two six-tops
    pub async fn seeded() -> Self {
        let api = Self::new();
        {
            let mut store = api.store.write().await;
            store.insert_course("Bar #1", 1);
            store.insert_course("Bar #2", 1);
            store.insert_course("#1", 6);
            store.insert_course("#2", 6);
        }
        api
    }

    /// Hold every API response for `latency`, so requests can be caught in flight
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn student(&self, student_id: StudentId) -> Option<Student> {
        self.store.read().await.students.get(&student_id).cloned()
    }

    pub async fn course(&self, course_id: CourseId) -> Option<Course> {
        self.store.read().await.courses.get(&course_id).cloned()
    }

    pub async fn course_by_name(&self, course_name: &str) -> Option<Course> {
        self.store
            .read()
            .await
            .courses
            .values()
            .find(|c| c.course_name == course_name)
            .cloned()
    }

    pub async fn student_count(&self) -> usize {
        self.store.read().await.students.len()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/students", get(list_students).post(create_student))
            .route("/students/:student_id", put(edit_student))
            .route("/students/:student_id/status", put(update_student_status))
            .route("/courses", get(list_courses).post(create_course))
            .route("/courses/:course_id/seat", put(seat_course).delete(finish_course))
            .layer(middleware::from_fn_with_state(self.clone(), slow_down))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn data<T: serde::Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(Envelope::new(value))).into_response()
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn check_payload(payload: &StudentPayload) -> Result<(), String> {
    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
        ("mobile_number", &payload.mobile_number),
        ("student_date", &payload.student_date),
        ("student_time", &payload.student_time),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{} is required", field));
        }
    }
    if payload.people < 1 {
        return Err("people must be at least 1".to_string());
    }
    Ok(())
}

async fn slow_down(State(api): State<FakeApi>, request: Request, next: Next) -> Response {
    if let Some(latency) = api.latency {
        if request.uri().path() != "/health" {
            tokio::time::sleep(latency).await;
        }
    }
    next.run(request).await
}

async fn health() -> &'static str {
    "ok"
}

async fn list_students(State(api): State<FakeApi>, Query(query): Query<StudentQuery>) -> Response {
    let store = api.store.read().await;
    let mut students: Vec<Student> = store
        .students
        .values()
        .filter(|s| match &query.date {
            Some(date) => &s.student_date == date && s.status != StudentStatus::Finished,
            None => true,
        })
        .filter(|s| match &query.mobile_number {
            Some(number) => digits(&s.mobile_number).contains(&digits(number)),
            None => true,
        })
        .cloned()
        .collect();

    if query.date.is_some() {
        students.sort_by(|a, b| a.student_time.cmp(&b.student_time));
    }
    data(StatusCode::OK, students)
}

async fn create_student(
    State(api): State<FakeApi>,
    body: Result<Json<Envelope<StudentPayload>>, JsonRejection>,
) -> Response {
    let Json(Envelope { data: payload }) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if let Err(message) = check_payload(&payload) {
        return api_error(StatusCode::BAD_REQUEST, message);
    }

    let student = api.store.write().await.insert_student(payload);
    debug!("Created student {}", student.student_id);
    data(StatusCode::CREATED, student)
}

async fn edit_student(
    State(api): State<FakeApi>,
    Path(student_id): Path<StudentId>,
    body: Result<Json<Envelope<StudentPayload>>, JsonRejection>,
) -> Response {
    let Json(Envelope { data: payload }) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if let Err(message) = check_payload(&payload) {
        return api_error(StatusCode::BAD_REQUEST, message);
    }

    let mut store = api.store.write().await;
    let Some(student) = store.students.get_mut(&student_id) else {
        return api_error(StatusCode::NOT_FOUND, format!("Student {} cannot be found.", student_id));
    };

    student.first_name = payload.first_name;
    student.last_name = payload.last_name;
    student.mobile_number = payload.mobile_number;
    student.student_date = payload.student_date;
    student.student_time = payload.student_time;
    student.people = payload.people;
    data(StatusCode::OK, student.clone())
}

#[derive(Deserialize)]
struct RawStatus {
    status: String,
}

async fn update_student_status(
    State(api): State<FakeApi>,
    Path(student_id): Path<StudentId>,
    body: Result<Json<Envelope<RawStatus>>, JsonRejection>,
) -> Response {
    let Json(Envelope { data: raw }) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let status: StudentStatus = match raw.status.parse() {
        Ok(status) => status,
        Err(_) => return api_error(StatusCode::BAD_REQUEST, format!("unknown status: {}", raw.status)),
    };

    let mut store = api.store.write().await;
    let Some(student) = store.students.get_mut(&student_id) else {
        return api_error(StatusCode::NOT_FOUND, format!("Student {} cannot be found.", student_id));
    };
    if student.status == StudentStatus::Finished {
        return api_error(StatusCode::BAD_REQUEST, "a finished student cannot be updated");
    }

    student.status = status;
    data(StatusCode::OK, StudentStatusUpdate { status })
}

async fn list_courses(State(api): State<FakeApi>) -> Response {
    // Ordered by name, like the real service; the client re-sorts by id
    let mut courses: Vec<Course> = api.store.read().await.courses.values().cloned().collect();
    courses.sort_by(|a, b| a.course_name.cmp(&b.course_name));
    data(StatusCode::OK, courses)
}

async fn create_course(
    State(api): State<FakeApi>,
    body: Result<Json<Envelope<CoursePayload>>, JsonRejection>,
) -> Response {
    let Json(Envelope { data: payload }) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if payload.course_name.trim().chars().count() < 2 {
        return api_error(StatusCode::BAD_REQUEST, "course_name must be at least 2 characters");
    }
    if payload.capacity < 1 {
        return api_error(StatusCode::BAD_REQUEST, "capacity must be at least 1");
    }

    let course = api.store.write().await.insert_course(payload.course_name.trim(), payload.capacity);
    data(StatusCode::CREATED, course)
}

async fn seat_course(
    State(api): State<FakeApi>,
    Path(course_id): Path<CourseId>,
    body: Result<Json<Envelope<SeatRequest>>, JsonRejection>,
) -> Response {
    let Json(Envelope { data: request }) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let mut guard = api.store.write().await;
    let store = &mut *guard;

    let Some(course) = store.courses.get_mut(&course_id) else {
        return api_error(StatusCode::NOT_FOUND, format!("Course {} cannot be found.", course_id));
    };
    let Some(student) = store.students.get_mut(&request.student_id) else {
        return api_error(
            StatusCode::NOT_FOUND,
            format!("Student {} cannot be found.", request.student_id),
        );
    };

    if student.status != StudentStatus::Booked {
        return api_error(StatusCode::BAD_REQUEST, format!("Student is already {}.", student.status));
    }
    if course.capacity < student.people {
        return api_error(StatusCode::BAD_REQUEST, "Course does not have sufficient capacity.");
    }
    if course.is_occupied() {
        return api_error(StatusCode::BAD_REQUEST, "Course is occupied.");
    }

    course.status = CourseStatus::Occupied;
    course.student_id = Some(student.student_id);
    student.status = StudentStatus::Seated;
    data(StatusCode::OK, course.clone())
}

async fn finish_course(State(api): State<FakeApi>, Path(course_id): Path<CourseId>) -> Response {
    let mut guard = api.store.write().await;
    let store = &mut *guard;

    let Some(course) = store.courses.get_mut(&course_id) else {
        return api_error(StatusCode::NOT_FOUND, format!("Course {} cannot be found.", course_id));
    };
    if !course.is_occupied() {
        return api_error(StatusCode::BAD_REQUEST, "Course is not occupied.");
    }

    if let Some(student) = course.student_id.and_then(|id| store.students.get_mut(&id)) {
        student.status = StudentStatus::Finished;
    }
    course.status = CourseStatus::Free;
    course.student_id = None;
    data(StatusCode::OK, course.clone())
}
