//! Test data helpers

use chrono::{Datelike, Duration, Local, NaiveDate};
use tokio_util::sync::CancellationToken;

use seatwise_cli::ApiClient;
use seatwise_common::format::as_date_string;
use seatwise_common::validation::CLOSED_WEEKDAY;
use seatwise_common::{Course, CoursePayload, Student, StudentForm, StudentPayload};

use crate::error::{E2eError, E2eResult};

fn tomorrow() -> NaiveDate {
    Local::now().date_naive() + Duration::days(1)
}

/// The first day after today the restaurant is open
pub fn next_open_day() -> String {
    let mut day = tomorrow();
    while day.weekday() == CLOSED_WEEKDAY {
        day += Duration::days(1);
    }
    as_date_string(day)
}

/// The first closure day after today
pub fn next_closed_day() -> String {
    let mut day = tomorrow();
    while day.weekday() != CLOSED_WEEKDAY {
        day += Duration::days(1);
    }
    as_date_string(day)
}

/// The day before today
pub fn yesterday() -> String {
    as_date_string(Local::now().date_naive() - Duration::days(1))
}

/// Expand a date keyword (`next_open_day`, `next_closed_day`, `yesterday`)
/// or pass a literal date through
pub fn resolve_date(value: &str) -> String {
    match value.trim() {
        "next_open_day" => next_open_day(),
        "next_closed_day" => next_closed_day(),
        "yesterday" => yesterday(),
        other => other.to_string(),
    }
}

/// A complete, bookable reservation form
pub fn booking(first_name: &str, people: u32) -> StudentForm {
    StudentForm {
        first_name: first_name.to_string(),
        last_name: "Guest".to_string(),
        mobile_number: "800-555-1212".to_string(),
        student_date: next_open_day(),
        student_time: "18:00".to_string(),
        people: people.to_string(),
    }
}

/// Create a reservation directly through the API, skipping form checks
pub async fn create_student(client: &ApiClient, form: &StudentForm) -> E2eResult<Student> {
    let payload = StudentPayload {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        mobile_number: form.mobile_number.clone(),
        student_date: form.student_date.clone(),
        student_time: form.student_time.clone(),
        people: form.people.parse().unwrap_or(1),
    };
    client
        .create_student(&payload, &CancellationToken::new())
        .await?
        .ok_or_else(|| E2eError::AssertionFailed("create_student returned no data".to_string()))
}

/// Create a course directly through the API
pub async fn create_course(client: &ApiClient, course_name: &str, capacity: u32) -> E2eResult<Course> {
    let payload = CoursePayload {
        course_name: course_name.to_string(),
        capacity,
    };
    client
        .create_course(&payload, &CancellationToken::new())
        .await?
        .ok_or_else(|| E2eError::AssertionFailed("create_course returned no data".to_string()))
}
