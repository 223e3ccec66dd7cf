//! Core types for Seatwise
//!
//! A "student" is a reservation and a "course" is a table in the dining
//! room. Field names match the JSON the REST backend speaks.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Identifier of a reservation
pub type StudentId = i64;

/// Identifier of a table
pub type CourseId = i64;

/// Reservation lifecycle, driven by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Booked,
    Seated,
    Finished,
    Cancelled,
}

impl Default for StudentStatus {
    fn default() -> Self {
        Self::Booked
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudentStatus::Booked => write!(f, "booked"),
            StudentStatus::Seated => write!(f, "seated"),
            StudentStatus::Finished => write!(f, "finished"),
            StudentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for StudentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "booked" => Ok(Self::Booked),
            "seated" => Ok(Self::Seated),
            "finished" => Ok(Self::Finished),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::UnknownStatus {
                kind: "student",
                value: other.to_string(),
            }),
        }
    }
}

/// Table occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Free,
    Occupied,
}

impl Default for CourseStatus {
    fn default() -> Self {
        Self::Free
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CourseStatus::Free => write!(f, "free"),
            CourseStatus::Occupied => write!(f, "occupied"),
        }
    }
}

/// A reservation as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub student_date: String,
    pub student_time: String,
    pub people: u32,
    #[serde(default)]
    pub status: StudentStatus,
}

impl Student {
    /// Finished reservations are never listed
    pub fn is_visible(&self) -> bool {
        self.status != StudentStatus::Finished
    }

    /// Only booked reservations can be edited, cancelled, or seated
    pub fn is_booked(&self) -> bool {
        self.status == StudentStatus::Booked
    }
}

/// A table as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    pub course_name: String,
    pub capacity: u32,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub student_id: Option<StudentId>,
}

impl Course {
    pub fn is_occupied(&self) -> bool {
        self.status == CourseStatus::Occupied
    }

    /// Whether a party of `people` fits at this table right now
    pub fn can_seat(&self, people: u32) -> bool {
        !self.is_occupied() && people <= self.capacity
    }
}

/// Body of the create and edit reservation requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPayload {
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub student_date: String,
    pub student_time: String,
    pub people: u32,
}

/// Body of the create table request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePayload {
    pub course_name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStatusUpdate {
    pub status: StudentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    pub student_id: StudentId,
}

/// Every request and response body is wrapped in `{ "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Error body sent by the backend: `{ "error": "message" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Query parameters accepted by `GET /students`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

impl StudentQuery {
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    pub fn for_mobile_number(mobile_number: impl Into<String>) -> Self {
        Self {
            mobile_number: Some(mobile_number.into()),
            ..Default::default()
        }
    }
}
