//! Date and time display formats
//!
//! The backend may hand back full ISO timestamps (`2035-01-03T00:00:00.000Z`)
//! or times with seconds (`18:00:00`). Everything shown to the host is
//! normalized to `YYYY-MM-DD` and `HH:MM`.

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::Student;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"));
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}:\d{2}").expect("valid time regex"));

/// Extract the `YYYY-MM-DD` part of a date or timestamp string
pub fn format_as_date(value: &str) -> Result<String> {
    DATE_PATTERN
        .find(value)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidDate(value.to_string()))
}

/// Extract the `HH:MM` part of a time string
pub fn format_as_time(value: &str) -> Result<String> {
    TIME_PATTERN
        .find(value)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidTime(value.to_string()))
}

/// Normalize `student_date` on every student in place
pub fn format_student_date(students: &mut [Student]) -> Result<()> {
    for student in students.iter_mut() {
        student.student_date = format_as_date(&student.student_date)?;
    }
    Ok(())
}

/// Normalize `student_time` on every student in place
pub fn format_student_time(students: &mut [Student]) -> Result<()> {
    for student in students.iter_mut() {
        student.student_time = format_as_time(&student.student_time)?;
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(value.to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| Error::InvalidTime(value.to_string()))
}

pub fn as_date_string(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's date in the local timezone
pub fn today() -> String {
    as_date_string(Local::now().date_naive())
}

/// The day before `date`
pub fn previous(date: &str) -> Result<String> {
    Ok(as_date_string(parse_date(date)? - Duration::days(1)))
}

/// The day after `date`
pub fn next(date: &str) -> Result<String> {
    Ok(as_date_string(parse_date(date)? + Duration::days(1)))
}
