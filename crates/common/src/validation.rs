//! Client-side form checks
//!
//! These are advisory gates run before a request is sent; the backend stays
//! the source of truth. Every check appends to an error list instead of
//! bailing out, so the host sees all problems with a form at once.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::format::{parse_date, parse_time};
use crate::types::{Course, CourseId, CoursePayload, Student, StudentId, StudentPayload};

/// Day of the week the restaurant is closed
pub const CLOSED_WEEKDAY: Weekday = Weekday::Tue;

pub const MIN_COURSE_NAME_LEN: usize = 2;

/// First bookable time of day
pub static OPENING_TIME: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(10, 30, 0).expect("valid opening time"));

/// Reservations at or after this time are rejected
pub static CLOSING_TIME: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(22, 30, 0).expect("valid closing time"));

/// Reservations strictly after this time fall in the last hour before closing
pub static LAST_CALL_TIME: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(21, 30, 0).expect("valid last call time"));

/// A single problem with a submitted form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Raw contents of the reservation form, exactly as the host typed them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub student_date: String,
    pub student_time: String,
    pub people: String,
}

impl StudentForm {
    /// Pre-fill the form from an existing reservation
    pub fn from_student(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            mobile_number: student.mobile_number.clone(),
            student_date: student.student_date.clone(),
            student_time: student.student_time.clone(),
            people: student.people.to_string(),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("mobile_number", &self.mobile_number),
            ("student_date", &self.student_date),
            ("student_time", &self.student_time),
            ("people", &self.people),
        ]
    }

    /// Run every check and produce the request body, or all the errors found.
    ///
    /// Date and time rules only run once every field is filled in.
    pub fn validate(&self, now: NaiveDateTime) -> Result<StudentPayload, Vec<ValidationError>> {
        let mut errors = check_fields(self);
        if !errors.is_empty() {
            return Err(errors);
        }

        let people = match parse_party_size(&self.people) {
            Some(people) => Some(people),
            None => {
                errors.push(ValidationError::new("Party size must be a whole number of at least 1."));
                None
            }
        };

        errors.extend(validate_reservation(&self.student_date, &self.student_time, now));

        match people {
            Some(people) if errors.is_empty() => Ok(StudentPayload {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                mobile_number: self.mobile_number.trim().to_string(),
                student_date: self.student_date.trim().to_string(),
                student_time: self.student_time.trim().to_string(),
                people,
            }),
            _ => Err(errors),
        }
    }
}

/// Every reservation field is required
pub fn check_fields(form: &StudentForm) -> Vec<ValidationError> {
    form.fields()
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| {
            ValidationError::new(format!("{} cannot be left blank.", name.replace('_', " ")))
        })
        .collect()
}

fn parse_party_size(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|people| *people >= 1)
}

/// Check a proposed date and time against the restaurant's schedule
pub fn validate_reservation(date: &str, time: &str, now: NaiveDateTime) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let date = parse_date(date).map_err(|e| errors.push(ValidationError::new(e.to_string())));
    let time = parse_time(time).map_err(|e| errors.push(ValidationError::new(e.to_string())));

    if let (Ok(date), Ok(time)) = (date, time) {
        errors.extend(check_reservation_time(date, time, now));
    }

    errors
}

/// Schedule rules for an already-parsed date and time
pub fn check_reservation_time(
    date: NaiveDate,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if date.weekday() == CLOSED_WEEKDAY {
        errors.push(ValidationError::new(
            "Student cannot be made: Restaurant is closed on Tuesdays.",
        ));
    }

    if date.and_time(time) < now {
        errors.push(ValidationError::new("Student cannot be made: Date is in the past."));
    }

    if time < *OPENING_TIME {
        errors.push(ValidationError::new(
            "Student cannot be made: Restaurant is not open until 10:30AM.",
        ));
    } else if time >= *CLOSING_TIME {
        errors.push(ValidationError::new(
            "Student cannot be made: Restaurant is closed after 10:30PM.",
        ));
    } else if time > *LAST_CALL_TIME {
        errors.push(ValidationError::new(
            "Student cannot be made: Student must be made at least an hour before closing (10:30PM).",
        ));
    }

    errors
}

/// Check that a reservation can be seated at the chosen table.
///
/// Occupancy and capacity are only checked once both records are found,
/// and only reported when [`Course::can_seat`] turns the party away.
pub fn check_seating(
    course_id: CourseId,
    student_id: StudentId,
    courses: &[Course],
    students: &[Student],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let course = courses.iter().find(|c| c.course_id == course_id);
    let student = students.iter().find(|s| s.student_id == student_id);

    if course.is_none() {
        errors.push(ValidationError::new("The course you selected does not exist."));
    }
    if student.is_none() {
        errors.push(ValidationError::new("This student does not exist."));
    }

    if let (Some(course), Some(student)) = (course, student) {
        if course.can_seat(student.people) {
            return errors;
        }
        if course.is_occupied() {
            errors.push(ValidationError::new("The course you selected is currently occupied."));
        }
        if course.capacity < student.people {
            errors.push(ValidationError::new(format!(
                "The course you selected cannot seat {} people.",
                student.people
            )));
        }
    }

    errors
}

/// Raw contents of the new table form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseForm {
    pub course_name: String,
    pub capacity: String,
}

impl CourseForm {
    pub fn validate(&self) -> Result<CoursePayload, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let name = self.course_name.trim();

        if name.is_empty() {
            errors.push(ValidationError::new("course name cannot be left blank."));
        } else if name.chars().count() < MIN_COURSE_NAME_LEN {
            errors.push(ValidationError::new(format!(
                "course name must be at least {} characters long.",
                MIN_COURSE_NAME_LEN
            )));
        }

        let capacity = if self.capacity.trim().is_empty() {
            errors.push(ValidationError::new("capacity cannot be left blank."));
            None
        } else {
            let parsed = parse_party_size(&self.capacity);
            if parsed.is_none() {
                errors.push(ValidationError::new("capacity must be a whole number of at least 1."));
            }
            parsed
        };

        match capacity {
            Some(capacity) if errors.is_empty() => Ok(CoursePayload {
                course_name: name.to_string(),
                capacity,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseStatus, StudentStatus};
    use test_case::test_case;

    // 2035-01-02 is a Tuesday
    const TUESDAY: &str = "2035-01-02";
    const WEDNESDAY: &str = "2035-01-03";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2034, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn messages(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn form(date: &str, time: &str, people: &str) -> StudentForm {
        StudentForm {
            first_name: "James".to_string(),
            last_name: "Baldwin".to_string(),
            mobile_number: "555-0142".to_string(),
            student_date: date.to_string(),
            student_time: time.to_string(),
            people: people.to_string(),
        }
    }

    fn course(id: CourseId, capacity: u32, status: CourseStatus) -> Course {
        Course {
            course_id: id,
            course_name: format!("Table #{}", id),
            capacity,
            status,
            student_id: None,
        }
    }

    fn student(id: StudentId, people: u32) -> Student {
        Student {
            student_id: id,
            first_name: "Zora".to_string(),
            last_name: "Hurston".to_string(),
            mobile_number: "555-0177".to_string(),
            student_date: WEDNESDAY.to_string(),
            student_time: "18:00".to_string(),
            people,
            status: StudentStatus::Booked,
        }
    }

    #[test]
    fn test_schedule_boundaries() {
        assert_eq!(OPENING_TIME.format("%H:%M").to_string(), "10:30");
        assert_eq!(LAST_CALL_TIME.format("%H:%M").to_string(), "21:30");
        assert_eq!(CLOSING_TIME.format("%H:%M").to_string(), "22:30");
    }

    #[test_case("10:30" ; "opening")]
    #[test_case("13:00" ; "afternoon")]
    #[test_case("21:30" ; "last call")]
    fn test_open_hours_accepted(time: &str) {
        assert!(validate_reservation(WEDNESDAY, time, now()).is_empty());
    }

    #[test_case("00:00" ; "midnight")]
    #[test_case("09:59" ; "early morning")]
    #[test_case("10:29" ; "one minute before opening")]
    fn test_before_opening_rejected(time: &str) {
        let errors = validate_reservation(WEDNESDAY, time, now());
        assert_eq!(
            messages(&errors),
            vec!["Student cannot be made: Restaurant is not open until 10:30AM."]
        );
    }

    #[test_case("22:30" ; "closing")]
    #[test_case("23:15" ; "late night")]
    fn test_at_or_after_closing_rejected(time: &str) {
        let errors = validate_reservation(WEDNESDAY, time, now());
        assert_eq!(
            messages(&errors),
            vec!["Student cannot be made: Restaurant is closed after 10:30PM."]
        );
    }

    #[test_case("21:31" ; "just past last call")]
    #[test_case("22:29" ; "just before closing")]
    fn test_last_call_window_rejected(time: &str) {
        let errors = validate_reservation(WEDNESDAY, time, now());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least an hour before closing"));
    }

    #[test_case("10:30" ; "morning")]
    #[test_case("18:00" ; "evening")]
    #[test_case("23:00" ; "after closing")]
    fn test_tuesday_always_closed(time: &str) {
        let errors = validate_reservation(TUESDAY, time, now());
        assert!(messages(&errors)
            .contains(&"Student cannot be made: Restaurant is closed on Tuesdays."));
    }

    #[test]
    fn test_errors_accumulate() {
        // A Tuesday in the past, before opening
        let errors = validate_reservation("2020-01-07", "09:00", now());
        assert_eq!(
            messages(&errors),
            vec![
                "Student cannot be made: Restaurant is closed on Tuesdays.",
                "Student cannot be made: Date is in the past.",
                "Student cannot be made: Restaurant is not open until 10:30AM.",
            ]
        );
    }

    #[test]
    fn test_same_day_earlier_time_is_past() {
        let errors = validate_reservation("2034-06-01", "11:00", now());
        assert_eq!(messages(&errors), vec!["Student cannot be made: Date is in the past."]);
    }

    #[test]
    fn test_unparseable_date_and_time() {
        let errors = validate_reservation("01/03/2035", "6pm", now());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_blank_fields_reported_by_name() {
        let form = StudentForm {
            first_name: "Toni".to_string(),
            ..Default::default()
        };
        let errors = form.validate(now()).unwrap_err();
        assert_eq!(
            messages(&errors),
            vec![
                "last name cannot be left blank.",
                "mobile number cannot be left blank.",
                "student date cannot be left blank.",
                "student time cannot be left blank.",
                "people cannot be left blank.",
            ]
        );
    }

    #[test]
    fn test_schedule_not_checked_until_form_complete() {
        let mut form = form(TUESDAY, "18:00", "2");
        form.last_name.clear();
        let errors = form.validate(now()).unwrap_err();
        assert_eq!(messages(&errors), vec!["last name cannot be left blank."]);
    }

    #[test]
    fn test_valid_form_produces_payload() {
        let payload = form(WEDNESDAY, "18:00", "4").validate(now()).unwrap();
        assert_eq!(payload.people, 4);
        assert_eq!(payload.student_date, WEDNESDAY);
    }

    #[test_case("0" ; "zero")]
    #[test_case("-3" ; "negative")]
    #[test_case("two" ; "words")]
    fn test_bad_party_size(people: &str) {
        let errors = form(WEDNESDAY, "18:00", people).validate(now()).unwrap_err();
        assert_eq!(messages(&errors), vec!["Party size must be a whole number of at least 1."]);
    }

    #[test]
    fn test_seat_four_at_free_six_top() {
        let courses = vec![course(1, 6, CourseStatus::Free)];
        let students = vec![student(10, 4)];
        assert!(check_seating(1, 10, &courses, &students).is_empty());
    }

    #[test]
    fn test_seat_at_occupied_course() {
        let courses = vec![course(1, 6, CourseStatus::Occupied)];
        let students = vec![student(10, 4)];
        assert_eq!(
            messages(&check_seating(1, 10, &courses, &students)),
            vec!["The course you selected is currently occupied."]
        );
    }

    #[test]
    fn test_capacity_and_occupancy_accumulate() {
        let courses = vec![course(1, 2, CourseStatus::Occupied)];
        let students = vec![student(10, 4)];
        assert_eq!(
            messages(&check_seating(1, 10, &courses, &students)),
            vec![
                "The course you selected is currently occupied.",
                "The course you selected cannot seat 4 people.",
            ]
        );
    }

    #[test]
    fn test_missing_course_and_student() {
        let errors = check_seating(99, 42, &[], &[]);
        assert_eq!(
            messages(&errors),
            vec!["The course you selected does not exist.", "This student does not exist."]
        );
    }

    #[test]
    fn test_capacity_property() {
        for status in [CourseStatus::Free, CourseStatus::Occupied] {
            for capacity in 1..=8u32 {
                for people in 1..=10u32 {
                    let courses = vec![course(1, capacity, status)];
                    let students = vec![student(1, people)];
                    let ok = check_seating(1, 1, &courses, &students).is_empty();
                    assert_eq!(ok, courses[0].can_seat(people));
                    assert_eq!(
                        ok,
                        people <= capacity && status == CourseStatus::Free,
                        "capacity {capacity}, party {people}, {status}"
                    );
                }
            }
        }
    }

    #[test_case("", "4", "course name cannot be left blank." ; "blank name")]
    #[test_case("1", "6", "course name must be at least 2 characters long." ; "short name")]
    #[test_case("Bar #2", "", "capacity cannot be left blank." ; "blank capacity")]
    #[test_case("Bar #2", "0", "capacity must be a whole number of at least 1." ; "zero capacity")]
    fn test_course_form_rejected(name: &str, capacity: &str, expected: &str) {
        let form = CourseForm {
            course_name: name.to_string(),
            capacity: capacity.to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(messages(&errors), vec![expected]);
    }

    #[test]
    fn test_course_form_accepted() {
        let form = CourseForm {
            course_name: " Patio ".to_string(),
            capacity: "6".to_string(),
        };
        let payload = form.validate().unwrap();
        assert_eq!(payload.course_name, "Patio");
        assert_eq!(payload.capacity, 6);
    }
}
