//! Student Commands: book, edit, cancel, and seat reservations

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use seatwise_common::validation::check_seating;
use seatwise_common::{
    Course, CourseId, Student, StudentForm, StudentId, StudentQuery, StudentStatus, ValidationError,
};

use super::{dashboard, ActionOutcome, FormOutcome, ViewScope};
use crate::client::{ApiClient, ApiResult};
use crate::output::{
    confirm, print_success, print_validation_errors, print_warning, OutputFormat, TableDisplay,
};

pub const CANCEL_PROMPT: &str = "Do you want to cancel this student? This cannot be undone.";

#[derive(Subcommand)]
pub enum StudentCommands {
    /// Book a new reservation
    New(StudentFormArgs),

    /// Change a booked reservation
    Edit {
        /// Student ID
        id: StudentId,

        #[command(flatten)]
        form: StudentFormArgs,
    },

    /// Cancel a booked reservation
    Cancel {
        /// Student ID
        id: StudentId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Seat a booked reservation at a course
    Seat {
        /// Student ID
        id: StudentId,

        /// Course to seat the party at
        #[arg(short, long)]
        course: CourseId,
    },
}

/// Reservation form fields. Anything left out is submitted blank when
/// booking, and kept from the current record when editing.
#[derive(Args, Debug, Clone, Default)]
pub struct StudentFormArgs {
    /// First name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Last name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Mobile number
    #[arg(long)]
    pub mobile_number: Option<String>,

    /// Reservation date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Reservation time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,

    /// Party size
    #[arg(long)]
    pub people: Option<String>,
}

impl StudentFormArgs {
    /// Overlay the given flags on top of `form`
    pub fn apply(self, mut form: StudentForm) -> StudentForm {
        if let Some(v) = self.first_name {
            form.first_name = v;
        }
        if let Some(v) = self.last_name {
            form.last_name = v;
        }
        if let Some(v) = self.mobile_number {
            form.mobile_number = v;
        }
        if let Some(v) = self.date {
            form.student_date = v;
        }
        if let Some(v) = self.time {
            form.student_time = v;
        }
        if let Some(v) = self.people {
            form.people = v;
        }
        form
    }
}

/// Whether the reservation form creates a new record or replaces one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(StudentId),
}

/// Student display wrapper for serialization
#[derive(Serialize)]
pub struct StudentDisplay {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub student_date: String,
    pub student_time: String,
    pub people: u32,
    pub status: StudentStatus,
}

impl From<&Student> for StudentDisplay {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.student_id,
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            mobile_number: student.mobile_number.clone(),
            student_date: student.student_date.clone(),
            student_time: student.student_time.clone(),
            people: student.people,
            status: student.status,
        }
    }
}

impl TableDisplay for StudentDisplay {
    fn headers() -> Vec<&'static str> {
        vec![
            "ID",
            "First Name",
            "Last Name",
            "Mobile Number",
            "Date",
            "Time",
            "People",
            "Status",
            "Actions",
        ]
    }

    fn row(&self) -> Vec<String> {
        let actions = if self.status == StudentStatus::Booked {
            "edit, cancel, seat".to_string()
        } else {
            String::new()
        };

        vec![
            self.student_id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.mobile_number.clone(),
            self.student_date.clone(),
            self.student_time.clone(),
            self.people.to_string(),
            self.status.to_string(),
            actions,
        ]
    }
}

/// Look up a reservation in the full list
async fn find_student(
    client: &ApiClient,
    student_id: StudentId,
    token: &CancellationToken,
) -> ApiResult<Option<Student>> {
    let students = client.list_students(&StudentQuery::default(), token).await?;
    Ok(students.into_iter().find(|s| s.student_id == student_id))
}

/// Result of opening the edit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditForm {
    /// Pre-filled from the stored reservation
    Ready(StudentForm),
    /// The reservation is missing or no longer booked
    Locked(ValidationError),
    Cancelled,
}

/// Pre-fill the edit form. Only booked reservations can be edited.
pub async fn load_edit_form(
    client: &ApiClient,
    student_id: StudentId,
    token: &CancellationToken,
) -> ApiResult<EditForm> {
    let student = find_student(client, student_id, token).await?;
    if token.is_cancelled() {
        return Ok(EditForm::Cancelled);
    }

    match student {
        Some(student) if student.is_booked() => Ok(EditForm::Ready(StudentForm::from_student(&student))),
        _ => Ok(EditForm::Locked(ValidationError::new(
            "Only booked students can be edited.",
        ))),
    }
}

/// Validate the reservation form and create or replace the record
pub async fn submit_student(
    client: &ApiClient,
    mode: FormMode,
    form: &StudentForm,
    now: NaiveDateTime,
    token: &CancellationToken,
) -> ApiResult<FormOutcome<Option<Student>>> {
    let payload = match form.validate(now) {
        Ok(payload) => payload,
        Err(errors) => return Ok(FormOutcome::Invalid(errors)),
    };

    let saved = match mode {
        FormMode::Create => client.create_student(&payload, token).await?,
        FormMode::Edit(student_id) => client.edit_student(student_id, &payload, token).await?,
    };
    if token.is_cancelled() {
        return Ok(FormOutcome::Cancelled);
    }
    Ok(FormOutcome::Saved(saved))
}

/// Cancel a booked reservation once the host confirms
pub async fn cancel_student(
    client: &ApiClient,
    student_id: StudentId,
    confirm: impl FnOnce(&str) -> bool,
    token: &CancellationToken,
) -> ApiResult<ActionOutcome> {
    let student = find_student(client, student_id, token).await?;
    if token.is_cancelled() {
        return Ok(ActionOutcome::Cancelled);
    }

    match student {
        Some(student) if student.is_booked() => {}
        Some(student) => {
            return Ok(ActionOutcome::Unavailable(format!(
                "Student {} is {} and cannot be cancelled.",
                student_id, student.status
            )))
        }
        None => {
            return Ok(ActionOutcome::Unavailable(format!(
                "Student {} does not exist.",
                student_id
            )))
        }
    }

    if !confirm(CANCEL_PROMPT) {
        return Ok(ActionOutcome::Declined);
    }

    client
        .update_student_status(student_id, StudentStatus::Cancelled, token)
        .await?;
    if token.is_cancelled() {
        return Ok(ActionOutcome::Cancelled);
    }
    Ok(ActionOutcome::Completed)
}

/// Check seating eligibility against fresh lists, then seat the party
pub async fn seat_student(
    client: &ApiClient,
    student_id: StudentId,
    course_id: CourseId,
    token: &CancellationToken,
) -> ApiResult<FormOutcome<Option<Course>>> {
    let query = StudentQuery::default();
    let (courses, students) = tokio::join!(
        client.list_courses(token),
        client.list_students(&query, token),
    );
    let (courses, students) = (courses?, students?);

    // Lists cut short by a closed view are empty, not evidence of anything
    if token.is_cancelled() {
        return Ok(FormOutcome::Cancelled);
    }

    let errors = check_seating(course_id, student_id, &courses, &students);
    if !errors.is_empty() {
        return Ok(FormOutcome::Invalid(errors));
    }

    let seated = client.seat_course(student_id, course_id, token).await?;
    if token.is_cancelled() {
        return Ok(FormOutcome::Cancelled);
    }
    Ok(FormOutcome::Saved(seated))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub async fn execute(cmd: StudentCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let scope = ViewScope::new();
    let token = scope.token();

    match cmd {
        StudentCommands::New(args) => {
            let form = args.apply(StudentForm::default());
            match submit_student(client, FormMode::Create, &form, now(), token).await? {
                FormOutcome::Saved(student) => {
                    let id = student.map(|s| s.student_id.to_string()).unwrap_or_default();
                    info!("Created student {}", id);
                    print_success(&format!("Student {} booked for {}", id, form.student_date));
                    dashboard::show(client, form.student_date.trim(), format).await;
                }
                FormOutcome::Invalid(errors) => print_validation_errors(&errors),
                FormOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }

        StudentCommands::Edit { id, form: args } => {
            let form = match load_edit_form(client, id, token).await? {
                EditForm::Ready(form) => args.apply(form),
                EditForm::Locked(error) => {
                    print_validation_errors(&[error]);
                    return Ok(());
                }
                EditForm::Cancelled => return Ok(()),
            };

            match submit_student(client, FormMode::Edit(id), &form, now(), token).await? {
                FormOutcome::Saved(_) => {
                    info!("Updated student {}", id);
                    print_success(&format!("Student {} updated", id));
                    dashboard::show(client, form.student_date.trim(), format).await;
                }
                FormOutcome::Invalid(errors) => print_validation_errors(&errors),
                FormOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }

        StudentCommands::Cancel { id, yes } => {
            let outcome = cancel_student(client, id, |prompt| yes || confirm(prompt), token).await?;
            match outcome {
                ActionOutcome::Completed => {
                    print_success(&format!("Student {} cancelled", id));
                    dashboard::show(client, &seatwise_common::format::today(), format).await;
                }
                ActionOutcome::Declined => print_warning("Nothing changed"),
                ActionOutcome::Unavailable(reason) => print_warning(&reason),
                ActionOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }

        StudentCommands::Seat { id, course } => {
            match seat_student(client, id, course, token).await? {
                FormOutcome::Saved(_) => {
                    print_success(&format!("Student {} seated at course {}", id, course));
                    dashboard::show(client, &seatwise_common::format::today(), format).await;
                }
                FormOutcome::Invalid(errors) => print_validation_errors(&errors),
                FormOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }
    }

    Ok(())
}
