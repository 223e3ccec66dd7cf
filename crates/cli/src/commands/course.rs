//! Course Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use seatwise_common::{Course, CourseForm, CourseId, CourseStatus, StudentId};

use super::{dashboard, ActionOutcome, FormOutcome, ViewScope};
use crate::client::{ApiClient, ApiResult};
use crate::output::{
    confirm, print_list, print_success, print_validation_errors, print_warning, OutputFormat,
    TableDisplay,
};

pub const FINISH_PROMPT: &str = "Is this course ready to seat new guests? This cannot be undone.";

#[derive(Subcommand)]
pub enum CourseCommands {
    /// List all courses
    List,

    /// Create a new course
    New {
        /// Course name (at least 2 characters)
        #[arg(short, long)]
        name: Option<String>,

        /// Number of seats
        #[arg(short, long)]
        capacity: Option<String>,
    },

    /// Release an occupied course
    Finish {
        /// Course ID
        id: CourseId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Course display wrapper for serialization
#[derive(Serialize)]
pub struct CourseDisplay {
    pub course_id: CourseId,
    pub course_name: String,
    pub capacity: u32,
    pub status: CourseStatus,
    pub student_id: Option<StudentId>,
}

impl From<&Course> for CourseDisplay {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.course_id,
            course_name: course.course_name.clone(),
            capacity: course.capacity,
            status: course.status,
            student_id: course.student_id,
        }
    }
}

impl TableDisplay for CourseDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Course ID", "Course Name", "Capacity", "Status", "Student ID", "Actions"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.course_id.to_string(),
            self.course_name.clone(),
            self.capacity.to_string(),
            self.status.to_string(),
            self.student_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "--".to_string()),
            if self.status == CourseStatus::Occupied {
                "finish".to_string()
            } else {
                String::new()
            },
        ]
    }
}

/// Validate the new course form and create the course
pub async fn submit_course(
    client: &ApiClient,
    form: &CourseForm,
    token: &CancellationToken,
) -> ApiResult<FormOutcome<Option<Course>>> {
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return Ok(FormOutcome::Invalid(errors)),
    };

    let created = client.create_course(&payload, token).await?;
    if token.is_cancelled() {
        return Ok(FormOutcome::Cancelled);
    }
    Ok(FormOutcome::Saved(created))
}

/// Release an occupied course once the host confirms
pub async fn finish_course(
    client: &ApiClient,
    course_id: CourseId,
    confirm: impl FnOnce(&str) -> bool,
    token: &CancellationToken,
) -> ApiResult<ActionOutcome> {
    let courses = client.list_courses(token).await?;
    if token.is_cancelled() {
        return Ok(ActionOutcome::Cancelled);
    }

    match courses.iter().find(|c| c.course_id == course_id) {
        Some(course) if course.is_occupied() => {}
        Some(_) => {
            return Ok(ActionOutcome::Unavailable(format!(
                "Course {} is not occupied.",
                course_id
            )))
        }
        None => {
            return Ok(ActionOutcome::Unavailable(format!(
                "Course {} does not exist.",
                course_id
            )))
        }
    }

    if !confirm(FINISH_PROMPT) {
        return Ok(ActionOutcome::Declined);
    }

    client.finish_course(course_id, token).await?;
    if token.is_cancelled() {
        return Ok(ActionOutcome::Cancelled);
    }
    Ok(ActionOutcome::Completed)
}

pub async fn execute(cmd: CourseCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let scope = ViewScope::new();
    let token = scope.token();

    match cmd {
        CourseCommands::List => {
            let courses = client.list_courses(token).await?;
            let displays: Vec<CourseDisplay> = courses.iter().map(CourseDisplay::from).collect();
            print_list(&displays, format, "No courses");
        }

        CourseCommands::New { name, capacity } => {
            let form = CourseForm {
                course_name: name.unwrap_or_default(),
                capacity: capacity.unwrap_or_default(),
            };
            match submit_course(client, &form, token).await? {
                FormOutcome::Saved(course) => {
                    let name = course
                        .map(|c| c.course_name)
                        .unwrap_or_else(|| form.course_name.trim().to_string());
                    info!("Created course {}", name);
                    print_success(&format!("Course '{}' created", name));
                    dashboard::show(client, &seatwise_common::format::today(), format).await;
                }
                FormOutcome::Invalid(errors) => print_validation_errors(&errors),
                FormOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }

        CourseCommands::Finish { id, yes } => {
            match finish_course(client, id, |prompt| yes || confirm(prompt), token).await? {
                ActionOutcome::Completed => {
                    print_success(&format!("Course {} is free", id));
                    dashboard::show(client, &seatwise_common::format::today(), format).await;
                }
                ActionOutcome::Declined => print_warning("Nothing changed"),
                ActionOutcome::Unavailable(reason) => print_warning(&reason),
                ActionOutcome::Cancelled => debug!("View closed, result discarded"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(status: CourseStatus, student_id: Option<StudentId>) -> Course {
        Course {
            course_id: 4,
            course_name: "Patio".to_string(),
            capacity: 6,
            status,
            student_id,
        }
    }

    #[test]
    fn test_free_row_shows_no_student() {
        let row = CourseDisplay::from(&course(CourseStatus::Free, None)).row();
        assert_eq!(row[4], "--");
        assert_eq!(row[5], "");
    }

    #[test]
    fn test_occupied_row_offers_finish() {
        let row = CourseDisplay::from(&course(CourseStatus::Occupied, Some(12))).row();
        assert_eq!(row[3], "occupied");
        assert_eq!(row[4], "12");
        assert_eq!(row[5], "finish");
    }

    #[tokio::test]
    async fn test_closed_view_finishes_nothing() {
        let client = ApiClient::new(seatwise_common::ClientConfig::new("http://127.0.0.1:9").unwrap()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = finish_course(&client, 4, |_| panic!("no prompt"), &token)
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
    }
}
