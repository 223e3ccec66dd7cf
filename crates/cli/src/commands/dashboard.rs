//! Dashboard: the day's reservations and every table

use anyhow::Result;
use clap::{ArgGroup, Args};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use seatwise_common::format::{next, previous, today};
use seatwise_common::{Course, Student, StudentQuery};

use super::course::CourseDisplay;
use super::student::StudentDisplay;
use super::ViewScope;
use crate::client::ApiClient;
use crate::output::{print_error, print_heading, print_list, OutputFormat};

#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("shift").args(["previous", "next", "today"])))]
pub struct DashboardArgs {
    /// Day to show (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<String>,

    /// Show the day before --date
    #[arg(long)]
    pub previous: bool,

    /// Show the day after --date
    #[arg(long)]
    pub next: bool,

    /// Jump back to today
    #[arg(long)]
    pub today: bool,
}

/// Calendar navigation from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayShift {
    Previous,
    Next,
    Today,
}

impl DashboardArgs {
    fn shift(&self) -> Option<DayShift> {
        if self.previous {
            Some(DayShift::Previous)
        } else if self.next {
            Some(DayShift::Next)
        } else if self.today {
            Some(DayShift::Today)
        } else {
            None
        }
    }
}

/// Work out which day to show; no date means today
pub fn resolve_date(date: Option<&str>, shift: Option<DayShift>) -> seatwise_common::Result<String> {
    let base = match date {
        Some(date) => seatwise_common::format::format_as_date(date)?,
        None => today(),
    };

    match shift {
        None => Ok(base),
        Some(DayShift::Previous) => previous(&base),
        Some(DayShift::Next) => next(&base),
        Some(DayShift::Today) => Ok(today()),
    }
}

/// Everything the dashboard shows. Each list fails independently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub date: String,
    pub students: Vec<Student>,
    pub students_error: Option<String>,
    pub courses: Vec<Course>,
    pub courses_error: Option<String>,
}

impl Dashboard {
    pub fn course(&self, course_id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }

    pub fn student(&self, student_id: i64) -> Option<&Student> {
        self.students.iter().find(|s| s.student_id == student_id)
    }
}

/// Load the day's reservations and all tables concurrently
pub async fn load_dashboard(client: &ApiClient, date: &str, token: &CancellationToken) -> Dashboard {
    debug!("Loading dashboard for {}", date);

    let query = StudentQuery::for_date(date);
    let (students, courses) = tokio::join!(
        client.list_students(&query, token),
        client.list_courses(token),
    );

    let mut dashboard = Dashboard {
        date: date.to_string(),
        ..Default::default()
    };

    match students {
        Ok(students) => {
            dashboard.students = students.into_iter().filter(Student::is_visible).collect();
        }
        Err(e) => dashboard.students_error = Some(e.to_string()),
    }
    match courses {
        Ok(courses) => dashboard.courses = courses,
        Err(e) => dashboard.courses_error = Some(e.to_string()),
    }

    dashboard
}

/// Render a loaded dashboard
pub fn render(dashboard: &Dashboard, format: OutputFormat) {
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(dashboard).unwrap_or_default(),
            _ => serde_yaml::to_string(dashboard).unwrap_or_default(),
        };
        println!("{}", rendered);
        return;
    }

    print_heading(&format!("Students for {}", dashboard.date), format);
    if let Some(error) = &dashboard.students_error {
        print_error(error);
    }
    let students: Vec<StudentDisplay> = dashboard.students.iter().map(StudentDisplay::from).collect();
    print_list(&students, format, "No students for this date");

    print_heading("Courses", format);
    if let Some(error) = &dashboard.courses_error {
        print_error(error);
    }
    let courses: Vec<CourseDisplay> = dashboard.courses.iter().map(CourseDisplay::from).collect();
    print_list(&courses, format, "No courses");
}

/// Load and render the dashboard for `date`
pub async fn show(client: &ApiClient, date: &str, format: OutputFormat) {
    let scope = ViewScope::new();
    let dashboard = load_dashboard(client, date, scope.token()).await;
    render(&dashboard, format);
}

pub async fn execute(args: DashboardArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let date = resolve_date(args.date.as_deref(), args.shift())?;
    show(client, &date, format).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_date() {
        assert_eq!(resolve_date(Some("2035-01-03"), None).unwrap(), "2035-01-03");
    }

    #[test]
    fn test_resolve_shifts() {
        assert_eq!(
            resolve_date(Some("2035-01-01"), Some(DayShift::Previous)).unwrap(),
            "2034-12-31"
        );
        assert_eq!(
            resolve_date(Some("2035-01-31"), Some(DayShift::Next)).unwrap(),
            "2035-02-01"
        );
        assert_eq!(resolve_date(Some("2035-01-31"), Some(DayShift::Today)).unwrap(), today());
    }

    #[test]
    fn test_resolve_defaults_to_today() {
        assert_eq!(resolve_date(None, None).unwrap(), today());
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert!(resolve_date(Some("next tuesday"), None).is_err());
    }

    #[test]
    fn test_args_shift() {
        let args = DashboardArgs {
            next: true,
            ..Default::default()
        };
        assert_eq!(args.shift(), Some(DayShift::Next));
        assert_eq!(DashboardArgs::default().shift(), None);
    }
}
