//! Main scenario runner that drives the CLI views against the fake backend

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use seatwise_cli::commands::course::{finish_course, submit_course};
use seatwise_cli::commands::dashboard::load_dashboard;
use seatwise_cli::commands::search::search_students;
use seatwise_cli::commands::student::{
    cancel_student, load_edit_form, seat_student, submit_student, EditForm, FormMode,
};
use seatwise_cli::{ActionOutcome, ApiClient, FormOutcome, ViewScope};
use seatwise_common::{CourseForm, CourseId, StudentForm, StudentId};

use crate::error::{E2eError, E2eResult};
use crate::fixtures::resolve_date;
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::{TestSpec, TestStep};

/// Result of running a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Records named with `as:` in the current scenario
#[derive(Default)]
struct Aliases {
    students: HashMap<String, StudentId>,
    courses: HashMap<String, CourseId>,
}

/// Compare a form outcome against the errors a step expects.
///
/// Each expected string must appear in at least one reported message.
fn check_outcome<T>(outcome: FormOutcome<T>, expected: &[String]) -> E2eResult<Option<T>> {
    match outcome {
        FormOutcome::Saved(value) if expected.is_empty() => Ok(Some(value)),
        FormOutcome::Saved(_) => Err(E2eError::AssertionFailed(format!(
            "expected errors {:?} but the form was accepted",
            expected
        ))),
        FormOutcome::Invalid(errors) => {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            if expected.is_empty() {
                return Err(E2eError::AssertionFailed(format!(
                    "unexpected errors: {}",
                    messages.join("; ")
                )));
            }
            for wanted in expected {
                if !messages.iter().any(|m| m.contains(wanted.as_str())) {
                    return Err(E2eError::AssertionFailed(format!(
                        "expected an error containing '{}', got: {}",
                        wanted,
                        messages.join("; ")
                    )));
                }
            }
            Ok(None)
        }
        FormOutcome::Cancelled => Err(E2eError::AssertionFailed(
            "the view closed before the backend answered".to_string(),
        )),
    }
}

fn check_action(outcome: ActionOutcome, confirm: bool) -> E2eResult<()> {
    match (outcome, confirm) {
        (ActionOutcome::Completed, true) | (ActionOutcome::Declined, false) => Ok(()),
        (ActionOutcome::Unavailable(reason), _) => Err(E2eError::AssertionFailed(reason)),
        (outcome, _) => Err(E2eError::AssertionFailed(format!(
            "unexpected outcome {:?} (confirm={})",
            outcome, confirm
        ))),
    }
}

/// Main E2E scenario runner
pub struct TestRunner {
    /// Server configuration
    server_config: ServerConfig,

    /// Running server handle (if any)
    server: Option<ServerHandle>,

    /// Scenario specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            server_config: config.server,
            server: None,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    /// Start the server
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(()); // Already running
        }

        self.server = Some(ServerHandle::spawn(self.server_config.clone()).await?);
        Ok(())
    }

    /// Stop the server
    pub fn stop_server(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
    }

    fn server(&self) -> E2eResult<&ServerHandle> {
        self.server
            .as_ref()
            .ok_or_else(|| E2eError::ServerStartup("server not started".to_string()))
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;

        self.start_server().await?;
        self.run_spec(&spec).await
    }

    /// Run a list of scenarios
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        // Ensure server is running
        self.start_server().await?;

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            match self.run_spec(spec).await {
                Ok(result) => {
                    if result.success {
                        passed += 1;
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", spec.name, e);
                    results.push(TestResult {
                        name: spec.name.clone(),
                        success: false,
                        duration_ms: 0,
                        steps: vec![],
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            skipped: 0,
            duration_ms,
            results,
        })
    }

    /// Run a single scenario; stops at the first failing step
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let server = self.server()?;
        let client = server.client()?;
        let mut aliases = Aliases::default();

        let mut step_results = Vec::new();
        let mut test_error: Option<String> = None;

        for step in &spec.steps {
            let step_start = Instant::now();
            let outcome = execute_step(server, &client, &mut aliases, step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            let error = outcome.err().map(|e| e.to_string());
            let success = error.is_none();
            step_results.push(StepResult {
                success,
                step_name: step.name(),
                duration_ms,
                error: error.clone(),
            });

            if !success {
                test_error = error.map(|e| format!("{}: {}", step.name(), e));
                break;
            }
        }

        Ok(TestResult {
            name: spec.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            error: test_error,
        })
    }

    /// Write scenario results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        self.stop_server();
    }
}

fn student_id(aliases: &Aliases, alias: &str) -> E2eResult<StudentId> {
    aliases
        .students
        .get(alias)
        .copied()
        .ok_or_else(|| E2eError::UnknownAlias(alias.to_string()))
}

/// Courses can be named by alias or by their name on the backend
async fn course_id(server: &ServerHandle, aliases: &Aliases, alias: &str) -> E2eResult<CourseId> {
    if let Some(id) = aliases.courses.get(alias) {
        return Ok(*id);
    }
    server
        .api()
        .course_by_name(alias)
        .await
        .map(|c| c.course_id)
        .ok_or_else(|| E2eError::UnknownAlias(alias.to_string()))
}

async fn execute_step(
    server: &ServerHandle,
    client: &ApiClient,
    aliases: &mut Aliases,
    step: &TestStep,
) -> E2eResult<()> {
    let scope = ViewScope::new();
    let token = scope.token();
    let now = Local::now().naive_local();

    match step {
        TestStep::CreateCourse {
            alias,
            course_name,
            capacity,
            expect_errors,
        } => {
            let form = CourseForm {
                course_name: course_name.clone(),
                capacity: capacity.clone(),
            };
            let outcome = submit_course(client, &form, token).await?;
            if let Some(saved) = check_outcome(outcome, expect_errors)? {
                let course = saved.ok_or_else(|| {
                    E2eError::AssertionFailed("backend returned no course".to_string())
                })?;
                if let Some(alias) = alias {
                    aliases.courses.insert(alias.clone(), course.course_id);
                }
            }
        }

        TestStep::CreateStudent {
            alias,
            first_name,
            last_name,
            mobile_number,
            date,
            time,
            people,
            expect_errors,
        } => {
            let form = StudentForm {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                mobile_number: mobile_number.clone(),
                student_date: resolve_date(date),
                student_time: time.clone(),
                people: people.clone(),
            };
            let outcome = submit_student(client, FormMode::Create, &form, now, token).await?;
            if let Some(saved) = check_outcome(outcome, expect_errors)? {
                let student = saved.ok_or_else(|| {
                    E2eError::AssertionFailed("backend returned no student".to_string())
                })?;
                if let Some(alias) = alias {
                    aliases.students.insert(alias.clone(), student.student_id);
                }
            }
        }

        TestStep::EditStudent {
            student,
            first_name,
            last_name,
            mobile_number,
            date,
            time,
            people,
            expect_errors,
        } => {
            let id = student_id(aliases, student)?;
            let mut form = match load_edit_form(client, id, token).await? {
                EditForm::Ready(form) => form,
                EditForm::Locked(error) => {
                    check_outcome::<()>(FormOutcome::Invalid(vec![error]), expect_errors)?;
                    return Ok(());
                }
                EditForm::Cancelled => {
                    check_outcome::<()>(FormOutcome::Cancelled, expect_errors)?;
                    return Ok(());
                }
            };

            let overrides = [
                (&mut form.first_name, first_name),
                (&mut form.last_name, last_name),
                (&mut form.mobile_number, mobile_number),
                (&mut form.student_time, time),
                (&mut form.people, people),
            ];
            for (field, value) in overrides {
                if let Some(value) = value {
                    *field = value.clone();
                }
            }
            if let Some(date) = date {
                form.student_date = resolve_date(date);
            }

            let outcome = submit_student(client, FormMode::Edit(id), &form, now, token).await?;
            check_outcome(outcome, expect_errors)?;
        }

        TestStep::Seat {
            student,
            course,
            expect_errors,
        } => {
            let student = student_id(aliases, student)?;
            let course = course_id(server, aliases, course).await?;
            let outcome = seat_student(client, student, course, token).await?;
            check_outcome(outcome, expect_errors)?;
        }

        TestStep::Finish { course, confirm } => {
            let course = course_id(server, aliases, course).await?;
            let answer = *confirm;
            let outcome = finish_course(client, course, |_| answer, token).await?;
            check_action(outcome, answer)?;
        }

        TestStep::Cancel { student, confirm } => {
            let student = student_id(aliases, student)?;
            let answer = *confirm;
            let outcome = cancel_student(client, student, |_| answer, token).await?;
            check_action(outcome, answer)?;
        }

        TestStep::ExpectStudent { student, status } => {
            let id = student_id(aliases, student)?;
            let record = server
                .api()
                .student(id)
                .await
                .ok_or_else(|| E2eError::AssertionFailed(format!("student {} is gone", id)))?;
            if record.status != *status {
                return Err(E2eError::AssertionFailed(format!(
                    "student {} is {}, expected {}",
                    id, record.status, status
                )));
            }
        }

        TestStep::ExpectCourse {
            course,
            status,
            seated,
        } => {
            let id = course_id(server, aliases, course).await?;
            let record = server
                .api()
                .course(id)
                .await
                .ok_or_else(|| E2eError::AssertionFailed(format!("course {} is gone", id)))?;
            if record.status != *status {
                return Err(E2eError::AssertionFailed(format!(
                    "course {} is {}, expected {}",
                    id, record.status, status
                )));
            }

            let expected_student = match seated {
                Some(alias) => Some(student_id(aliases, alias)?),
                None => None,
            };
            if record.student_id != expected_student {
                return Err(E2eError::AssertionFailed(format!(
                    "course {} seats {:?}, expected {:?}",
                    id, record.student_id, expected_student
                )));
            }
        }

        TestStep::ExpectOnDashboard { student, visible } => {
            let id = student_id(aliases, student)?;
            let record = server
                .api()
                .student(id)
                .await
                .ok_or_else(|| E2eError::AssertionFailed(format!("student {} is gone", id)))?;
            let dashboard = load_dashboard(client, &record.student_date, token).await;
            if let Some(error) = dashboard.students_error {
                return Err(E2eError::AssertionFailed(error));
            }
            let shown = dashboard.student(id).is_some();
            if shown != *visible {
                return Err(E2eError::AssertionFailed(format!(
                    "student {} shown={} on {}, expected {}",
                    id, shown, record.student_date, visible
                )));
            }
        }

        TestStep::ExpectSearch {
            mobile_number,
            count,
        } => {
            let found = search_students(client, mobile_number, token).await?;
            if found.len() != *count {
                return Err(E2eError::AssertionFailed(format!(
                    "search for {} found {}, expected {}",
                    mobile_number,
                    found.len(),
                    count
                )));
            }
        }

        TestStep::Log { message } => info!("{}", message),
    }

    Ok(())
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub server: ServerConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            specs_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/specs")),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatwise_common::ValidationError;

    #[test]
    fn test_check_outcome_matches_substrings() {
        let outcome: FormOutcome<()> = FormOutcome::Invalid(vec![ValidationError::new(
            "Student cannot be made: Restaurant is closed on Tuesdays.",
        )]);
        assert!(check_outcome(outcome, &["closed on Tuesdays".to_string()]).is_ok());
    }

    #[test]
    fn test_check_outcome_rejects_unexpected_success() {
        let outcome = FormOutcome::Saved(());
        assert!(check_outcome(outcome, &["occupied".to_string()]).is_err());
    }

    #[test]
    fn test_check_outcome_fails_closed_views() {
        assert!(check_outcome::<()>(FormOutcome::Cancelled, &[]).is_err());
        assert!(check_action(ActionOutcome::Cancelled, true).is_err());
    }

    #[test]
    fn test_check_action() {
        assert!(check_action(ActionOutcome::Completed, true).is_ok());
        assert!(check_action(ActionOutcome::Declined, false).is_ok());
        assert!(check_action(ActionOutcome::Declined, true).is_err());
        assert!(check_action(ActionOutcome::Unavailable("x".to_string()), true).is_err());
    }
}
