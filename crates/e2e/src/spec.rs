//! Declarative YAML scenario specification
//!
//! Records created by a step can be named with `as:` and referred to by
//! that alias in later steps.

use serde::{Deserialize, Serialize};
use std::path::Path;

use seatwise_common::{CourseStatus, StudentStatus};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Submit the new course form
    CreateCourse {
        #[serde(rename = "as", default)]
        alias: Option<String>,
        #[serde(default)]
        course_name: String,
        #[serde(default)]
        capacity: String,
        #[serde(default)]
        expect_errors: Vec<String>,
    },

    /// Submit the new reservation form
    CreateStudent {
        #[serde(rename = "as", default)]
        alias: Option<String>,
        #[serde(default)]
        first_name: String,
        #[serde(default)]
        last_name: String,
        #[serde(default)]
        mobile_number: String,
        /// Literal date or a keyword such as `next_open_day`
        #[serde(default = "default_date")]
        date: String,
        #[serde(default)]
        time: String,
        #[serde(default)]
        people: String,
        #[serde(default)]
        expect_errors: Vec<String>,
    },

    /// Load the edit form, change some fields, and submit
    EditStudent {
        student: String,
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        mobile_number: Option<String>,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        time: Option<String>,
        #[serde(default)]
        people: Option<String>,
        #[serde(default)]
        expect_errors: Vec<String>,
    },

    /// Seat a reservation at a course
    Seat {
        student: String,
        course: String,
        #[serde(default)]
        expect_errors: Vec<String>,
    },

    /// Finish a course, answering the confirmation prompt with `confirm`
    Finish {
        course: String,
        #[serde(default = "default_confirm")]
        confirm: bool,
    },

    /// Cancel a reservation, answering the confirmation prompt with `confirm`
    Cancel {
        student: String,
        #[serde(default = "default_confirm")]
        confirm: bool,
    },

    /// Assert a reservation's status as stored by the backend
    ExpectStudent {
        student: String,
        status: StudentStatus,
    },

    /// Assert a course's status and who is seated there
    ExpectCourse {
        course: String,
        status: CourseStatus,
        #[serde(default)]
        seated: Option<String>,
    },

    /// Assert whether a reservation shows on its day's dashboard
    ExpectOnDashboard {
        student: String,
        visible: bool,
    },

    /// Assert how many reservations a mobile number search finds
    ExpectSearch {
        mobile_number: String,
        count: usize,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_date() -> String {
    "next_open_day".to_string()
}

fn default_confirm() -> bool {
    true
}

impl TestStep {
    /// Short name used in results and logs
    pub fn name(&self) -> String {
        match self {
            TestStep::CreateCourse { course_name, .. } => format!("create_course {}", course_name),
            TestStep::CreateStudent { first_name, .. } => format!("create_student {}", first_name),
            TestStep::EditStudent { student, .. } => format!("edit_student {}", student),
            TestStep::Seat { student, course, .. } => format!("seat {} at {}", student, course),
            TestStep::Finish { course, .. } => format!("finish {}", course),
            TestStep::Cancel { student, .. } => format!("cancel {}", student),
            TestStep::ExpectStudent { student, status } => format!("expect {} {}", student, status),
            TestStep::ExpectCourse { course, status, .. } => format!("expect {} {}", course, status),
            TestStep::ExpectOnDashboard { student, visible } => {
                format!("expect {} visible={}", student, visible)
            }
            TestStep::ExpectSearch { mobile_number, count } => {
                format!("search {} finds {}", mobile_number, count)
            }
            TestStep::Log { .. } => "log".to_string(),
        }
    }
}

impl TestSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, ordered by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seat_scenario() {
        let yaml = r#"
name: seat-party
description: Seat a party of four at a six-top
tags:
  - us-04
steps:
  - action: create_course
    as: six_top
    course_name: Patio
    capacity: "6"
  - action: create_student
    as: party
    first_name: James
    last_name: Baldwin
    mobile_number: "555-0142"
    time: "18:00"
    people: "4"
  - action: seat
    student: party
    course: six_top
  - action: expect_course
    course: six_top
    status: occupied
    seated: party
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "seat-party");
        assert_eq!(spec.steps.len(), 4);

        match &spec.steps[1] {
            TestStep::CreateStudent { alias, date, .. } => {
                assert_eq!(alias.as_deref(), Some("party"));
                assert_eq!(date, "next_open_day");
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert!(matches!(
            spec.steps[3],
            TestStep::ExpectCourse { status: CourseStatus::Occupied, .. }
        ));
    }

    #[test]
    fn test_confirm_defaults_to_yes() {
        let yaml = r#"
name: finish
steps:
  - action: finish
    course: bar
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert!(matches!(spec.steps[0], TestStep::Finish { confirm: true, .. }));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let yaml = r#"
name: broken
steps:
  - action: teleport
"#;
        assert!(TestSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_filter_by_tag() {
        let specs = vec![
            TestSpec::from_yaml("name: a\ntags: [us-05]\nsteps: []").unwrap(),
            TestSpec::from_yaml("name: b\ntags: [us-06]\nsteps: []").unwrap(),
        ];
        let filtered = TestSpec::filter_by_tag(&specs, "us-06");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "b");
    }
}
