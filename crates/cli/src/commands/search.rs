//! Search reservations by mobile number

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use seatwise_common::{Student, StudentQuery};

use super::student::StudentDisplay;
use super::ViewScope;
use crate::client::{ApiClient, ApiResult};
use crate::output::{print_list, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Customer's phone number (partial numbers match)
    #[arg(short, long)]
    pub mobile_number: String,
}

/// Reservations matching a mobile number, finished ones hidden
pub async fn search_students(
    client: &ApiClient,
    mobile_number: &str,
    token: &CancellationToken,
) -> ApiResult<Vec<Student>> {
    let query = StudentQuery::for_mobile_number(mobile_number.trim());
    let students = client.list_students(&query, token).await?;
    Ok(students.into_iter().filter(Student::is_visible).collect())
}

pub async fn execute(args: SearchArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let scope = ViewScope::new();
    let students = search_students(client, &args.mobile_number, scope.token()).await?;
    let displays: Vec<StudentDisplay> = students.iter().map(StudentDisplay::from).collect();
    print_list(&displays, format, "No students found");
    Ok(())
}
