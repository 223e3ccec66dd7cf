//! Finishing an occupied table

use tokio_util::sync::CancellationToken;

use seatwise_cli::commands::course::{finish_course, FINISH_PROMPT};
use seatwise_cli::commands::dashboard::load_dashboard;
use seatwise_cli::commands::student::seat_student;
use seatwise_cli::ActionOutcome;
use seatwise_common::{CourseStatus, StudentStatus};
use seatwise_e2e::fixtures::{booking, create_student};
use seatwise_e2e::server::{ServerConfig, ServerHandle};

async fn seated_party(server: &ServerHandle) -> (i64, i64) {
    let client = server.client().unwrap();
    let party = create_student(&client, &booking("Ralph", 4)).await.unwrap();
    let course = server.api().course_by_name("#1").await.unwrap();
    seat_student(&client, party.student_id, course.course_id, &CancellationToken::new())
        .await
        .unwrap();
    (party.student_id, course.course_id)
}

#[tokio::test]
async fn finishing_frees_the_table_and_finishes_the_party() {
    let server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let client = server.client().unwrap();
    let token = CancellationToken::new();
    let (student_id, course_id) = seated_party(&server).await;

    let mut asked = None;
    let outcome = finish_course(
        &client,
        course_id,
        |prompt| {
            asked = Some(prompt.to_string());
            true
        },
        &token,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(asked.as_deref(), Some(FINISH_PROMPT));

    let course = server.api().course(course_id).await.unwrap();
    assert_eq!(course.status, CourseStatus::Free);
    assert_eq!(course.student_id, None);

    let student = server.api().student(student_id).await.unwrap();
    assert_eq!(student.status, StudentStatus::Finished);

    let dashboard = load_dashboard(&client, &student.student_date, &token).await;
    assert!(dashboard.student(student_id).is_none());
    assert!(!dashboard.course(course_id).unwrap().is_occupied());
}

#[tokio::test]
async fn declining_the_prompt_leaves_the_table_occupied() {
    let server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let client = server.client().unwrap();
    let (student_id, course_id) = seated_party(&server).await;

    let outcome = finish_course(&client, course_id, |_| false, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Declined);

    let course = server.api().course(course_id).await.unwrap();
    assert_eq!(course.student_id, Some(student_id));
}

#[tokio::test]
async fn free_table_offers_no_finish() {
    let server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
    let client = server.client().unwrap();
    let bar = server.api().course_by_name("Bar #1").await.unwrap();

    let outcome = finish_course(
        &client,
        bar.course_id,
        |_| panic!("no prompt for a free table"),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, ActionOutcome::Unavailable(_)));
}
