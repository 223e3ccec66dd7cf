//! Booking a reservation from the new reservation form

use chrono::Local;
use tokio_util::sync::CancellationToken;

use seatwise_cli::commands::dashboard::load_dashboard;
use seatwise_cli::commands::student::{submit_student, FormMode};
use seatwise_cli::FormOutcome;
use seatwise_common::StudentStatus;
use seatwise_e2e::fixtures::{booking, next_closed_day, next_open_day};
use seatwise_e2e::server::{ServerConfig, ServerHandle};

async fn server() -> ServerHandle {
    ServerHandle::spawn(ServerConfig::default()).await.unwrap()
}

#[tokio::test]
async fn booking_is_created_and_shown_on_its_day() {
    let server = server().await;
    let client = server.client().unwrap();
    let token = CancellationToken::new();

    let form = booking("Toni", 2);
    let outcome = submit_student(&client, FormMode::Create, &form, Local::now().naive_local(), &token)
        .await
        .unwrap();

    let student = match outcome {
        FormOutcome::Saved(Some(student)) => student,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(student.status, StudentStatus::Booked);
    assert_eq!(student.people, 2);

    let dashboard = load_dashboard(&client, &next_open_day(), &token).await;
    assert!(dashboard.students_error.is_none());
    assert!(dashboard.student(student.student_id).is_some());
    assert_eq!(dashboard.courses.len(), 4);
}

#[tokio::test]
async fn tuesday_booking_is_rejected_before_sending() {
    let server = server().await;
    let client = server.client().unwrap();

    for time in ["10:30", "18:00", "23:00"] {
        let mut form = booking("Toni", 2);
        form.student_date = next_closed_day();
        form.student_time = time.to_string();

        let outcome = submit_student(
            &client,
            FormMode::Create,
            &form,
            Local::now().naive_local(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!outcome.is_saved());
        assert!(outcome
            .errors()
            .iter()
            .any(|e| e.message == "Student cannot be made: Restaurant is closed on Tuesdays."));
    }

    assert_eq!(server.api().student_count().await, 0);
}

#[tokio::test]
async fn blank_form_lists_every_missing_field() {
    let server = server().await;
    let client = server.client().unwrap();

    let outcome = submit_student(
        &client,
        FormMode::Create,
        &Default::default(),
        Local::now().naive_local(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.errors().len(), 6);
    assert_eq!(server.api().student_count().await, 0);
}
