use chrono::{Duration, Utc};
use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use pipeline_core::models::{
    candidates, interviewers, interviews, stage_changes,
    state_machine::{can_transition_stage, InterviewStatus, Stage},
    status_changes,
};
use sea_orm::EntityTrait;
use serial_test::serial;
use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

fn future_hour(hour: u32) -> chrono::DateTime<chrono::FixedOffset> {
    let day = (Utc::now() + Duration::days(1)).date_naive();
    day.and_hms_opt(hour, 0, 0).unwrap().and_utc().fixed_offset()
}

/// Invariant 1: the latest StageChange.toState always equals the
/// candidate's currentStage, after an arbitrary sequence of transitions.
#[tokio::test]
#[serial]
async fn latest_stage_change_matches_current_stage() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Invariant1", &unique_email("invariant1"), None, None).await.unwrap();

    for stage in [Stage::Screening, Stage::InterviewScheduled, Stage::InterviewCompleted, Stage::Hired] {
        let updated = candidates::update_stage(&boot.app_context.db, candidate.id, stage, "HR_MANAGER", None).await.unwrap();
        let history = stage_changes::Model::history_for(&boot.app_context.db, candidate.id).await.unwrap();
        assert_eq!(history.last().unwrap().to_state, updated.current_stage);
    }
}

/// Invariant 2: the latest StatusChange.toState always equals the
/// interview's currentStatus.
#[tokio::test]
#[serial]
async fn latest_status_change_matches_current_status() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Invariant2", &unique_email("invariant2"), None, None).await.unwrap();
    candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Screening, "HR_MANAGER", None).await.unwrap();
    let interviewer = interviewers::create(&boot.app_context.db, "Invariant2", &unique_email("invariant2"), None, None, None)
        .await
        .unwrap();
    let interview = interviews::schedule(
        &boot.app_context.db,
        candidate.id,
        interviewer.id,
        future_hour(9),
        None,
        "TECHNICAL",
        None,
        None,
        "HR_MANAGER",
    )
    .await
    .unwrap();

    for status in [InterviewStatus::InProgress, InterviewStatus::Completed] {
        let updated = interviews::transition_status(&boot.app_context.db, interview.id, status, "HR_MANAGER", None).await.unwrap();
        let history = status_changes::Model::history_for(&boot.app_context.db, interview.id).await.unwrap();
        assert_eq!(history.last().unwrap().to_state, updated.current_status);
    }
}

/// Round-trip: the sequence of stages visible in history, projected to
/// `toState`, is a valid path in the transition graph; applying the same
/// sequence to a fresh candidate reproduces the same current stage.
#[tokio::test]
#[serial]
async fn stage_history_round_trips_through_a_fresh_candidate() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let original = candidates::create(&boot.app_context.db, "Original", &unique_email("original"), None, None).await.unwrap();
    for stage in [Stage::Screening, Stage::InterviewScheduled, Stage::Rejected] {
        candidates::update_stage(&boot.app_context.db, original.id, stage, "HR_MANAGER", None).await.unwrap();
    }

    let history = stage_changes::Model::history_for(&boot.app_context.db, original.id).await.unwrap();
    let path: Vec<Stage> = history.iter().map(|h| Stage::parse(&h.to_state).unwrap()).collect();

    for window in path.windows(2) {
        assert!(can_transition_stage(window[0], window[1]), "recorded history must only contain legal hops");
    }

    let replay = candidates::create(&boot.app_context.db, "Replay", &unique_email("replay"), None, None).await.unwrap();
    // `create` already lands the replay candidate on the first element (APPLIED);
    // replay every subsequent hop in the same order.
    for stage in &path[1..] {
        candidates::update_stage(&boot.app_context.db, replay.id, *stage, "HR_MANAGER", None).await.unwrap();
    }

    let reloaded_original = candidates::Entity::find_by_id(original.id).one(&boot.app_context.db).await.unwrap().unwrap();
    let reloaded_replay = candidates::Entity::find_by_id(replay.id).one(&boot.app_context.db).await.unwrap().unwrap();
    assert_eq!(reloaded_original.current_stage, reloaded_replay.current_stage);
}
