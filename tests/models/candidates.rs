use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use pipeline_core::errors::Error;
use pipeline_core::models::{candidates, state_machine::Stage};
use sea_orm::EntityTrait;
use serial_test::serial;
use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[serial]
async fn create_lands_in_applied_with_an_initial_stage_change() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let email = unique_email("create");

    let candidate = candidates::create(&boot.app_context.db, "Ada Lovelace", &email, None, None).await.unwrap();
    assert_eq!(candidate.current_stage, "APPLIED");

    let history = pipeline_core::models::stage_changes::Model::history_for(&boot.app_context.db, candidate.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_state, None);
    assert_eq!(history[0].to_state, "APPLIED");
}

#[tokio::test]
#[serial]
async fn create_rejects_a_duplicate_email() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let email = unique_email("dup");
    candidates::create(&boot.app_context.db, "First", &email, None, None).await.unwrap();

    let result = candidates::create(&boot.app_context.db, "Second", &email, None, None).await;
    assert!(matches!(result, Err(Error::DuplicateEmail(_))));
}

#[tokio::test]
#[serial]
async fn update_stage_rejects_a_same_stage_transition() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Noop", &unique_email("noop"), None, None).await.unwrap();

    let result = candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Applied, "HR_MANAGER", None).await;
    assert!(matches!(result, Err(Error::NoOpTransition)));
}

#[tokio::test]
#[serial]
async fn update_stage_rejects_an_illegal_transition() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Illegal", &unique_email("illegal"), None, None).await.unwrap();

    let result = candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Hired, "HR_MANAGER", None).await;
    assert!(matches!(result, Err(Error::IllegalTransition(_))));
}

#[tokio::test]
#[serial]
async fn update_stage_records_a_stage_change_per_legal_hop() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Hops", &unique_email("hops"), None, None).await.unwrap();

    candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Screening, "HR_MANAGER", None).await.unwrap();
    candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Rejected, "HR_MANAGER", Some("not a fit".into()))
        .await
        .unwrap();

    let history = pipeline_core::models::stage_changes::Model::history_for(&boot.app_context.db, candidate.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].from_state.as_deref(), Some("SCREENING"));
    assert_eq!(history[2].to_state, "REJECTED");
    assert_eq!(history[2].reason.as_deref(), Some("not a fit"));
}

#[tokio::test]
#[serial]
async fn delete_rejects_a_hired_candidate() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Hired", &unique_email("hired"), None, None).await.unwrap();
    for stage in [Stage::Screening, Stage::InterviewScheduled, Stage::InterviewCompleted, Stage::Hired] {
        candidates::update_stage(&boot.app_context.db, candidate.id, stage, "HR_MANAGER", None).await.unwrap();
    }

    let result = candidates::delete(&boot.app_context.db, candidate.id).await;
    assert!(matches!(result, Err(Error::Forbidden(_))));
}

#[tokio::test]
#[serial]
async fn delete_allows_a_non_hired_candidate() {
    let boot = boot_test::<App>().await.expect("failed to boot test application");
    let candidate = candidates::create(&boot.app_context.db, "Rejected", &unique_email("rejected"), None, None).await.unwrap();
    candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Screening, "HR_MANAGER", None).await.unwrap();
    candidates::update_stage(&boot.app_context.db, candidate.id, Stage::Rejected, "HR_MANAGER", None).await.unwrap();

    candidates::delete(&boot.app_context.db, candidate.id).await.unwrap();
    assert!(candidates::Entity::find_by_id(candidate.id).one(&boot.app_context.db).await.unwrap().is_none());
}
