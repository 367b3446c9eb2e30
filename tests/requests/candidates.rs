use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use serial_test::serial;

use super::prepare_data;

#[tokio::test]
#[serial]
async fn create_candidate_returns_201_with_applied_stage() {
    request::<App, _, _>(|request, _ctx| async move {
        let form = axum_test::multipart::MultipartForm::new()
            .add_text("name", "John Doe")
            .add_text("email", "john.doe@example.com");
        let response = request.post("/api/candidates").multipart(form).await;

        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "John Doe");
        assert_eq!(body["currentStage"], "APPLIED");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn create_candidate_with_resume_is_screenable() {
    request::<App, _, _>(|request, _ctx| async move {
        let form = axum_test::multipart::MultipartForm::new()
            .add_text("name", "Resume Owner")
            .add_text("email", "resume.owner@example.com")
            .add_text("resume", prepare_data::SAMPLE_RESUME);
        let response = request.post("/api/candidates").multipart(form).await;
        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        let blob_ref = body["resumeBlobRef"].as_str().expect("resumeBlobRef must be set");
        assert_ne!(blob_ref, prepare_data::SAMPLE_RESUME, "the uploaded text must not be stored as the blob ref itself");

        let candidate_id: uuid::Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let screen = request.post(&format!("/api/screenings/candidate/{candidate_id}")).await;
        assert_eq!(screen.status_code(), 201, "screening must be able to open the stored blob by its generated name");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn create_candidate_missing_name_is_rejected() {
    request::<App, _, _>(|request, _ctx| async move {
        let form = axum_test::multipart::MultipartForm::new().add_text("email", "noname@example.com");
        let response = request.post("/api/candidates").multipart(form).await;

        assert_eq!(response.status_code(), 400);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn show_candidate_returns_404_when_missing() {
    request::<App, _, _>(|request, _ctx| async move {
        let id = uuid::Uuid::new_v4();
        let response = request.get(&format!("/api/candidates/{id}")).await;
        assert_eq!(response.status_code(), 404);
        let body: serde_json::Value = response.json();
        assert_eq!(body["path"], format!("/api/candidates/{id}"));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn show_candidate_returns_the_created_record() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Jane Roe").await;
        let response = request.get(&format!("/api/candidates/{}", candidate.id)).await;

        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["id"], candidate.id.to_string());
    })
    .await;
}

#[tokio::test]
#[serial]
async fn list_candidates_is_paginated() {
    request::<App, _, _>(|request, ctx| async move {
        for i in 0..3 {
            prepare_data::create_candidate(&ctx, &format!("Candidate {i}")).await;
        }
        let response = request.get("/api/candidates?page=1&size=2").await;

        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["total"], 3);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn search_candidates_filters_by_stage() {
    request::<App, _, _>(|request, ctx| async move {
        let applied = prepare_data::create_candidate(&ctx, "Still Applied").await;
        let screening = prepare_data::create_candidate(&ctx, "In Screening").await;
        prepare_data::advance_to_screening(&ctx, screening.id).await;

        let response = request.get("/api/candidates/search?stage=SCREENING").await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        let ids: Vec<String> = body.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap().to_string()).collect();
        assert!(ids.contains(&screening.id.to_string()));
        assert!(!ids.contains(&applied.id.to_string()));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn update_stage_applies_a_legal_transition() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Legal Transition").await;
        let response = request
            .put(&format!("/api/candidates/{}/stage?newStage=SCREENING&changedBy=HR_MANAGER", candidate.id))
            .await;

        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["currentStage"], "SCREENING");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn update_stage_rejects_an_illegal_transition() {
    // APPLIED -> HIRED is not in the transition table.
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Illegal Jump").await;
        let response = request
            .put(&format!("/api/candidates/{}/stage?newStage=HIRED&changedBy=HR_MANAGER", candidate.id))
            .await;

        assert_eq!(response.status_code(), 422);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "IllegalTransition");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn delete_non_hired_candidate_succeeds() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Deletable").await;
        let response = request.delete(&format!("/api/candidates/{}", candidate.id)).await;
        assert_eq!(response.status_code(), 204);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn delete_hired_candidate_is_rejected() {
    // Walk the candidate through the only legal chain to HIRED, then
    // confirm deletion is refused.
    use pipeline_core::models::{candidates, state_machine::Stage};

    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Hired Already").await;
        for stage in [Stage::Screening, Stage::InterviewScheduled, Stage::InterviewCompleted, Stage::Hired] {
            candidates::update_stage(&ctx.db, candidate.id, stage, "HR_MANAGER", None).await.unwrap();
        }

        let response = request.delete(&format!("/api/candidates/{}", candidate.id)).await;
        assert_eq!(response.status_code(), 422);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("Cannot delete hired"));
    })
    .await;
}
