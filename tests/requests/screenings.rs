use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use serial_test::serial;

use super::prepare_data;

#[tokio::test]
#[serial]
async fn sync_screen_persists_a_fallback_analysis() {
    // The test environment's llm.baseUrl is unreachable (config/test.yaml),
    // so this always exercises the fallback analyzer path.
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate_with_resume(&ctx, "Screened Candidate").await;
        let response = request
            .post(&format!("/api/screenings/candidate/{}?jobDescription=Java+Developer", candidate.id))
            .await;

        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        assert_eq!(body["matchScore"], 55);
        assert_eq!(body["recommendation"], "MAYBE");
        assert_eq!(body["experienceYears"], 5.0);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn sync_screen_without_resume_is_rejected() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "No Resume").await;
        let response = request.post(&format!("/api/screenings/candidate/{}", candidate.id)).await;
        assert_eq!(response.status_code(), 400);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn async_screen_accepts_and_returns_processing() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate_with_resume(&ctx, "Async Candidate").await;
        let response = request.post(&format!("/api/screenings/candidate/{}/async", candidate.id)).await;

        assert_eq!(response.status_code(), 202);
        let body: serde_json::Value = response.json();
        assert_eq!(body["candidateId"], candidate.id.to_string());
        assert_eq!(body["status"], "PROCESSING");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn bulk_screen_accepts_a_batch() {
    request::<App, _, _>(|request, ctx| async move {
        let a = prepare_data::create_candidate_with_resume(&ctx, "Bulk A").await;
        let b = prepare_data::create_candidate_with_resume(&ctx, "Bulk B").await;

        let response = request
            .post("/api/screenings/bulk")
            .json(&serde_json::json!({"candidateIds": [a.id, b.id]}))
            .await;

        assert_eq!(response.status_code(), 202);
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalCandidates"], 2);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn bulk_screen_rejects_an_empty_batch() {
    request::<App, _, _>(|request, _ctx| async move {
        let response = request.post("/api/screenings/bulk").json(&serde_json::json!({"candidateIds": []})).await;
        assert_eq!(response.status_code(), 400);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn listing_by_score_threshold_excludes_lower_scores() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate_with_resume(&ctx, "Threshold Candidate").await;
        request
            .post(&format!("/api/screenings/candidate/{}?jobDescription=Java+Developer", candidate.id))
            .await;

        let above = request.get("/api/screenings?minScore=10").await;
        assert_eq!(above.status_code(), 200);
        let above_body: serde_json::Value = above.json();
        let ids: Vec<String> = above_body.as_array().unwrap().iter().map(|s| s["candidateId"].as_str().unwrap().to_string()).collect();
        assert!(ids.contains(&candidate.id.to_string()));

        let below = request.get("/api/screenings?minScore=90").await;
        let below_body: serde_json::Value = below.json();
        let below_ids: Vec<String> = below_body.as_array().unwrap().iter().map(|s| s["candidateId"].as_str().unwrap().to_string()).collect();
        assert!(!below_ids.contains(&candidate.id.to_string()));
    })
    .await;
}
