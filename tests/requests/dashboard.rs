use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use serial_test::serial;

use super::prepare_data;

#[tokio::test]
#[serial]
async fn dashboard_reports_totals_and_per_stage_counts() {
    request::<App, _, _>(|request, ctx| async move {
        prepare_data::create_candidate(&ctx, "Dashboard Candidate One").await;
        let screening_candidate = prepare_data::create_candidate(&ctx, "Dashboard Candidate Two").await;
        prepare_data::advance_to_screening(&ctx, screening_candidate.id).await;

        let response = request.get("/api/dashboard").await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["totalCandidates"], 2);
        assert_eq!(body["candidatesPerStage"]["applied"], 1);
        assert_eq!(body["candidatesPerStage"]["screening"], 1);
        assert_eq!(body["hiringFunnel"]["total"], 2);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn dashboard_lists_recent_stage_transitions_and_average_scores() {
    use pipeline_core::models::{ai_screenings, candidates, state_machine::Stage};

    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate_with_resume(&ctx, "Dashboard Screened Candidate").await;
        candidates::update_stage(&ctx.db, candidate.id, Stage::Screening, "HR_MANAGER", None).await.unwrap();
        let screening = ai_screenings::ActiveModel {
            candidate_id: sea_orm::ActiveValue::Set(candidate.id),
            skills_matched: sea_orm::ActiveValue::Set("Rust, SQL".into()),
            experience_years: sea_orm::ActiveValue::Set(4.0),
            education_level: sea_orm::ActiveValue::Set("BACHELOR".into()),
            cultural_fit: sea_orm::ActiveValue::Set("GOOD".into()),
            match_score: sea_orm::ActiveValue::Set(72),
            analysis_text: sea_orm::ActiveValue::Set("solid match".into()),
            recommendation: sea_orm::ActiveValue::Set("YES".into()),
            model_used: sea_orm::ActiveValue::Set("fallback-heuristic".into()),
            processing_ms: sea_orm::ActiveValue::Set(5),
            ..Default::default()
        };
        ai_screenings::persist(&ctx.db, screening, candidate.id).await.unwrap();

        let response = request.get("/api/dashboard?recentWindowHours=48").await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();

        let transitions = body["recentStageTransitions"].as_array().unwrap();
        assert!(transitions.iter().any(|t| t["candidateId"] == candidate.id.to_string() && t["toStage"] == "SCREENING"));

        let averages = body["averageScreeningScoreByStage"].as_array().unwrap();
        let screening_average = averages.iter().find(|a| a["stage"] == "SCREENING").unwrap();
        assert_eq!(screening_average["averageScore"], 72.0);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn health_reports_ok() {
    request::<App, _, _>(|request, _ctx| async move {
        let response = request.get("/api/dashboard/health").await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    })
    .await;
}
