use loco_rs::testing::prelude::*;
use pipeline_core::app::App;
use pipeline_core::models::{interviews, state_machine::InterviewStatus};
use serial_test::serial;

use super::prepare_data;

/// Schedules and completes an interview, returning (interview_id, interviewer_id).
async fn completed_interview(ctx: &loco_rs::app::AppContext) -> (uuid::Uuid, uuid::Uuid) {
    let candidate = prepare_data::create_candidate(ctx, "Feedback Candidate").await;
    prepare_data::advance_to_screening(ctx, candidate.id).await;
    let interviewer = prepare_data::create_interviewer(ctx, "Feedback Interviewer").await;
    let interview = interviews::schedule(
        &ctx.db,
        candidate.id,
        interviewer.id,
        prepare_data::tomorrow_at(9),
        None,
        "TECHNICAL",
        None,
        None,
        "HR_MANAGER",
    )
    .await
    .unwrap();
    interviews::transition_status(&ctx.db, interview.id, InterviewStatus::Completed, "HR_MANAGER", None)
        .await
        .unwrap();
    (interview.id, interviewer.id)
}

#[tokio::test]
#[serial]
async fn submit_feedback_returns_201_with_overall_score() {
    request::<App, _, _>(|request, ctx| async move {
        let (interview_id, interviewer_id) = completed_interview(&ctx).await;
        let response = request
            .post("/api/feedback")
            .json(&serde_json::json!({
                "interviewId": interview_id,
                "interviewerId": interviewer_id,
                "technical": 5,
                "communication": 4,
                "problemSolving": 5,
                "culturalFit": 4,
                "recommendation": "STRONG_HIRE",
            }))
            .await;

        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        assert_eq!(body["overallScore"], 4.5);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn submit_feedback_rejects_out_of_range_score() {
    request::<App, _, _>(|request, ctx| async move {
        let (interview_id, interviewer_id) = completed_interview(&ctx).await;
        let response = request
            .post("/api/feedback")
            .json(&serde_json::json!({
                "interviewId": interview_id,
                "interviewerId": interviewer_id,
                "technical": 6,
                "communication": 4,
                "problemSolving": 5,
                "recommendation": "HIRE",
            }))
            .await;

        assert_eq!(response.status_code(), 400);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("between 1 and 5"));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn submit_feedback_rejects_interview_still_scheduled() {
    request::<App, _, _>(|request, ctx| async move {
        let candidate = prepare_data::create_candidate(&ctx, "Not Completed Yet").await;
        prepare_data::advance_to_screening(&ctx, candidate.id).await;
        let interviewer = prepare_data::create_interviewer(&ctx, "Waiting Interviewer").await;
        let interview = interviews::schedule(
            &ctx.db,
            candidate.id,
            interviewer.id,
            prepare_data::tomorrow_at(10),
            None,
            "TECHNICAL",
            None,
            None,
            "HR_MANAGER",
        )
        .await
        .unwrap();

        let response = request
            .post("/api/feedback")
            .json(&serde_json::json!({
                "interviewId": interview.id,
                "interviewerId": interviewer.id,
                "technical": 4,
                "communication": 4,
                "problemSolving": 4,
                "recommendation": "HIRE",
            }))
            .await;

        assert_eq!(response.status_code(), 400);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "InvalidState");
    })
    .await;
}

#[tokio::test]
#[serial]
async fn submit_feedback_twice_is_a_conflict() {
    request::<App, _, _>(|request, ctx| async move {
        let (interview_id, interviewer_id) = completed_interview(&ctx).await;
        let payload = serde_json::json!({
            "interviewId": interview_id,
            "interviewerId": interviewer_id,
            "technical": 4,
            "communication": 4,
            "problemSolving": 4,
            "recommendation": "HIRE",
        });
        let first = request.post("/api/feedback").json(&payload).await;
        assert_eq!(first.status_code(), 201);

        let second = request.post("/api/feedback").json(&payload).await;
        assert_eq!(second.status_code(), 409);
        let body: serde_json::Value = second.json();
        assert_eq!(body["error"], "DuplicateFeedback");
    })
    .await;
}
