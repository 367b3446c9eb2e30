use axum::debug_handler;
use loco_rs::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result as PipelineResult;
use crate::models::feedback;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackResponse {
    id: Uuid,
    interview_id: Uuid,
    interviewer_id: Uuid,
    technical: i32,
    communication: i32,
    problem_solving: i32,
    cultural_fit: Option<i32>,
    strengths: Option<String>,
    weaknesses: Option<String>,
    comments: Option<String>,
    recommendation: String,
    overall_score: f64,
}

impl From<feedback::Model> for FeedbackResponse {
    fn from(m: feedback::Model) -> Self {
        let overall_score = m.overall_score();
        Self {
            id: m.id,
            interview_id: m.interview_id,
            interviewer_id: m.interviewer_id,
            technical: m.technical,
            communication: m.communication,
            problem_solving: m.problem_solving,
            cultural_fit: m.cultural_fit,
            strengths: m.strengths,
            weaknesses: m.weaknesses,
            comments: m.comments,
            recommendation: m.recommendation,
            overall_score,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitParams {
    #[serde(rename = "interviewId")]
    interview_id: Uuid,
    #[serde(rename = "interviewerId")]
    interviewer_id: Uuid,
    technical: i32,
    communication: i32,
    #[serde(rename = "problemSolving")]
    problem_solving: i32,
    #[serde(rename = "culturalFit")]
    cultural_fit: Option<i32>,
    strengths: Option<String>,
    weaknesses: Option<String>,
    comments: Option<String>,
    recommendation: String,
}

#[debug_handler]
async fn submit(State(ctx): State<AppContext>, Json(params): Json<SubmitParams>) -> PipelineResult<Response> {
    let created = feedback::submit(
        &ctx.db,
        params.interview_id,
        params.interviewer_id,
        params.technical,
        params.communication,
        params.problem_solving,
        params.cultural_fit,
        params.strengths,
        params.weaknesses,
        params.comments,
        &params.recommendation,
    )
    .await?;
    Ok((axum::http::StatusCode::CREATED, axum::Json(FeedbackResponse::from(created))).into_response())
}

pub fn routes() -> Routes {
    Routes::new().prefix("feedback").add("/", post(submit))
}
