use axum::debug_handler;
use axum::extract::{Path, Query};
use loco_rs::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::settings::Settings;
use crate::errors::{Error, Result as PipelineResult};
use crate::models::ai_screenings;
use crate::services::screening;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScreeningResponse {
    id: Uuid,
    candidate_id: Uuid,
    skills_matched: String,
    experience_years: f64,
    education_level: String,
    cultural_fit: String,
    match_score: i32,
    analysis_text: String,
    recommendation: String,
    model_used: String,
    processing_ms: i64,
}

impl From<ai_screenings::Model> for ScreeningResponse {
    fn from(m: ai_screenings::Model) -> Self {
        Self {
            id: m.id,
            candidate_id: m.candidate_id,
            skills_matched: m.skills_matched,
            experience_years: m.experience_years,
            education_level: m.education_level,
            cultural_fit: m.cultural_fit,
            match_score: m.match_score,
            analysis_text: m.analysis_text,
            recommendation: m.recommendation,
            model_used: m.model_used,
            processing_ms: m.processing_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobDescriptionQuery {
    #[serde(rename = "jobDescription")]
    job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreThresholdQuery {
    #[serde(rename = "minScore")]
    min_score: i32,
}

#[derive(Debug, Deserialize)]
struct BulkParams {
    #[serde(rename = "candidateIds")]
    candidate_ids: Vec<Uuid>,
    #[serde(rename = "jobDescription")]
    job_description: Option<String>,
}

#[debug_handler]
async fn screen_sync(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<JobDescriptionQuery>,
) -> PipelineResult<Response> {
    let settings = Settings::from_context(&ctx);
    let result = screening::screen(&ctx.db, &settings, id, query.job_description).await?;
    Ok((axum::http::StatusCode::CREATED, axum::Json(ScreeningResponse::from(result))).into_response())
}

#[debug_handler]
async fn screen_async(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<JobDescriptionQuery>,
) -> PipelineResult<Response> {
    let settings = Settings::from_context(&ctx);
    screening::screen_async(ctx.db.clone(), settings, id, query.job_description);
    let body = serde_json::json!({ "candidateId": id, "status": "PROCESSING" });
    Ok((axum::http::StatusCode::ACCEPTED, axum::Json(body)).into_response())
}

#[debug_handler]
async fn bulk(State(ctx): State<AppContext>, Json(params): Json<BulkParams>) -> PipelineResult<Response> {
    if params.candidate_ids.is_empty() {
        return Err(Error::Validation("candidateIds must not be empty".into()));
    }
    let settings = Settings::from_context(&ctx);
    let total = screening::bulk_async(ctx.db.clone(), settings, params.candidate_ids, params.job_description);
    let body = serde_json::json!({ "totalCandidates": total, "status": "PROCESSING" });
    Ok((axum::http::StatusCode::ACCEPTED, axum::Json(body)).into_response())
}

#[debug_handler]
async fn by_score_threshold(
    State(ctx): State<AppContext>,
    Query(query): Query<ScoreThresholdQuery>,
) -> PipelineResult<Response> {
    let results = ai_screenings::Model::by_score_threshold(&ctx.db, query.min_score).await?;
    format::json(results.into_iter().map(ScreeningResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("screenings")
        .add("/candidate/{id}", post(screen_sync))
        .add("/candidate/{id}/async", post(screen_async))
        .add("/bulk", post(bulk))
        .add("/", get(by_score_threshold))
}
