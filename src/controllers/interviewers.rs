use axum::debug_handler;
use axum::extract::{Path, Query};
use loco_rs::prelude::*;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result as PipelineResult};
use crate::models::interviewers;
use crate::models::interviews;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InterviewerResponse {
    id: Uuid,
    name: String,
    email: String,
    department: Option<String>,
    title: Option<String>,
    expertise: Option<String>,
}

impl From<interviewers::Model> for InterviewerResponse {
    fn from(m: interviewers::Model) -> Self {
        Self { id: m.id, name: m.name, email: m.email, department: m.department, title: m.title, expertise: m.expertise }
    }
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    name: String,
    email: String,
    department: Option<String>,
    title: Option<String>,
    expertise: Option<String>,
}

#[debug_handler]
async fn create(State(ctx): State<AppContext>, Json(params): Json<CreateParams>) -> PipelineResult<Response> {
    let interviewer = interviewers::create(
        &ctx.db,
        &params.name,
        &params.email,
        params.department,
        params.title,
        params.expertise,
    )
    .await?;
    format::json(InterviewerResponse::from(interviewer)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn show(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    let interviewer = interviewers::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interviewer {id}")))?;
    format::json(InterviewerResponse::from(interviewer)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn list(State(ctx): State<AppContext>) -> PipelineResult<Response> {
    let all = interviewers::Entity::find().all(&ctx.db).await?;
    format::json(all.into_iter().map(InterviewerResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn destroy(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    interviewers::delete(&ctx.db, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InterviewSummary {
    id: Uuid,
    candidate_id: Uuid,
    scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    duration_minutes: i32,
    current_status: String,
}

impl From<interviews::Model> for InterviewSummary {
    fn from(m: interviews::Model) -> Self {
        Self {
            id: m.id,
            candidate_id: m.candidate_id,
            scheduled_at: m.scheduled_at,
            duration_minutes: m.duration_minutes,
            current_status: m.current_status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WindowQuery {
    start: Option<chrono::DateTime<chrono::FixedOffset>>,
    end: Option<chrono::DateTime<chrono::FixedOffset>>,
}

#[debug_handler]
async fn list_interviews(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> PipelineResult<Response> {
    let interviews = match (window.start, window.end) {
        (Some(start), Some(end)) => interviews::Model::find_by_window(&ctx.db, id, start, end).await?,
        _ => interviews::Model::find_by_interviewer(&ctx.db, id).await?,
    };
    format::json(interviews.into_iter().map(InterviewSummary::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityResponse {
    available: bool,
}

#[debug_handler]
async fn availability(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> PipelineResult<Response> {
    let start = window.start.ok_or_else(|| Error::MissingParameter("start".into()))?;
    let end = window.end.ok_or_else(|| Error::MissingParameter("end".into()))?;
    let available = interviews::is_available(&ctx.db, id, start, end).await?;
    format::json(AvailabilityResponse { available }).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn available(State(ctx): State<AppContext>, Query(window): Query<WindowQuery>) -> PipelineResult<Response> {
    let start = window.start.ok_or_else(|| Error::MissingParameter("start".into()))?;
    let end = window.end.ok_or_else(|| Error::MissingParameter("end".into()))?;
    let interviewers = interviews::find_available(&ctx.db, start, end).await?;
    format::json(interviewers.into_iter().map(InterviewerResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("interviewers")
        .add("/", post(create))
        .add("/", get(list))
        .add("/available", get(available))
        .add("/{id}", get(show))
        .add("/{id}", delete(destroy))
        .add("/{id}/interviews", get(list_interviews))
        .add("/{id}/availability", get(availability))
}
