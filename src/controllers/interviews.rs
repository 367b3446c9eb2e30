use axum::debug_handler;
use axum::extract::{Path, Query};
use loco_rs::prelude::*;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result as PipelineResult};
use crate::models::interviews;
use crate::models::state_machine::InterviewStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InterviewResponse {
    id: Uuid,
    candidate_id: Uuid,
    interviewer_id: Uuid,
    scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    duration_minutes: i32,
    current_status: String,
    interview_type: String,
    location: Option<String>,
    notes: Option<String>,
}

impl From<interviews::Model> for InterviewResponse {
    fn from(m: interviews::Model) -> Self {
        Self {
            id: m.id,
            candidate_id: m.candidate_id,
            interviewer_id: m.interviewer_id,
            scheduled_at: m.scheduled_at,
            duration_minutes: m.duration_minutes,
            current_status: m.current_status,
            interview_type: m.interview_type,
            location: m.location,
            notes: m.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleParams {
    #[serde(rename = "candidateId")]
    candidate_id: Uuid,
    #[serde(rename = "interviewerId")]
    interviewer_id: Uuid,
    #[serde(rename = "scheduledAt")]
    scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    #[serde(rename = "durationMinutes")]
    duration_minutes: Option<i32>,
    #[serde(rename = "type")]
    interview_type: String,
    location: Option<String>,
    notes: Option<String>,
    who: String,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    #[serde(rename = "newStatus")]
    new_status: String,
    #[serde(rename = "changedBy")]
    changed_by: String,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RescheduleQuery {
    #[serde(rename = "newScheduledAt")]
    new_scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    #[serde(rename = "newDuration")]
    new_duration: Option<i32>,
    #[serde(rename = "rescheduledBy")]
    rescheduled_by: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CancelQuery {
    #[serde(rename = "cancelledBy")]
    cancelled_by: String,
    reason: Option<String>,
}

#[debug_handler]
async fn schedule(State(ctx): State<AppContext>, Json(params): Json<ScheduleParams>) -> PipelineResult<Response> {
    let interview = interviews::schedule(
        &ctx.db,
        params.candidate_id,
        params.interviewer_id,
        params.scheduled_at,
        params.duration_minutes,
        &params.interview_type,
        params.location,
        params.notes,
        &params.who,
    )
    .await?;
    Ok((axum::http::StatusCode::CREATED, axum::Json(InterviewResponse::from(interview))).into_response())
}

#[debug_handler]
async fn show(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    let interview = interviews::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interview {id}")))?;
    format::json(InterviewResponse::from(interview)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn update_status(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> PipelineResult<Response> {
    let new_status = InterviewStatus::parse(&query.new_status)
        .ok_or_else(|| Error::Validation(format!("unknown status {}", query.new_status)))?;
    let interview = interviews::transition_status(&ctx.db, id, new_status, &query.changed_by, query.notes).await?;
    format::json(InterviewResponse::from(interview)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn reschedule(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<RescheduleQuery>,
) -> PipelineResult<Response> {
    let interview = interviews::reschedule(
        &ctx.db,
        id,
        query.new_scheduled_at,
        query.new_duration,
        &query.rescheduled_by,
        query.reason,
    )
    .await?;
    format::json(InterviewResponse::from(interview)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn cancel(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<CancelQuery>,
) -> PipelineResult<Response> {
    let interview = interviews::cancel(&ctx.db, id, &query.cancelled_by, query.reason).await?;
    format::json(InterviewResponse::from(interview)).map_err(|e| Error::Internal(e.to_string()))
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("interviews")
        .add("/", post(schedule))
        .add("/{id}", get(show))
        .add("/{id}/status", put(update_status))
        .add("/{id}/reschedule", put(reschedule))
        .add("/{id}/cancel", put(cancel))
}
