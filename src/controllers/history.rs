use axum::debug_handler;
use axum::extract::Path;
use loco_rs::prelude::*;
use sea_orm::EntityTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{Error, Result as PipelineResult};
use crate::models::{stage_changes, status_changes};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StageChangeResponse {
    id: Uuid,
    candidate_id: Uuid,
    from_state: Option<String>,
    to_state: String,
    changed_by: String,
    reason: Option<String>,
    changed_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<stage_changes::Model> for StageChangeResponse {
    fn from(m: stage_changes::Model) -> Self {
        Self {
            id: m.id,
            candidate_id: m.candidate_id,
            from_state: m.from_state,
            to_state: m.to_state,
            changed_by: m.changed_by,
            reason: m.reason,
            changed_at: m.changed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusChangeResponse {
    id: Uuid,
    interview_id: Uuid,
    from_state: Option<String>,
    to_state: String,
    changed_by: String,
    notes: Option<String>,
    changed_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<status_changes::Model> for StatusChangeResponse {
    fn from(m: status_changes::Model) -> Self {
        Self {
            id: m.id,
            interview_id: m.interview_id,
            from_state: m.from_state,
            to_state: m.to_state,
            changed_by: m.changed_by,
            notes: m.notes,
            changed_at: m.changed_at,
        }
    }
}

#[debug_handler]
async fn candidate_history(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    use crate::models::candidates;
    candidates::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    let history = stage_changes::Model::history_for(&ctx.db, id).await?;
    format::json(history.into_iter().map(StageChangeResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn interview_history(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    use crate::models::interviews;
    interviews::Entity::find_by_id(id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interview {id}")))?;
    let history = status_changes::Model::history_for(&ctx.db, id).await?;
    format::json(history.into_iter().map(StatusChangeResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StageDurationResponse {
    stage: String,
    average_minutes: f64,
}

#[debug_handler]
async fn stage_durations(State(ctx): State<AppContext>) -> PipelineResult<Response> {
    let durations = stage_changes::Model::average_stage_durations(&ctx.db).await?;
    format::json(
        durations
            .into_iter()
            .map(|(stage, average_minutes)| StageDurationResponse { stage, average_minutes })
            .collect::<Vec<_>>(),
    )
    .map_err(|e| Error::Internal(e.to_string()))
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("history")
        .add("/candidates/{id}", get(candidate_history))
        .add("/interviews/{id}", get(interview_history))
        .add("/stage-durations", get(stage_durations))
}
