//! Read-only aggregates over the pipeline's candidates, interviews, and
//! screenings.

use axum::debug_handler;
use axum::extract::Query;
use chrono::Datelike;
use loco_rs::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result as PipelineResult};
use crate::models::ai_screenings;
use crate::models::candidates;
use crate::models::interviews;
use crate::models::stage_changes;
use crate::models::state_machine::Stage;

fn default_recent_window_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    #[serde(default = "default_recent_window_hours", rename = "recentWindowHours")]
    recent_window_hours: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StageCounts {
    applied: u64,
    screening: u64,
    interview_scheduled: u64,
    interview_completed: u64,
    hired: u64,
    rejected: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    total_candidates: u64,
    candidates_created_this_month: u64,
    interviews_scheduled_today: u64,
    completed_without_feedback: u64,
    candidates_per_stage: StageCounts,
    top_screenings: Vec<TopScreening>,
    recent_stage_transitions: Vec<RecentStageTransition>,
    average_screening_score_by_stage: Vec<StageAverageScore>,
    hiring_funnel: HiringFunnel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopScreening {
    candidate_id: uuid::Uuid,
    match_score: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentStageTransition {
    candidate_id: uuid::Uuid,
    from_stage: Option<String>,
    to_stage: String,
    changed_by: String,
    changed_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StageAverageScore {
    stage: String,
    average_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HiringFunnel {
    total: u64,
    hired: u64,
    conversion_rate: f64,
}

#[debug_handler]
async fn index(State(ctx): State<AppContext>, Query(query): Query<DashboardQuery>) -> PipelineResult<Response> {
    let db = &ctx.db;

    let total_candidates = candidates::Entity::find().count(db).await?;

    let now = chrono::Utc::now();
    let month_start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
        .and_utc()
        .fixed_offset();
    let candidates_created_this_month = candidates::Entity::find()
        .filter(candidates::Column::CreatedAt.gte(month_start))
        .count(db)
        .await?;

    let interviews_scheduled_today = interviews::Model::scheduled_today(db, now).await?.len() as u64;
    let completed_without_feedback = interviews::Model::completed_without_feedback(db).await?.len() as u64;

    let candidates_per_stage = StageCounts {
        applied: candidates::Model::count_by_stage(db, Stage::Applied).await?,
        screening: candidates::Model::count_by_stage(db, Stage::Screening).await?,
        interview_scheduled: candidates::Model::count_by_stage(db, Stage::InterviewScheduled).await?,
        interview_completed: candidates::Model::count_by_stage(db, Stage::InterviewCompleted).await?,
        hired: candidates::Model::count_by_stage(db, Stage::Hired).await?,
        rejected: candidates::Model::count_by_stage(db, Stage::Rejected).await?,
    };

    let top_screenings = ai_screenings::Model::top_n_by_score(db, 10)
        .await?
        .into_iter()
        .map(|s| TopScreening { candidate_id: s.candidate_id, match_score: s.match_score })
        .collect();

    let recent_since = now.fixed_offset() - chrono::Duration::hours(query.recent_window_hours);
    let recent_stage_transitions = stage_changes::Model::recent_since(db, recent_since)
        .await?
        .into_iter()
        .map(|c| RecentStageTransition {
            candidate_id: c.candidate_id,
            from_stage: c.from_state,
            to_stage: c.to_state,
            changed_by: c.changed_by,
            changed_at: c.changed_at,
        })
        .collect();

    let average_screening_score_by_stage = ai_screenings::Model::average_score_by_current_stage(db)
        .await?
        .into_iter()
        .map(|(stage, average_score)| StageAverageScore { stage, average_score })
        .collect();

    let hired = candidates_per_stage.hired;
    let conversion_rate = if total_candidates > 0 { hired as f64 / total_candidates as f64 } else { 0.0 };

    let response = DashboardResponse {
        total_candidates,
        candidates_created_this_month,
        interviews_scheduled_today,
        completed_without_feedback,
        candidates_per_stage,
        top_screenings,
        recent_stage_transitions,
        average_screening_score_by_stage,
        hiring_funnel: HiringFunnel { total: total_candidates, hired, conversion_rate },
    };

    format::json(response).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn health() -> PipelineResult<Response> {
    format::json(serde_json::json!({
        "status": "ok",
        "service": "pipeline_core",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
    .map_err(|e| Error::Internal(e.to_string()))
}

pub fn routes() -> Routes {
    Routes::new().prefix("dashboard").add("/", get(index)).add("/health", get(health))
}
