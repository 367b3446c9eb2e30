//! Scheduling engine and interview lifecycle manager. Both live here
//! because rescheduling and cancellation straddle the schedule and the
//! status machine at once.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

pub use super::_entities::interviews::{ActiveModel, Column, Entity, Model};
use crate::errors::{Error, Result};
use crate::models::state_machine::{can_transition_status, InterviewStatus, Stage};
use crate::models::{candidates, interviewers, status_changes};

pub type Interviews = Entity;

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 480;
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Validate, Deserialize)]
pub struct Validator {
    #[validate(range(min = 15, max = 480, message = "duration must be between 15 and 480 minutes"))]
    pub duration_minutes: i32,
}

impl Validatable for ActiveModel {
    fn validator(&self) -> Box<dyn Validate> {
        Box::new(Validator {
            duration_minutes: match &self.duration_minutes {
                sea_orm::ActiveValue::Set(v) => *v,
                _ => DEFAULT_DURATION_MINUTES,
            },
        })
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> std::result::Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.validate()?;
        let mut this = self;
        if insert {
            this.id = sea_orm::ActiveValue::Set(Uuid::new_v4());
        } else if this.updated_at.is_unchanged() {
            this.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
        }
        Ok(this)
    }
}

impl Model {
    pub fn status(&self) -> InterviewStatus {
        InterviewStatus::parse(&self.current_status).unwrap_or(InterviewStatus::Scheduled)
    }

    pub fn end_time(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.scheduled_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    pub async fn find_by_interviewer<C>(db: &C, interviewer_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::InterviewerId.eq(interviewer_id))
            .order_by_asc(Column::ScheduledAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn find_by_window<C>(
        db: &C,
        interviewer_id: Uuid,
        window_start: chrono::DateTime<chrono::FixedOffset>,
        window_end: chrono::DateTime<chrono::FixedOffset>,
    ) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::InterviewerId.eq(interviewer_id))
            .filter(Column::ScheduledAt.gte(window_start))
            .filter(Column::ScheduledAt.lte(window_end))
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn completed_without_feedback<C>(db: &C) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        use crate::models::feedback;
        let completed = Entity::find()
            .filter(Column::CurrentStatus.eq(InterviewStatus::Completed.as_str()))
            .all(db)
            .await
            .map_err(ModelError::DbErr)?;
        let mut out = Vec::new();
        for interview in completed {
            let has_feedback = feedback::Entity::find()
                .filter(feedback::Column::InterviewId.eq(interview.id))
                .count(db)
                .await
                .map_err(ModelError::DbErr)?
                > 0;
            if !has_feedback {
                out.push(interview);
            }
        }
        Ok(out)
    }

    pub async fn scheduled_today<C>(db: &C, now: chrono::DateTime<chrono::Utc>) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        let start = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = now.date_naive().and_hms_opt(23, 59, 59).unwrap().and_utc();
        Entity::find()
            .filter(Column::ScheduledAt.gte(start.fixed_offset()))
            .filter(Column::ScheduledAt.lte(end.fixed_offset()))
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }
}

/// Half-open interval overlap: `[s1, s1+d1)` and `[s2, s2+d2)` overlap iff
/// `s1 < s2+d2 ∧ s1+d1 > s2`. Adjacent intervals (back-to-back) do not overlap.
pub fn overlaps(
    s1: chrono::DateTime<chrono::FixedOffset>,
    d1_minutes: i32,
    s2: chrono::DateTime<chrono::FixedOffset>,
    d2_minutes: i32,
) -> bool {
    let e1 = s1 + chrono::Duration::minutes(d1_minutes as i64);
    let e2 = s2 + chrono::Duration::minutes(d2_minutes as i64);
    s1 < e2 && e1 > s2
}

#[allow(clippy::too_many_arguments)]
pub async fn schedule(
    db: &DatabaseConnection,
    candidate_id: Uuid,
    interviewer_id: Uuid,
    scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    duration_minutes: Option<i32>,
    interview_type: &str,
    location: Option<String>,
    notes: Option<String>,
    who: &str,
) -> Result<Model> {
    let duration = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(Error::Validation("duration must be between 15 and 480 minutes".into()));
    }
    if scheduled_at <= chrono::Utc::now() {
        return Err(Error::Validation("scheduledAt must be in the future".into()));
    }

    let txn = db.begin().await?;

    let candidate = candidates::Entity::find_by_id(candidate_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {candidate_id}")))?;
    let stage = candidate.stage();
    if !matches!(stage, Stage::Screening | Stage::InterviewScheduled | Stage::InterviewCompleted) {
        return Err(Error::InvalidState(format!(
            "candidate in stage {stage} cannot be scheduled for an interview"
        )));
    }

    // Lock the interviewer row so concurrent `schedule` calls for the same
    // interviewer serialize their conflict-check + insert.
    interviewers::Entity::find_by_id(interviewer_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interviewer {interviewer_id}")))?;

    if let Some(conflict) = find_conflict(&txn, interviewer_id, scheduled_at, duration, None).await? {
        return Err(Error::SchedulingConflict {
            interviewer_id,
            conflict_time: conflict.scheduled_at,
        });
    }

    let interview = ActiveModel {
        candidate_id: sea_orm::ActiveValue::Set(candidate_id),
        interviewer_id: sea_orm::ActiveValue::Set(interviewer_id),
        scheduled_at: sea_orm::ActiveValue::Set(scheduled_at),
        duration_minutes: sea_orm::ActiveValue::Set(duration),
        current_status: sea_orm::ActiveValue::Set(InterviewStatus::Scheduled.as_str().to_string()),
        interview_type: sea_orm::ActiveValue::Set(interview_type.to_string()),
        location: sea_orm::ActiveValue::Set(location),
        notes: sea_orm::ActiveValue::Set(notes),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| Error::Internal(e.to_string()))?;

    status_changes::record(&txn, interview.id, None, InterviewStatus::Scheduled, who, None).await?;

    if stage == Stage::Screening {
        candidates::advance_internal(&txn, candidate_id, Stage::InterviewScheduled, who).await?;
    }

    txn.commit().await?;
    tracing::debug!(interview_id = %interview.id, candidate_id = %candidate_id, interviewer_id = %interviewer_id, "interview scheduled");
    Ok(interview)
}

async fn find_conflict<C>(
    db: &C,
    interviewer_id: Uuid,
    scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    duration_minutes: i32,
    exclude_id: Option<Uuid>,
) -> Result<Option<Model>>
where
    C: ConnectionTrait,
{
    // Broaden the candidate set with a ±2h pre-query window before applying
    // the exact half-open overlap test in memory.
    let window_start = scheduled_at - chrono::Duration::hours(2);
    let window_end = scheduled_at + chrono::Duration::minutes(duration_minutes as i64) + chrono::Duration::hours(2);

    let mut condition = Condition::all()
        .add(Column::InterviewerId.eq(interviewer_id))
        .add(Column::ScheduledAt.gte(window_start))
        .add(Column::ScheduledAt.lte(window_end))
        .add(Column::CurrentStatus.ne(InterviewStatus::Cancelled.as_str()))
        .add(Column::CurrentStatus.ne(InterviewStatus::Completed.as_str()));
    if let Some(id) = exclude_id {
        condition = condition.add(Column::Id.ne(id));
    }

    let candidates = Entity::find().filter(condition).all(db).await?;
    Ok(candidates
        .into_iter()
        .find(|other| overlaps(scheduled_at, duration_minutes, other.scheduled_at, other.duration_minutes)))
}

pub async fn reschedule(
    db: &DatabaseConnection,
    interview_id: Uuid,
    new_scheduled_at: chrono::DateTime<chrono::FixedOffset>,
    new_duration: Option<i32>,
    who: &str,
    reason: Option<String>,
) -> Result<Model> {
    if new_scheduled_at <= chrono::Utc::now() {
        return Err(Error::Validation("newScheduledAt must be in the future".into()));
    }
    if let Some(d) = new_duration {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&d) {
            return Err(Error::Validation("duration must be between 15 and 480 minutes".into()));
        }
    }

    let txn = db.begin().await?;
    let interview = Entity::find_by_id(interview_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interview {interview_id}")))?;
    if matches!(interview.status(), InterviewStatus::Completed | InterviewStatus::Cancelled) {
        return Err(Error::InvalidState("cannot reschedule a completed or cancelled interview".into()));
    }

    interviewers::Entity::find_by_id(interview.interviewer_id)
        .lock_exclusive()
        .one(&txn)
        .await?;

    let duration = new_duration.unwrap_or(interview.duration_minutes);
    if let Some(conflict) = find_conflict(&txn, interview.interviewer_id, new_scheduled_at, duration, Some(interview_id)).await? {
        return Err(Error::SchedulingConflict {
            interviewer_id: interview.interviewer_id,
            conflict_time: conflict.scheduled_at,
        });
    }

    let from_status = interview.status();
    let mut active: ActiveModel = interview.into();
    active.scheduled_at = sea_orm::ActiveValue::Set(new_scheduled_at);
    active.duration_minutes = sea_orm::ActiveValue::Set(duration);
    active.current_status = sea_orm::ActiveValue::Set(InterviewStatus::Scheduled.as_str().to_string());
    active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
    let updated = active.update(&txn).await.map_err(|e| Error::Internal(e.to_string()))?;

    // Two-step audit trail per the design notes: a RESCHEDULED record
    // followed, same transaction, by the synthetic return to SCHEDULED.
    status_changes::record(&txn, interview_id, Some(from_status), InterviewStatus::Rescheduled, who, reason.clone()).await?;
    status_changes::record(&txn, interview_id, Some(InterviewStatus::Rescheduled), InterviewStatus::Scheduled, who, reason).await?;

    txn.commit().await?;
    tracing::debug!(interview_id = %interview_id, new_time = %new_scheduled_at, "interview rescheduled");
    Ok(updated)
}

pub async fn cancel(db: &DatabaseConnection, interview_id: Uuid, who: &str, reason: Option<String>) -> Result<Model> {
    transition_status(db, interview_id, InterviewStatus::Cancelled, who, reason).await
}

pub async fn transition_status(
    db: &DatabaseConnection,
    interview_id: Uuid,
    new_status: InterviewStatus,
    who: &str,
    notes: Option<String>,
) -> Result<Model> {
    if new_status == InterviewStatus::Rescheduled {
        return Err(Error::IllegalTransition(
            "RESCHEDULED cannot be set directly; call reschedule() instead".into(),
        ));
    }

    let txn = db.begin().await?;
    let interview = Entity::find_by_id(interview_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interview {interview_id}")))?;

    let from_status = interview.status();
    if from_status == new_status {
        return Err(Error::NoOpTransition);
    }
    if !can_transition_status(from_status, new_status) {
        return Err(Error::IllegalTransition(format!(
            "cannot transition interview from {from_status} to {new_status}"
        )));
    }

    let candidate_id = interview.candidate_id;
    let mut active: ActiveModel = interview.into();
    active.current_status = sea_orm::ActiveValue::Set(new_status.as_str().to_string());
    active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
    let updated = active.update(&txn).await.map_err(|e| Error::Internal(e.to_string()))?;

    status_changes::record(&txn, interview_id, Some(from_status), new_status, who, notes).await?;

    if new_status == InterviewStatus::Completed {
        candidates::advance_internal(&txn, candidate_id, Stage::InterviewCompleted, who).await?;
    }

    txn.commit().await?;
    tracing::debug!(interview_id = %interview_id, from = %from_status, to = %new_status, actor = who, "interview status transition");
    Ok(updated)
}

pub async fn is_available(
    db: &DatabaseConnection,
    interviewer_id: Uuid,
    start: chrono::DateTime<chrono::FixedOffset>,
    end: chrono::DateTime<chrono::FixedOffset>,
) -> Result<bool> {
    let duration = (end - start).num_minutes() as i32;
    Ok(find_conflict(db, interviewer_id, start, duration.max(0), None).await?.is_none())
}

pub async fn find_available(
    db: &DatabaseConnection,
    start: chrono::DateTime<chrono::FixedOffset>,
    end: chrono::DateTime<chrono::FixedOffset>,
) -> Result<Vec<interviewers::Model>> {
    let all = interviewers::Entity::find().all(db).await?;
    let mut available = Vec::new();
    for interviewer in all {
        if is_available(db, interviewer.id, start, end).await? {
            available.push(interviewer);
        }
    }
    Ok(available)
}
