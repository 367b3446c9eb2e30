//! Append-only candidate stage history.
//!
//! Records are written inside the same transaction as the candidate
//! mutation they describe and are never updated or deleted afterward.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
pub use super::_entities::stage_changes::{ActiveModel, Column, Entity, Model};
use crate::models::state_machine::Stage;

pub type StageChanges = Entity;

/// Principal used for stage advances driven by the screening orchestrator
/// rather than a human actor.
pub const AI_SYSTEM: &str = "AI_SYSTEM";

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> std::result::Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            let mut this = self;
            this.id = sea_orm::ActiveValue::Set(Uuid::new_v4());
            if this.changed_at.is_not_set() {
                this.changed_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
            }
            Ok(this)
        } else {
            Ok(self)
        }
    }
}

impl Model {
    /// Full history for a candidate, ordered ascending by time — invariant 4
    /// requires these records to be read in the order they were written.
    pub async fn history_for<C>(db: &C, candidate_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::CandidateId.eq(candidate_id))
            .order_by_asc(Column::ChangedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn recent_since<C>(db: &C, since: chrono::DateTime<chrono::FixedOffset>) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::ChangedAt.gte(since))
            .order_by_desc(Column::ChangedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    /// Average time spent in each stage, computed from adjacent transitions
    /// per candidate. Stages with no closing transition (the candidate's
    /// current stage) are excluded since their duration is still open.
    pub async fn average_stage_durations<C>(db: &C) -> ModelResult<Vec<(String, f64)>>
    where
        C: ConnectionTrait,
    {
        let all = Entity::find()
            .order_by_asc(Column::CandidateId)
            .order_by_asc(Column::ChangedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)?;

        let mut totals: std::collections::HashMap<String, (f64, u64)> = std::collections::HashMap::new();
        let mut by_candidate: std::collections::HashMap<Uuid, Vec<Model>> = std::collections::HashMap::new();
        for change in all {
            by_candidate.entry(change.candidate_id).or_default().push(change);
        }

        for (_, changes) in by_candidate {
            for pair in changes.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                let minutes = (next.changed_at - prev.changed_at).num_seconds() as f64 / 60.0;
                let entry = totals.entry(prev.to_state.clone()).or_insert((0.0, 0));
                entry.0 += minutes;
                entry.1 += 1;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(stage, (sum, count))| (stage, if count > 0 { sum / count as f64 } else { 0.0 }))
            .collect())
    }
}

/// Records a candidate stage transition. Callers pass the same connection
/// (typically a transaction handle) used for the owning candidate update.
pub async fn record<C>(
    db: &C,
    candidate_id: Uuid,
    from: Option<Stage>,
    to: Stage,
    changed_by: &str,
    reason: Option<String>,
) -> ModelResult<Model>
where
    C: ConnectionTrait,
{
    let entry = ActiveModel {
        candidate_id: sea_orm::ActiveValue::Set(candidate_id),
        from_state: sea_orm::ActiveValue::Set(from.map(|s| s.as_str().to_string())),
        to_state: sea_orm::ActiveValue::Set(to.as_str().to_string()),
        changed_by: sea_orm::ActiveValue::Set(changed_by.to_string()),
        reason: sea_orm::ActiveValue::Set(reason),
        ..Default::default()
    };
    entry.insert(db).await.map_err(ModelError::DbErr)
}
