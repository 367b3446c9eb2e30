//! Persistence and read side of the screening orchestrator.
//! The orchestration itself — prompting, the LLM call, parsing, the
//! fallback analyzer and the worker pool — lives in
//! [`crate::services::screening`]; this module only owns the immutable
//! record and the queries over it.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, TransactionTrait};

pub use super::_entities::ai_screenings::{ActiveModel, Column, Entity, Model};
use crate::errors::Result;
use crate::models::candidates;
use crate::models::stage_changes::AI_SYSTEM;
use crate::models::state_machine::Stage;

pub type AiScreenings = Entity;

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> std::result::Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut this = self;
        if insert {
            this.id = sea_orm::ActiveValue::Set(Uuid::new_v4());
            if this.screened_at.is_not_set() {
                this.screened_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
            }
            let score = match &this.match_score {
                sea_orm::ActiveValue::Set(v) => *v,
                _ => 0,
            };
            this.match_score = sea_orm::ActiveValue::Set(score.clamp(0, 100));
        }
        Ok(this)
    }
}

impl Model {
    pub async fn by_candidate<C>(db: &C, candidate_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::CandidateId.eq(candidate_id))
            .order_by_desc(Column::ScreenedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn by_score_threshold<C>(db: &C, min_score: i32) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::MatchScore.gte(min_score))
            .order_by_desc(Column::MatchScore)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    /// Top `n` candidates by their highest screening score. A candidate with
    /// several screenings is represented once, at their best score.
    pub async fn top_n_by_score<C>(db: &C, n: u64) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        let all = Entity::find().order_by_desc(Column::MatchScore).all(db).await.map_err(ModelError::DbErr)?;

        let mut seen = std::collections::HashSet::new();
        let mut top = Vec::new();
        for screening in all {
            if top.len() as u64 >= n {
                break;
            }
            if seen.insert(screening.candidate_id) {
                top.push(screening);
            }
        }
        Ok(top)
    }

    /// Mean `match_score` of each candidate's most recent screening, grouped
    /// by the candidate's current stage.
    pub async fn average_score_by_current_stage<C>(db: &C) -> ModelResult<Vec<(String, f64)>>
    where
        C: ConnectionTrait,
    {
        let screenings = Entity::find().order_by_desc(Column::ScreenedAt).all(db).await.map_err(ModelError::DbErr)?;
        let mut latest_score_by_candidate: std::collections::HashMap<Uuid, i32> = std::collections::HashMap::new();
        for screening in screenings {
            latest_score_by_candidate.entry(screening.candidate_id).or_insert(screening.match_score);
        }

        let all_candidates = candidates::Entity::find().all(db).await.map_err(ModelError::DbErr)?;
        let stage_by_candidate: std::collections::HashMap<Uuid, String> =
            all_candidates.into_iter().map(|c| (c.id, c.current_stage)).collect();

        let mut totals: std::collections::HashMap<String, (f64, u64)> = std::collections::HashMap::new();
        for (candidate_id, score) in latest_score_by_candidate {
            if let Some(stage) = stage_by_candidate.get(&candidate_id) {
                let entry = totals.entry(stage.clone()).or_insert((0.0, 0));
                entry.0 += score as f64;
                entry.1 += 1;
            }
        }

        Ok(totals.into_iter().map(|(stage, (sum, count))| (stage, sum / count as f64)).collect())
    }
}

/// Persists a completed screening and, in the same transaction, advances the
/// candidate from APPLIED to SCREENING if it is still in APPLIED — the
/// transition is authored by the reserved `AI_SYSTEM` principal.
pub async fn persist(db: &DatabaseConnection, new_screening: ActiveModel, candidate_id: Uuid) -> Result<Model> {
    let txn = db.begin().await?;
    let screening = new_screening.insert(&txn).await.map_err(|e| crate::errors::Error::Internal(e.to_string()))?;
    candidates::advance_internal(&txn, candidate_id, Stage::Screening, AI_SYSTEM).await?;
    txn.commit().await?;
    Ok(screening)
}
