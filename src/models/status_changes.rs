//! Append-only interview status history. Mirrors `stage_changes`.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
pub use super::_entities::status_changes::{ActiveModel, Column, Entity, Model};
use crate::models::state_machine::InterviewStatus;

pub type StatusChanges = Entity;

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
    pub async fn history_for<C>(db: &C, interview_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::InterviewId.eq(interview_id))
            .order_by_asc(Column::ChangedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }
}

pub async fn record<C>(
    db: &C,
    interview_id: Uuid,
    from: Option<InterviewStatus>,
    to: InterviewStatus,
    changed_by: &str,
    notes: Option<String>,
) -> ModelResult<Model>
where
    C: ConnectionTrait,
{
    let entry = ActiveModel {
        interview_id: sea_orm::ActiveValue::Set(interview_id),
        from_state: sea_orm::ActiveValue::Set(from.map(|s| s.as_str().to_string())),
        to_state: sea_orm::ActiveValue::Set(to.as_str().to_string()),
        changed_by: sea_orm::ActiveValue::Set(changed_by.to_string()),
        notes: sea_orm::ActiveValue::Set(notes),
        ..Default::default()
    };
    entry.insert(db).await.map_err(ModelError::DbErr)
}
