//! Interviewer roster. Owns no state machine of its own; the scheduling
//! engine in [`interviews`](super::interviews) is what enforces non-overlap
//! against this entity's rows.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QuerySelect, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

pub use super::_entities::interviewers::{ActiveModel, Column, Entity, Model};
use crate::errors::{Error, Result};

pub type Interviewers = Entity;

#[derive(Debug, Validate, Deserialize)]
pub struct Validator {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

impl Validatable for ActiveModel {
    fn validator(&self) -> Box<dyn Validate> {
        Box::new(Validator {
            name: match &self.name {
                sea_orm::ActiveValue::Set(v) => v.clone(),
                _ => String::new(),
            },
            email: match &self.email {
                sea_orm::ActiveValue::Set(v) => v.clone(),
                _ => String::new(),
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
    pub async fn find_by_email<C>(db: &C, email: &str) -> ModelResult<Option<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Email.eq(email))
            .one(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn has_any_interviews<C>(db: &C, interviewer_id: Uuid) -> ModelResult<bool>
    where
        C: ConnectionTrait,
    {
        use crate::models::interviews;
        let count = interviews::Entity::find()
            .filter(interviews::Column::InterviewerId.eq(interviewer_id))
            .count(db)
            .await
            .map_err(ModelError::DbErr)?;
        Ok(count > 0)
    }
}

pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    department: Option<String>,
    title: Option<String>,
    expertise: Option<String>,
) -> Result<Model> {
    if Model::find_by_email(db, email).await?.is_some() {
        return Err(Error::DuplicateEmail(email.to_string()));
    }
    let interviewer = ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_string()),
        email: sea_orm::ActiveValue::Set(email.to_string()),
        department: sea_orm::ActiveValue::Set(department),
        title: sea_orm::ActiveValue::Set(title),
        expertise: sea_orm::ActiveValue::Set(expertise),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| Error::Internal(e.to_string()))?;
    Ok(interviewer)
}

/// Refuses deletion while interviews reference this interviewer. The
/// existence check and the delete run inside one transaction with the
/// interviewer row locked (`lock_exclusive`, the same row-serializing
/// pattern `interviews::schedule` uses), so a concurrent schedule attempt
/// against this interviewer either lands before the check sees it or blocks
/// until this transaction commits. `interviews.interviewer_id` also carries
/// `ON DELETE RESTRICT` as a second line of defense, but this check runs
/// first and produces the friendlier 422 instead of a raw DB error.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;
    let interviewer = Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interviewer {id}")))?;
    if Model::has_any_interviews(&txn, interviewer.id).await? {
        return Err(Error::Forbidden("interviewer has interviews; archive instead of deleting".into()));
    }
    Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}
