//! Candidate state machine and CRUD, with stage transitions audited.
//!
//! Owns the candidate stage state machine. Every stage mutation is paired,
//! in the same transaction, with a [`stage_changes`] append. Nothing outside
//! this module is allowed to write `current_stage` directly.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

pub use super::_entities::candidates::{ActiveModel, Column, Entity, Model};
use crate::errors::{Error, Result};
use crate::models::stage_changes;
use crate::models::state_machine::Stage;

pub type Candidates = Entity;

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
            if this.current_stage.is_not_set() {
                this.current_stage = sea_orm::ActiveValue::Set(Stage::Applied.as_str().to_string());
            }
        } else if this.updated_at.is_unchanged() {
            this.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
        }
        Ok(this)
    }
}

#[derive(Debug, Default)]
pub struct SearchParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
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

    pub async fn list_paged<C>(db: &C, page: u64, size: u64, sort_by: &str, sort_dir: &str) -> ModelResult<Page<Model>>
    where
        C: ConnectionTrait,
    {
        let size = size.clamp(1, 200);
        let page = page.max(1);
        let column = match sort_by {
            "name" => Column::Name,
            "email" => Column::Email,
            "currentStage" | "current_stage" => Column::CurrentStage,
            _ => Column::CreatedAt,
        };
        let mut query = Entity::find();
        query = if sort_dir.eq_ignore_ascii_case("asc") {
            query.order_by_asc(column)
        } else {
            query.order_by_desc(column)
        };
        let total = Entity::find().count(db).await.map_err(ModelError::DbErr)?;
        let items = query
            .offset((page - 1) * size)
            .limit(size)
            .all(db)
            .await
            .map_err(ModelError::DbErr)?;
        Ok(Page { items, page, size, total })
    }

    pub async fn search<C>(db: &C, params: &SearchParams) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        let mut condition = Condition::all();
        if let Some(name) = &params.name {
            condition = condition.add(Column::Name.contains(name));
        }
        if let Some(email) = &params.email {
            condition = condition.add(Column::Email.contains(email));
        }
        if let Some(stage) = &params.stage {
            condition = condition.add(Column::CurrentStage.eq(stage.clone()));
        }
        Entity::find()
            .filter(condition)
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn count_by_stage<C>(db: &C, stage: Stage) -> ModelResult<u64>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::CurrentStage.eq(stage.as_str()))
            .count(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub fn stage(&self) -> Stage {
        Stage::parse(&self.current_stage).unwrap_or(Stage::Applied)
    }
}

/// Creates a candidate in stage APPLIED and records the initial transition.
pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    phone: Option<String>,
    resume_blob_ref: Option<String>,
) -> Result<Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
    }
    if Model::find_by_email(db, email).await?.is_some() {
        return Err(Error::DuplicateEmail(email.to_string()));
    }

    let txn = db.begin().await?;
    let candidate = ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_string()),
        email: sea_orm::ActiveValue::Set(email.to_string()),
        phone: sea_orm::ActiveValue::Set(phone),
        resume_blob_ref: sea_orm::ActiveValue::Set(resume_blob_ref),
        current_stage: sea_orm::ActiveValue::Set(Stage::Applied.as_str().to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e {
        DbErr::RecordNotInserted | DbErr::Query(_) => Error::DuplicateEmail(email.to_string()),
        other => Error::Internal(other.to_string()),
    })?;

    stage_changes::record(&txn, candidate.id, None, Stage::Applied, "SYSTEM", None).await?;
    txn.commit().await?;
    tracing::debug!(candidate_id = %candidate.id, "candidate created in APPLIED");
    Ok(candidate)
}

async fn transition_stage_internal<C>(
    db: &C,
    candidate: Model,
    new_stage: Stage,
    who: &str,
    reason: Option<String>,
) -> Result<Model>
where
    C: ConnectionTrait,
{
    let current = candidate.stage();
    if current == new_stage {
        return Err(Error::NoOpTransition);
    }
    if !crate::models::state_machine::can_transition_stage(current, new_stage) {
        return Err(Error::IllegalTransition(format!(
            "cannot transition candidate from {current} to {new_stage}"
        )));
    }

    let id = candidate.id;
    let mut active: ActiveModel = candidate.into();
    active.current_stage = sea_orm::ActiveValue::Set(new_stage.as_str().to_string());
    active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
    let updated = active.update(db).await.map_err(ModelError::DbErr)?;

    stage_changes::record(db, id, Some(current), new_stage, who, reason).await?;
    tracing::debug!(candidate_id = %id, from = %current, to = %new_stage, actor = who, "candidate stage transition");
    Ok(updated)
}

/// Public stage transition entry point (HTTP: `PUT /api/candidates/{id}/stage`).
pub async fn update_stage(
    db: &DatabaseConnection,
    id: Uuid,
    new_stage: Stage,
    who: &str,
    reason: Option<String>,
) -> Result<Model> {
    let txn = db.begin().await?;
    let candidate = Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    let updated = transition_stage_internal(&txn, candidate, new_stage, who, reason).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Internal transition used by the scheduling engine and lifecycle manager —
/// callers supply their own transaction so the candidate advance is atomic
/// with the interview mutation that triggered it.
pub async fn advance_internal<C>(db: &C, id: Uuid, new_stage: Stage, who: &str) -> Result<Option<Model>>
where
    C: ConnectionTrait,
{
    let candidate = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    if candidate.stage() == new_stage {
        return Ok(None);
    }
    if !crate::models::state_machine::can_transition_stage(candidate.stage(), new_stage) {
        return Ok(None);
    }
    Ok(Some(transition_stage_internal(db, candidate, new_stage, who, None).await?))
}

pub async fn update_profile(db: &DatabaseConnection, id: Uuid, name: Option<String>, phone: Option<String>) -> Result<Model> {
    let candidate = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    let mut active: ActiveModel = candidate.into();
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        active.name = sea_orm::ActiveValue::Set(name);
    }
    if let Some(phone) = phone {
        active.phone = sea_orm::ActiveValue::Set(Some(phone));
    }
    active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
    active.update(db).await.map_err(|e| Error::Internal(e.to_string()))
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let candidate = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    if candidate.stage() == Stage::Hired {
        return Err(Error::Forbidden("Cannot delete hired candidate".into()));
    }
    Entity::delete_by_id(id).exec(db).await?;
    tracing::debug!(candidate_id = %id, "candidate deleted");
    Ok(())
}
