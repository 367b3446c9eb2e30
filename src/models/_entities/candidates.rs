use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "candidates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub resume_blob_ref: Option<String>,
    pub current_stage: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interviews::Entity")]
    Interviews,
    #[sea_orm(has_many = "super::ai_screenings::Entity")]
    AiScreenings,
    #[sea_orm(has_many = "super::stage_changes::Entity")]
    StageChanges,
}

impl Related<super::interviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interviews.def()
    }
}

impl Related<super::ai_screenings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AiScreenings.def()
    }
}

impl Related<super::stage_changes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageChanges.def()
    }
}
