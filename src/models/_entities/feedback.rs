use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub interview_id: Uuid,
    pub interviewer_id: Uuid,
    pub technical: i32,
    pub communication: i32,
    pub problem_solving: i32,
    pub cultural_fit: Option<i32>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub comments: Option<String>,
    pub recommendation: String,
    pub submitted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::interviews::Entity",
        from = "Column::InterviewId",
        to = "super::interviews::Column::Id"
    )]
    Interview,
    #[sea_orm(
        belongs_to = "super::interviewers::Entity",
        from = "Column::InterviewerId",
        to = "super::interviewers::Column::Id"
    )]
    Interviewer,
}

impl Related<super::interviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interview.def()
    }
}

impl Related<super::interviewers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interviewer.def()
    }
}
