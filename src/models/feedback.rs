//! Interview feedback: submission, validation, and aggregate scoring.

use loco_rs::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder};
use serde::Deserialize;
use validator::Validate;

pub use super::_entities::feedback::{ActiveModel, Column, Entity, Model};
use crate::errors::{Error, Result};
use crate::models::interviews;
use crate::models::state_machine::InterviewStatus;

pub type FeedbackEntity = Entity;

pub const RECOMMENDATIONS: &[&str] = &["STRONG_HIRE", "HIRE", "MAYBE", "NO_HIRE"];
pub const POSITIVE_RECOMMENDATIONS: &[&str] = &["STRONG_HIRE", "HIRE"];

#[derive(Debug, Validate, Deserialize)]
pub struct Validator {
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub technical: i32,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub communication: i32,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub problem_solving: i32,
    #[validate(custom(function = "validate_recommendation"))]
    pub recommendation: String,
}

fn validate_recommendation(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if RECOMMENDATIONS.contains(&value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_recommendation"))
    }
}

impl Validatable for ActiveModel {
    fn validator(&self) -> Box<dyn Validate> {
        Box::new(Validator {
            technical: match &self.technical {
                sea_orm::ActiveValue::Set(v) => *v,
                _ => 0,
            },
            communication: match &self.communication {
                sea_orm::ActiveValue::Set(v) => *v,
                _ => 0,
            },
            problem_solving: match &self.problem_solving {
                sea_orm::ActiveValue::Set(v) => *v,
                _ => 0,
            },
            recommendation: match &self.recommendation {
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
            if this.submitted_at.is_not_set() {
                this.submitted_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());
            }
        }
        Ok(this)
    }
}

impl Model {
    /// Arithmetic mean of the present scores (cultural fit is optional).
    pub fn overall_score(&self) -> f64 {
        let mut sum = (self.technical + self.communication + self.problem_solving) as f64;
        let mut count = 3.0;
        if let Some(cf) = self.cultural_fit {
            sum += cf as f64;
            count += 1.0;
        }
        sum / count
    }

    pub async fn by_interview<C>(db: &C, interview_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::InterviewId.eq(interview_id))
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn by_interviewer<C>(db: &C, interviewer_id: Uuid) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::InterviewerId.eq(interviewer_id))
            .order_by_desc(Column::SubmittedAt)
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    pub async fn positive<C>(db: &C) -> ModelResult<Vec<Model>>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Recommendation.is_in(POSITIVE_RECOMMENDATIONS.to_vec()))
            .all(db)
            .await
            .map_err(ModelError::DbErr)
    }

    /// Mean across feedbacks attached to the candidate's completed interviews.
    pub async fn candidate_average_scores<C>(db: &C, candidate_id: Uuid) -> ModelResult<Option<f64>>
    where
        C: ConnectionTrait,
    {
        let interview_ids: Vec<Uuid> = interviews::Entity::find()
            .filter(interviews::Column::CandidateId.eq(candidate_id))
            .all(db)
            .await
            .map_err(ModelError::DbErr)?
            .into_iter()
            .map(|i| i.id)
            .collect();
        if interview_ids.is_empty() {
            return Ok(None);
        }
        let feedbacks = Entity::find()
            .filter(Column::InterviewId.is_in(interview_ids))
            .all(db)
            .await
            .map_err(ModelError::DbErr)?;
        if feedbacks.is_empty() {
            return Ok(None);
        }
        let sum: f64 = feedbacks.iter().map(Model::overall_score).sum();
        Ok(Some(sum / feedbacks.len() as f64))
    }

    pub async fn interviewer_statistics<C>(db: &C, interviewer_id: Uuid) -> ModelResult<InterviewerStatistics>
    where
        C: ConnectionTrait,
    {
        let feedbacks = Self::by_interviewer(db, interviewer_id).await?;
        let count = feedbacks.len();
        if count == 0 {
            return Ok(InterviewerStatistics::default());
        }
        let mean_technical = feedbacks.iter().map(|f| f.technical as f64).sum::<f64>() / count as f64;
        let mean_communication = feedbacks.iter().map(|f| f.communication as f64).sum::<f64>() / count as f64;
        let strong_hire_count = feedbacks.iter().filter(|f| f.recommendation == "STRONG_HIRE").count();
        Ok(InterviewerStatistics { count, mean_technical, mean_communication, strong_hire_count })
    }
}

#[derive(Debug, Default, serde::Serialize)]
pub struct InterviewerStatistics {
    pub count: usize,
    pub mean_technical: f64,
    pub mean_communication: f64,
    pub strong_hire_count: usize,
}

#[allow(clippy::too_many_arguments)]
pub async fn submit(
    db: &DatabaseConnection,
    interview_id: Uuid,
    interviewer_id: Uuid,
    technical: i32,
    communication: i32,
    problem_solving: i32,
    cultural_fit: Option<i32>,
    strengths: Option<String>,
    weaknesses: Option<String>,
    comments: Option<String>,
    recommendation: &str,
) -> Result<Model> {
    let interview = interviews::Entity::find_by_id(interview_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("interview {interview_id}")))?;
    if interview.interviewer_id != interviewer_id {
        return Err(Error::Forbidden("only the interview's interviewer of record may submit feedback".into()));
    }
    if interview.status() != InterviewStatus::Completed {
        return Err(Error::InvalidState("feedback requires a completed interview".into()));
    }

    let existing = Entity::find()
        .filter(Column::InterviewId.eq(interview_id))
        .filter(Column::InterviewerId.eq(interviewer_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(Error::DuplicateFeedback);
    }

    for (label, score) in [("technical", technical), ("communication", communication), ("problemSolving", problem_solving)] {
        if !(1..=5).contains(&score) {
            return Err(Error::Validation(format!("{label} must be between 1 and 5")));
        }
    }
    if let Some(cf) = cultural_fit {
        if !(1..=5).contains(&cf) {
            return Err(Error::Validation("culturalFit must be between 1 and 5".into()));
        }
    }
    if !RECOMMENDATIONS.contains(&recommendation) {
        return Err(Error::Validation("recommendation is required".into()));
    }

    let saved = ActiveModel {
        interview_id: sea_orm::ActiveValue::Set(interview_id),
        interviewer_id: sea_orm::ActiveValue::Set(interviewer_id),
        technical: sea_orm::ActiveValue::Set(technical),
        communication: sea_orm::ActiveValue::Set(communication),
        problem_solving: sea_orm::ActiveValue::Set(problem_solving),
        cultural_fit: sea_orm::ActiveValue::Set(cultural_fit),
        strengths: sea_orm::ActiveValue::Set(strengths),
        weaknesses: sea_orm::ActiveValue::Set(weaknesses),
        comments: sea_orm::ActiveValue::Set(comments),
        recommendation: sea_orm::ActiveValue::Set(recommendation.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| Error::Internal(e.to_string()))?;

    tracing::debug!(interview_id = %interview_id, interviewer_id = %interviewer_id, recommendation, "feedback submitted");
    Ok(saved)
}
