use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        let db = m.get_connection();
        db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"")
            .await
            .ok();

        m.create_table(
            Table::create()
                .table(Candidates::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Candidates::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(Candidates::Name).string().not_null())
                .col(
                    ColumnDef::new(Candidates::Email)
                        .string()
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Candidates::Phone).string())
                .col(ColumnDef::new(Candidates::ResumeBlobRef).string())
                .col(
                    ColumnDef::new(Candidates::CurrentStage)
                        .string()
                        .not_null()
                        .default("APPLIED"),
                )
                .col(
                    ColumnDef::new(Candidates::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(Candidates::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(Interviewers::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Interviewers::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(Interviewers::Name).string().not_null())
                .col(
                    ColumnDef::new(Interviewers::Email)
                        .string()
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(Interviewers::Department).string())
                .col(ColumnDef::new(Interviewers::Title).string())
                .col(ColumnDef::new(Interviewers::Expertise).text())
                .col(
                    ColumnDef::new(Interviewers::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(Interviewers::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(Interviews::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Interviews::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(Interviews::CandidateId).uuid().not_null())
                .col(ColumnDef::new(Interviews::InterviewerId).uuid().not_null())
                .col(
                    ColumnDef::new(Interviews::ScheduledAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Interviews::DurationMinutes)
                        .integer()
                        .not_null()
                        .default(60),
                )
                .col(
                    ColumnDef::new(Interviews::CurrentStatus)
                        .string()
                        .not_null()
                        .default("SCHEDULED"),
                )
                .col(ColumnDef::new(Interviews::InterviewType).string().not_null())
                .col(ColumnDef::new(Interviews::Location).string())
                .col(ColumnDef::new(Interviews::Notes).text())
                .col(
                    ColumnDef::new(Interviews::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(Interviews::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_interviews_candidate_id")
                        .from(Interviews::Table, Interviews::CandidateId)
                        .to(Candidates::Table, Candidates::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_interviews_interviewer_id")
                        .from(Interviews::Table, Interviews::InterviewerId)
                        .to(Interviewers::Table, Interviewers::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(Feedback::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Feedback::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(Feedback::InterviewId).uuid().not_null())
                .col(ColumnDef::new(Feedback::InterviewerId).uuid().not_null())
                .col(ColumnDef::new(Feedback::Technical).integer().not_null())
                .col(ColumnDef::new(Feedback::Communication).integer().not_null())
                .col(ColumnDef::new(Feedback::ProblemSolving).integer().not_null())
                .col(ColumnDef::new(Feedback::CulturalFit).integer())
                .col(ColumnDef::new(Feedback::Strengths).text())
                .col(ColumnDef::new(Feedback::Weaknesses).text())
                .col(ColumnDef::new(Feedback::Comments).text())
                .col(ColumnDef::new(Feedback::Recommendation).string().not_null())
                .col(
                    ColumnDef::new(Feedback::SubmittedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_feedback_interview_id")
                        .from(Feedback::Table, Feedback::InterviewId)
                        .to(Interviews::Table, Interviews::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_feedback_interviewer_id")
                        .from(Feedback::Table, Feedback::InterviewerId)
                        .to(Interviewers::Table, Interviewers::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(AiScreenings::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(AiScreenings::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(AiScreenings::CandidateId).uuid().not_null())
                .col(ColumnDef::new(AiScreenings::SkillsMatched).text().not_null())
                .col(ColumnDef::new(AiScreenings::ExperienceYears).double().not_null())
                .col(ColumnDef::new(AiScreenings::EducationLevel).string().not_null())
                .col(ColumnDef::new(AiScreenings::CulturalFit).text().not_null())
                .col(ColumnDef::new(AiScreenings::MatchScore).integer().not_null())
                .col(ColumnDef::new(AiScreenings::AnalysisText).text().not_null())
                .col(ColumnDef::new(AiScreenings::Recommendation).string().not_null())
                .col(ColumnDef::new(AiScreenings::ModelUsed).string().not_null())
                .col(ColumnDef::new(AiScreenings::ProcessingMs).big_integer().not_null())
                .col(
                    ColumnDef::new(AiScreenings::ScreenedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_ai_screenings_candidate_id")
                        .from(AiScreenings::Table, AiScreenings::CandidateId)
                        .to(Candidates::Table, Candidates::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(StageChanges::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(StageChanges::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(StageChanges::CandidateId).uuid().not_null())
                .col(ColumnDef::new(StageChanges::FromState).string())
                .col(ColumnDef::new(StageChanges::ToState).string().not_null())
                .col(ColumnDef::new(StageChanges::ChangedBy).string().not_null())
                .col(ColumnDef::new(StageChanges::Reason).text())
                .col(
                    ColumnDef::new(StageChanges::ChangedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_stage_changes_candidate_id")
                        .from(StageChanges::Table, StageChanges::CandidateId)
                        .to(Candidates::Table, Candidates::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

        m.create_table(
            Table::create()
                .table(StatusChanges::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(StatusChanges::Id)
                        .uuid()
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(StatusChanges::InterviewId).uuid().not_null())
                .col(ColumnDef::new(StatusChanges::FromState).string())
                .col(ColumnDef::new(StatusChanges::ToState).string().not_null())
                .col(ColumnDef::new(StatusChanges::ChangedBy).string().not_null())
                .col(ColumnDef::new(StatusChanges::Notes).text())
                .col(
                    ColumnDef::new(StatusChanges::ChangedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_status_changes_interview_id")
                        .from(StatusChanges::Table, StatusChanges::InterviewId)
                        .to(Interviews::Table, Interviews::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_interviews_candidate_id ON interviews (candidate_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_interviews_interviewer_id ON interviews (interviewer_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_interviews_scheduled_at ON interviews (scheduled_at)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_interviews_current_status ON interviews (current_status)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_feedback_interview_interviewer ON feedback (interview_id, interviewer_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_ai_screenings_match_score ON ai_screenings (match_score)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_ai_screenings_candidate_id ON ai_screenings (candidate_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_stage_changes_candidate_id ON stage_changes (candidate_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_status_changes_interview_id ON status_changes (interview_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(StatusChanges::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(StageChanges::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(AiScreenings::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(Interviews::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(Interviewers::Table).to_owned())
            .await?;
        m.drop_table(Table::drop().table(Candidates::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Candidates {
    Table,
    Id,
    Name,
    Email,
    Phone,
    ResumeBlobRef,
    CurrentStage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Interviewers {
    Table,
    Id,
    Name,
    Email,
    Department,
    Title,
    Expertise,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Interviews {
    Table,
    Id,
    CandidateId,
    InterviewerId,
    ScheduledAt,
    DurationMinutes,
    CurrentStatus,
    InterviewType,
    Location,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Feedback {
    Table,
    Id,
    InterviewId,
    InterviewerId,
    Technical,
    Communication,
    ProblemSolving,
    CulturalFit,
    Strengths,
    Weaknesses,
    Comments,
    Recommendation,
    SubmittedAt,
}

#[derive(DeriveIden)]
enum AiScreenings {
    Table,
    Id,
    CandidateId,
    SkillsMatched,
    ExperienceYears,
    EducationLevel,
    CulturalFit,
    MatchScore,
    AnalysisText,
    Recommendation,
    ModelUsed,
    ProcessingMs,
    ScreenedAt,
}

#[derive(DeriveIden)]
enum StageChanges {
    Table,
    Id,
    CandidateId,
    FromState,
    ToState,
    ChangedBy,
    Reason,
    ChangedAt,
}

#[derive(DeriveIden)]
enum StatusChanges {
    Table,
    Id,
    InterviewId,
    FromState,
    ToState,
    ChangedBy,
    Notes,
    ChangedAt,
}
