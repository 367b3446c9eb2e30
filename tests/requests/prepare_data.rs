//! Shared fixture builders for the HTTP-request test suite: the
//! candidate/interviewer/resume fixtures the controller tests need.

use chrono::{Duration, Utc};
use loco_rs::app::AppContext;
use pipeline_core::models::{candidates, interviewers, state_machine::Stage};
use uuid::Uuid;

/// Resume text long enough to pass the minimum-length check, containing a
/// presence token (`email`/`@`/etc.) and several fallback-analyzer keywords
/// (java, spring, docker, senior).
pub const SAMPLE_RESUME: &str = "John Doe <john.doe@example.com>\n\
    Senior Software Engineer with 6 years of experience building distributed\n\
    systems in java and spring, containerized with docker for deployment.\n\
    EDUCATION: Bachelor's degree in Computer Science, State University.\n\
    Led several cross-functional projects on the work of migrating legacy services.";

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

pub async fn write_resume(ctx: &AppContext, blob_ref: &str, content: &str) {
    let settings = pipeline_core::common::settings::Settings::from_context(ctx);
    let dir = std::path::Path::new(&settings.uploads.resume_dir);
    std::fs::create_dir_all(dir).expect("failed to create resume fixture directory");
    std::fs::write(dir.join(blob_ref), content).expect("failed to write resume fixture");
}

pub async fn create_candidate(ctx: &AppContext, name: &str) -> candidates::Model {
    candidates::create(&ctx.db, name, &unique_email("candidate"), None, None)
        .await
        .expect("failed to create candidate fixture")
}

pub async fn create_candidate_with_resume(ctx: &AppContext, name: &str) -> candidates::Model {
    let blob_ref = format!("{}.txt", Uuid::new_v4());
    write_resume(ctx, &blob_ref, SAMPLE_RESUME).await;
    candidates::create(&ctx.db, name, &unique_email("candidate"), None, Some(blob_ref))
        .await
        .expect("failed to create candidate fixture")
}

pub async fn create_interviewer(ctx: &AppContext, name: &str) -> interviewers::Model {
    interviewers::create(&ctx.db, name, &unique_email("interviewer"), None, None, None)
        .await
        .expect("failed to create interviewer fixture")
}

/// Advances a freshly-created (APPLIED) candidate straight to SCREENING so
/// it becomes eligible for interview scheduling.
pub async fn advance_to_screening(ctx: &AppContext, candidate_id: Uuid) -> candidates::Model {
    candidates::update_stage(&ctx.db, candidate_id, Stage::Screening, "TEST_HARNESS", None)
        .await
        .expect("failed to advance candidate to SCREENING")
}

pub fn tomorrow_at(hour: u32) -> chrono::DateTime<chrono::FixedOffset> {
    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
    tomorrow.and_hms_opt(hour, 0, 0).unwrap().and_utc().fixed_offset()
}

pub fn days_from_now_at(days: i64, hour: u32) -> chrono::DateTime<chrono::FixedOffset> {
    let day = (Utc::now() + Duration::days(days)).date_naive();
    day.and_hms_opt(hour, 0, 0).unwrap().and_utc().fixed_offset()
}
