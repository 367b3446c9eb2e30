//! Prompt construction, the external LLM call, response parsing, the
//! fallback analyzer, and the bounded worker pool that runs all of it off
//! the request path.
//!
//! Built around a shared `reqwest::Client`, typed request/response structs,
//! and an explicit per-call timeout.

use regex::Regex;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, warn};
use uuid::Uuid;

use crate::common::settings::Settings;
use crate::errors::{Error, Result};
use crate::models::ai_screenings::{self, ActiveModel as ScreeningActiveModel, Model as Screening};
use crate::models::candidates;

const MIN_RESUME_CHARS: usize = 100;
const RESUME_PRESENCE_TOKENS: &[&str] =
    &["email", "@", "experience", "work", "project", "education", "degree", "university"];
const MAX_PROMPT_RESUME_CHARS: usize = 4_000;
const FALLBACK_KEYWORDS: &[&str] = &[
    "java", "python", "javascript", "react", "spring", "sql", "aws", "docker", "kubernetes", "git", "api",
    "microservices",
];

static POOL: OnceLock<Pool> = OnceLock::new();

/// Returns the process-wide screening pool, constructing it on first use.
pub fn pool(settings: &Settings) -> &'static Pool {
    POOL.get_or_init(|| Pool::new(settings.screening.pool.core, settings.screening.pool.max, settings.screening.pool.queue))
}

#[derive(Debug, Clone)]
pub struct ParsedScreening {
    pub skills_matched: String,
    pub experience_years: f64,
    pub education_level: String,
    pub cultural_fit: String,
    pub match_score: i32,
    pub analysis_text: String,
    pub recommendation: String,
}

fn build_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let truncated: String = resume_text.chars().take(MAX_PROMPT_RESUME_CHARS).collect();
    let requirements = job_description.filter(|s| !s.trim().is_empty()).unwrap_or("General software engineering position");
    format!(
        "You are an expert HR recruiter analyzing a candidate's resume.\n\
         RESUME CONTENT: {truncated}\n\
         JOB REQUIREMENTS: {requirements}\n\
         SKILLS: ...\n\
         EXPERIENCE: <number>\n\
         EDUCATION: ...\n\
         CULTURAL_FIT: ...\n\
         MATCH_SCORE: <0-100>\n\
         ANALYSIS: ...\n\
         RECOMMENDATION: STRONG_HIRE | HIRE | MAYBE | NO_HIRE"
    )
}

/// Minimal resume text extractor. The real PDF/DOCX pipeline is an external
/// collaborator; this reads the blob as UTF-8 text, which is as far as
/// the core's contract goes, and rejects anything that doesn't decode.
pub fn extract_resume_text(resume_dir: &str, blob_ref: &str) -> Result<String> {
    let path = std::path::Path::new(resume_dir).join(blob_ref);
    let bytes = std::fs::read(&path).map_err(|e| Error::Validation(format!("resume: {e}")))?;
    String::from_utf8(bytes).map_err(|_| Error::Validation("resume: unsupported legacy binary format".into()))
}

fn validate_resume_text(text: &str) -> Result<()> {
    if text.len() < MIN_RESUME_CHARS {
        return Err(Error::Validation("resume: too short to analyze".into()));
    }
    let lower = text.to_lowercase();
    if !RESUME_PRESENCE_TOKENS.iter().any(|tok| lower.contains(tok)) {
        return Err(Error::Validation("resume: missing expected resume content".into()));
    }
    Ok(())
}

struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: String,
}

impl LlmClient {
    fn new(settings: &Settings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.llm.base_url.clone(),
            model: settings.llm.model.clone(),
            timeout: Duration::from_millis(settings.llm.timeout_ms),
        }
    }

    async fn complete(&self, prompt: &str) -> std::result::Result<String, String> {
        let request = self.http
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&ChatRequest { model: &self.model, prompt, stream: false })
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(resp)) => resp
                .json::<ChatResponse>()
                .await
                .map(|r| r.response)
                .map_err(|e| e.to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("LLM call timed out".to_string()),
        }
    }
}

/// Finds the substring between `marker` and whichever of the other markers
/// comes next, trimmed. Returns `None` if `marker` is absent.
fn section(text: &str, marker: &str, all_markers: &[&str]) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = all_markers
        .iter()
        .filter(|m| **m != marker)
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn parse_llm_response(text: &str) -> Option<ParsedScreening> {
    const MARKERS: &[&str] = &[
        "SKILLS:",
        "EXPERIENCE:",
        "EDUCATION:",
        "CULTURAL_FIT:",
        "MATCH_SCORE:",
        "ANALYSIS:",
        "RECOMMENDATION:",
    ];
    let skills_matched = section(text, "SKILLS:", MARKERS)?;
    let experience_raw = section(text, "EXPERIENCE:", MARKERS)?;
    let education_level = section(text, "EDUCATION:", MARKERS)?;
    let cultural_fit = section(text, "CULTURAL_FIT:", MARKERS)?;
    let score_raw = section(text, "MATCH_SCORE:", MARKERS)?;
    let analysis_text = section(text, "ANALYSIS:", MARKERS)?;
    let recommendation_raw = section(text, "RECOMMENDATION:", MARKERS)?;

    let decimal_re = Regex::new(r"\d+(\.\d+)?").ok()?;
    let experience_years: f64 = decimal_re.find(&experience_raw)?.as_str().parse().ok()?;

    let integer_re = Regex::new(r"\d+").ok()?;
    let match_score: i32 = integer_re.find(&score_raw)?.as_str().parse().ok()?;
    let match_score = match_score.clamp(0, 100);

    let recommendation = ["STRONG_HIRE", "NO_HIRE", "MAYBE", "HIRE"]
        .into_iter()
        .find(|r| recommendation_raw.contains(r))
        .unwrap_or("MAYBE")
        .to_string();

    Some(ParsedScreening {
        skills_matched,
        experience_years,
        education_level,
        cultural_fit,
        match_score,
        analysis_text,
        recommendation,
    })
}

/// Deterministic keyword-count heuristic, used whenever the LLM call fails
/// or its response cannot be parsed — the screening always produces a result.
fn fallback_analyze(resume_text: &str) -> ParsedScreening {
    let lower = resume_text.to_lowercase();
    let skill_count = FALLBACK_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
    let matched: Vec<&str> = FALLBACK_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).copied().collect();

    let experience_years = if lower.contains("senior") || lower.contains("lead") {
        5.0
    } else if lower.contains("junior") || lower.contains("intern") {
        1.0
    } else {
        3.0
    };

    let education_level = if lower.contains("master") || lower.contains("phd") {
        "Master's degree or higher"
    } else if lower.contains("bachelor") || lower.contains("b.tech") || lower.contains("b.e") {
        "Bachelor's degree"
    } else {
        "Unknown"
    }
    .to_string();

    let match_score = (40 + (5 * skill_count).min(30) as i32).clamp(0, 100);
    let recommendation = if match_score >= 70 { "HIRE" } else { "MAYBE" }.to_string();

    ParsedScreening {
        skills_matched: matched.join(", "),
        experience_years,
        education_level,
        cultural_fit: "Teamwork: Medium, Leadership: Medium, Communication: Medium".to_string(),
        match_score,
        analysis_text: "Generated by the fallback keyword analyzer.".to_string(),
        recommendation,
    }
}

/// Synchronous screening entry point (`screen`/`screenAsync` share this).
pub async fn screen(db: &DatabaseConnection, settings: &Settings, candidate_id: Uuid, job_description: Option<String>) -> Result<Screening> {
    let candidate = candidates::Entity::find_by_id(candidate_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("candidate {candidate_id}")))?;

    let blob_ref = candidate
        .resume_blob_ref
        .clone()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| Error::Validation("resume: candidate has no resume on file".into()))?;

    let resume_text = extract_resume_text(&settings.uploads.resume_dir, &blob_ref)?;
    validate_resume_text(&resume_text)?;

    let prompt = build_prompt(&resume_text, job_description.as_deref());
    let client = LlmClient::new(settings);

    let started = Instant::now();
    let parsed = match client.complete(&prompt).await {
        Ok(response) => match parse_llm_response(&response) {
            Some(parsed) => parsed,
            None => {
                warn!(candidate_id = %candidate_id, "LLM response failed to parse, using fallback analyzer");
                fallback_analyze(&resume_text)
            }
        },
        Err(cause) => {
            error!(candidate_id = %candidate_id, cause, "LLM call failed, using fallback analyzer");
            fallback_analyze(&resume_text)
        }
    };
    let processing_ms = started.elapsed().as_millis() as i64;

    let active = ScreeningActiveModel {
        candidate_id: sea_orm::ActiveValue::Set(candidate_id),
        skills_matched: sea_orm::ActiveValue::Set(parsed.skills_matched),
        experience_years: sea_orm::ActiveValue::Set(parsed.experience_years),
        education_level: sea_orm::ActiveValue::Set(parsed.education_level),
        cultural_fit: sea_orm::ActiveValue::Set(parsed.cultural_fit),
        match_score: sea_orm::ActiveValue::Set(parsed.match_score),
        analysis_text: sea_orm::ActiveValue::Set(parsed.analysis_text),
        recommendation: sea_orm::ActiveValue::Set(parsed.recommendation),
        model_used: sea_orm::ActiveValue::Set(settings.llm.model.clone()),
        processing_ms: sea_orm::ActiveValue::Set(processing_ms),
        ..Default::default()
    };

    ai_screenings::persist(db, active, candidate_id).await
}

type BoxedUnitFuture = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;
type Job = Box<dyn FnOnce() -> BoxedUnitFuture + Send>;

/// Bounded worker pool with core/max/queue shape and caller-runs
/// back-pressure. `core` named workers are always running;
/// `max - core` additional named workers share the same queue so bursts
/// get real concurrency instead of just waiting in line, while the total
/// concurrent job count never exceeds `max`. When the queue is also full,
/// the submitting caller executes the job itself instead of blocking.
pub struct Pool {
    sender: mpsc::Sender<Job>,
    permits: Arc<Semaphore>,
}

impl Pool {
    fn new(core: usize, max: usize, queue: usize) -> Self {
        let core = core.max(1);
        let max = max.max(core);
        let (sender, receiver) = mpsc::channel::<Job>(queue.max(1));
        let permits = Arc::new(Semaphore::new(max));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        for worker_id in 0..max {
            let receiver = receiver.clone();
            let permits = permits.clone();
            let kind = if worker_id < core { "core" } else { "extra" };
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };
                    match job {
                        Some(job) => {
                            let _permit = permits.acquire().await;
                            tracing::debug!(worker = worker_id, kind, "screening worker picked up job");
                            job().await;
                        }
                        None => break,
                    }
                }
            });
        }

        Self { sender, permits }
    }

    /// Enqueues `job`. If the bounded queue is full, runs it on the caller's
    /// task instead (caller-runs back-pressure) rather than blocking.
    pub async fn submit<F>(&self, job: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let boxed: Job = Box::new(move || Box::pin(job));
        match self.sender.try_send(boxed) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!("screening queue full, running job on caller's task");
                job().await;
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                job().await;
            }
        }
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Fire-and-forget entry point for `POST /api/screenings/candidate/{id}/async`.
pub fn screen_async(db: DatabaseConnection, settings: Settings, candidate_id: Uuid, job_description: Option<String>) {
    let pool = pool(&settings);
    let db2 = db.clone();
    let settings2 = settings.clone();
    let job = async move {
        if let Err(e) = screen(&db2, &settings2, candidate_id, job_description).await {
            error!(candidate_id = %candidate_id, error = %e, "async screening job failed");
        }
    };
    let pool_ref = pool;
    tokio::spawn(async move {
        pool_ref.submit(job).await;
    });
}

/// Enqueues one job per candidate for `POST /api/screenings/bulk`. Returns
/// immediately with the count; there is no externally observable completion
/// signal for the batch (design notes, Open Question 3).
pub fn bulk_async(db: DatabaseConnection, settings: Settings, candidate_ids: Vec<Uuid>, job_description: Option<String>) -> usize {
    let total = candidate_ids.len();
    for candidate_id in candidate_ids {
        screen_async(db.clone(), settings.clone(), candidate_id, job_description.clone());
    }
    total
}
