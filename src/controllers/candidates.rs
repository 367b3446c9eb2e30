use axum::debug_handler;
use axum::extract::{Multipart, Path, Query};
use loco_rs::prelude::*;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result as PipelineResult};
use crate::models::candidates::{self, SearchParams};
use crate::models::state_machine::Stage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateResponse {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    resume_blob_ref: Option<String>,
    current_stage: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
    updated_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<candidates::Model> for CandidateResponse {
    fn from(m: candidates::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            resume_blob_ref: m.resume_blob_ref,
            current_stage: m.current_stage,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageResponse<T> {
    items: Vec<T>,
    page: u64,
    size: u64,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_size")]
    size: u64,
    #[serde(default = "default_sort_by")]
    #[serde(rename = "sortBy")]
    sort_by: String,
    #[serde(default = "default_sort_dir")]
    #[serde(rename = "sortDir")]
    sort_dir: String,
}

fn default_page() -> u64 {
    1
}
fn default_size() -> u64 {
    20
}
fn default_sort_by() -> String {
    "createdAt".to_string()
}
fn default_sort_dir() -> String {
    "desc".to_string()
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    name: Option<String>,
    email: Option<String>,
    stage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StageTransitionQuery {
    #[serde(rename = "newStage")]
    new_stage: String,
    #[serde(rename = "changedBy")]
    changed_by: String,
    reason: Option<String>,
}

#[debug_handler]
async fn create(State(ctx): State<AppContext>, mut multipart: Multipart) -> PipelineResult<Response> {
    let mut name: Option<String> = None;
    let mut email: Option<String> = None;
    let mut phone: Option<String> = None;
    let mut resume_bytes: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::MalformedRequest(e.to_string()))? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "resume" => {
                resume_bytes = Some(field.bytes().await.map_err(|e| Error::MalformedRequest(e.to_string()))?);
            }
            _ => {
                let text = field.text().await.map_err(|e| Error::MalformedRequest(e.to_string()))?;
                match field_name.as_str() {
                    "name" => name = Some(text),
                    "email" => email = Some(text),
                    "phone" => phone = Some(text),
                    _ => {}
                }
            }
        }
    }

    let name = name.ok_or_else(|| Error::MissingParameter("name".into()))?;
    let email = email.ok_or_else(|| Error::MissingParameter("email".into()))?;

    let resume_blob_ref = match resume_bytes {
        Some(bytes) => {
            let settings = crate::common::settings::Settings::from_context(&ctx);
            let dir = std::path::Path::new(&settings.uploads.resume_dir);
            std::fs::create_dir_all(dir).map_err(|e| Error::Internal(e.to_string()))?;
            let blob_ref = format!("{}.txt", Uuid::new_v4());
            std::fs::write(dir.join(&blob_ref), &bytes).map_err(|e| Error::Internal(e.to_string()))?;
            Some(blob_ref)
        }
        None => None,
    };

    let candidate = candidates::create(&ctx.db, &name, &email, phone, resume_blob_ref).await?;
    Ok((axum::http::StatusCode::CREATED, axum::Json(CandidateResponse::from(candidate))).into_response())
}

#[debug_handler]
async fn show(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    let candidate = candidates::Entity::find_by_id(id)
        .one(&ctx.db)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
        .ok_or_else(|| Error::NotFound(format!("candidate {id}")))?;
    format::json(CandidateResponse::from(candidate)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn list(State(ctx): State<AppContext>, Query(params): Query<ListParams>) -> PipelineResult<Response> {
    let page = candidates::Model::list_paged(&ctx.db, params.page, params.size, &params.sort_by, &params.sort_dir).await
        .map_err(|e| Error::Internal(e.to_string()))?;
    format::json(PageResponse {
        items: page.items.into_iter().map(CandidateResponse::from).collect(),
        page: page.page,
        size: page.size,
        total: page.total,
    })
    .map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn search(State(ctx): State<AppContext>, Query(query): Query<SearchQuery>) -> PipelineResult<Response> {
    let results = candidates::Model::search(
        &ctx.db,
        &SearchParams { name: query.name, email: query.email, stage: query.stage },
    )
    .await
    .map_err(|e| Error::Internal(e.to_string()))?;
    format::json(results.into_iter().map(CandidateResponse::from).collect::<Vec<_>>())
        .map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn update_stage(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<StageTransitionQuery>,
) -> PipelineResult<Response> {
    let new_stage = Stage::parse(&query.new_stage)
        .ok_or_else(|| Error::Validation(format!("unknown stage {}", query.new_stage)))?;
    let candidate = candidates::update_stage(&ctx.db, id, new_stage, &query.changed_by, query.reason).await?;
    format::json(CandidateResponse::from(candidate)).map_err(|e| Error::Internal(e.to_string()))
}

#[debug_handler]
async fn destroy(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> PipelineResult<Response> {
    candidates::delete(&ctx.db, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT.into_response())
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("candidates")
        .add("/", post(create))
        .add("/", get(list))
        .add("/search", get(search))
        .add("/{id}", get(show))
        .add("/{id}/stage", put(update_stage))
        .add("/{id}", delete(destroy))
}
