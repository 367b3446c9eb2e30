//! Central error-to-HTTP translator for the pipeline core.
//!
//! Managers return `Error`; controllers propagate it with `?` and this
//! module's `IntoResponse` impl turns it into the stable JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    NotFound(String),
    DuplicateEmail(String),
    DuplicateFeedback,
    SchedulingConflict { interviewer_id: uuid::Uuid, conflict_time: chrono::DateTime<chrono::FixedOffset> },
    Validation(String),
    MalformedRequest(String),
    MissingParameter(String),
    TypeMismatch(String),
    IllegalTransition(String),
    Forbidden(String),
    NoOpTransition,
    PayloadTooLarge,
    ExternalServiceUnavailable(String),
    InvalidState(String),
    StorageUnavailable(String),
    OptimisticConflict(String),
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(what) => write!(f, "not found: {what}"),
            Error::DuplicateEmail(email) => write!(f, "email already in use: {email}"),
            Error::DuplicateFeedback => write!(f, "feedback already submitted for this interview by this interviewer"),
            Error::SchedulingConflict { interviewer_id, conflict_time } => {
                write!(f, "scheduling conflict for interviewer {interviewer_id} at {conflict_time}")
            }
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::MalformedRequest(msg) => write!(f, "malformed request: {msg}"),
            Error::MissingParameter(name) => write!(f, "missing parameter: {name}"),
            Error::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            Error::IllegalTransition(msg) => write!(f, "{msg}"),
            Error::Forbidden(msg) => write!(f, "{msg}"),
            Error::NoOpTransition => write!(f, "target state equals current state"),
            Error::PayloadTooLarge => write!(f, "payload exceeds the upload limit"),
            Error::ExternalServiceUnavailable(name) => write!(f, "{name} is unavailable"),
            Error::InvalidState(msg) => write!(f, "{msg}"),
            Error::StorageUnavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Error::OptimisticConflict(msg) => write!(f, "optimistic conflict: {msg}"),
            Error::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<sea_orm::DbErr> for Error {
    fn from(e: sea_orm::DbErr) -> Self {
        match &e {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => Error::StorageUnavailable(e.to_string()),
            _ => Error::Internal(e.to_string()),
        }
    }
}

impl From<loco_rs::model::ModelError> for Error {
    fn from(e: loco_rs::model::ModelError) -> Self {
        match e {
            loco_rs::model::ModelError::EntityNotFound => Error::NotFound("record".into()),
            loco_rs::model::ModelError::DbErr(db_err) => Error::from(db_err),
            other => Error::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct FieldError {
    field: String,
    rejected_value: Value,
    message: String,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateEmail(_)
            | Error::DuplicateFeedback
            | Error::SchedulingConflict { .. }
            | Error::OptimisticConflict(_) => StatusCode::CONFLICT,
            Error::Validation(_)
            | Error::MalformedRequest(_)
            | Error::MissingParameter(_)
            | Error::TypeMismatch(_)
            | Error::InvalidState(_) => StatusCode::BAD_REQUEST,
            Error::IllegalTransition(_) | Error::NoOpTransition => StatusCode::UNPROCESSABLE_ENTITY,
            // Every `Forbidden` this codebase raises is a business-rule
            // violation (delete HIRED, delete an active interviewer,
            // non-owner feedback submission), not an authorization failure,
            // so it maps to 422 alongside the other business-rule errors.
            Error::Forbidden(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::ExternalServiceUnavailable(_) | Error::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::DuplicateEmail(_) => "DuplicateEmail",
            Error::DuplicateFeedback => "DuplicateFeedback",
            Error::SchedulingConflict { .. } => "SchedulingConflict",
            Error::Validation(_) => "ValidationError",
            Error::MalformedRequest(_) => "MalformedRequest",
            Error::MissingParameter(_) => "MissingParameter",
            Error::TypeMismatch(_) => "TypeMismatch",
            Error::IllegalTransition(_) => "IllegalTransition",
            Error::Forbidden(_) => "Forbidden",
            Error::NoOpTransition => "NoOpTransition",
            Error::PayloadTooLarge => "PayloadTooLarge",
            Error::ExternalServiceUnavailable(_) => "ExternalServiceUnavailable",
            Error::InvalidState(_) => "InvalidState",
            Error::StorageUnavailable(_) => "StorageUnavailable",
            Error::OptimisticConflict(_) => "OptimisticConflict",
            Error::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": status.as_u16(),
            "error": self.error_kind(),
            "message": self.to_string(),
        });

        if let Error::SchedulingConflict { interviewer_id, conflict_time } = &self {
            body["metadata"] = json!({
                "interviewerId": interviewer_id,
                "conflictTime": conflict_time.to_rfc3339(),
            });
        }
        if let Error::ExternalServiceUnavailable(name) = &self {
            body["metadata"] = json!({ "serviceName": name });
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stamps every error body with the request path it was raised for, per the
/// required `{timestamp, status, error, message, path}` shape. `Error`
/// itself has no access to the request, so this runs as a router-wide layer
/// instead of inside `IntoResponse` — it's the one place that sees both the
/// incoming `Uri` and the outgoing body.
pub async fn stamp_error_path(req: axum::extract::Request, next: axum::middleware::Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    if !response.status().is_client_error() && !response.status().is_server_error() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(_) => return Response::from_parts(parts, axum::body::Body::empty()),
    };
    let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, axum::body::Body::from(bytes));
    };
    if let Some(obj) = value.as_object_mut() {
        obj.entry("path").or_insert_with(|| Value::String(path));
    }
    let bytes = serde_json::to_vec(&value).unwrap_or_else(|_| bytes.to_vec());
    Response::from_parts(parts, axum::body::Body::from(bytes))
}
