use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::allocator::AllocationError;
use super::domain::{ApplicationContent, ApplicationId};
use super::fields::FieldPatch;
use super::repository::{AuditPublisher, OriginationRepository, RepositoryError};
use super::service::{OriginationError, OriginationService};

/// Router builder exposing HTTP endpoints for intake, sealing, and lookup.
pub fn origination_router<R, A>(service: Arc<OriginationService<R, A>>) -> Router
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/origination/applications",
            post(intake_handler::<R, A>),
        )
        .route(
            "/api/v1/origination/applications/:application_id",
            get(record_handler::<R, A>).patch(update_handler::<R, A>),
        )
        .route(
            "/api/v1/origination/applications/:application_id/submit",
            post(submit_handler::<R, A>),
        )
        .route(
            "/api/v1/origination/applications/:application_id/verify",
            post(verify_handler::<R, A>),
        )
        .route(
            "/api/v1/origination/lookup/:transaction_id",
            get(lookup_handler::<R, A>),
        )
        .with_state(service)
}

pub(crate) async fn intake_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    axum::Json(content): axum::Json<ApplicationContent>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    match service.open_draft(content) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "application already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn record_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.get(&id) {
        Ok(bundle) => (StatusCode::OK, axum::Json(bundle)).into_response(),
        Err(OriginationError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("application '{}' not found", id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn update_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    Path(application_id): Path<String>,
    axum::Json(patches): axum::Json<Vec<FieldPatch>>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.apply_updates(&id, patches) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(OriginationError::Immutability(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("application '{}' not found", id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "record changed underneath this update, retry",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn submit_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.submit(&id) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error @ OriginationError::AlreadySealed { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Allocation(AllocationError::CapacityExceeded {
            date_token, ..
        })) => {
            let payload = json!({
                "error": format!("daily transaction id capacity exhausted for {date_token}"),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("application '{}' not found", id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "submission raced another write, retry",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn verify_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.verify_integrity(&id) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error @ OriginationError::NotSealed { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("application '{}' not found", id.0),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn lookup_handler<R, A>(
    State(service): State<Arc<OriginationService<R, A>>>,
    Path(transaction_id): Path<String>,
) -> Response
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    match service.lookup(&transaction_id) {
        Ok(Some(bundle)) => (StatusCode::OK, axum::Json(bundle)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": format!("no application issued under '{transaction_id}'"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(OriginationError::Format(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
