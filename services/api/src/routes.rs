use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_origination::error::AppError;
use loan_origination::workflows::origination::{
    origination_router, AuditPublisher, OriginationError, OriginationRepository,
    OriginationService, TransactionId,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Decoded parts of a transaction id reference, for support staff checking
/// a reference read back over the phone.
#[derive(Debug, Serialize)]
pub(crate) struct IdInspectResponse {
    pub(crate) raw: String,
    pub(crate) display: String,
    pub(crate) date_token: String,
    pub(crate) sequence: u16,
}

pub(crate) fn with_origination_routes<R, A>(
    service: Arc<OriginationService<R, A>>,
) -> axum::Router
where
    R: OriginationRepository + 'static,
    A: AuditPublisher + 'static,
{
    origination_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/origination/id/:reference",
            axum::routing::get(id_inspect_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn id_inspect_endpoint(
    Path(reference): Path<String>,
) -> Result<Json<IdInspectResponse>, AppError> {
    let transaction_id = TransactionId::parse(&reference).map_err(OriginationError::from)?;

    Ok(Json(IdInspectResponse {
        raw: transaction_id.raw(),
        display: transaction_id.display(),
        date_token: transaction_id.date_token().to_string(),
        sequence: transaction_id.sequence(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn id_inspect_endpoint_decodes_both_reference_forms() {
        let Json(raw_form) = id_inspect_endpoint(Path("2501210007".to_string()))
            .await
            .expect("raw form decodes");
        let Json(display_form) = id_inspect_endpoint(Path("250121-0007".to_string()))
            .await
            .expect("display form decodes");

        assert_eq!(raw_form.raw, "2501210007");
        assert_eq!(raw_form.display, "250121-0007");
        assert_eq!(raw_form.date_token, "250121");
        assert_eq!(raw_form.sequence, 7);
        assert_eq!(display_form.raw, raw_form.raw);
    }

    #[tokio::test]
    async fn id_inspect_endpoint_rejects_malformed_references() {
        let result = id_inspect_endpoint(Path("25-01-21-0007".to_string())).await;
        assert!(result.is_err(), "malformed references never decode");
    }
}
