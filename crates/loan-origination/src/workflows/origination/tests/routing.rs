use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::origination::fields::{FieldPatch, ReviewDisposition};
use crate::workflows::origination::router::intake_handler;
use crate::workflows::origination::OriginationService;

fn intake_request() -> Request<Body> {
    Request::post("/api/v1/origination/applications")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&content()).unwrap()))
        .unwrap()
}

async fn open_draft_over_http(router: &axum::Router) -> String {
    let response = router.clone().oneshot(intake_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    body["application_id"].as_str().expect("id present").to_string()
}

async fn submit_over_http(router: &axum::Router, application_id: &str) -> serde_json::Value {
    let response = router
        .clone()
        .oneshot(
            Request::post(format!(
                "/api/v1/origination/applications/{application_id}/submit"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    read_json_body(response).await
}

#[tokio::test]
async fn intake_route_accepts_drafts() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let response = router.oneshot(intake_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = read_json_body(response).await;
    assert_eq!(body["status"], "draft");
    assert!(body["application_id"]
        .as_str()
        .expect("id present")
        .starts_with("ln-"));
    assert!(body.get("transaction_id").is_none());
}

#[tokio::test]
async fn submit_route_returns_a_sealed_receipt() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    let receipt = submit_over_http(&router, &application_id).await;

    let raw = receipt["transaction_id"].as_str().expect("raw id present");
    assert_eq!(raw.len(), 10);
    assert!(raw.bytes().all(|b| b.is_ascii_digit()));

    let display = receipt["display_id"].as_str().expect("display id present");
    assert_eq!(display.len(), 11);
    assert_eq!(&display[6..7], "-");
    assert_eq!(display.replace('-', ""), raw);

    assert_eq!(
        receipt["seal_hash"].as_str().expect("hash present").len(),
        64
    );
    assert!(receipt["sealed_at"].is_string());
}

#[tokio::test]
async fn second_submit_conflicts() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    submit_over_http(&router, &application_id).await;

    let response = router
        .oneshot(
            Request::post(format!(
                "/api/v1/origination/applications/{application_id}/submit"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submitting_an_unknown_application_is_not_found() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/origination/applications/ln-000999/submit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sealed_field_patches_are_unprocessable() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    submit_over_http(&router, &application_id).await;

    let patches = vec![FieldPatch::Principal(1)];
    let response = router
        .oneshot(
            Request::patch(format!(
                "/api/v1/origination/applications/{application_id}"
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&patches).unwrap()))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message present")
        .contains("principal"));
}

#[tokio::test]
async fn operational_patches_keep_flowing_after_submission() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    submit_over_http(&router, &application_id).await;

    let patches = vec![FieldPatch::Status(ReviewDisposition::UnderReview)];
    let response = router
        .clone()
        .oneshot(
            Request::patch(format!(
                "/api/v1/origination/applications/{application_id}"
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&patches).unwrap()))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["status"], "under_review");
}

#[tokio::test]
async fn verify_route_reports_on_the_stored_seal() {
    let (service, repository, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    submit_over_http(&router, &application_id).await;

    let response = router
        .clone()
        .oneshot(
            Request::post(format!(
                "/api/v1/origination/applications/{application_id}/verify"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["valid"], json!(true));

    repository.tamper(
        &crate::workflows::origination::domain::ApplicationId(application_id.clone()),
        |record| record.content.borrower.gross_monthly_income = 1,
    );

    let response = router
        .oneshot(
            Request::post(format!(
                "/api/v1/origination/applications/{application_id}/verify"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["valid"], json!(false));
}

#[tokio::test]
async fn verifying_an_unsealed_draft_conflicts() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    let response = router
        .oneshot(
            Request::post(format!(
                "/api/v1/origination/applications/{application_id}/verify"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn lookup_route_resolves_sealed_records() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    let receipt = submit_over_http(&router, &application_id).await;
    let raw = receipt["transaction_id"].as_str().expect("raw id present");

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/origination/lookup/{raw}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(
        body["application"]["application_id"],
        json!(application_id)
    );
}

#[tokio::test]
async fn lookup_route_rejects_malformed_references() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/origination/lookup/25012100AB")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_route_misses_with_not_found() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/origination/lookup/250121-9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn record_route_fetches_bundles() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let application_id = open_draft_over_http(&router).await;
    let response = router
        .oneshot(
            Request::get(format!("/api/v1/origination/applications/{application_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["application"]["status"], "Draft");
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let (service, _, _) = build_service();
    let router = origination_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/origination/applications/ln-000999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn intake_handler_reports_storage_outages() {
    let service = Arc::new(OriginationService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAudit::default()),
    ));

    let response = intake_handler::<UnavailableRepository, MemoryAudit>(
        State(service),
        axum::Json(content()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
