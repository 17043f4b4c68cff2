use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use claims_server::{create_app, AppState};
use claims_service::{ClaimPatch, ClaimStatus, ClaimStore, ClaimsConfig, DetailPatch, InMemoryClaimStore};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "claimtrack-test-boundary";

fn setup() -> (Arc<InMemoryClaimStore>, Router) {
    let store = Arc::new(InMemoryClaimStore::new());
    let state = AppState::new(store.clone(), ClaimsConfig::default());
    (store, create_app(state))
}

async fn seed(store: &InMemoryClaimStore) {
    for (id, name, insurer, status, billed, paid) in [
        ("30001", "Virginia Rhodes", "Aetna", ClaimStatus::Denied, 100000, 0),
        ("30002", "Maria Chen", "Cigna", ClaimStatus::Paid, 50000, 40000),
        ("30003", "Ravi Kumar", "Aetna", ClaimStatus::UnderReview, 20000, 0),
    ] {
        store
            .upsert_claim(ClaimPatch {
                patient_name: Some(name.into()),
                insurer_name: Some(insurer.into()),
                status: Some(status),
                billed_amount: Some(Decimal::new(billed, 2)),
                paid_amount: Some(Decimal::new(paid, 2)),
                ..ClaimPatch::new(id)
            })
            .await
            .unwrap();
    }
    store
        .upsert_detail(DetailPatch {
            claim_id: "30001".into(),
            cpt_codes: Some("99213, 80053".into()),
            denial_reason: Some(Some("Coverage not verified".into())),
        })
        .await
        .unwrap();
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Parts are (field name, optional file name, contents)
fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, file_name, contents) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                name, file_name
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
        }
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (_, app) = setup();
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["backend"], "memory");
}

#[tokio::test]
async fn test_upload_imports_claims_then_details() {
    let (store, app) = setup();
    let claims = r#"[{"id":"1","patient_name":"A","billed_amount":"$100.00","paid_amount":"50","status":"Denied","insurer_name":"X","discharge_date":"2023-01-05"}]"#;
    let details = "claim_id,cpt_codes,denial_reason\n1,99213,Not covered\n404,99215,\n";

    let (status, body) = send(
        &app,
        multipart(&[
            ("claims_file", Some("claims.json"), claims),
            ("details_file", Some("details.csv"), details),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["claims"]["created"], 1);
    assert_eq!(body["data"]["details"]["updated"], 1);
    assert_eq!(body["data"]["details"]["skipped"], 1);
    assert_eq!(
        body["data"]["messages"][0],
        "Successfully processed 1 claims: 1 created, 0 updated"
    );

    let claim = store.get_claim("1").await.unwrap().unwrap();
    assert_eq!(claim.billed_amount.to_string(), "100.00");
    let detail = store.get_detail("1").await.unwrap().unwrap();
    assert_eq!(detail.denial_reason.as_deref(), Some("Not covered"));
    assert!(store.get_detail("404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_declared_format_and_clear() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(
        &app,
        multipart(&[
            ("file_format", None, "csv"),
            ("clear_existing", None, "true"),
            ("claims_file", Some("export.txt"), "id,patient_name\n9,Zoe\n"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["claims"]["created"], 1);
    assert!(body["data"]["details"].is_null());
    assert!(store.get_claim("30001").await.unwrap().is_none());
    assert!(store.get_claim("9").await.unwrap().is_some());
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let (_, app) = setup();
    let (status, body) = send(&app, multipart(&[("clear_existing", None, "true")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "bad_request");
    assert!(body["error_id"].is_string());
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn test_upload_malformed_file_is_unprocessable() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(
        &app,
        multipart(&[
            ("clear_existing", None, "true"),
            ("claims_file", Some("claims.json"), r#"{"rows": []}"#),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "import_error");
    assert_eq!(body["code"], error_common::codes::import::INVALID_SHAPE);
    // The batch was rejected before anything was cleared
    assert!(store.get_claim("30001").await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_claims_filters_and_paginates() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(&app, get("/api/v1/claims?insurer=aet&page_size=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["metadata"]["total_count"], 2);
    assert_eq!(body["metadata"]["pagination"]["total_pages"], 2);
    assert_eq!(body["metadata"]["pagination"]["has_next"], true);

    let (_, body) = send(&app, get("/api/v1/claims?search=chen&status=paid")).await;
    let claims = body["data"].as_array().unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0]["id"], "30002");

    let (status, body) = send(&app, get("/api/v1/claims?status=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_claim_detail_view() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(&app, get("/api/v1/claims/30001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["claim"]["patient_name"], "Virginia Rhodes");
    assert_eq!(body["data"]["underpayment"], "1000.00");
    assert_eq!(body["data"]["cpt_codes"], json!(["99213", "80053"]));
    assert_eq!(body["data"]["detail"]["denial_reason"], "Coverage not verified");

    let (status, body) = send(&app, get("/api/v1/claims/99999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn test_flag_lifecycle_and_notes() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/claims/30001/flags",
            json!({"author": "auditor", "reason": "Review coding"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_resolved"], false);
    let flag_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post_json(&format!("/api/v1/flags/{}/resolve", flag_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_resolved"], true);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/claims/30001/notes",
            json!({"author": "ops", "content": "Appeal filed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["note_type"], "user");

    let (_, body) = send(&app, get("/api/v1/claims/30001")).await;
    assert_eq!(body["data"]["flags"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["notes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_annotation_errors() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, _) = send(
        &app,
        post_json("/api/v1/claims/404/flags", json!({"author": "a", "reason": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post_json("/api/v1/claims/30001/notes", json!({"author": "ops", "content": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");

    let (status, _) = send(&app, post_json("/api/v1/flags/777/resolve", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_applies_filters() {
    let (store, app) = setup();
    seed(&store).await;

    let (status, body) = send(&app, get("/api/v1/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_claims"], 3);
    assert_eq!(body["data"]["denied_claims"], 1);
    assert_eq!(body["data"]["top_cpt_codes"][0]["code"], "80053");

    let (_, body) = send(&app, get("/api/v1/dashboard?insurer=cigna&status=bogus")).await;
    assert_eq!(body["data"]["total_claims"], 1);
    assert_eq!(body["data"]["paid_claims"], 1);
    assert_eq!(body["data"]["insurers"], json!(["Aetna", "Cigna"]));
}
