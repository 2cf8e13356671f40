use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
    response::Response,
};
use serde_json::{json, Value};
use shared::protocol::{HOLDER_NOT_FOUND_SENTINEL, POINTS_NOT_FOUND_SENTINEL};
use tower::ServiceExt;

async fn test_app(legacy_routes: bool) -> (Router, ApiContext) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext::new(storage);
    server_api::init_ledger(&api).await.expect("seed");
    let app = build_router(Arc::new(AppState { api: api.clone() }), legacy_routes);
    (app, api)
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn send_json(app: &Router, method: &str, uri: &str, payload: Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

async fn json_body(response: Response) -> Value {
    serde_json::from_str(&text(response).await).expect("json body")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _api) = test_app(true).await;
    let response = get(&app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn legacy_get_all_points_answers_with_and_without_trailing_slash() {
    let (app, _api) = test_app(true).await;
    for uri in ["/get_all_points/", "/get_all_points"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        let entries = json_body(response).await;
        let entries = entries.as_array().expect("array");
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0]["Key"], "1");
        assert_eq!(entries[1]["Key"], "10");
        assert_eq!(entries[0]["Record"]["holder"], "Miriam");
    }
}

#[tokio::test]
async fn legacy_get_points_returns_record_or_sentinel() {
    let (app, _api) = test_app(true).await;

    let response = get(&app, "/get_points/3").await;
    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;
    assert_eq!(record["holder"], "Igor");
    assert_eq!(record["schemeid"], "T012");

    let response = get(&app, "/get_points/99").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, POINTS_NOT_FOUND_SENTINEL);
}

#[tokio::test]
async fn legacy_add_points_records_hyphen_segment() {
    let (app, api) = test_app(true).await;

    let response = get(&app, "/add_points/11-10,%20-20.5-T-H-S").await;
    assert_eq!(response.status(), StatusCode::OK);
    let tx_id = text(response).await;

    let log = api
        .storage
        .transactions_for_key(&shared::domain::PointsKey::new("11"))
        .await
        .expect("log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].tx_id.0, tx_id);

    let record = json_body(get(&app, "/get_points/11").await).await;
    assert_eq!(record["location"], "10, -20.5");
    assert_eq!(record["timestamp"], "T");
    assert_eq!(record["holder"], "H");
    assert_eq!(record["schemeid"], "S");
}

#[tokio::test]
async fn legacy_add_points_rejects_short_segment() {
    let (app, _api) = test_app(true).await;
    let response = get(&app, "/add_points/11-only-three").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn legacy_change_holder_updates_or_returns_sentinel() {
    let (app, _api) = test_app(true).await;

    let response = get(&app, "/change_holder/99-Bob").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, HOLDER_NOT_FOUND_SENTINEL);

    let response = get(&app, "/change_holder/1-Jean-Luc").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!text(response).await.is_empty());

    let record = json_body(get(&app, "/get_points/1").await).await;
    assert_eq!(record["holder"], "Jean-Luc");
}

#[tokio::test]
async fn legacy_routes_can_be_switched_off() {
    let (app, _api) = test_app(false).await;
    assert_eq!(
        get(&app, "/get_all_points/").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(get(&app, "/api/v1/points").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn v1_record_and_fetch_round_trip_with_status_codes() {
    let (app, _api) = test_app(false).await;

    let response = send_json(
        &app,
        "POST",
        "/api/v1/points",
        json!({
            "id": "12",
            "longitude": 10.0,
            "latitude": 20.0,
            "timestamp": "T",
            "holder": "H",
            "scheme_id": "S"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = json_body(response).await;
    assert_eq!(receipt["key"], "12");

    let response = get(&app, "/api/v1/points/12").await;
    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;
    assert_eq!(record["location"], "10, 20");
}

#[tokio::test]
async fn v1_errors_carry_codes() {
    let (app, _api) = test_app(false).await;

    let response = get(&app, "/api/v1/points/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "not_found");

    let response = send_json(
        &app,
        "POST",
        "/api/v1/points",
        json!({
            "id": "12",
            "longitude": 500.0,
            "latitude": 20.0,
            "timestamp": "T",
            "holder": "H",
            "scheme_id": "S"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "validation");

    let response = send_json(&app, "POST", "/api/v1/points", json!({ "id": "12" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "validation");

    let response = send_json(
        &app,
        "PUT",
        "/api/v1/points/404/holder",
        json!({ "holder": "Bob" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn v1_change_holder_returns_receipt() {
    let (app, _api) = test_app(false).await;
    let response = send_json(
        &app,
        "PUT",
        "/api/v1/points/5/holder",
        json!({ "holder": "Noor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["key"], "5");

    let record = json_body(get(&app, "/api/v1/points/5").await).await;
    assert_eq!(record["holder"], "Noor");
    assert_eq!(record["schemeid"], "S439");
}
